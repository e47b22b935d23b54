//! Concrete [`CodecContext`] implementations over owned/borrowed Rust types
//! (no host-object system to thread through, unlike a codec embedded in an
//! interpreter).

use core::ops::Range;

use pyrt_common::encodings::{CodecContext, DecodeContext, EncodeContext, StrSize};
use pyrt_wtf8::Wtf8;

use crate::error::CodecError;

pub struct EncodeCtx<'a> {
    pub(crate) encoding: &'a str,
    data: &'a Wtf8,
    pos: StrSize,
}

impl<'a> EncodeCtx<'a> {
    pub fn new(encoding: &'a str, data: &'a Wtf8) -> Self {
        Self {
            encoding,
            data,
            pos: StrSize::default(),
        }
    }
}

impl CodecContext for EncodeCtx<'_> {
    type Error = CodecError;
    type StrBuf = pyrt_wtf8::Wtf8Buf;
    type BytesBuf = Vec<u8>;

    fn string(&self, s: pyrt_wtf8::Wtf8Buf) -> Self::StrBuf {
        s
    }

    fn bytes(&self, b: Vec<u8>) -> Self::BytesBuf {
        b
    }
}

impl EncodeContext for EncodeCtx<'_> {
    fn full_data(&self) -> &Wtf8 {
        self.data
    }

    fn data_len(&self) -> StrSize {
        StrSize {
            bytes: self.data.len(),
            chars: self.data.char_len(),
        }
    }

    fn remaining_data(&self) -> &Wtf8 {
        &self.full_data()[self.pos.bytes..]
    }

    fn position(&self) -> StrSize {
        self.pos
    }

    fn restart_from(&mut self, pos: StrSize) -> Result<(), Self::Error> {
        if pos.chars > self.data.char_len() {
            return Err(CodecError::index(format!(
                "position {} from error handler out of bounds",
                pos.chars
            )));
        }
        debug_assert!(
            self.data.is_code_point_boundary(pos.bytes),
            "invalid pos {pos:?} for {:?}",
            self.data
        );
        self.pos = pos;
        Ok(())
    }

    fn error_encoding(&self, range: Range<StrSize>, reason: Option<&str>) -> Self::Error {
        CodecError::Encode {
            encoding: self.encoding.to_owned(),
            input: self.data.into(),
            start: range.start.chars,
            end: range.end.chars,
            reason: reason.unwrap_or("unknown error").to_owned(),
        }
    }
}

pub struct DecodeCtx<'a> {
    pub(crate) encoding: &'a str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> DecodeCtx<'a> {
    pub fn new(encoding: &'a str, data: &'a [u8]) -> Self {
        Self {
            encoding,
            data,
            pos: 0,
        }
    }
}

impl CodecContext for DecodeCtx<'_> {
    type Error = CodecError;
    type StrBuf = pyrt_wtf8::Wtf8Buf;
    type BytesBuf = Vec<u8>;

    fn string(&self, s: pyrt_wtf8::Wtf8Buf) -> Self::StrBuf {
        s
    }

    fn bytes(&self, b: Vec<u8>) -> Self::BytesBuf {
        b
    }
}

impl DecodeContext for DecodeCtx<'_> {
    fn full_data(&self) -> &[u8] {
        self.data
    }

    fn remaining_data(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn advance(&mut self, by: usize) {
        self.pos += by;
    }

    fn restart_from(&mut self, pos: usize) -> Result<(), Self::Error> {
        if pos > self.data.len() {
            return Err(CodecError::index(format!(
                "position {pos} from error handler out of bounds"
            )));
        }
        self.pos = pos;
        Ok(())
    }

    fn error_decoding(&self, byte_range: Range<usize>, reason: Option<&str>) -> Self::Error {
        CodecError::Decode {
            encoding: self.encoding.to_owned(),
            input: self.data.to_vec(),
            start: byte_range.start,
            end: byte_range.end,
            reason: reason.unwrap_or("unknown error").to_owned(),
        }
    }
}
