//! `charmap`: transcoding driven by a caller-supplied lookup table instead
//! of a fixed algorithm. A table entry may map a code point to a byte
//! sequence, to nothing (meaning "drop this character"), or be absent
//! (meaning "unencodable"); decode is the mirror image, byte to code point,
//! string, or absence.
//!
//! There's no single well-known "the" charmap the way there is for
//! `utf-8`/`latin-1` — this module is a library surface for callers who
//! register their own mapping via [`CodecsRegistry::register`], not an
//! entry under a fixed name in `builtins`.

use pyrt_common::encodings::{DecodeContext, EncodeContext, EncodeReplace, StrSize};
use pyrt_wtf8::{CodePoint, Wtf8, Wtf8Buf};

use crate::context::{DecodeCtx, EncodeCtx};
use crate::error::CodecError;
use crate::errors::ErrorsHandler;
use crate::registry::CodecsRegistry;

/// A decoded mapping target: either a single code point or a longer
/// replacement string (CPython charmaps allow one byte to expand to several
/// characters).
pub enum MapTarget {
    CodePoint(CodePoint),
    Str(Wtf8Buf),
}

pub trait CharMap: Send + Sync {
    /// `None` means "no mapping" (unencodable); `Some(empty)` means
    /// "encodes to nothing".
    fn encode(&self, c: CodePoint) -> Option<Vec<u8>>;
    /// `None` means the byte is unmapped.
    fn decode(&self, b: u8) -> Option<MapTarget>;
}

/// The identity mapping: byte `n` decodes to code point `n` and vice versa
/// for code points below 256. Matches the "if the mapping is absent, fall
/// back to latin-1" shortcut.
pub struct Latin1Map;

impl CharMap for Latin1Map {
    fn encode(&self, c: CodePoint) -> Option<Vec<u8>> {
        (c.to_u32() < 256).then(|| vec![c.to_u32() as u8])
    }

    fn decode(&self, b: u8) -> Option<MapTarget> {
        Some(MapTarget::CodePoint(CodePoint::from(u16::from(b))))
    }
}

pub fn encode(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
    map: &dyn CharMap,
) -> Result<(Vec<u8>, usize), CodecError> {
    let mut ctx = EncodeCtx::new("charmap", data);
    let handler = ErrorsHandler::new(errors, registry);
    let mut out = Vec::with_capacity(data.len());
    loop {
        let remaining = ctx.remaining_data();
        let mut iter = pyrt_common::encodings::iter_code_points(remaining);
        let Some((i, c)) = iter.next() else { break };
        drop(iter);
        match map.encode(c) {
            Some(bytes) => {
                out.extend_from_slice(bytes.as_slice());
                ctx.restart_from(
                    ctx.position() + i + StrSize { bytes: c.encode_wtf8(&mut [0; 4]).len(), chars: 1 },
                )?;
            }
            None => {
                let start = ctx.position() + i;
                let end = start + StrSize { bytes: c.encode_wtf8(&mut [0; 4]).len(), chars: 1 };
                let replace = ctx.handle_error(&handler, start..end, Some("character maps to <undefined>"))?;
                match replace {
                    EncodeReplace::Str(s) => {
                        for rc in s.as_ref().code_points() {
                            match map.encode(rc) {
                                Some(bytes) => out.extend_from_slice(&bytes),
                                None => return Err(ctx.error_encoding(start..end, Some("character maps to <undefined>"))),
                            }
                        }
                    }
                    EncodeReplace::Bytes(b) => out.extend_from_slice(b.as_ref()),
                }
            }
        }
    }
    Ok((out, data.char_len()))
}

pub fn decode(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    map: &dyn CharMap,
) -> Result<(Wtf8Buf, usize), CodecError> {
    let mut ctx = DecodeCtx::new("charmap", data);
    let handler = ErrorsHandler::new(errors, registry);
    let mut out = Wtf8Buf::with_capacity(data.len());
    while !ctx.remaining_data().is_empty() {
        let b = ctx.remaining_data()[0];
        match map.decode(b) {
            Some(MapTarget::CodePoint(c)) => {
                out.push(c);
                ctx.advance(1);
            }
            Some(MapTarget::Str(s)) => {
                out.push_wtf8(&s);
                ctx.advance(1);
            }
            None => {
                let s = ctx.handle_error(
                    &handler,
                    ctx.position()..ctx.position() + 1,
                    Some("character maps to <undefined>"),
                )?;
                out.push_wtf8(s.as_ref());
            }
        }
    }
    Ok((out, ctx.position()))
}
