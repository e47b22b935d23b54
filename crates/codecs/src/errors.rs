//! Name-based error-handler resolution: the eight built-in policies are
//! fast-pathed as an enum match, anything else is looked up in the
//! [`CodecsRegistry`](crate::registry::CodecsRegistry)'s error-handler table.
//!
//! Unlike the interpreter this is ported from, a registered handler here
//! isn't a generic callable dispatched on the exception's Python type — it's
//! a [`ErrorHandler`] trait object with one method per failure kind, since
//! there is no dynamic exception hierarchy to downcast through.

use core::ops::Range;
use std::sync::{Arc, OnceLock};

use pyrt_common::encodings::{
    CodecContext, DecodeErrorHandler, EncodeContext, EncodeErrorHandler, EncodeReplace, StrSize,
    errors,
};
use pyrt_wtf8::{CodePoint, Wtf8Buf};

use crate::context::{DecodeCtx, EncodeCtx};
use crate::error::CodecError;

/// What a user-registered handler spliced in, before it's wrapped back into
/// an [`EncodeReplace`] for the concrete [`EncodeCtx`] it's resolving for.
pub enum HandlerReplace {
    Str(Wtf8Buf),
    Bytes(Vec<u8>),
}

/// A user-registered error handler, invoked with the failure that was
/// classified by the transcoder. Returns `(replacement, new_position)`
/// exactly as described by the registry contract; `new_position` may be
/// negative, interpreted relative to the input length.
pub trait ErrorHandler: Send + Sync {
    fn handle_encode(
        &self,
        encoding: &str,
        input: &pyrt_wtf8::Wtf8,
        start: usize,
        end: usize,
        reason: &str,
    ) -> Result<(HandlerReplace, isize), CodecError>;

    fn handle_decode(
        &self,
        encoding: &str,
        input: &[u8],
        start: usize,
        end: usize,
        reason: &str,
    ) -> Result<(Wtf8Buf, isize), CodecError>;
}

#[derive(strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StandardError {
    Strict,
    Ignore,
    Replace,
    XmlCharRefReplace,
    BackslashReplace,
    NameReplace,
    SurrogatePass,
    SurrogateEscape,
}

pub const BUILTIN_ERROR_HANDLERS: &[&str] = &[
    "strict",
    "ignore",
    "replace",
    "xmlcharrefreplace",
    "backslashreplace",
    "namereplace",
    "surrogatepass",
    "surrogateescape",
];

impl<'a> EncodeErrorHandler<EncodeCtx<'a>> for StandardError {
    fn handle_encode_error(
        &self,
        ctx: &mut EncodeCtx<'a>,
        range: Range<StrSize>,
        reason: Option<&str>,
    ) -> Result<(EncodeReplace<EncodeCtx<'a>>, StrSize), CodecError> {
        use StandardError::*;
        match self {
            Strict => errors::Strict.handle_encode_error(ctx, range, reason),
            Ignore => errors::Ignore.handle_encode_error(ctx, range, reason),
            Replace => errors::Replace.handle_encode_error(ctx, range, reason),
            XmlCharRefReplace => errors::XmlCharRefReplace.handle_encode_error(ctx, range, reason),
            BackslashReplace => errors::BackslashReplace.handle_encode_error(ctx, range, reason),
            NameReplace => errors::NameReplace.handle_encode_error(ctx, range, reason),
            SurrogatePass => SurrogatePass.handle_encode_error(ctx, range, reason),
            SurrogateEscape => errors::SurrogateEscape.handle_encode_error(ctx, range, reason),
        }
    }
}

impl DecodeErrorHandler<DecodeCtx<'_>> for StandardError {
    fn handle_decode_error(
        &self,
        ctx: &mut DecodeCtx<'_>,
        byte_range: Range<usize>,
        reason: Option<&str>,
    ) -> Result<(Wtf8Buf, usize), CodecError> {
        use StandardError::*;
        match self {
            Strict => errors::Strict.handle_decode_error(ctx, byte_range, reason),
            Ignore => errors::Ignore.handle_decode_error(ctx, byte_range, reason),
            Replace => errors::Replace.handle_decode_error(ctx, byte_range, reason),
            BackslashReplace => errors::BackslashReplace.handle_decode_error(ctx, byte_range, reason),
            SurrogatePass => SurrogatePass.handle_decode_error(ctx, byte_range, reason),
            SurrogateEscape => errors::SurrogateEscape.handle_decode_error(ctx, byte_range, reason),
            XmlCharRefReplace | NameReplace => Err(CodecError::type_error(
                "don't know how to handle UnicodeDecodeError in error callback",
            )),
        }
    }
}

/// Wraps a [`StandardError`] variant behind the object-safe [`ErrorHandler`]
/// interface so the eight built-ins can live in
/// [`CodecsRegistry`](crate::registry::CodecsRegistry)'s error-handler table
/// alongside user-registered handlers, rather than only being reachable
/// through [`ErrorsHandler::resolve`]'s name-parsing fast path.
pub struct BuiltinErrorHandler(pub StandardError);

fn char_to_byte(data: &pyrt_wtf8::Wtf8, chars: usize) -> StrSize {
    StrSize {
        chars,
        bytes: data
            .code_point_indices()
            .nth(chars)
            .map_or(data.len(), |(i, _)| i),
    }
}

impl ErrorHandler for BuiltinErrorHandler {
    fn handle_encode(
        &self,
        encoding: &str,
        input: &pyrt_wtf8::Wtf8,
        start: usize,
        end: usize,
        reason: &str,
    ) -> Result<(HandlerReplace, isize), CodecError> {
        let mut ctx = EncodeCtx::new(encoding, input);
        let range = char_to_byte(input, start)..char_to_byte(input, end);
        let (replace, restart) = self.0.handle_encode_error(&mut ctx, range, Some(reason))?;
        let replace = match replace {
            EncodeReplace::Str(s) => HandlerReplace::Str(s),
            EncodeReplace::Bytes(b) => HandlerReplace::Bytes(b),
        };
        Ok((replace, restart.chars as isize))
    }

    fn handle_decode(
        &self,
        encoding: &str,
        input: &[u8],
        start: usize,
        end: usize,
        reason: &str,
    ) -> Result<(Wtf8Buf, isize), CodecError> {
        let mut ctx = DecodeCtx::new(encoding, input);
        let (replace, restart) = self.0.handle_decode_error(&mut ctx, start..end, Some(reason))?;
        Ok((replace, restart as isize))
    }
}

/// `StandardEncoding::parse` recognizes the name a `surrogatepass`/ handler
/// needs in order to reconstruct the raw byte pattern a lone surrogate would
/// have had under that fixed-width encoding.
#[derive(Eq, PartialEq)]
enum StandardEncoding {
    Utf8,
    Utf16Be,
    Utf16Le,
    Utf32Be,
    Utf32Le,
}

impl StandardEncoding {
    #[cfg(target_endian = "little")]
    const UTF_16_NE: Self = Self::Utf16Le;
    #[cfg(target_endian = "big")]
    const UTF_16_NE: Self = Self::Utf16Be;

    #[cfg(target_endian = "little")]
    const UTF_32_NE: Self = Self::Utf32Le;
    #[cfg(target_endian = "big")]
    const UTF_32_NE: Self = Self::Utf32Be;

    fn parse(encoding: &str) -> Option<Self> {
        let encoding = encoding.to_lowercase();
        if let Some(encoding) = encoding.strip_prefix("utf") {
            let encoding = encoding
                .strip_prefix(|c| ['-', '_'].contains(&c))
                .unwrap_or(encoding);
            if encoding == "8" {
                Some(Self::Utf8)
            } else if let Some(encoding) = encoding.strip_prefix("16") {
                if encoding.is_empty() {
                    return Some(Self::UTF_16_NE);
                }
                match encoding.strip_prefix(['-', '_']).unwrap_or(encoding) {
                    "be" => Some(Self::Utf16Be),
                    "le" => Some(Self::Utf16Le),
                    _ => None,
                }
            } else if let Some(encoding) = encoding.strip_prefix("32") {
                if encoding.is_empty() {
                    return Some(Self::UTF_32_NE);
                }
                match encoding.strip_prefix(['-', '_']).unwrap_or(encoding) {
                    "be" => Some(Self::Utf32Be),
                    "le" => Some(Self::Utf32Le),
                    _ => None,
                }
            } else {
                None
            }
        } else if encoding == "cp65001" {
            Some(Self::Utf8)
        } else {
            None
        }
    }
}

struct SurrogatePass;

impl<'a> EncodeErrorHandler<EncodeCtx<'a>> for SurrogatePass {
    fn handle_encode_error(
        &self,
        ctx: &mut EncodeCtx<'a>,
        range: Range<StrSize>,
        reason: Option<&str>,
    ) -> Result<(EncodeReplace<EncodeCtx<'a>>, StrSize), CodecError> {
        let standard_encoding = StandardEncoding::parse(ctx.encoding)
            .ok_or_else(|| ctx.error_encoding(range.clone(), reason))?;
        let err_str = &ctx.full_data()[range.start.bytes..range.end.bytes];
        let num_chars = range.end.chars - range.start.chars;
        let mut out: Vec<u8> = Vec::with_capacity(num_chars * 4);
        for ch in err_str.code_points() {
            let c = ch.to_u32();
            if !matches!(c, 0xd800..=0xdfff) {
                return Err(ctx.error_encoding(range, reason));
            }
            match standard_encoding {
                StandardEncoding::Utf8 => out.extend(ch.encode_wtf8(&mut [0; 4]).as_bytes()),
                StandardEncoding::Utf16Le => out.extend((c as u16).to_le_bytes()),
                StandardEncoding::Utf16Be => out.extend((c as u16).to_be_bytes()),
                StandardEncoding::Utf32Le => out.extend(c.to_le_bytes()),
                StandardEncoding::Utf32Be => out.extend(c.to_be_bytes()),
            }
        }
        Ok((EncodeReplace::Bytes(ctx.bytes(out)), range.end))
    }
}

impl DecodeErrorHandler<DecodeCtx<'_>> for SurrogatePass {
    fn handle_decode_error(
        &self,
        ctx: &mut DecodeCtx<'_>,
        byte_range: Range<usize>,
        reason: Option<&str>,
    ) -> Result<(Wtf8Buf, usize), CodecError> {
        use pyrt_common::encodings::DecodeContext;

        let standard_encoding = StandardEncoding::parse(ctx.encoding)
            .ok_or_else(|| ctx.error_decoding(byte_range.clone(), reason))?;

        let s = ctx.full_data();
        let p = &s[byte_range.start..];

        fn slice<const N: usize>(p: &[u8]) -> Option<[u8; N]> {
            p.first_chunk().copied()
        }

        let c = match standard_encoding {
            StandardEncoding::Utf8 => slice::<3>(p)
                .filter(|&[a, b, c]| {
                    (u32::from(a) & 0xf0) == 0xe0
                        && (u32::from(b) & 0xc0) == 0x80
                        && (u32::from(c) & 0xc0) == 0x80
                })
                .map(|[a, b, c]| {
                    ((u32::from(a) & 0x0f) << 12) + ((u32::from(b) & 0x3f) << 6) + (u32::from(c) & 0x3f)
                }),
            StandardEncoding::Utf16Le => slice(p).map(u16::from_le_bytes).map(u32::from),
            StandardEncoding::Utf16Be => slice(p).map(u16::from_be_bytes).map(u32::from),
            StandardEncoding::Utf32Le => slice(p).map(u32::from_le_bytes),
            StandardEncoding::Utf32Be => slice(p).map(u32::from_be_bytes),
        };
        let byte_length = match standard_encoding {
            StandardEncoding::Utf8 => 3,
            StandardEncoding::Utf16Be | StandardEncoding::Utf16Le => 2,
            StandardEncoding::Utf32Be | StandardEncoding::Utf32Le => 4,
        };

        let c = c
            .and_then(CodePoint::from_u32)
            .filter(|c| matches!(c.to_u32(), 0xd800..=0xdfff))
            .ok_or_else(|| ctx.error_decoding(byte_range.clone(), reason))?;

        Ok((ctx.string(c.into()), byte_range.start + byte_length))
    }
}

/// Resolves an error-policy name once and caches the resolution for the
/// remainder of a single transcoder call.
pub struct ErrorsHandler<'a> {
    name: &'a str,
    registry: &'a crate::registry::CodecsRegistry,
    resolved: OnceLock<ResolvedError>,
}

enum ResolvedError {
    Standard(StandardError),
    Handler(Arc<dyn ErrorHandler>),
}

impl<'a> ErrorsHandler<'a> {
    pub fn new(name: &'a str, registry: &'a crate::registry::CodecsRegistry) -> Self {
        Self {
            name,
            registry,
            resolved: OnceLock::new(),
        }
    }

    fn resolve(&self) -> Result<&ResolvedError, CodecError> {
        if let Some(val) = self.resolved.get() {
            return Ok(val);
        }
        let val = if let Ok(standard) = self.name.parse() {
            ResolvedError::Standard(standard)
        } else {
            ResolvedError::Handler(self.registry.lookup_error(self.name)?)
        };
        Ok(self.resolved.get_or_init(|| val))
    }
}

fn normalize_restart(restart: isize, len: usize, end: usize) -> usize {
    let restart = if restart < 0 {
        len.wrapping_sub(restart.unsigned_abs())
    } else {
        restart as usize
    };
    if restart == end { end } else { restart }
}

impl<'h, 'c> EncodeErrorHandler<EncodeCtx<'c>> for ErrorsHandler<'h> {
    fn handle_encode_error(
        &self,
        ctx: &mut EncodeCtx<'c>,
        range: Range<StrSize>,
        reason: Option<&str>,
    ) -> Result<(EncodeReplace<EncodeCtx<'c>>, StrSize), CodecError> {
        let handler = match self.resolve()? {
            ResolvedError::Standard(standard) => {
                return standard.handle_encode_error(ctx, range, reason);
            }
            ResolvedError::Handler(handler) => handler,
        };
        let reason = reason.unwrap_or("unknown error");
        let (replace, restart) = handler.handle_encode(
            ctx.encoding,
            ctx.full_data(),
            range.start.chars,
            range.end.chars,
            reason,
        )?;
        let replace = match replace {
            HandlerReplace::Str(s) => EncodeReplace::Str(ctx.string(s)),
            HandlerReplace::Bytes(b) => EncodeReplace::Bytes(ctx.bytes(b)),
        };
        let restart_chars = normalize_restart(restart, ctx.data_len().chars, range.end.chars);
        let restart = if restart_chars == range.end.chars {
            range.end
        } else {
            StrSize {
                chars: restart_chars,
                bytes: ctx
                    .full_data()
                    .code_point_indices()
                    .nth(restart_chars)
                    .map_or(ctx.data_len().bytes, |(i, _)| i),
            }
        };
        Ok((replace, restart))
    }
}

impl DecodeErrorHandler<DecodeCtx<'_>> for ErrorsHandler<'_> {
    fn handle_decode_error(
        &self,
        ctx: &mut DecodeCtx<'_>,
        byte_range: Range<usize>,
        reason: Option<&str>,
    ) -> Result<(Wtf8Buf, usize), CodecError> {
        use pyrt_common::encodings::DecodeContext;

        let handler = match self.resolve()? {
            ResolvedError::Standard(standard) => {
                return standard.handle_decode_error(ctx, byte_range, reason);
            }
            ResolvedError::Handler(handler) => handler,
        };
        let reason = reason.unwrap_or("unknown error");
        let (replace, restart) = handler.handle_decode(
            ctx.encoding,
            ctx.full_data(),
            byte_range.start,
            byte_range.end,
            reason,
        )?;
        let restart = normalize_restart(restart, ctx.full_data().len(), byte_range.end);
        Ok((replace, restart))
    }
}
