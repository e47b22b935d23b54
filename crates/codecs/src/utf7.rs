//! UTF-7 (RFC 2152): a direct-encoding mode for a safe ASCII subset and a
//! modified-base64 shift mode for everything else, entered and left with
//! `+`/`-`.

use pyrt_common::encodings::{DecodeContext, EncodeContext, EncodeReplace, StrSize};
use pyrt_wtf8::{CodePoint, Wtf8, Wtf8Buf};

use crate::context::{DecodeCtx, EncodeCtx};
use crate::error::CodecError;
use crate::errors::ErrorsHandler;
use crate::registry::CodecsRegistry;

const B64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn b64_value(c: u8) -> Option<u32> {
    B64_CHARS.iter().position(|&b| b == c).map(|i| i as u32)
}

/// Characters the direct-encoding fast path can emit without entering shift
/// mode: RFC 2152's "Set D" plus optionally "Set O" and whitespace.
fn is_special(c: u8, encode_set_o: bool, encode_whitespace: bool) -> bool {
    match c {
        0..=0x7f => (),
        _ => return true,
    }
    if encode_whitespace && matches!(c, b' ' | b'\t' | b'\r' | b'\n') {
        return true;
    }
    let direct = c.is_ascii_alphanumeric() || b"'(),-./:? ".contains(&c);
    let optional = b"!\"#$%&*;<=>@[]^_`{|}".contains(&c);
    if direct {
        return false;
    }
    if optional {
        return encode_set_o;
    }
    !matches!(c, b'+' | b'\\' | b'~')
}

pub fn encode(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    let mut ctx = EncodeCtx::new("utf-7", data);
    let handler = ErrorsHandler::new(errors, registry);
    let mut out = Vec::with_capacity(data.len());

    let mut shift_bits: u32 = 0;
    let mut shift_accum: u32 = 0;
    let mut in_shift = false;

    fn close_shift(out: &mut Vec<u8>, shift_bits: &mut u32, shift_accum: &mut u32, in_shift: &mut bool) {
        if *in_shift {
            if *shift_bits > 0 {
                out.push(B64_CHARS[((*shift_accum << (6 - *shift_bits)) & 0x3f) as usize]);
            }
            out.push(b'-');
        }
        *in_shift = false;
        *shift_bits = 0;
        *shift_accum = 0;
    }

    loop {
        let remaining = ctx.remaining_data();
        let mut iter = pyrt_common::encodings::iter_code_points(remaining);
        let Some((i, ch)) = iter.next() else { break };
        drop(iter);
        let n = ch.to_u32();
        if n < 0x80 && !is_special(n as u8, false, true) {
            close_shift(&mut out, &mut shift_bits, &mut shift_accum, &mut in_shift);
            if n as u8 == b'+' {
                out.extend_from_slice(b"+-");
            } else {
                out.push(n as u8);
            }
        } else if matches!(n, 0xd800..=0xdfff) {
            close_shift(&mut out, &mut shift_bits, &mut shift_accum, &mut in_shift);
            let range = (ctx.position() + i)..(ctx.position() + i + StrSize { bytes: 3, chars: 1 });
            let replace = ctx.handle_error(&handler, range, Some("surrogates not allowed"))?;
            match replace {
                EncodeReplace::Str(s) => {
                    let (bytes, _) = encode(s.as_ref(), "strict", registry)?;
                    out.extend_from_slice(&bytes);
                }
                EncodeReplace::Bytes(b) => out.extend_from_slice(b.as_ref()),
            }
            continue;
        } else {
            if !in_shift {
                out.push(b'+');
                in_shift = true;
            }
            shift_accum = (shift_accum << 16) | n;
            shift_bits += 16;
            while shift_bits >= 6 {
                shift_bits -= 6;
                out.push(B64_CHARS[((shift_accum >> shift_bits) & 0x3f) as usize]);
            }
        }
        ctx.restart_from(ctx.position() + i + StrSize { bytes: ch.encode_wtf8(&mut [0; 4]).len(), chars: 1 })?;
    }
    close_shift(&mut out, &mut shift_bits, &mut shift_accum, &mut in_shift);
    Ok((out, data.char_len()))
}

pub fn decode(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    _final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    let mut ctx = DecodeCtx::new("utf-7", data);
    let handler = ErrorsHandler::new(errors, registry);
    let mut out = Wtf8Buf::with_capacity(data.len());

    let mut in_shift = false;
    let mut shift_bits: u32 = 0;
    let mut shift_accum: u32 = 0;
    let mut start_shift = 0;

    while !ctx.remaining_data().is_empty() {
        let c = ctx.remaining_data()[0];
        if !in_shift {
            if c == b'+' {
                start_shift = ctx.position();
                in_shift = true;
                shift_bits = 0;
                shift_accum = 0;
                ctx.advance(1);
                if ctx.remaining_data().first() == Some(&b'-') {
                    out.push_char('+');
                    in_shift = false;
                    ctx.advance(1);
                }
            } else if c < 0x80 {
                out.push_char(c as char);
                ctx.advance(1);
            } else {
                let s = ctx.handle_error(&handler, ctx.position()..ctx.position() + 1, Some("unexpected special character"))?;
                out.push_wtf8(s.as_ref());
            }
            continue;
        }

        if let Some(bits) = b64_value(c) {
            shift_accum = (shift_accum << 6) | bits;
            shift_bits += 6;
            ctx.advance(1);
            if shift_bits >= 16 {
                shift_bits -= 16;
                let unit = ((shift_accum >> shift_bits) & 0xffff) as u16;
                if matches!(unit, 0xd800..=0xdfff) {
                    let s = ctx.handle_error(
                        &handler,
                        start_shift..ctx.position(),
                        Some("code pairs are not supported"),
                    )?;
                    out.push_wtf8(s.as_ref());
                } else {
                    out.push(CodePoint::from(unit));
                }
            }
        } else {
            if shift_bits >= 6 || (shift_accum & ((1 << shift_bits) - 1)) != 0 {
                let s = ctx.handle_error(
                    &handler,
                    start_shift..ctx.position(),
                    Some("partial character in shift sequence"),
                )?;
                out.push_wtf8(s.as_ref());
            }
            in_shift = false;
            if c == b'-' {
                ctx.advance(1);
            }
        }
    }
    Ok((out, ctx.position()))
}
