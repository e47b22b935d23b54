//! `unicode-escape`: the format `repr()` uses for non-ASCII text, minus the
//! surrounding quotes. Printable ASCII passes through unescaped; everything
//! else becomes a C-style or `\x`/`\u`/`\U`/`\N{}` escape.

use pyrt_common::encodings::DecodeContext;
use pyrt_common::str::UnicodeEscapeCodepoint;
use pyrt_wtf8::{CodePoint, Wtf8, Wtf8Buf};
use std::fmt::Write as _;

use crate::context::DecodeCtx;
use crate::error::CodecError;
use crate::registry::CodecsRegistry;

pub const NAME: &str = "unicode-escape";

pub fn encode(
    data: &Wtf8,
    _errors: &str,
    _registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    let mut out = String::with_capacity(data.len());
    for c in data.code_points() {
        match c.to_u32() {
            0x5c => out.push_str("\\\\"),
            0x0a => out.push_str("\\n"),
            0x0d => out.push_str("\\r"),
            0x09 => out.push_str("\\t"),
            0x20..=0x7e => out.push(c.to_char().unwrap()),
            _ => write!(out, "{}", UnicodeEscapeCodepoint(c)).unwrap(),
        }
    }
    Ok((out.into_bytes(), data.char_len()))
}

fn hexdigits(bytes: &[u8], n: usize) -> Option<u32> {
    let chunk = bytes.get(..n)?;
    let s = std::str::from_utf8(chunk).ok()?;
    u32::from_str_radix(s, 16).ok()
}

pub fn decode(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    _final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    let mut ctx = DecodeCtx::new(NAME, data);
    let handler = crate::errors::ErrorsHandler::new(errors, registry);
    let mut out = Wtf8Buf::with_capacity(data.len());

    while !ctx.remaining_data().is_empty() {
        let rest = ctx.remaining_data();
        let b = rest[0];
        if b != b'\\' {
            out.push(CodePoint::from(u16::from(b)));
            ctx.advance(1);
            continue;
        }
        let Some(&esc) = rest.get(1) else {
            out.push(CodePoint::from(u16::from(b'\\')));
            ctx.advance(1);
            continue;
        };
        let mut consumed = 2;
        match esc {
            b'\n' => {}
            b'\\' => out.push_char('\\'),
            b'\'' => out.push_char('\''),
            b'"' => out.push_char('"'),
            b'a' => out.push_char('\x07'),
            b'b' => out.push_char('\x08'),
            b'f' => out.push_char('\x0c'),
            b'n' => out.push_char('\n'),
            b'r' => out.push_char('\r'),
            b't' => out.push_char('\t'),
            b'v' => out.push_char('\x0b'),
            b'0'..=b'7' => {
                let mut value = (esc - b'0') as u32;
                let mut n = 1;
                while n < 3 {
                    match rest.get(consumed) {
                        Some(&d) if (b'0'..=b'7').contains(&d) => {
                            value = (value << 3) | u32::from(d - b'0');
                            consumed += 1;
                            n += 1;
                        }
                        _ => break,
                    }
                }
                out.push(CodePoint::from((value & 0xff) as u16));
            }
            b'x' => match hexdigits(&rest[consumed..], 2) {
                Some(v) => {
                    out.push(CodePoint::from(v as u16));
                    consumed += 2;
                }
                None => {
                    let s = ctx.handle_error(
                        &handler,
                        ctx.position()..(ctx.position() + rest.len().min(4)),
                        Some("truncated \\xXX escape"),
                    )?;
                    out.push_wtf8(s.as_ref());
                    continue;
                }
            },
            b'u' => match hexdigits(&rest[consumed..], 4) {
                Some(v) => {
                    out.push(CodePoint::from(v as u16));
                    consumed += 4;
                }
                None => {
                    let s = ctx.handle_error(
                        &handler,
                        ctx.position()..(ctx.position() + rest.len().min(6)),
                        Some("truncated \\uXXXX escape"),
                    )?;
                    out.push_wtf8(s.as_ref());
                    continue;
                }
            },
            b'U' => match hexdigits(&rest[consumed..], 8).and_then(CodePoint::from_u32) {
                Some(v) => {
                    out.push(v);
                    consumed += 8;
                }
                None => {
                    let s = ctx.handle_error(
                        &handler,
                        ctx.position()..(ctx.position() + rest.len().min(10)),
                        Some("illegal Unicode character"),
                    )?;
                    out.push_wtf8(s.as_ref());
                    continue;
                }
            },
            b'N' if rest.get(consumed) == Some(&b'{') => {
                if let Some(end) = rest[consumed..].iter().position(|&c| c == b'}') {
                    let name = std::str::from_utf8(&rest[consumed + 1..consumed + end]).ok();
                    match name.and_then(unicode_names2::character) {
                        Some(c) => {
                            out.push_char(c);
                            consumed += end + 1;
                        }
                        None => {
                            let s = ctx.handle_error(
                                &handler,
                                ctx.position()..(ctx.position() + consumed + end + 1),
                                Some("unknown Unicode character name"),
                            )?;
                            out.push_wtf8(s.as_ref());
                            continue;
                        }
                    }
                } else {
                    let s = ctx.handle_error(
                        &handler,
                        ctx.position()..ctx.full_data().len(),
                        Some("malformed \\N character escape"),
                    )?;
                    out.push_wtf8(s.as_ref());
                    continue;
                }
            }
            _ => {
                out.push_char('\\');
                out.push(CodePoint::from(esc as u16));
            }
        }
        ctx.advance(consumed);
    }
    Ok((out, ctx.position()))
}
