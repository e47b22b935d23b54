//! `escape`: the minimal C-style byte-string escaping used for `bytes`
//! `repr()`, minus the surrounding quotes. Each character is expected to be
//! a single byte value (0-255); this codec never touches code points above
//! that range.

use pyrt_common::encodings::DecodeContext;
use pyrt_wtf8::{CodePoint, Wtf8, Wtf8Buf};
use std::fmt::Write as _;

use crate::context::DecodeCtx;
use crate::error::CodecError;
use crate::registry::CodecsRegistry;

pub const NAME: &str = "escape";

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
            n @ 0x20..=0x7e => out.push(n as u8 as char),
            n => write!(out, "\\x{n:02x}").unwrap(),
        }
    }
    Ok((out.into_bytes(), data.char_len()))
}

pub fn decode(
    data: &[u8],
    _errors: &str,
    _registry: &CodecsRegistry,
    _final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    let mut ctx = DecodeCtx::new(NAME, data);
    let mut out = Wtf8Buf::with_capacity(data.len());

    while !ctx.remaining_data().is_empty() {
        let rest = ctx.remaining_data();
        let b = rest[0];
        if b != b'\\' || rest.len() < 2 {
            out.push(CodePoint::from(u16::from(b)));
            ctx.advance(1);
            continue;
        }
        let mut consumed = 2;
        match rest[1] {
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
                let mut value = u32::from(rest[1] - b'0');
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
            b'x' => {
                let hex = rest
                    .get(consumed..consumed + 2)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|s| u32::from_str_radix(s, 16).ok());
                match hex {
                    Some(v) => {
                        out.push(CodePoint::from(v as u16));
                        consumed += 2;
                    }
                    None => {
                        out.push_char('\\');
                        out.push(CodePoint::from(rest[1] as u16));
                    }
                }
            }
            other => {
                out.push_char('\\');
                out.push(CodePoint::from(other as u16));
            }
        }
        ctx.advance(consumed);
    }
    Ok((out, ctx.position()))
}
