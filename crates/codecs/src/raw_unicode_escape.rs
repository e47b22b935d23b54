//! `raw-unicode-escape`: like `unicode-escape` but only `\u`/`\U` are
//! recognized — no `\n`/`\t`/backslash escaping, so a single backslash
//! followed by anything other than `u`/`U` plus the right number of hex
//! digits passes through unchanged.

use pyrt_common::encodings::DecodeContext;
use pyrt_wtf8::{CodePoint, Wtf8, Wtf8Buf};
use std::fmt::Write as _;

use crate::context::DecodeCtx;
use crate::error::CodecError;
use crate::registry::CodecsRegistry;

pub const NAME: &str = "raw-unicode-escape";

pub fn encode(
    data: &Wtf8,
    _errors: &str,
    _registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    let mut out = String::with_capacity(data.len());
    for c in data.code_points() {
        let n = c.to_u32();
        if n < 0x100 {
            out.push(n as u8 as char);
        } else if n < 0x10000 {
            write!(out, "\\u{n:04x}").unwrap();
        } else {
            write!(out, "\\U{n:08x}").unwrap();
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
        match rest[1] {
            b'u' => match hexdigits(&rest[2..], 4) {
                Some(v) => {
                    out.push(CodePoint::from(v as u16));
                    ctx.advance(6);
                }
                None => {
                    out.push(CodePoint::from(u16::from(b)));
                    ctx.advance(1);
                }
            },
            b'U' => match hexdigits(&rest[2..], 8).and_then(CodePoint::from_u32) {
                Some(v) => {
                    out.push(v);
                    ctx.advance(10);
                }
                None => {
                    out.push(CodePoint::from(u16::from(b)));
                    ctx.advance(1);
                }
            },
            _ => {
                out.push(CodePoint::from(u16::from(b)));
                ctx.advance(1);
            }
        }
    }
    Ok((out, ctx.position()))
}
