//! UTF-16 with BOM autodetection, forced little/big order, and stateful
//! decoding. Unlike `utf8`/`latin1`/`ascii` this doesn't reuse
//! [`pyrt_common::encodings`]'s byte-oriented transcoder loop — the 16-bit
//! code unit granularity and the surrogate-pairing logic don't fit that
//! shape — but it plugs into the same [`EncodeContext`]/[`DecodeContext`]
//! machinery for error-handler dispatch.

use pyrt_common::encodings::{DecodeContext, EncodeContext, EncodeReplace, StrSize};
use pyrt_wtf8::{CodePoint, Wtf8, Wtf8Buf};

use crate::context::{DecodeCtx, EncodeCtx};
use crate::error::CodecError;
use crate::errors::ErrorsHandler;
use crate::registry::CodecsRegistry;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Native,
    Little,
    Big,
}

#[cfg(target_endian = "little")]
const HOST_ORDER: ByteOrder = ByteOrder::Little;
#[cfg(target_endian = "big")]
const HOST_ORDER: ByteOrder = ByteOrder::Big;

fn pack(unit: u16, order: ByteOrder) -> [u8; 2] {
    match order {
        ByteOrder::Little => unit.to_le_bytes(),
        ByteOrder::Big => unit.to_be_bytes(),
        ByteOrder::Native => unit.to_ne_bytes(),
    }
}

fn unpack(bytes: [u8; 2], order: ByteOrder) -> u16 {
    match order {
        ByteOrder::Little => u16::from_le_bytes(bytes),
        ByteOrder::Big => u16::from_be_bytes(bytes),
        ByteOrder::Native => u16::from_ne_bytes(bytes),
    }
}

fn push_unit(out: &mut Vec<u8>, c: CodePoint, order: ByteOrder) {
    let n = c.to_u32();
    if n < 0x10000 {
        out.extend(pack(n as u16, order));
    } else {
        let n = n - 0x10000;
        out.extend(pack((0xd800 + (n >> 10)) as u16, order));
        out.extend(pack((0xdc00 + (n & 0x3ff)) as u16, order));
    }
}

pub fn encode_with_order(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
    order: ByteOrder,
) -> Result<(Vec<u8>, usize), CodecError> {
    let mut ctx = EncodeCtx::new("utf-16", data);
    let handler = ErrorsHandler::new(errors, registry);
    let mut out = Vec::with_capacity(data.len() * 2 + 2);
    if order == ByteOrder::Native {
        out.extend_from_slice(&pack(0xfeff, order));
    }
    loop {
        let remaining = ctx.remaining_data();
        if remaining.is_empty() {
            break;
        }
        let mut iter = pyrt_common::encodings::iter_code_points(remaining);
        let Some((i, _)) = iter.find(|(_, c)| matches!(c.to_u32(), 0xd800..=0xdfff)) else {
            for (_, c) in pyrt_common::encodings::iter_code_points(remaining) {
                push_unit(&mut out, c, order);
            }
            break;
        };
        drop(iter);
        for (_, c) in pyrt_common::encodings::iter_code_points(&remaining[0..i.bytes]) {
            push_unit(&mut out, c, order);
        }
        let err_start = ctx.position() + i;
        let err_end = err_start + StrSize { bytes: 3, chars: 1 };
        let replace = ctx.handle_error(&handler, err_start..err_end, Some("surrogates not allowed"))?;
        match replace {
            EncodeReplace::Str(s) => {
                for c in s.as_ref().code_points() {
                    push_unit(&mut out, c, order);
                }
            }
            EncodeReplace::Bytes(b) => out.extend_from_slice(b.as_ref()),
        }
    }
    Ok((out, data.char_len()))
}

pub fn encode(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    encode_with_order(data, errors, registry, ByteOrder::Native)
}

pub fn encode_le(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    encode_with_order(data, errors, registry, ByteOrder::Little)
}

pub fn encode_be(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    encode_with_order(data, errors, registry, ByteOrder::Big)
}

pub fn decode_with_order(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    final_decode: bool,
    order: ByteOrder,
) -> Result<(Wtf8Buf, usize), CodecError> {
    let mut ctx = DecodeCtx::new("utf-16", data);
    let handler = ErrorsHandler::new(errors, registry);

    let mut order = order;
    if order == ByteOrder::Native && data.len() >= 2 {
        match [data[0], data[1]] {
            [0xff, 0xfe] => {
                order = ByteOrder::Little;
                ctx.advance(2);
            }
            [0xfe, 0xff] => {
                order = ByteOrder::Big;
                ctx.advance(2);
            }
            _ => order = HOST_ORDER,
        }
    } else if order == ByteOrder::Native {
        order = HOST_ORDER;
    }

    let mut out = Wtf8Buf::with_capacity(data.len() / 2);
    loop {
        let remaining = ctx.remaining_data();
        if remaining.is_empty() {
            break;
        }
        if remaining.len() < 2 {
            if final_decode {
                let s = ctx.handle_error(
                    &handler,
                    ctx.position()..ctx.full_data().len(),
                    Some("truncated data"),
                )?;
                out.push_wtf8(s.as_ref());
            }
            break;
        }
        let unit = unpack([remaining[0], remaining[1]], order);
        match unit {
            0xd800..=0xdbff => {
                if remaining.len() < 4 {
                    if final_decode {
                        let s = ctx.handle_error(
                            &handler,
                            ctx.position()..ctx.full_data().len(),
                            Some("unexpected end of data"),
                        )?;
                        out.push_wtf8(s.as_ref());
                    }
                    break;
                }
                let low = unpack([remaining[2], remaining[3]], order);
                if matches!(low, 0xdc00..=0xdfff) {
                    let c = 0x10000 + ((u32::from(unit) - 0xd800) << 10) + (u32::from(low) - 0xdc00);
                    out.push(CodePoint::from_u32(c).expect("valid surrogate pair decodes to a scalar"));
                    ctx.advance(4);
                } else {
                    let s = ctx.handle_error(
                        &handler,
                        ctx.position()..ctx.position() + 2,
                        Some("illegal UTF-16 surrogate"),
                    )?;
                    out.push_wtf8(s.as_ref());
                }
            }
            0xdc00..=0xdfff => {
                let s = ctx.handle_error(
                    &handler,
                    ctx.position()..ctx.position() + 2,
                    Some("illegal encoding"),
                )?;
                out.push_wtf8(s.as_ref());
            }
            _ => {
                out.push(CodePoint::from(unit));
                ctx.advance(2);
            }
        }
    }
    Ok((out, ctx.position()))
}

pub fn decode(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    decode_with_order(data, errors, registry, final_decode, ByteOrder::Native)
}

pub fn decode_le(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    decode_with_order(data, errors, registry, final_decode, ByteOrder::Little)
}

pub fn decode_be(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    decode_with_order(data, errors, registry, final_decode, ByteOrder::Big)
}
