//! Thin wrapper around [`pyrt_common::encodings::latin_1`].

use pyrt_wtf8::{Wtf8, Wtf8Buf};

use crate::context::{DecodeCtx, EncodeCtx};
use crate::error::CodecError;
use crate::errors::ErrorsHandler;
use crate::registry::CodecsRegistry;

pub const NAME: &str = "latin-1";

pub fn encode(
    data: &Wtf8,
    errors: &str,
    registry: &CodecsRegistry,
) -> Result<(Vec<u8>, usize), CodecError> {
    let ctx = EncodeCtx::new(NAME, data);
    let handler = ErrorsHandler::new(errors, registry);
    let bytes = pyrt_common::encodings::latin_1::encode(ctx, &handler)?;
    Ok((bytes, data.char_len()))
}

pub fn decode(
    data: &[u8],
    errors: &str,
    registry: &CodecsRegistry,
    _final_decode: bool,
) -> Result<(Wtf8Buf, usize), CodecError> {
    let ctx = DecodeCtx::new(NAME, data);
    let handler = ErrorsHandler::new(errors, registry);
    pyrt_common::encodings::latin_1::decode(ctx, &handler)
}
