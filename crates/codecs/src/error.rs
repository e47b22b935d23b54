//! The three tagged transcoding-failure exceptions plus the registry-level
//! failure kinds (`lookup`/`type`/`index`/`runtime`), collapsed into one
//! error type since this crate has no exception hierarchy to hang them on.

use std::fmt;

use pyrt_wtf8::Wtf8Buf;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CodecError {
    /// `UnicodeEncodeError(encoding, input_text, start, end, reason)`
    #[error("'{encoding}' codec can't encode {len} character(s) starting at position {start}: {reason}", len = end - start)]
    Encode {
        encoding: String,
        input: Wtf8Buf,
        start: usize,
        end: usize,
        reason: String,
    },
    /// `UnicodeDecodeError(encoding, input_bytes, start, end, reason)`
    #[error("'{encoding}' codec can't decode byte(s) in position {start}-{end}: {reason}", end = end.saturating_sub(1))]
    Decode {
        encoding: String,
        input: Vec<u8>,
        start: usize,
        end: usize,
        reason: String,
    },
    /// `UnicodeTranslateError(input_text, start, end, reason)`
    #[error("can't translate character(s) in position {start}-{end}: {reason}", end = end.saturating_sub(1))]
    Translate {
        input: Wtf8Buf,
        start: usize,
        end: usize,
        reason: String,
    },
    #[error("unknown encoding: {0}")]
    Lookup(String),
    #[error("{0}")]
    Type(String),
    #[error("{0}")]
    Index(String),
    #[error("{0}")]
    Runtime(String),
}

impl CodecError {
    pub fn lookup(name: impl fmt::Display) -> Self {
        Self::Lookup(name.to_string())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index(msg.into())
    }

    /// `[start, end)` char range the failure is reported over, if this is a
    /// transcoding-failure variant.
    pub fn range(&self) -> Option<(usize, usize)> {
        match self {
            Self::Encode { start, end, .. }
            | Self::Decode { start, end, .. }
            | Self::Translate { start, end, .. } => Some((*start, *end)),
            _ => None,
        }
    }
}
