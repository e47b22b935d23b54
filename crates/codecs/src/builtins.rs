//! The bootstrap search function: resolves the encoding names and aliases
//! this crate ships out of the box. Registered first in every
//! [`CodecsRegistry`](crate::registry::CodecsRegistry), so a caller's own
//! `register`ed search functions only ever see names this one didn't claim.

use crate::registry::{CodecEntry, SearchFn};
use std::sync::Arc;

macro_rules! entry {
    ($name:expr, $encode:expr, $decode:expr) => {
        CodecEntry {
            name: $name,
            encode: Arc::new($encode),
            decode: Arc::new($decode),
            stream_reader: None,
            stream_writer: None,
        }
    };
}

pub fn search_function() -> SearchFn {
    Arc::new(|name: &str| {
        Some(match name {
            "utf-8" | "utf8" | "u8" | "cp65001" => {
                entry!("utf-8", crate::utf8::encode, crate::utf8::decode)
            }
            "latin-1" | "latin1" | "latin" | "l1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" => {
                entry!("latin-1", crate::latin1::encode, crate::latin1::decode)
            }
            "ascii" | "646" | "us-ascii" => {
                entry!("ascii", crate::ascii::encode, crate::ascii::decode)
            }
            "utf-16" | "utf16" | "u16" => {
                entry!("utf-16", crate::utf16::encode, crate::utf16::decode)
            }
            "utf-16-le" | "utf-16le" | "utf16-le" => {
                entry!("utf-16-le", crate::utf16::encode_le, crate::utf16::decode_le)
            }
            "utf-16-be" | "utf-16be" | "utf16-be" => {
                entry!("utf-16-be", crate::utf16::encode_be, crate::utf16::decode_be)
            }
            "utf-7" | "utf7" | "u7" => {
                entry!("utf-7", crate::utf7::encode, crate::utf7::decode)
            }
            "unicode-escape" => entry!(
                "unicode-escape",
                crate::unicode_escape::encode,
                crate::unicode_escape::decode
            ),
            "raw-unicode-escape" => entry!(
                "raw-unicode-escape",
                crate::raw_unicode_escape::encode,
                crate::raw_unicode_escape::decode
            ),
            "escape" | "string-escape" => {
                entry!("escape", crate::escape::encode, crate::escape::decode)
            }
            _ => return None,
        })
    })
}
