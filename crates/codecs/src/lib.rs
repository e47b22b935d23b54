//! Codec registry and concrete text/byte transcoders, built on
//! `pyrt-common`'s generic codec loop.
//!
//! [`CodecsRegistry`] owns the search path and the error-handler table;
//! everything else in this crate either implements a codec or implements
//! [`ErrorHandler`](errors::ErrorHandler).

pub mod ascii;
mod builtins;
pub mod charmap;
pub mod context;
pub mod error;
pub mod errors;
pub mod escape;
pub mod latin1;
pub mod raw_unicode_escape;
pub mod registry;
pub mod unicode_escape;
pub mod utf7;
pub mod utf8;
pub mod utf16;

pub use error::CodecError;
pub use errors::ErrorHandler;
pub use registry::{CodecEntry, CodecsRegistry};
