//! A CPython-compatible codec registry and a regex bytecode VM, as
//! standalone crates:
//!
//! - [`pyrt_wtf8`] — the WTF-8 string type used throughout as the host
//!   string representation, so lone surrogates produced by lossy decodes
//!   round-trip instead of silently corrupting data.
//! - [`pyrt_common`] — the generic error-handler and transcoder-loop
//!   machinery shared by every concrete codec.
//! - [`pyrt_codecs`] — the codec registry, the eight built-in error
//!   handlers, and the concrete UTF-8/16/7, Latin-1, ASCII, unicode-escape,
//!   raw-unicode-escape, charmap and escape codecs.
//! - [`pyrt_sre`] — the `sre`-style regex bytecode VM.
//!
//! This crate is a thin re-export; there's no interpreter or CLI surface
//! above it, so it carries no logging setup of its own — each crate below
//! it is a library with no ambient state to initialize.

pub use pyrt_codecs as codecs;
pub use pyrt_common as common;
pub use pyrt_sre as sre;
pub use pyrt_wtf8 as wtf8;
