//! The codec registry (CR) and error-handler registry (EH): normalize and
//! cache encoding names, walk user-registered search functions, and publish
//! the eight built-in error handlers plus whatever a caller registers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pyrt_wtf8::{Wtf8, Wtf8Buf};

use crate::error::CodecError;
use crate::errors::{BUILTIN_ERROR_HANDLERS, BuiltinErrorHandler, ErrorHandler, StandardError};

pub type EncodeFn =
    Arc<dyn Fn(&Wtf8, &str, &CodecsRegistry) -> Result<(Vec<u8>, usize), CodecError> + Send + Sync>;
pub type DecodeFn = Arc<
    dyn Fn(&[u8], &str, &CodecsRegistry, bool) -> Result<(Wtf8Buf, usize), CodecError>
        + Send
        + Sync,
>;
pub type SearchFn = Arc<dyn Fn(&str) -> Option<CodecEntry> + Send + Sync>;

/// A registered codec: `(encoder, decoder, stream_reader, stream_writer)`.
/// The stream reader/writer constructors are opaque to the registry — it
/// never calls them, only ferries them back out of `lookup` — so they're
/// represented as plain markers rather than given real behavior here.
#[derive(Clone)]
pub struct CodecEntry {
    pub name: &'static str,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
    pub stream_reader: Option<()>,
    pub stream_writer: Option<()>,
}

struct RegistryInner {
    search_path: Vec<SearchFn>,
    search_cache: HashMap<String, CodecEntry>,
    errors: HashMap<String, Arc<dyn ErrorHandler>>,
}

pub struct CodecsRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for CodecsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecsRegistry {
    pub fn new() -> Self {
        let errors = BUILTIN_ERROR_HANDLERS
            .iter()
            .map(|&name| {
                let standard: StandardError = name.parse().expect("built-in handler name parses");
                (name.to_owned(), Arc::new(BuiltinErrorHandler(standard)) as Arc<dyn ErrorHandler>)
            })
            .collect();
        let inner = RegistryInner {
            search_path: vec![crate::builtins::search_function()],
            search_cache: HashMap::new(),
            errors,
        };
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Appends a search function. Unlike the source this was ported from,
    /// "must be callable" is enforced by the type system rather than at
    /// runtime, so there's no `TypeError` path here — a caller can only
    /// ever construct a well-typed `SearchFn`.
    pub fn register(&self, search_fn: SearchFn) {
        self.inner.write().search_path.push(search_fn);
    }

    pub fn unregister(&self, search_fn: &SearchFn) {
        let mut inner = self.inner.write();
        if inner.search_path.is_empty() {
            return;
        }
        if let Some(i) = inner
            .search_path
            .iter()
            .position(|f| Arc::ptr_eq(f, search_fn))
        {
            inner.search_cache.clear();
            inner.search_path.remove(i);
        }
    }

    /// "lowercase and replace each space with `-`", per the registry's
    /// normalization rule.
    pub fn normalize_encoding_name(encoding: &str) -> String {
        encoding.replace(' ', "-").to_lowercase()
    }

    pub fn lookup(&self, encoding: &str) -> Result<CodecEntry, CodecError> {
        let encoding = Self::normalize_encoding_name(encoding);
        let search_path = {
            let inner = self.inner.read();
            if let Some(entry) = inner.search_cache.get(&encoding) {
                return Ok(entry.clone());
            }
            inner.search_path.clone()
        };
        for func in &search_path {
            if let Some(entry) = func(&encoding) {
                let mut inner = self.inner.write();
                let entry = inner
                    .search_cache
                    .entry(encoding.clone())
                    .or_insert(entry)
                    .clone();
                return Ok(entry);
            }
        }
        Err(CodecError::lookup(format!("unknown encoding: {encoding}")))
    }

    pub fn encode(
        &self,
        data: &Wtf8,
        encoding: &str,
        errors: &str,
    ) -> Result<(Vec<u8>, usize), CodecError> {
        let entry = self.lookup(encoding)?;
        (entry.encode)(data, errors, self)
    }

    pub fn decode(
        &self,
        data: &[u8],
        encoding: &str,
        errors: &str,
        final_decode: bool,
    ) -> Result<(Wtf8Buf, usize), CodecError> {
        let entry = self.lookup(encoding)?;
        (entry.decode)(data, errors, self, final_decode)
    }

    pub fn register_error(&self, name: String, handler: Arc<dyn ErrorHandler>) {
        self.inner.write().errors.insert(name, handler);
    }

    pub fn unregister_error(&self, name: &str) -> Result<bool, CodecError> {
        if BUILTIN_ERROR_HANDLERS.contains(&name) {
            return Err(CodecError::type_error(format!(
                "cannot un-register built-in error handler '{name}'"
            )));
        }
        Ok(self.inner.write().errors.remove(name).is_some())
    }

    pub fn lookup_error(&self, name: &str) -> Result<Arc<dyn ErrorHandler>, CodecError> {
        self.inner
            .read()
            .errors
            .get(name)
            .cloned()
            .ok_or_else(|| CodecError::lookup(format!("unknown error handler name '{name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrt_wtf8::Wtf8;

    fn roundtrip(registry: &CodecsRegistry, encoding: &str, text: &str) {
        let (bytes, _) = registry.encode(Wtf8::from_str(text), encoding, "strict").unwrap();
        let (back, _) = registry.decode(&bytes, encoding, "strict", true).unwrap();
        assert_eq!(back.as_wtf8(), Wtf8::from_str(text));
    }

    #[test]
    fn normalizes_before_lookup() {
        assert_eq!(CodecsRegistry::normalize_encoding_name("UTF 8"), "utf-8");
        assert_eq!(CodecsRegistry::normalize_encoding_name("Latin-1"), "latin-1");
    }

    #[test]
    fn unknown_encoding_errors() {
        let registry = CodecsRegistry::new();
        assert!(registry.lookup("not-a-real-encoding").is_err());
    }

    #[test]
    fn builtin_round_trips() {
        let registry = CodecsRegistry::new();
        roundtrip(&registry, "utf-8", "hello, \u{1f600}");
        roundtrip(&registry, "utf-16", "hello, \u{1f600}");
        roundtrip(&registry, "utf-16-le", "hello, \u{1f600}");
        roundtrip(&registry, "utf-7", "hello, world");
        roundtrip(&registry, "unicode-escape", "tab\there");
        roundtrip(&registry, "latin-1", "caf\u{e9}");
        roundtrip(&registry, "ascii", "plain text");
    }

    #[test]
    fn strict_ascii_rejects_non_ascii() {
        let registry = CodecsRegistry::new();
        let err = registry
            .encode(Wtf8::from_str("caf\u{e9}"), "ascii", "strict")
            .unwrap_err();
        assert!(matches!(err, CodecError::Encode { .. }));
    }

    #[test]
    fn lookup_error_resolves_builtins_on_a_fresh_registry() {
        let registry = CodecsRegistry::new();
        for name in BUILTIN_ERROR_HANDLERS {
            registry.lookup_error(name).unwrap();
        }
        assert!(registry.lookup_error("not-a-real-handler").is_err());
    }

    #[test]
    fn custom_error_handler_registers_and_resolves() {
        struct AllQuestionMarks;
        impl ErrorHandler for AllQuestionMarks {
            fn handle_encode(
                &self,
                _encoding: &str,
                _input: &Wtf8,
                _start: usize,
                end: usize,
                _reason: &str,
            ) -> Result<(crate::errors::HandlerReplace, isize), CodecError> {
                Ok((
                    crate::errors::HandlerReplace::Bytes(vec![b'?']),
                    end as isize,
                ))
            }

            fn handle_decode(
                &self,
                _encoding: &str,
                _input: &[u8],
                _start: usize,
                end: usize,
                _reason: &str,
            ) -> Result<(pyrt_wtf8::Wtf8Buf, isize), CodecError> {
                Ok(("?".into(), end as isize))
            }
        }

        let registry = CodecsRegistry::new();
        registry.register_error("all-question-marks".to_owned(), Arc::new(AllQuestionMarks));
        let (bytes, _) = registry
            .encode(Wtf8::from_str("caf\u{e9}"), "ascii", "all-question-marks")
            .unwrap();
        assert_eq!(bytes, b"caf?");
    }
}
