//! Opcode and operand vocabulary for the regex bytecode stream executed by
//! [`engine`]. Values are assigned sequentially by definition order; nothing
//! outside this crate parses a foreign bytecode stream, so the numbering
//! only has to be internally consistent (unlike CPython's `sre_constants`,
//! which additionally has to match what its `sre_compile` emits).

pub mod engine;
pub mod pattern;
pub mod string;

pub use engine::{Marks, Request, SearchIter, State};
pub use string::{StrDrive, StringCursor};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Sentinel meaning "no upper bound" for a repeat's max count.
pub const MAXREPEAT: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SreOpcode {
    FAILURE = 0,
    SUCCESS,
    ANY,
    ANY_ALL,
    ASSERT,
    ASSERT_NOT,
    AT,
    BRANCH,
    CATEGORY,
    CHARSET,
    BIGCHARSET,
    GROUPREF,
    GROUPREF_EXISTS,
    GROUPREF_IGNORE,
    GROUPREF_LOC_IGNORE,
    GROUPREF_UNI_IGNORE,
    IN,
    IN_IGNORE,
    IN_LOC_IGNORE,
    IN_UNI_IGNORE,
    INFO,
    JUMP,
    LITERAL,
    LITERAL_IGNORE,
    LITERAL_LOC_IGNORE,
    LITERAL_UNI_IGNORE,
    MARK,
    MAX_UNTIL,
    MIN_REPEAT_ONE,
    MIN_UNTIL,
    NEGATE,
    NOT_LITERAL,
    NOT_LITERAL_IGNORE,
    NOT_LITERAL_LOC_IGNORE,
    NOT_LITERAL_UNI_IGNORE,
    RANGE,
    RANGE_UNI_IGNORE,
    REPEAT,
    REPEAT_ONE,
    SUBPATTERN,
    ATOMIC_GROUP,
    POSSESSIVE_REPEAT,
    POSSESSIVE_REPEAT_ONE,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SreAtCode {
    BEGINNING = 0,
    BEGINNING_LINE,
    BEGINNING_STRING,
    BOUNDARY,
    NON_BOUNDARY,
    END,
    END_LINE,
    END_STRING,
    LOC_BOUNDARY,
    LOC_NON_BOUNDARY,
    UNI_BOUNDARY,
    UNI_NON_BOUNDARY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum SreCatCode {
    DIGIT = 0,
    NOT_DIGIT,
    SPACE,
    NOT_SPACE,
    WORD,
    NOT_WORD,
    LINEBREAK,
    NOT_LINEBREAK,
    LOC_WORD,
    LOC_NOT_WORD,
    UNI_DIGIT,
    UNI_NOT_DIGIT,
    UNI_SPACE,
    UNI_NOT_SPACE,
    UNI_WORD,
    UNI_NOT_WORD,
    UNI_LINEBREAK,
    UNI_NOT_LINEBREAK,
}

bitflags::bitflags! {
    /// Flags carried in an `INFO` opcode's header, advising the searcher.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SreInfo: u32 {
        const PREFIX = 1;
        const LITERAL = 2;
        const CHARSET = 4;
    }
}

bitflags::bitflags! {
    /// Compile-time flags carried on a [`pattern::Pattern`], mirroring the
    /// `re.I`/`re.M`/... constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SreFlag: u32 {
        const TEMPLATE = 1;
        const IGNORECASE = 2;
        const LOCALE = 4;
        const MULTILINE = 8;
        const DOTALL = 16;
        const UNICODE = 32;
        const VERBOSE = 64;
        const DEBUG = 128;
        const ASCII = 256;
    }
}
