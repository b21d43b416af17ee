//! The static native command table.
//!
//! Commands are declared as a `'static` slice of [`CommandEntry`] and wrapped
//! in a [`CommandRegistry`], which checks the names once before the runtime
//! starts.  The registry is the whole public surface of the native module:
//! the interpreter sees exactly these entries, in this order.
//!
//! ```
//! use exphost::command::{CallingConvention, CommandEntry, CommandRegistry};
//! use exphost::value::{NativeValue, ValueKind};
//!
//! fn twice(args: &[NativeValue]) -> Result<NativeValue, exphost::CommandError> {
//!     Ok(NativeValue::Int(args[0].as_int().unwrap_or(0) * 2))
//! }
//!
//! static TABLE: &[CommandEntry] = &[CommandEntry {
//!     name: c"twice",
//!     function: twice,
//!     convention: CallingConvention::Positional(&[ValueKind::Int]),
//!     doc: c"Double an integer.",
//! }];
//!
//! let registry = CommandRegistry::new(TABLE).unwrap();
//! assert_eq!(registry.names().collect::<Vec<_>>(), ["twice"]);
//! ```

use std::collections::HashSet;
use std::ffi::CStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{CommandError, RegistryError};
use crate::value::{NativeValue, ValueKind};

/// Native entry point.  Arguments arrive already decoded per the entry's
/// [`CallingConvention`].
pub type NativeFn = fn(&[NativeValue]) -> Result<NativeValue, CommandError>;

/// How a command expects its interpreter-side arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    /// Exactly these positional arguments, in order.  No keywords.
    Positional(&'static [ValueKind]),
}

impl CallingConvention {
    pub fn arity(self) -> usize {
        match self {
            CallingConvention::Positional(kinds) => kinds.len(),
        }
    }
}

/// One row of the native command table.
///
/// Name and doc are C strings because the interpreter keeps pointers to
/// them for the lifetime of the callable.
#[derive(Debug)]
pub struct CommandEntry {
    pub name: &'static CStr,
    pub function: NativeFn,
    pub convention: CallingConvention,
    /// Becomes the callable's `__doc__`; the orchestration layer shows its
    /// first sentence in `--help`.
    pub doc: &'static CStr,
}

impl CommandEntry {
    /// The name as text.  Empty if it is not UTF-8, which
    /// [`CommandRegistry::new`] rejects.
    pub fn name(&self) -> &'static str {
        self.name.to_str().unwrap_or_default()
    }

    pub fn doc(&self) -> &'static str {
        self.doc.to_str().unwrap_or_default()
    }

    pub fn call(&self, args: &[NativeValue]) -> Result<NativeValue, CommandError> {
        (self.function)(args)
    }
}

// ── CommandRegistry ───────────────────────────────────────────────────────────

/// A validated, immutable command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandRegistry {
    entries: &'static [CommandEntry],
}

fn identifier() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

/// Hard keywords: valid identifiers that cannot follow `native.`.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

impl CommandRegistry {
    /// Validate `entries`: every name must be a unique ASCII identifier,
    /// not a Python keyword, without the reserved `__` prefix.
    pub fn new(entries: &'static [CommandEntry]) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            let name = entry
                .name
                .to_str()
                .map_err(|_| RegistryError::InvalidName(entry.name.to_string_lossy().into_owned()))?;
            if name.starts_with("__") {
                return Err(RegistryError::Reserved(name.to_owned()));
            }
            if !identifier().is_match(name) {
                return Err(RegistryError::InvalidName(name.to_owned()));
            }
            if PYTHON_KEYWORDS.contains(&name) {
                return Err(RegistryError::Keyword(name.to_owned()));
            }
            if !seen.insert(name) {
                return Err(RegistryError::Duplicate(name.to_owned()));
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static CommandEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(CommandEntry::name)
    }

    pub fn get(&self, name: &str) -> Option<&'static CommandEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn nothing(_: &[NativeValue]) -> Result<NativeValue, CommandError> {
        Ok(NativeValue::None)
    }

    const fn entry(name: &'static CStr) -> CommandEntry {
        CommandEntry {
            name,
            function: nothing,
            convention: CallingConvention::Positional(&[]),
            doc: c"",
        }
    }

    static GOOD: &[CommandEntry] = &[entry(c"alpha"), entry(c"beta_2"), entry(c"_gamma")];
    static RESERVED: &[CommandEntry] = &[entry(c"alpha"), entry(c"__init__")];
    static DUPLICATE: &[CommandEntry] = &[entry(c"alpha"), entry(c"beta"), entry(c"alpha")];
    static INVALID: &[CommandEntry] = &[entry(c"has space")];
    static DIGIT: &[CommandEntry] = &[entry(c"9lives")];
    static EMPTY_NAME: &[CommandEntry] = &[entry(c"")];
    static NOT_UTF8: &[CommandEntry] = &[entry(c"caf\xe9")];
    static CLASS: &[CommandEntry] = &[entry(c"class")];
    static NONE_NAME: &[CommandEntry] = &[entry(c"None")];
    static SOFT_KEYWORDS: &[CommandEntry] = &[entry(c"match"), entry(c"case"), entry(c"type")];

    #[test]
    fn accepts_valid_table_in_order() {
        let reg = CommandRegistry::new(GOOD).unwrap();
        assert_eq!(reg.names().collect::<Vec<_>>(), ["alpha", "beta_2", "_gamma"]);
        assert_eq!(reg.len(), 3);
        assert!(reg.get("beta_2").is_some());
        assert!(reg.get("delta").is_none());
    }

    #[test]
    fn rejects_reserved_prefix() {
        assert_eq!(
            CommandRegistry::new(RESERVED).unwrap_err(),
            RegistryError::Reserved("__init__".into())
        );
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            CommandRegistry::new(DUPLICATE).unwrap_err(),
            RegistryError::Duplicate("alpha".into())
        );
    }

    #[test]
    fn rejects_non_identifiers() {
        assert!(matches!(CommandRegistry::new(INVALID), Err(RegistryError::InvalidName(_))));
        assert!(matches!(CommandRegistry::new(DIGIT), Err(RegistryError::InvalidName(_))));
        assert!(matches!(CommandRegistry::new(EMPTY_NAME), Err(RegistryError::InvalidName(_))));
        assert!(matches!(CommandRegistry::new(NOT_UTF8), Err(RegistryError::InvalidName(_))));
    }

    #[test]
    fn rejects_python_keywords() {
        assert_eq!(CommandRegistry::new(CLASS).unwrap_err(), RegistryError::Keyword("class".into()));
        assert_eq!(CommandRegistry::new(NONE_NAME).unwrap_err(), RegistryError::Keyword("None".into()));
        // Soft keywords are still usable as attribute names.
        assert_eq!(CommandRegistry::new(SOFT_KEYWORDS).unwrap().len(), 3);
    }

    #[test]
    fn text_accessors_read_the_c_strings() {
        static DOCUMENTED: CommandEntry = CommandEntry {
            name: c"documented",
            function: nothing,
            convention: CallingConvention::Positional(&[]),
            doc: c"Has a doc.",
        };
        assert_eq!(DOCUMENTED.name(), "documented");
        assert_eq!(DOCUMENTED.doc(), "Has a doc.");
    }

    #[test]
    fn empty_table_is_valid() {
        static NONE: &[CommandEntry] = &[];
        assert!(CommandRegistry::new(NONE).unwrap().is_empty());
    }

    #[test]
    fn entry_call_dispatches() {
        let reg = CommandRegistry::new(GOOD).unwrap();
        assert_eq!(reg.get("alpha").unwrap().call(&[]), Ok(NativeValue::None));
        assert_eq!(CallingConvention::Positional(&[ValueKind::Str]).arity(), 1);
    }
}
