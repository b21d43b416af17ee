//! Values that cross the native/interpreter boundary.
//!
//! Only primitive scalars and strings are marshalled; anything richer stays
//! on the Python side.

use std::fmt;

/// The shape of a single marshalled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Str,
    Int,
    Float,
    None,
}

impl ValueKind {
    /// Python-facing name, used in error messages raised into the interpreter.
    pub fn python_name(self) -> &'static str {
        match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::None => "None",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.python_name())
    }
}

/// A native argument or result value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NativeValue {
    Str(String),
    Int(i64),
    Float(f64),
    #[default]
    None,
}

impl NativeValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            NativeValue::Str(_) => ValueKind::Str,
            NativeValue::Int(_) => ValueKind::Int,
            NativeValue::Float(_) => ValueKind::Float,
            NativeValue::None => ValueKind::None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            NativeValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            NativeValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, NativeValue::None)
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Str(s) => write!(f, "{s:?}"),
            NativeValue::Int(n) => write!(f, "{n}"),
            NativeValue::Float(x) => write!(f, "{x:?}"),
            NativeValue::None => f.write_str("None"),
        }
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::Str(s)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::Str(s.to_owned())
    }
}

impl From<i64> for NativeValue {
    fn from(n: i64) -> Self {
        NativeValue::Int(n)
    }
}

impl From<f64> for NativeValue {
    fn from(x: f64) -> Self {
        NativeValue::Float(x)
    }
}

impl From<()> for NativeValue {
    fn from(_: ()) -> Self {
        NativeValue::None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(NativeValue::from("x").kind(), ValueKind::Str);
        assert_eq!(NativeValue::from(3).kind(), ValueKind::Int);
        assert_eq!(NativeValue::from(0.5).kind(), ValueKind::Float);
        assert_eq!(NativeValue::from(()).kind(), ValueKind::None);
    }

    #[test]
    fn display_uses_python_like_literals() {
        assert_eq!(NativeValue::from("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(NativeValue::Float(1.0).to_string(), "1.0");
        assert_eq!(NativeValue::None.to_string(), "None");
        assert_eq!(ValueKind::Float.to_string(), "float");
    }

    #[test]
    fn accessors_reject_other_variants() {
        let v = NativeValue::Int(7);
        assert_eq!(v.as_int(), Some(7));
        assert!(v.as_str().is_none());
        assert!(v.as_float().is_none());
        assert!(!v.is_none());
    }
}
