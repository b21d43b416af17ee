//! Error types, one per boundary the host crosses.

use std::path::PathBuf;

use pyo3::prelude::*;
use thiserror::Error;

use crate::value::ValueKind;

// ── Lifecycle ─────────────────────────────────────────────────────────────────

/// Fatal failure while bringing the runtime up or running the bootstrap.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("cannot configure interpreter: {0}")]
    Configure(String),
    #[error("cannot publish native module `{module}`: {message}")]
    Publish { module: String, message: String },
    #[error("cannot import `{target}`: {message}")]
    Import { target: String, message: String },
    #[error("bootstrap entry point `{target}` failed: {message}")]
    Bootstrap { target: String, message: String },
    #[error("application exited with status {code}")]
    Exit { code: i32 },
}

impl InitError {
    /// Process exit status for this failure; never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            InitError::Exit { code } => match (*code).rem_euclid(256) {
                0 => 1,
                n => n as u8,
            },
            _ => 1,
        }
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command name `{0}` uses the reserved `__` prefix")]
    Reserved(String),
    #[error("command name `{0}` is not a valid identifier")]
    InvalidName(String),
    #[error("command name `{0}` is a Python keyword")]
    Keyword(String),
    #[error("command `{0}` is registered more than once")]
    Duplicate(String),
}

// ── Marshalling ───────────────────────────────────────────────────────────────

/// A value could not cross the boundary in one direction or the other.
#[derive(Debug, Error, PartialEq)]
pub enum MarshalError {
    #[error("expected {expected} positional argument(s), got {found}")]
    Arity { expected: usize, found: usize },
    #[error("keyword arguments are not accepted")]
    Keywords,
    #[error("expected {expected}, got {found}")]
    Mismatch { expected: ValueKind, found: ValueKind },
    #[error("unsupported type `{type_name}`")]
    UnsupportedType { type_name: String },
    #[error("{value} does not fit in a 64-bit {kind}")]
    OutOfRange { kind: ValueKind, value: String },
    #[error("integer {0} is not exactly representable as a float")]
    Inexact(i64),
    #[error("invalid string: {0}")]
    InvalidString(String),
    #[error("cannot encode {value}: {reason}")]
    Encode { value: String, reason: &'static str },
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: Box<MarshalError>,
    },
}

impl MarshalError {
    pub(crate) fn at(self, index: usize) -> Self {
        MarshalError::Argument { index, source: Box::new(self) }
    }

    /// The innermost error, skipping argument-position wrappers.
    pub fn root(&self) -> &MarshalError {
        match self {
            MarshalError::Argument { source, .. } => source.root(),
            other => other,
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Failure reported by a native command body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CommandError(String);

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        CommandError(message.into())
    }
}

// ── Log relay ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("logging facility `{facility}` is unavailable: {message}")]
    Unavailable { facility: String, message: String },
    #[error("logging facility `{facility}` raised: {message}")]
    Call { facility: String, message: String },
    #[error(transparent)]
    Encode(#[from] MarshalError),
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid import target `{0}` (expected `module` or `module:attribute`)")]
    InvalidTarget(String),
    #[error("invalid module name `{0}`")]
    InvalidModule(String),
}

// ── Python error rendering ────────────────────────────────────────────────────

/// Render a Python exception as `Type: value` followed by its traceback.
pub fn describe(py: Python<'_>, err: &PyErr) -> String {
    let head = err.to_string();
    match err.traceback_bound(py).and_then(|tb| tb.format().ok()) {
        Some(tb) => format!("{head}\n{}", tb.trim_end()),
        None => head,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_is_never_zero() {
        assert_eq!(InitError::Exit { code: 3 }.exit_code(), 3);
        assert_eq!(InitError::Exit { code: 256 }.exit_code(), 1);
        assert_eq!(InitError::Exit { code: -1 }.exit_code(), 255);
        assert_eq!(InitError::Configure("x".into()).exit_code(), 1);
    }

    #[test]
    fn argument_wrapper_reports_position_and_root() {
        let err = MarshalError::Mismatch { expected: ValueKind::Str, found: ValueKind::Int }.at(1);
        assert_eq!(err.to_string(), "argument 1: expected str, got int");
        assert!(matches!(err.root(), MarshalError::Mismatch { .. }));
    }
}
