//! Native → Python log relay.
//!
//! Messages are handed to the application's logging facility as call
//! arguments, never as source text: the facility function is looked up by
//! attribute and called with `("%s", message)`, so `%` signs, quotes and
//! control characters in the message are plain data.

use std::fmt;
use std::str::FromStr;

use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{describe, RelayError};
use crate::marshal;
use crate::value::NativeValue;

/// Severity, mapped to the facility's function of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    #[default]
    Error,
    Fatal,
}

impl LogLevel {
    pub fn function_name(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "fatal" | "critical" => Ok(LogLevel::Fatal),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Handle on the interpreter-side logging module.
#[derive(Debug, Clone)]
pub struct LogRelay {
    facility: String,
}

impl LogRelay {
    pub fn new(facility: impl Into<String>) -> Self {
        Self { facility: facility.into() }
    }

    pub fn facility(&self) -> &str {
        &self.facility
    }

    /// Send `message` to the facility's `level` function.
    pub fn emit(&self, py: Python<'_>, level: LogLevel, message: &str) -> Result<(), RelayError> {
        let unavailable = |err: PyErr| RelayError::Unavailable {
            facility: self.facility.clone(),
            message: describe(py, &err),
        };
        let module = py.import_bound(self.facility.as_str()).map_err(unavailable)?;
        let function = module.getattr(level.function_name()).map_err(unavailable)?;

        let text = marshal::encode(py, &NativeValue::Str(message.to_owned()))?;
        function.call1(("%s", text)).map_err(|err| RelayError::Call {
            facility: self.facility.clone(),
            message: describe(py, &err),
        })?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
