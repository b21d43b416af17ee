//! Host configuration: where the application lives and how to start it.
//!
//! Every field has a default that reproduces the stock `pyexperiment`
//! bootstrap, so a config file only needs the keys it changes:
//!
//! ```toml
//! module_path = ["/home/me/experiments"]
//!
//! [bootstrap]
//! imports = ["pyexperiment.conf.conf", "pyexperiment.log.log",
//!            "pyexperiment.experiment:init_log", "pyexperiment.experiment"]
//! native_module = "native"
//! entry_point = "pyexperiment.experiment:main"
//! description = "My experiment"
//!
//! [logging]
//! facility = "pyexperiment.log.log"
//! level = "error"
//! ```
//!
//! # Resolution order (see [`HostConfig::resolve`])
//! 1. `$EXPHOST_CONFIG`                      → this file, which must exist
//! 2. `host.toml` in the OS config dir       → if present
//! 3. built-in defaults
//!
//! Entries of `$EXPHOST_PATH` (OS path-list syntax) are then appended to
//! `module_path`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::relay::LogLevel;

/// Names the config file to load instead of the per-user one.
pub const CONFIG_ENV: &str = "EXPHOST_CONFIG";
/// Extra module search path entries.
pub const PATH_ENV: &str = "EXPHOST_PATH";

// ── Import targets ────────────────────────────────────────────────────────────

fn target_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)(?::([A-Za-z_][A-Za-z0-9_]*))?$")
            .expect("static regex")
    })
}

/// A `module` or `module:attribute` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Target {
    pub module: String,
    pub attr: Option<String>,
}

impl Target {
    /// The name the target is bound to in `__main__`: the attribute, or the
    /// last segment of the module path.
    pub fn binding(&self) -> &str {
        match &self.attr {
            Some(attr) => attr,
            None => self.module.rsplit('.').next().unwrap_or(&self.module),
        }
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = target_pattern()
            .captures(s.trim())
            .ok_or_else(|| ConfigError::InvalidTarget(s.to_owned()))?;
        Ok(Target {
            module: caps[1].to_owned(),
            attr: caps.get(2).map(|m| m.as_str().to_owned()),
        })
    }
}

impl TryFrom<String> for Target {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Target> for String {
    fn from(t: Target) -> Self {
        t.to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attr {
            Some(attr) => write!(f, "{}:{attr}", self.module),
            None => f.write_str(&self.module),
        }
    }
}

fn target(s: &str) -> Target {
    s.parse().expect("built-in target")
}

// ── Config sections ───────────────────────────────────────────────────────────

/// The fixed startup sequence handed to the interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Imported in order before the native module is bound.
    pub imports: Vec<Target>,
    /// Name the command table is published under (`import <name>`).
    pub native_module: String,
    /// Called with the command list as its only positional argument.
    pub entry_point: Target,
    /// Passed to the entry point as `description=` when set.
    pub description: Option<String>,
    /// Passed to the entry point as `config_spec=` when set.
    pub config_spec: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            imports: vec![
                target("pyexperiment.conf.conf"),
                target("pyexperiment.log.log"),
                target("pyexperiment.experiment:init_log"),
                target("pyexperiment.experiment"),
            ],
            native_module: "native".to_owned(),
            entry_point: target("pyexperiment.experiment:main"),
            description: None,
            config_spec: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Module providing `debug`/`info`/`warning`/`error`/`fatal`.
    pub facility: String,
    /// Level used by [`RuntimeHost::log`](crate::host::RuntimeHost::log).
    pub level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { facility: "pyexperiment.log.log".to_owned(), level: LogLevel::Error }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Appended to `sys.path` before any bootstrap import.
    pub module_path: Vec<PathBuf>,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl HostConfig {
    /// Resolve from the process environment and the per-user config dir.
    pub fn resolve() -> Result<Self, ConfigError> {
        Self::resolve_from(
            std::env::var_os(CONFIG_ENV),
            std::env::var_os(PATH_ENV),
            default_config_file(),
        )
    }

    /// Resolution with every input explicit (exposed for testing).
    pub fn resolve_from(
        config_file: Option<OsString>,
        extra_path: Option<OsString>,
        fallback: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut config = match (config_file, fallback) {
            (Some(path), _) => Self::load_file(Path::new(&path))?,
            (None, Some(path)) if path.is_file() => Self::load_file(&path)?,
            (None, _) => Self::default(),
        };
        if let Some(paths) = extra_path {
            config
                .module_path
                .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load_str(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse { path: origin.to_owned(), source })
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        Self::load_str(&s, path)
    }

    /// Check the plain module names; targets are checked while parsing.
    /// The native module is top-level so `import <name>` needs no package.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let native = &self.bootstrap.native_module;
        if native.contains('.') || !is_module_name(native) {
            return Err(ConfigError::InvalidModule(native.clone()));
        }
        if !is_module_name(&self.logging.facility) {
            return Err(ConfigError::InvalidModule(self.logging.facility.clone()));
        }
        Ok(())
    }
}

fn is_module_name(name: &str) -> bool {
    name.parse::<Target>().is_ok_and(|t| t.attr.is_none())
}

/// `host.toml` in the platform config directory, if one can be determined.
pub fn default_config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "exphost").map(|d| d.config_dir().join("host.toml"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
