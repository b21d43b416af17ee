//! Native host for `pyexperiment`-style applications.
//!
//! The host starts an embedded CPython interpreter, publishes a table of
//! native commands as an importable module and hands control to the
//! application's entry point.  While it runs, native code can relay log
//! messages into the application's logging facility.
//!
//! ```no_run
//! use exphost::{commands::COMMANDS, CommandRegistry, HostConfig, RuntimeHost};
//!
//! let registry = CommandRegistry::new(COMMANDS)?;
//! let config = HostConfig::resolve()?;
//! let host = RuntimeHost::create(&["exphost"], &registry, &config)?;
//! host.log("Hello from here...");
//! host.destroy();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod marshal;
pub mod relay;
pub mod value;
pub mod wrapper;

pub use command::{CallingConvention, CommandEntry, CommandRegistry, NativeFn};
pub use config::HostConfig;
pub use error::{CommandError, ConfigError, InitError, MarshalError, RegistryError, RelayError};
pub use host::RuntimeHost;
pub use relay::{LogLevel, LogRelay};
pub use value::{NativeValue, ValueKind};
