//! The embedded interpreter's lifecycle.
//!
//! [`RuntimeHost::create`] is the only way to obtain a running host and
//! [`RuntimeHost::destroy`] consumes it, so the state machine
//! `Uninitialized → Running → Finalized` is carried by ownership:
//!
//! ```compile_fail
//! # use exphost::{CommandRegistry, HostConfig, RuntimeHost};
//! # fn demo(registry: &CommandRegistry, config: &HostConfig) {
//! let host = RuntimeHost::create(&["app"], registry, config).unwrap();
//! host.destroy();
//! host.log("too late"); // borrow of moved value: `host`
//! # }
//! ```
//!
//! The host is pinned to the thread that created it:
//!
//! ```compile_fail
//! fn assert_send<T: Send>() {}
//! assert_send::<exphost::RuntimeHost>();
//! ```
//!
//! # Startup sequence
//!
//! | Step | Effect                                                         |
//! |------|----------------------------------------------------------------|
//! | 1    | initialise CPython (or attach to an already running one)       |
//! | 2    | publish the command table as `sys.modules[native_module]`      |
//! | 3    | `sys.argv = args`                                              |
//! | 4    | append `module_path` entries to `sys.path`                     |
//! | 5    | import each bootstrap target, binding it in `__main__`         |
//! | 6    | bind the native module in `__main__`                           |
//! | 7    | call `entry_point(commands, **options)`                        |
//!
//! The order is part of the contract with the application: its logging
//! module is imported before any command can run.

use std::marker::PhantomData;

use pyo3::exceptions::PySystemExit;
use pyo3::ffi;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyModule};
use tracing::{debug, info, warn};

use crate::command::CommandRegistry;
use crate::config::{HostConfig, Target};
use crate::error::{describe, InitError};
use crate::relay::{LogLevel, LogRelay};
use crate::wrapper::CommandWrapper;

// ── Interpreter ownership ─────────────────────────────────────────────────────

/// Finalizes CPython on drop, but only if this process-wide owner started it.
struct Interpreter {
    owned: bool,
}

impl Interpreter {
    fn acquire() -> Self {
        // SAFETY: Py_IsInitialized may be called before initialisation and
        // without holding the GIL.
        let owned = unsafe { ffi::Py_IsInitialized() } == 0;
        pyo3::prepare_freethreaded_python();
        Self { owned }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        if !self.owned {
            debug!("interpreter left running for its original owner");
            return;
        }
        // SAFETY: we initialised the interpreter on this thread (the host is
        // !Send), no GIL guard is alive here, and nothing touches Python
        // after this point.
        let status = unsafe {
            ffi::PyGILState_Ensure();
            ffi::Py_FinalizeEx()
        };
        if status < 0 {
            warn!("interpreter finalisation could not flush buffered data");
        } else {
            info!("embedded interpreter finalized");
        }
    }
}

// ── RuntimeHost ───────────────────────────────────────────────────────────────

/// The running embedded interpreter with the native commands published.
pub struct RuntimeHost {
    native: Py<PyModule>,
    native_name: String,
    relay: LogRelay,
    level: LogLevel,
    // Dropped last: finalisation must follow every other release.
    interpreter: Interpreter,
    _thread_bound: PhantomData<*mut ()>,
}

impl RuntimeHost {
    /// Start the interpreter, publish `registry` and run the bootstrap
    /// sequence to completion.
    ///
    /// `args` is the full process argument vector, program name first; it
    /// becomes `sys.argv` unchanged.  On error everything acquired so far
    /// is released before returning.
    pub fn create<S: AsRef<str>>(
        args: &[S],
        registry: &CommandRegistry,
        config: &HostConfig,
    ) -> Result<Self, InitError> {
        let interpreter = Interpreter::acquire();
        info!(
            commands = registry.len(),
            owned = interpreter.owned,
            "embedded interpreter ready"
        );

        let native_name = config.bootstrap.native_module.clone();
        let native = Python::with_gil(|py| publish(py, registry, &native_name).map(Bound::unbind))?;

        let host = RuntimeHost {
            native,
            native_name,
            relay: LogRelay::new(config.logging.facility.clone()),
            level: config.logging.level,
            interpreter,
            _thread_bound: PhantomData,
        };
        Python::with_gil(|py| host.bootstrap(py, args, registry, config))?;
        Ok(host)
    }

    /// Relay `message` to the application's logging facility at the
    /// configured default level.  Never fails: relay errors are reported
    /// through `tracing` and dropped.
    pub fn log(&self, message: &str) {
        self.log_at(self.level, message);
    }

    /// Like [`log`](Self::log) with an explicit level.
    pub fn log_at(&self, level: LogLevel, message: &str) {
        let outcome = Python::with_gil(|py| self.relay.emit(py, level, message));
        if let Err(err) = outcome {
            warn!(%err, %level, "log relay failed; message dropped");
        }
    }

    /// Name under which the command table is importable.
    pub fn native_module_name(&self) -> &str {
        &self.native_name
    }

    /// Tear down the runtime.  The host is consumed, so nothing can reach
    /// the interpreter afterwards.
    pub fn destroy(self) {
        info!(
            module = %self.native_name,
            finalize = self.interpreter.owned,
            "tearing down embedded interpreter"
        );
        drop(self);
    }

    // ── Bootstrap ─────────────────────────────────────────────────────────

    fn bootstrap<S: AsRef<str>>(
        &self,
        py: Python<'_>,
        args: &[S],
        registry: &CommandRegistry,
        config: &HostConfig,
    ) -> Result<(), InitError> {
        let configure = |err: PyErr| InitError::Configure(describe(py, &err));

        let sys = py.import_bound("sys").map_err(configure)?;
        let argv = PyList::new_bound(py, args.iter().map(|a| a.as_ref()));
        sys.setattr("argv", argv).map_err(configure)?;

        let sys_path = sys
            .getattr("path")
            .and_then(|p| p.downcast_into::<PyList>().map_err(PyErr::from))
            .map_err(configure)?;
        for dir in &config.module_path {
            if !sys_path.contains(dir).map_err(configure)? {
                sys_path.append(dir).map_err(configure)?;
                debug!(path = %dir.display(), "module search path extended");
            }
        }

        let main = py.import_bound("__main__").map_err(configure)?;
        for target in &config.bootstrap.imports {
            let object = import_target(py, target)?;
            main.setattr(target.binding(), object).map_err(configure)?;
            debug!(%target, "bootstrap import");
        }
        main.setattr(self.native_name.as_str(), self.native.bind(py))
            .map_err(configure)?;

        self.run_entry_point(py, registry, config)
    }

    fn run_entry_point(
        &self,
        py: Python<'_>,
        registry: &CommandRegistry,
        config: &HostConfig,
    ) -> Result<(), InitError> {
        let target = &config.bootstrap.entry_point;
        let fail = |err: PyErr| InitError::Bootstrap {
            target: target.to_string(),
            message: describe(py, &err),
        };

        let native = self.native.bind(py);
        let commands = PyList::empty_bound(py);
        for name in registry.names() {
            commands.append(native.getattr(name).map_err(fail)?).map_err(fail)?;
        }

        let options = PyDict::new_bound(py);
        if let Some(description) = &config.bootstrap.description {
            options.set_item("description", description).map_err(fail)?;
        }
        if let Some(spec) = &config.bootstrap.config_spec {
            options.set_item("config_spec", spec).map_err(fail)?;
        }

        let entry = import_target(py, target)?;
        info!(%target, commands = commands.len(), "handing control to the application");
        match entry.call((commands,), Some(&options)) {
            Ok(_) => Ok(()),
            Err(err) if err.is_instance_of::<PySystemExit>(py) => match exit_status(py, &err) {
                0 => Ok(()),
                code => Err(InitError::Exit { code }),
            },
            Err(err) => Err(fail(err)),
        }
    }
}

impl Drop for RuntimeHost {
    fn drop(&mut self) {
        Python::with_gil(|py| {
            if let Err(err) = unpublish(py, &self.native_name) {
                warn!(module = %self.native_name, error = %describe(py, &err), "cannot unpublish native module");
            }
            flush_stdio(py);
        });
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build the native module and register it as `sys.modules[name]`.
fn publish<'py>(
    py: Python<'py>,
    registry: &CommandRegistry,
    name: &str,
) -> Result<Bound<'py, PyModule>, InitError> {
    let fail = |err: PyErr| InitError::Publish {
        module: name.to_owned(),
        message: describe(py, &err),
    };

    let module = PyModule::new_bound(py, name).map_err(fail)?;
    for entry in registry.iter() {
        let callable = CommandWrapper::new(entry).into_callable(py).map_err(fail)?;
        // `add` also appends the name to `__all__`.
        module.add(entry.name(), callable).map_err(fail)?;
    }
    py.import_bound("sys")
        .and_then(|sys| sys.getattr("modules"))
        .and_then(|modules| modules.set_item(name, &module))
        .map_err(fail)?;

    debug!(module = name, commands = ?registry.names().collect::<Vec<_>>(), "native module published");
    Ok(module)
}

fn unpublish(py: Python<'_>, name: &str) -> PyResult<()> {
    let modules = py.import_bound("sys")?.getattr("modules")?;
    if modules.contains(name)? {
        modules.del_item(name)?;
    }
    let main = py.import_bound("__main__")?;
    if main.hasattr(name)? {
        main.delattr(name)?;
    }
    Ok(())
}

fn import_target<'py>(py: Python<'py>, target: &Target) -> Result<Bound<'py, PyAny>, InitError> {
    let fail = |err: PyErr| InitError::Import {
        target: target.to_string(),
        message: describe(py, &err),
    };
    let module = py.import_bound(target.module.as_str()).map_err(fail)?;
    match &target.attr {
        Some(attr) => module.getattr(attr.as_str()).map_err(fail),
        None => Ok(module.into_any()),
    }
}

/// Python's own rule: `None` is 0, an int is itself, anything else is
/// printed to stderr and means 1.
fn exit_status(py: Python<'_>, err: &PyErr) -> i32 {
    match err.value_bound(py).getattr("code") {
        Ok(code) if code.is_none() => 0,
        Ok(code) => code.extract::<i32>().unwrap_or_else(|_| {
            eprintln!("{code}");
            1
        }),
        Err(_) => 1,
    }
}

fn flush_stdio(py: Python<'_>) {
    let Ok(sys) = py.import_bound("sys") else { return };
    for stream in ["stdout", "stderr"] {
        if let Err(err) = sys.getattr(stream).and_then(|s| s.call_method0("flush")) {
            debug!(stream, error = %err, "flush failed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
