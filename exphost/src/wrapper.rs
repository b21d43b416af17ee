//! Per-command adapters exposed to Python as builtin functions.
//!
//! A [`CommandWrapper`] turns one [`CommandEntry`] into a callable whose
//! `__name__` and `__doc__` come from the entry.  Every failure on the way
//! in or out becomes a Python exception:
//!
//! | Failure                                   | Python exception |
//! |-------------------------------------------|------------------|
//! | wrong arity, keywords, wrong/unsupported type | `TypeError`  |
//! | integer outside the 64-bit range          | `OverflowError`  |
//! | inexact float, bad string, unencodable result | `ValueError` |
//! | the native function returned an error     | `RuntimeError`   |

use pyo3::exceptions::{PyOverflowError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyCFunction, PyDict, PyTuple};
use tracing::debug;

use crate::command::CommandEntry;
use crate::error::MarshalError;
use crate::marshal;

#[derive(Debug, Clone, Copy)]
pub struct CommandWrapper {
    entry: &'static CommandEntry,
}

impl CommandWrapper {
    pub fn new(entry: &'static CommandEntry) -> Self {
        Self { entry }
    }

    pub fn name(&self) -> &'static str {
        self.entry.name()
    }

    /// Decode `args`, run the native function and encode its result.
    pub fn invoke(
        &self,
        py: Python<'_>,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<PyObject> {
        let name = self.entry.name();
        if kwargs.is_some_and(|kw| !kw.is_empty()) {
            return Err(boundary_error(name, MarshalError::Keywords));
        }
        let decoded = marshal::decode(args, self.entry.convention)
            .map_err(|e| boundary_error(name, e))?;

        debug!(command = name, argc = decoded.len(), "native command invoked");
        let result = self
            .entry
            .call(&decoded)
            .map_err(|e| PyRuntimeError::new_err(format!("{name}(): {e}")))?;

        marshal::encode(py, &result).map_err(|e| boundary_error(name, e))
    }

    /// Build the Python callable for this command.  Name and doc are
    /// borrowed from the `'static` table, never copied.
    pub fn into_callable(self, py: Python<'_>) -> PyResult<Bound<'_, PyCFunction>> {
        let doc = Some(self.entry.doc).filter(|d| !d.is_empty());
        PyCFunction::new_closure_bound(
            py,
            Some(self.entry.name),
            doc,
            move |args: &Bound<'_, PyTuple>, kwargs: Option<&Bound<'_, PyDict>>| -> PyResult<PyObject> {
                self.invoke(args.py(), args, kwargs)
            },
        )
    }
}

fn boundary_error(command: &str, err: MarshalError) -> PyErr {
    let message = format!("{command}(): {err}");
    match err.root() {
        MarshalError::Arity { .. }
        | MarshalError::Keywords
        | MarshalError::Mismatch { .. }
        | MarshalError::UnsupportedType { .. } => PyTypeError::new_err(message),
        MarshalError::OutOfRange { .. } => PyOverflowError::new_err(message),
        MarshalError::Inexact(_)
        | MarshalError::InvalidString(_)
        | MarshalError::Encode { .. }
        | MarshalError::Argument { .. } => PyValueError::new_err(message),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CallingConvention, CommandRegistry};
    use crate::error::CommandError;
    use crate::value::{NativeValue, ValueKind};

    fn echo(args: &[NativeValue]) -> Result<NativeValue, CommandError> {
        Ok(args[0].clone())
    }

    fn add(args: &[NativeValue]) -> Result<NativeValue, CommandError> {
        let (Some(a), Some(b)) = (args[0].as_int(), args[1].as_int()) else {
            return Err(CommandError::new("expected integers"));
        };
        a.checked_add(b).map(NativeValue::Int).ok_or_else(|| CommandError::new("overflow"))
    }

    fn refuse(_: &[NativeValue]) -> Result<NativeValue, CommandError> {
        Err(CommandError::new("not today"))
    }

    fn not_a_number(_: &[NativeValue]) -> Result<NativeValue, CommandError> {
        Ok(NativeValue::Float(f64::NAN))
    }

    static TABLE: &[CommandEntry] = &[
        CommandEntry {
            name: c"echo",
            function: echo,
            convention: CallingConvention::Positional(&[ValueKind::Str]),
            doc: c"Echo a string.",
        },
        CommandEntry {
            name: c"add",
            function: add,
            convention: CallingConvention::Positional(&[ValueKind::Int, ValueKind::Int]),
            doc: c"",
        },
        CommandEntry {
            name: c"refuse",
            function: refuse,
            convention: CallingConvention::Positional(&[]),
            doc: c"Always fails.",
        },
        CommandEntry {
            name: c"not_a_number",
            function: not_a_number,
            convention: CallingConvention::Positional(&[]),
            doc: c"Returns NaN.",
        },
    ];

    fn callable<'py>(py: Python<'py>, name: &str) -> Bound<'py, PyCFunction> {
        let registry = CommandRegistry::new(TABLE).unwrap();
        CommandWrapper::new(registry.get(name).unwrap()).into_callable(py).unwrap()
    }

    fn with_py<R>(f: impl FnOnce(Python<'_>) -> R) -> R {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(f)
    }

    #[test]
    fn callable_carries_name_and_doc() {
        with_py(|py| {
            let f = callable(py, "echo");
            assert_eq!(f.getattr("__name__").unwrap().extract::<String>().unwrap(), "echo");
            assert_eq!(f.getattr("__doc__").unwrap().extract::<String>().unwrap(), "Echo a string.");
            assert!(callable(py, "add").getattr("__doc__").unwrap().is_none());
        });
    }

    #[test]
    fn round_trips_through_the_native_function() {
        with_py(|py| {
            let out = callable(py, "echo").call1(("it's \"quoted\"",)).unwrap();
            assert_eq!(out.extract::<String>().unwrap(), "it's \"quoted\"");
            let sum = callable(py, "add").call1((40, 2)).unwrap();
            assert_eq!(sum.extract::<i64>().unwrap(), 42);
        });
    }

    #[test]
    fn decode_failures_raise_type_error() {
        with_py(|py| {
            let err = callable(py, "echo").call1((1,)).unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
            assert!(err.to_string().contains("echo(): argument 0: expected str, got int"));

            let err = callable(py, "echo").call0().unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }

    #[test]
    fn keywords_are_rejected() {
        with_py(|py| {
            let kwargs = PyDict::new_bound(py);
            kwargs.set_item("text", "x").unwrap();
            let err = callable(py, "echo").call((), Some(&kwargs)).unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }

    #[test]
    fn out_of_range_raises_overflow_error() {
        with_py(|py| {
            let big = py.eval_bound("2**64", None, None).unwrap();
            let err = callable(py, "add").call1((big, 1)).unwrap_err();
            assert!(err.is_instance_of::<PyOverflowError>(py));
        });
    }

    #[test]
    fn native_error_raises_runtime_error() {
        with_py(|py| {
            let err = callable(py, "refuse").call0().unwrap_err();
            assert!(err.is_instance_of::<PyRuntimeError>(py));
            assert!(err.to_string().contains("refuse(): not today"));

            let err = callable(py, "add").call1((i64::MAX, 1)).unwrap_err();
            assert!(err.is_instance_of::<PyRuntimeError>(py));
        });
    }

    #[test]
    fn unencodable_result_raises_value_error() {
        with_py(|py| {
            let err = callable(py, "not_a_number").call0().unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }

    #[test]
    fn shipped_commands_become_callables() {
        use crate::commands::COMMANDS;
        with_py(|py| {
            let registry = CommandRegistry::new(COMMANDS).unwrap();
            for entry in registry.iter() {
                let f = CommandWrapper::new(entry).into_callable(py).unwrap();
                assert_eq!(f.getattr("__name__").unwrap().extract::<String>().unwrap(), entry.name());
                assert_eq!(f.getattr("__doc__").unwrap().extract::<String>().unwrap(), entry.doc());
            }
            let hello = CommandWrapper::new(registry.get("hello").unwrap()).into_callable(py).unwrap();
            assert_eq!(hello.call1(("world",)).unwrap().extract::<String>().unwrap(), "Hello");
        });
    }

    #[test]
    fn python_can_catch_boundary_errors() {
        with_py(|py| {
            let locals = PyDict::new_bound(py);
            locals.set_item("echo", callable(py, "echo")).unwrap();
            py.run_bound(
                "try:\n    echo([])\n    caught = False\nexcept TypeError:\n    caught = True\n",
                None,
                Some(&locals),
            )
            .unwrap();
            assert!(locals.get_item("caught").unwrap().unwrap().extract::<bool>().unwrap());
        });
    }
}
