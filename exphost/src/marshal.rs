//! Argument marshalling between Python objects and [`NativeValue`]s.
//!
//! Conversions are exact or they fail: an `int` that does not fit in `i64`,
//! an `int` that a `float` cannot hold exactly, or a non-finite float are
//! errors, never rounded or wrapped values.  `bool` is rejected even though
//! Python treats it as an `int` subclass.

use pyo3::prelude::*;
use pyo3::types::{PyBool, PyFloat, PyLong, PyString, PyTuple};

use crate::command::CallingConvention;
use crate::error::MarshalError;
use crate::value::{NativeValue, ValueKind};

/// Decode a positional argument tuple according to `convention`.
pub fn decode(
    args: &Bound<'_, PyTuple>,
    convention: CallingConvention,
) -> Result<Vec<NativeValue>, MarshalError> {
    let CallingConvention::Positional(kinds) = convention;
    if args.len() != kinds.len() {
        return Err(MarshalError::Arity { expected: kinds.len(), found: args.len() });
    }
    args.iter()
        .zip(kinds)
        .enumerate()
        .map(|(i, (arg, &kind))| decode_value(&arg, kind).map_err(|e| e.at(i)))
        .collect()
}

/// Decode a single object as `kind`.
pub fn decode_value(obj: &Bound<'_, PyAny>, kind: ValueKind) -> Result<NativeValue, MarshalError> {
    let found = classify(obj)?;
    match (kind, found) {
        (ValueKind::None, ValueKind::None) => Ok(NativeValue::None),
        (ValueKind::Str, ValueKind::Str) => obj
            .extract::<String>()
            .map(NativeValue::Str)
            .map_err(|e| MarshalError::InvalidString(e.to_string())),
        (ValueKind::Int, ValueKind::Int) => extract_int(obj).map(NativeValue::Int),
        (ValueKind::Float, ValueKind::Float) => {
            let x: f64 = obj
                .extract()
                .map_err(|_| MarshalError::OutOfRange { kind, value: obj.to_string() })?;
            if !x.is_finite() {
                return Err(MarshalError::OutOfRange { kind, value: obj.to_string() });
            }
            Ok(NativeValue::Float(x))
        }
        (ValueKind::Float, ValueKind::Int) => {
            let n = extract_int(obj)?;
            let x = n as f64;
            // i128 compare: `x as i64` saturates and would hide 2^63.
            if x as i128 == n as i128 {
                Ok(NativeValue::Float(x))
            } else {
                Err(MarshalError::Inexact(n))
            }
        }
        (expected, found) => Err(MarshalError::Mismatch { expected, found }),
    }
}

/// Encode a native value as a Python object.
pub fn encode(py: Python<'_>, value: &NativeValue) -> Result<PyObject, MarshalError> {
    match value {
        NativeValue::Str(s) => Ok(PyString::new_bound(py, s).into_any().unbind()),
        NativeValue::Int(n) => Ok(n.to_object(py)),
        NativeValue::Float(x) if !x.is_finite() => Err(MarshalError::Encode {
            value: value.to_string(),
            reason: "non-finite floats are not marshalled",
        }),
        NativeValue::Float(x) => Ok(PyFloat::new_bound(py, *x).into_any().unbind()),
        NativeValue::None => Ok(py.None()),
    }
}

fn classify(obj: &Bound<'_, PyAny>) -> Result<ValueKind, MarshalError> {
    if obj.is_none() {
        Ok(ValueKind::None)
    } else if obj.is_instance_of::<PyBool>() {
        Err(unsupported(obj))
    } else if obj.is_instance_of::<PyString>() {
        Ok(ValueKind::Str)
    } else if obj.is_instance_of::<PyLong>() {
        Ok(ValueKind::Int)
    } else if obj.is_instance_of::<PyFloat>() {
        Ok(ValueKind::Float)
    } else {
        Err(unsupported(obj))
    }
}

fn extract_int(obj: &Bound<'_, PyAny>) -> Result<i64, MarshalError> {
    obj.extract::<i64>()
        .map_err(|_| MarshalError::OutOfRange { kind: ValueKind::Int, value: obj.to_string() })
}

fn unsupported(obj: &Bound<'_, PyAny>) -> MarshalError {
    let type_name = obj
        .get_type()
        .getattr("__name__")
        .and_then(|n| n.extract::<String>())
        .unwrap_or_else(|_| "<unknown>".to_owned());
    MarshalError::UnsupportedType { type_name }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
