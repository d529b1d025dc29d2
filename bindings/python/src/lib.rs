//! Python bindings for QGL (structural description language)
//!
//! Thin wrapper around `qgl-core` - ZERO logic here.
//! All behavior comes from the canonical Rust implementation.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| PyValueError::new_err(format!("Serialization error: {}", e)))
}

/// Tokenize QGL source text.
///
/// Returns:
///     JSON array of {"token": ..., "span": {"line", "column", "offset"}}
///
/// Raises:
///     ValueError: On forbidden words or invalid characters
#[pyfunction]
fn tokenize(text: &str) -> PyResult<String> {
    let tokens = qgl_core::parser::tokenizer::tokenize(text).map_err(value_error)?;
    to_json(&tokens)
}

/// Parse QGL source text and return a JSON string of the Program.
///
/// Raises:
///     ValueError: On lexical, syntax, or structural errors
#[pyfunction]
fn parse(text: &str) -> PyResult<String> {
    let program = qgl_core::parse_source(text).map_err(value_error)?;
    to_json(&program)
}

/// Check a QGL program for admissibility.
///
/// Returns:
///     JSON string: {"admissible": bool, "reason": str, "kind": str | null}
///
/// Raises:
///     ValueError: If the source cannot be parsed
#[pyfunction]
fn check(text: &str) -> PyResult<String> {
    let program = qgl_core::parse_source(text).map_err(value_error)?;
    let verdict = qgl_core::check(&program, &qgl_core::AdmissibilityConfig::default());
    to_json(&verdict)
}

/// Invert one boundary of a QGL program.
///
/// Returns:
///     JSON string: {"success": bool, "reason": str, "program": str}
///     where "program" is canonical QGL text (the input on failure)
///
/// Raises:
///     ValueError: If the source cannot be parsed
#[pyfunction]
fn invert(text: &str, boundary: &str) -> PyResult<String> {
    let program = qgl_core::parse_source(text).map_err(value_error)?;
    let outcome = qgl_core::InversionEngine::default().invert(program, boundary);
    let canonical = qgl_core::normalizer::serialize_canonical(
        &qgl_core::normalizer::normalize_program(outcome.program),
    );
    to_json(&serde_json::json!({
        "success": outcome.success,
        "reason": outcome.reason,
        "program": canonical,
    }))
}

/// Normalize QGL source text to canonical form.
///
/// Guarantees:
///   - Deterministic: same input → same output
///   - Idempotent: normalize(normalize(x)) == normalize(x)
///
/// Raises:
///     ValueError: If the source cannot be parsed
#[pyfunction]
fn normalize(text: &str) -> PyResult<String> {
    qgl_core::normalizer::normalize(text).map_err(value_error)
}

/// SHA-256 structural fingerprint of a QGL program.
#[pyfunction]
fn fingerprint(text: &str) -> PyResult<String> {
    let program = qgl_core::parse_source(text).map_err(value_error)?;
    Ok(qgl_core::normalizer::fingerprint(&program))
}

/// QGL - structural description language
///
/// Python bindings for the canonical Rust implementation.
#[pymodule]
fn qgl(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(tokenize, m)?)?;
    m.add_function(wrap_pyfunction!(parse, m)?)?;
    m.add_function(wrap_pyfunction!(check, m)?)?;
    m.add_function(wrap_pyfunction!(invert, m)?)?;
    m.add_function(wrap_pyfunction!(normalize, m)?)?;
    m.add_function(wrap_pyfunction!(fingerprint, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
