//! Unified error type for the module control surface.
//!
//! One closed enumeration covers local validation failures, table parsing
//! failures, and operational failures reported by the native module layer.
//! Anything the native layer reports that matches no known category lands in
//! `UnknownFailure` with its raw diagnostic preserved.

use std::io;
use thiserror::Error;

/// Errors produced by the module control surface.
///
/// The local validation variants (`InvalidParameterType`, `InvalidArgument`,
/// `MalformedTableLine`) are raised before any kernel call is attempted, so
/// a locally invalid request never reaches the native layer. The operational
/// variants carry the diagnostic text of the native layer unmodified; the
/// kernel log usually holds the detailed root cause.
#[derive(Error, Debug)]
pub enum ModuleError {
    /// A parameter value shape the kernel parameter format cannot express,
    /// e.g. a list mixing integer and string elements.
    #[error("invalid parameter type: {0}")]
    InvalidParameterType(String),

    /// An operation was invoked with unusable arguments, e.g. an empty
    /// module name list.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A module table line did not match the six-field format.
    #[error("malformed module table line: {0}")]
    MalformedTableLine(String),

    /// The module table resource could not be opened or read.
    #[error("module table unavailable: {0}")]
    TableUnavailable(#[from] io::Error),

    /// The native layer rejected an insert (already loaded, unresolved
    /// symbols, permission denied, ...).
    #[error("could not insert module {module}: {reason}")]
    InsertFailed { module: String, reason: String },

    /// The native layer rejected a removal (module in use without force,
    /// not removable, permission denied, ...).
    #[error("could not remove module {module}: {reason}")]
    RemoveFailed { module: String, reason: String },

    /// No module matched the given name or path.
    #[error("module {0} not found")]
    ModuleNotFound(String),

    /// Unclassified failure from the native layer; the raw diagnostic
    /// payload is preserved verbatim.
    #[error("module operation failed: {0}")]
    UnknownFailure(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ModuleError>;
