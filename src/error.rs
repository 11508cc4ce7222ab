//! Error types.
//!
//! Only genuine faults live here. "No route matched" and "the action returned
//! something we cannot render" are ordinary outcomes of
//! [`Dispatcher::handle`](crate::Dispatcher::handle), not errors.

use std::path::PathBuf;

/// The error type returned by the host's fallible operations: loading
/// configuration, building the route table, binding a port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("route: {0}")]
    Pattern(#[from] PatternError),

    #[error("address: {0}")]
    Addr(#[from] std::net::AddrParseError),
}

/// A route template that cannot be compiled.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("unterminated `{{` at byte {position} in `{template}`")]
    Unterminated { template: String, position: usize },

    #[error("empty placeholder `{{}}` in `{template}`")]
    EmptyPlaceholder { template: String },

    #[error("invalid placeholder name `{name}` in `{template}`")]
    InvalidName { template: String, name: String },

    #[error("placeholder `{name}` appears more than once in `{template}`")]
    DuplicateName { template: String, name: String },

    #[error("`{template}` does not compile: {message}")]
    Regex { template: String, message: String },
}

/// A request string that could not be converted to the declared type.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("cannot convert `{value}` to {target}")]
pub struct ConversionError {
    pub value: String,
    pub target: &'static str,
}

/// An action read one of its arguments with the wrong accessor.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("argument {index} does not exist")]
    Missing { index: usize },

    #[error("argument {index} is {found}, not {expected}")]
    Mismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// Controller construction or the action call failed.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("{controller}::{action} panicked: {message}")]
    Panicked {
        controller: &'static str,
        action: String,
        message: String,
    },

    #[error("{controller}::{action} failed: {message}")]
    Action {
        controller: &'static str,
        action: String,
        message: String,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

/// JSON encoding of an action's return value failed.
#[derive(Debug, thiserror::Error)]
#[error("json: {0}")]
pub struct SerializationError(#[from] serde_json::Error);

/// The upload directory could not be prepared or written.
#[derive(Debug, thiserror::Error)]
#[error("upload `{}`: {source}", path.display())]
pub struct UploadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The error type an action body may return. Anything convertible into a
/// boxed error works: `String`, `&str`, or any `std::error::Error`.
pub type ActionError = Box<dyn std::error::Error + Send + Sync + 'static>;
