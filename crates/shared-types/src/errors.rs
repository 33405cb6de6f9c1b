//! # Shared Errors

use thiserror::Error;

/// Semantic policy validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A mandatory policy member is absent or empty.
    #[error("Policy is missing mandatory field '{0}'")]
    MissingField(&'static str),

    /// The policy carries the wrong ODRL type for its position.
    #[error("Expected policy of type {expected}, got {actual}")]
    WrongKind {
        /// Expected type
        expected: &'static str,
        /// Type found on the policy
        actual: String,
    },
}

/// Failure to parse a process identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid process id: {0}")]
pub struct InvalidProcessId(pub String);
