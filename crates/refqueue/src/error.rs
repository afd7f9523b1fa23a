use serde::{Deserialize, Serialize};

/// Why a single operation did not run to completion.
///
/// Errors are scoped to one operation; a drain keeps going past them unless
/// the queue runs under [`crate::DrainPolicy::AbortQueue`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpError {
    #[error("reference '{0}' is not defined")]
    Resolution(String),
    #[error("surface has no primitive '{0}'")]
    Unsupported(String),
    #[error("reference '{0}' is not an ordered sequence")]
    TypeMismatch(String),
    #[error("malformed '{op}' operation: {reason}")]
    Malformed { op: String, reason: String },
    #[error("invalid arguments for '{op}': {reason}")]
    InvalidArguments { op: String, reason: String },
    #[error("not executed after an earlier failure in the queue")]
    Skipped,
}

/// Wire-level discriminant of [`OpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    ResolutionError,
    UnsupportedOperation,
    TypeMismatch,
    MalformedOperation,
    InvalidArguments,
    Skipped,
}

impl OpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpError::Resolution(_) => ErrorKind::ResolutionError,
            OpError::Unsupported(_) => ErrorKind::UnsupportedOperation,
            OpError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            OpError::Malformed { .. } => ErrorKind::MalformedOperation,
            OpError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            OpError::Skipped => ErrorKind::Skipped,
        }
    }

    pub(crate) fn malformed(op: &str, reason: impl Into<String>) -> Self {
        OpError::Malformed {
            op: op.to_string(),
            reason: reason.into(),
        }
    }
}
