use crate::error::OpError;
use crate::value::RefValue;

/// Failure reported by a surface primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("unsupported primitive")]
    Unsupported,
    #[error("{0}")]
    InvalidArguments(String),
}

impl SurfaceError {
    pub(crate) fn into_op_error(self, primitive: &str) -> OpError {
        match self {
            SurfaceError::Unsupported => OpError::Unsupported(primitive.to_string()),
            SurfaceError::InvalidArguments(reason) => OpError::InvalidArguments {
                op: primitive.to_string(),
                reason,
            },
        }
    }
}

/// A stateful drawing target exposing named primitives.
///
/// `invoke` receives parameters that have already been resolved against the
/// surface's reference table. A primitive that produces something (a gradient,
/// a measurement) returns it so the caller can capture it.
pub trait Surface {
    fn invoke(
        &mut self,
        primitive: &str,
        args: &[RefValue],
    ) -> Result<Option<RefValue>, SurfaceError>;
}
