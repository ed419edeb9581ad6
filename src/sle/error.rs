//! Error types for linear systems in tensor-train format.

use std::fmt;

/// Result type for tensor-train linear solvers.
pub type SleResult<T> = Result<T, SleError>;

/// Errors that can occur while solving `A · x = b` in tensor-train format.
#[derive(Debug, Clone)]
pub enum SleError {
    /// The relative residual stayed above the requested tolerance.
    DidNotConverge {
        repeats: usize,
        residual: f64,
        tolerance: f64,
    },

    /// A local system could not be solved.
    SingularMicroSystem { site: usize, context: String },

    /// Invalid parameter value or incompatible operands.
    InvalidParameter { parameter: String, message: String },

    /// Error from underlying numr operation.
    NumrError(String),
}

impl fmt::Display for SleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DidNotConverge {
                repeats,
                residual,
                tolerance,
            } => {
                write!(
                    f,
                    "TT solver did not converge after {} sweeps: residual {:.2e} (tolerance: {:.2e})",
                    repeats, residual, tolerance
                )
            }
            Self::SingularMicroSystem { site, context } => {
                write!(f, "Singular micro system at core {}: {}", site, context)
            }
            Self::InvalidParameter { parameter, message } => {
                write!(f, "Invalid parameter '{}': {}", parameter, message)
            }
            Self::NumrError(msg) => {
                write!(f, "numr error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SleError {}

impl From<numr::error::Error> for SleError {
    fn from(err: numr::error::Error) -> Self {
        Self::NumrError(err.to_string())
    }
}
