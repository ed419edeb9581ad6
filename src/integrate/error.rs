//! Error types for tensor-train time integration.

use std::fmt;

use crate::sle::SleError;

/// Result type for integration operations.
pub type IntegrateResult<T> = Result<T, IntegrateError>;

/// Errors that can occur during time integration.
#[derive(Debug, Clone)]
pub enum IntegrateError {
    /// The linear solver of an implicit step failed.
    SolverFailure { t: Option<f64>, reason: SleError },

    /// Invalid or out-of-range configuration value.
    InvalidConfiguration { parameter: String, message: String },

    /// Invalid input operands (e.g., mismatched dimensions).
    InvalidInput { context: String },

    /// Numerical computation failed (e.g., NaN step size).
    NumericalError { message: String },

    /// The cancellation flag was raised before the step at `t`.
    Cancelled { t: f64 },

    /// Error from underlying numr operation.
    NumrError(String),
}

impl IntegrateError {
    pub(crate) fn invalid_configuration(parameter: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    /// Attach the integration time to a solver failure.
    pub(crate) fn at_time(self, time: f64) -> Self {
        match self {
            Self::SolverFailure { t: None, reason } => Self::SolverFailure {
                t: Some(time),
                reason,
            },
            other => other,
        }
    }
}

impl fmt::Display for IntegrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SolverFailure { t: Some(t), reason } => {
                write!(f, "Linear solver failed at t = {:.6e}: {}", t, reason)
            }
            Self::SolverFailure { t: None, reason } => {
                write!(f, "Linear solver failed: {}", reason)
            }
            Self::InvalidConfiguration { parameter, message } => {
                write!(f, "Invalid configuration '{}': {}", parameter, message)
            }
            Self::InvalidInput { context } => {
                write!(f, "Invalid input: {}", context)
            }
            Self::NumericalError { message } => {
                write!(f, "Numerical error: {}", message)
            }
            Self::Cancelled { t } => {
                write!(f, "Integration cancelled at t = {:.6e}", t)
            }
            Self::NumrError(msg) => {
                write!(f, "numr error: {}", msg)
            }
        }
    }
}

impl std::error::Error for IntegrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SolverFailure { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<numr::error::Error> for IntegrateError {
    fn from(err: numr::error::Error) -> Self {
        Self::NumrError(err.to_string())
    }
}

impl From<SleError> for IntegrateError {
    fn from(err: SleError) -> Self {
        match err {
            SleError::InvalidParameter { parameter, message } => {
                Self::InvalidConfiguration { parameter, message }
            }
            reason => Self::SolverFailure { t: None, reason },
        }
    }
}
