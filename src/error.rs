//! Error types for observation construction and calibration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalibrationError>;

/// Input-shape errors. Both are fatal: they abort the call before any
/// geometry is computed.
///
/// Optimizer non-convergence is deliberately not an error; it is reported
/// through [`CalibrationResult::converged`](crate::CalibrationResult).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// Right ascension, declination or distance outside its valid range.
    #[error("invalid observation: {message}")]
    InvalidObservation { message: String },

    /// Observation and target tables must pair 1:1 in order.
    #[error("table length mismatch: {observations} observations but {targets} targets")]
    TableLengthMismatch { observations: usize, targets: usize },
}

impl CalibrationError {
    pub fn invalid_observation(message: impl Into<String>) -> Self {
        Self::InvalidObservation {
            message: message.into(),
        }
    }
}
