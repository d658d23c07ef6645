//! Unified error types for the IBIS ecosystem.
//!
//! This module provides a common error type [`IbisError`] used across the
//! model and algorithm layers. Structural faults (bad indices, unknown
//! variables, out-of-range factors) are reported through `Err` values;
//! numeric outcomes such as an empty box or an infeasible constraint are
//! never errors and travel as [`crate::Proof`] certificates instead.

use thiserror::Error;

/// Unified error type for all IBIS operations.
#[derive(Error, Debug)]
pub enum IbisError {
    /// Structural errors: bad DAG index, unknown variable, malformed model
    #[error("Structure error: {0}")]
    Structure(String),

    /// A numeric parameter outside its domain (tolerance, inflation factor,
    /// peel factor)
    #[error("Out of domain: {0}")]
    OutOfDomain(String),

    /// Symbolic derivation applied to a non-differentiable operation
    #[error("Not differentiable: {0}")]
    NotDifferentiable(String),

    /// A problem without variables or constraints where some are required
    #[error("Empty problem: {0}")]
    EmptyProblem(String),

    /// Solver/configuration errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using IbisError.
pub type IbisResult<T> = Result<T, IbisError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for IbisError {
    fn from(err: anyhow::Error) -> Self {
        IbisError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for IbisError {
    fn from(s: String) -> Self {
        IbisError::Other(s)
    }
}

impl From<&str> for IbisError {
    fn from(s: &str) -> Self {
        IbisError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IbisError::OutOfDomain("delta = 0.5".into());
        assert!(err.to_string().contains("Out of domain"));
        assert!(err.to_string().contains("delta"));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> IbisResult<()> {
            Err(IbisError::Structure("test".into()))
        }

        fn outer() -> IbisResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: IbisError = anyhow::anyhow!("wrapped").into();
        assert!(matches!(err, IbisError::Other(_)));
    }
}
