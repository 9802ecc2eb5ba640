use std::fmt;

/// Error types for the minimizers
///
/// Running out of iterations is not an error: every minimizer reports it
/// through the `converged` flag of its result instead.
#[derive(Debug, Clone, PartialEq)]
pub enum MinimizerError {
    BracketNotFound,
    DimensionMismatch { expected: usize, found: usize },
    FunctionEvaluationError,
    InvalidArgument(String),
    InvalidBracket,
    InvalidDimension,
    InvalidDirectionSet,
    InvalidTolerance,
}

impl fmt::Display for MinimizerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MinimizerError::BracketNotFound => {
                write!(f, "No minimum bracket found within the expansion limit")
            }
            MinimizerError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {}, found {}", expected, found)
            }
            MinimizerError::FunctionEvaluationError => {
                write!(f, "Function evaluation returned invalid value")
            }
            MinimizerError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            MinimizerError::InvalidBracket => write!(
                f,
                "Invalid bracket: need lower < inner < upper with f(inner) below both ends"
            ),
            MinimizerError::InvalidDimension => write!(f, "Invalid dimension or empty vector"),
            MinimizerError::InvalidDirectionSet => {
                write!(f, "Direction set must be a square matrix matching the point")
            }
            MinimizerError::InvalidTolerance => write!(f, "Tolerance must be positive and finite"),
        }
    }
}

impl std::error::Error for MinimizerError {}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MinimizerError::DimensionMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, found 2");

        let err = MinimizerError::InvalidArgument(String::from("lower == upper"));
        assert_eq!(err.to_string(), "Invalid argument: lower == upper");
    }

    #[test]
    fn test_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&MinimizerError::BracketNotFound);
    }
}
