use thiserror::Error;

///
/// Shorthand for results of fallible p-adic operations.
///
pub type Result<T> = std::result::Result<T, PAdicError>;

///
/// The ways a p-adic operation can fail.
///
/// Domain-test failures ([`PAdicError::NotConvergent`],
/// [`PAdicError::NotASquare`]) are ordinary outcomes of exp/log/sqrt on
/// inputs outside their domain; the remaining kinds indicate that the
/// operation's contract was violated. None of them abort the process.
///
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PAdicError {
    #[error("invalid context parameter: {0}")]
    InvalidArg(&'static str),
    #[error("operand with negative valuation where a p-adic unit is required")]
    NotUnit,
    #[error("series does not converge at the given point")]
    NotConvergent,
    #[error("not enough precision left to represent the result")]
    PrecisionLost,
    #[error("element is not a p-adic integer")]
    NotInteger,
    #[error("element is not a square")]
    NotASquare,
    #[error("division by a value that is zero to its precision")]
    DivisionByZero,
    #[error("integer provider violated its contract: {0}")]
    Internal(&'static str),
}
