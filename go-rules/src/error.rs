use thiserror::Error;

use crate::sgf::SgfError;

/// Why a placement was refused. The board is always left as it was before the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("point is not on the board")]
    OutOfBounds,
    #[error("a stone has already been placed here")]
    Occupied,
    #[error("move is suicidal")]
    Suicide,
    #[error("illegal ko move")]
    Ko,
    #[error("illegal board repetition")]
    Superko,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GoError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] IllegalMove),
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("score estimator is not available")]
    EstimatorUnavailable,
}

impl GoError {
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, GoError::IllegalMove(_))
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        GoError::InvariantViolation(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        GoError::MalformedInput(msg.into())
    }
}

impl From<SgfError> for GoError {
    fn from(e: SgfError) -> Self {
        GoError::MalformedInput(e.to_string())
    }
}

impl From<serde_json::Error> for GoError {
    fn from(e: serde_json::Error) -> Self {
        GoError::MalformedInput(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_move_converts_with_question_mark() {
        fn attempt() -> Result<(), GoError> {
            Err(IllegalMove::Ko)?;
            Ok(())
        }
        assert_eq!(attempt(), Err(GoError::IllegalMove(IllegalMove::Ko)));
        assert!(attempt().unwrap_err().is_illegal_move());
    }

    #[test]
    fn display() {
        assert_eq!(
            GoError::from(IllegalMove::Suicide).to_string(),
            "illegal move: move is suicidal"
        );
        assert_eq!(
            GoError::EstimatorUnavailable.to_string(),
            "score estimator is not available"
        );
    }

    #[test]
    fn sgf_errors_are_malformed_input() {
        let e: GoError = SgfError::UnexpectedEof.into();
        assert!(matches!(e, GoError::MalformedInput(_)));
    }
}
