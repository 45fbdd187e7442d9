use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SgfError {
    #[error("expected {expected}, found '{found}' at position {pos}")]
    UnexpectedChar {
        expected: &'static str,
        found: char,
        pos: usize,
    },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid value '{value}' for property {property}: {reason}")]
    InvalidPropertyValue {
        property: String,
        value: String,
        reason: String,
    },
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("SGF contains no game trees")]
    EmptyCollection,
}
