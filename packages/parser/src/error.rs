use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },

    #[error("Mismatched closing tag at {pos}: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unterminated expression at {pos}")]
    UnterminatedExpression { pos: usize },
}

impl ParseError {
    pub fn unexpected_token(
        pos: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }
}

/// Errors from the source generator. These signal generator bugs, not bad
/// user input: any tree the parser or update path produces must generate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("Generator invariant violation: {0}")]
    InvariantViolation(String),
}
