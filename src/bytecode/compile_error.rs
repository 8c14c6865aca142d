use std::fmt;

use crate::frontend::lexer::{OwnedToken, ScanError, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The scanner could not produce a token at this position.
    ScanFailure(ScanError),

    /// A specific token was required and something else showed up.
    ExpectedToken {
        expected: TokenKind,
        found: OwnedToken,
    },

    /// A position where an expression has to start held no prefix form.
    ExpectedExpression { found: OwnedToken },

    /// Reserved for statement positions. The grammar is a single
    /// expression today, so nothing raises it yet.
    #[allow(dead_code)]
    ExpectedStatement { found: OwnedToken },

    /// The constant pool can address at most 65536 values per chunk.
    ConstantPoolExhausted { at: OwnedToken },
}

impl CompileError {
    pub fn scan_failure(error: ScanError) -> Self {
        CompileError::ScanFailure(error)
    }

    pub fn expected_token(expected: TokenKind, found: Token<'_>) -> Self {
        CompileError::ExpectedToken {
            expected,
            found: found.into(),
        }
    }

    pub fn expected_expression(found: Token<'_>) -> Self {
        CompileError::ExpectedExpression {
            found: found.into(),
        }
    }

    pub fn constant_pool_exhausted(at: Token<'_>) -> Self {
        CompileError::ConstantPoolExhausted { at: at.into() }
    }

    /// Source line the diagnostic points at.
    pub fn line(&self) -> usize {
        match self {
            CompileError::ScanFailure(error) => error.line,
            CompileError::ExpectedToken { found, .. } => found.line,
            CompileError::ExpectedExpression { found } => found.line,
            CompileError::ExpectedStatement { found } => found.line,
            CompileError::ConstantPoolExhausted { at } => at.line,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line())?;
        match self {
            CompileError::ScanFailure(error) => write!(f, "{}", error.kind),
            CompileError::ExpectedToken { expected, found } => {
                write!(f, "expected {} but found {}", expected.describe(), found)
            }
            CompileError::ExpectedExpression { found } => {
                write!(f, "expected an expression but found {}", found)
            }
            CompileError::ExpectedStatement { found } => {
                write!(f, "expected a statement but found {}", found)
            }
            CompileError::ConstantPoolExhausted { .. } => {
                write!(f, "too many constants in one chunk")
            }
        }
    }
}

impl std::error::Error for CompileError {}
