mod expression;
mod parser;
mod statement;
mod tokenstream;

pub use parser::Parser;
pub use tokenstream::TokenStream;

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ParserError {
    UnexpectedToken {
        found: String,
        expected: &'static str,
        line: u32,
    },
    UnexpectedEof {
        expected: &'static str,
    },
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::UnexpectedToken {
                found,
                expected,
                line,
            } => write!(f, "L{}: expected {} but found \"{}\"", line, expected, found),
            ParserError::UnexpectedEof { expected } => {
                write!(f, "unexpected end of file, expected {}", expected)
            }
        }
    }
}

pub type ParserResult<T> = std::result::Result<T, ParserError>;
