use crate::compiler::lexer::tokens::{Lex, Token};

use super::{ParserError, ParserResult};

/// Cursor over the scanner's output with one-token lookahead.
pub struct TokenStream {
    tokens: Vec<Token>,
    index: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> TokenStream {
        TokenStream { tokens, index: 0 }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    pub fn peek_lex(&self) -> Option<&Lex> {
        self.peek().map(|t| &t.lex)
    }

    pub fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.index).cloned();
        if t.is_some() {
            self.index += 1;
        }
        t
    }

    /// Line of the upcoming token, or of the last token once exhausted.
    pub fn line(&self) -> u32 {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub fn next_if(&mut self, lex: &Lex) -> bool {
        if self.peek_lex() == Some(lex) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Consume the expected terminal or fail with what was found instead.
    pub fn expect(&mut self, lex: &Lex, expected: &'static str) -> ParserResult<Token> {
        match self.peek() {
            Some(t) if t.lex == *lex => Ok(self.next().unwrap()),
            Some(t) => Err(ParserError::UnexpectedToken {
                found: t.to_string(),
                expected,
                line: t.line,
            }),
            None => Err(ParserError::UnexpectedEof { expected }),
        }
    }

    /// Consume an identifier and return its lexeme and line.
    pub fn expect_id(&mut self, expected: &'static str) -> ParserResult<(String, u32)> {
        match self.peek() {
            Some(Token {
                lex: Lex::Id(name),
                line,
            }) => {
                let out = (name.clone(), *line);
                self.index += 1;
                Ok(out)
            }
            Some(t) => Err(ParserError::UnexpectedToken {
                found: t.to_string(),
                expected,
                line: t.line,
            }),
            None => Err(ParserError::UnexpectedEof { expected }),
        }
    }

    pub fn expect_int_lit(&mut self, expected: &'static str) -> ParserResult<(String, u32)> {
        match self.peek() {
            Some(Token {
                lex: Lex::IntLit(lexeme),
                line,
            }) => {
                let out = (lexeme.clone(), *line);
                self.index += 1;
                Ok(out)
            }
            Some(t) => Err(ParserError::UnexpectedToken {
                found: t.to_string(),
                expected,
                line: t.line,
            }),
            None => Err(ParserError::UnexpectedEof { expected }),
        }
    }

    pub fn unexpected<T>(&self, expected: &'static str) -> ParserResult<T> {
        match self.peek() {
            Some(t) => Err(ParserError::UnexpectedToken {
                found: t.to_string(),
                expected,
                line: t.line,
            }),
            None => Err(ParserError::UnexpectedEof { expected }),
        }
    }
}
