use log::debug;
use stdext::function_name;

use crate::diagnostics::config::{Tracing, TracingConfig};

use super::tokens::{Lex, Token};
use super::LexerError;

macro_rules! trace {
    ($lx:expr) => {
        if $lx.tracing.matches($lx.line as usize) {
            println!("{} <- L{}", function_name!(), $lx.line)
        }
    };
}

/// Hand-written scanner. Walks a char vector with a one-character lookahead,
/// counting lines and skipping both comment forms (`//` and nesting
/// `/* ... */`). Malformed lexemes come back as `Err` items in the token
/// stream; the driver decides whether to stop.
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    tracing: TracingConfig,
}

impl Lexer {
    pub fn new(text: &str) -> Lexer {
        Lexer {
            chars: text.chars().collect(),
            index: 0,
            line: 1,
            tracing: TracingConfig::Off,
        }
    }

    pub fn tokenize(&mut self) -> Vec<Result<Token, LexerError>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments(&mut tokens);
            let line = self.line;
            let c = match self.peek() {
                Some(c) => c,
                None => break,
            };

            let item = if c.is_ascii_alphabetic() {
                Ok(self.consume_word(line))
            } else if c.is_ascii_digit() {
                self.consume_number(line)
            } else {
                self.consume_operator(line)
            };
            tokens.push(item);
        }
        debug!("scanned {} tokens over {} lines", tokens.len(), self.line);
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn next_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.next();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self, tokens: &mut Vec<Result<Token, LexerError>>) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.next();
            }
            if self.peek() == Some('/') && self.peek_second() == Some('/') {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.next();
                }
            } else if self.peek() == Some('/') && self.peek_second() == Some('*') {
                let opened_at = self.line;
                self.next();
                self.next();
                let mut depth = 1;
                loop {
                    match (self.peek(), self.peek_second()) {
                        (Some('/'), Some('*')) => {
                            self.next();
                            self.next();
                            depth += 1;
                        }
                        (Some('*'), Some('/')) => {
                            self.next();
                            self.next();
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        (Some(_), _) => {
                            self.next();
                        }
                        (None, _) => {
                            tokens.push(Err(LexerError::UnterminatedComment(opened_at)));
                            break;
                        }
                    }
                }
            } else {
                break;
            }
        }
    }

    fn consume_word(&mut self, line: u32) -> Token {
        trace!(self);
        let mut word = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            word.push(self.next().unwrap());
        }
        match Lex::keyword(&word) {
            Some(lex) => Token::new(lex, line),
            None => Token::new(Lex::Id(word), line),
        }
    }

    fn consume_number(&mut self, line: u32) -> Result<Token, LexerError> {
        trace!(self);
        let integer = self.consume_digits();

        let is_float = self.peek() == Some('.') && matches!(self.peek_second(), Some(c) if c.is_ascii_digit());
        if !is_float {
            if integer.len() > 1 && integer.starts_with('0') {
                return Err(LexerError::InvalidNumber(integer, line));
            }
            return Ok(Token::new(Lex::IntLit(integer), line));
        }

        self.next();
        let fraction = self.consume_digits();
        let mut lexeme = format!("{}.{}", integer, fraction);

        if self.next_if('e') {
            lexeme.push('e');
            if self.peek() == Some('+') || self.peek() == Some('-') {
                lexeme.push(self.next().unwrap());
            }
            let exponent = self.consume_digits();
            if exponent.is_empty() {
                return Err(LexerError::InvalidNumber(lexeme, line));
            }
            lexeme.push_str(&exponent);
        }

        let valid_integer = integer.len() == 1 || !integer.starts_with('0');
        let valid_fraction = fraction.len() == 1 || !fraction.ends_with('0');
        if !valid_integer || !valid_fraction {
            return Err(LexerError::InvalidNumber(lexeme, line));
        }
        Ok(Token::new(Lex::FloatLit(lexeme), line))
    }

    fn consume_digits(&mut self) -> String {
        let mut digits = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            digits.push(self.next().unwrap());
        }
        digits
    }

    fn consume_operator(&mut self, line: u32) -> Result<Token, LexerError> {
        trace!(self);
        let c = self.next().unwrap();
        let lex = match c {
            '+' => Lex::Plus,
            '-' => Lex::Minus,
            '*' => Lex::Mul,
            '/' => Lex::Div,
            '|' => Lex::Or,
            '&' => Lex::And,
            '!' => Lex::Not,
            '(' => Lex::LParen,
            ')' => Lex::RParen,
            '{' => Lex::LBrace,
            '}' => Lex::RBrace,
            '[' => Lex::LBracket,
            ']' => Lex::RBracket,
            ';' => Lex::Semicolon,
            ',' => Lex::Comma,
            '.' => Lex::Dot,
            ':' => Lex::Colon,
            '=' => {
                if self.next_if('=') {
                    Lex::Eq
                } else {
                    Lex::Assign
                }
            }
            '<' => {
                if self.next_if('>') {
                    Lex::NEq
                } else if self.next_if('=') {
                    Lex::LEq
                } else {
                    Lex::Lt
                }
            }
            '>' => {
                if self.next_if('=') {
                    Lex::GEq
                } else {
                    Lex::Gt
                }
            }
            _ => return Err(LexerError::InvalidCharacter(c, line)),
        };
        Ok(Token::new(lex, line))
    }
}

impl Tracing for Lexer {
    fn set_tracing(&mut self, config: TracingConfig) {
        self.tracing = config;
    }
}
