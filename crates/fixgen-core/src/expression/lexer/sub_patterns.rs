//! Scanner for values mixing text with embedded sub-patterns
//!
//! Handles: escaped characters, function calls, parameters, variables and
//! every reference shape. Runs of plain text become string tokens.
//!
//! A `<`, `$` or `@` that does not start a well-formed construct is plain
//! text (`1 < 2`, `$ 5`, `john@example.org`). A construct that starts but
//! never closes (`<name(`, `<{param`) is an error.

use super::Lexer;
use crate::error::LexError;
use crate::expression::scan::{is_name_char, is_reference_char};
use crate::expression::{Token, TokenType};

/// Lexer of last resort: splits a value into text and sub-pattern tokens
pub struct SubPatternsLexer;

impl Lexer for SubPatternsLexer {
    fn lex(&self, value: &str) -> Result<Vec<Token>, LexError> {
        Scanner::new(value).scan()
    }
}

struct Scanner<'a> {
    source: &'a str,
    input: Vec<char>,
    position: usize,
    tokens: Vec<Token>,
    text: String,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Scanner {
            source,
            input: source.chars().collect(),
            position: 0,
            tokens: Vec::new(),
            text: String::new(),
        }
    }

    fn scan(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(ch) = self.peek() {
            match ch {
                '\\' if matches!(self.peek_ahead(1), Some('@' | '<' | '$' | '\\')) => {
                    let escaped: String = self.input[self.position..self.position + 2].iter().collect();
                    self.position += 2;
                    self.push(escaped, TokenType::EscapedValue);
                }
                '<' if self.peek_ahead(1) == Some('{') => self.read_parameter()?,
                '<' if self.starts_function() => self.read_function()?,
                '$' if self.peek_ahead(1).is_some_and(|c| c.is_alphabetic() || c == '_') => {
                    self.read_variable()
                }
                '@' if self.starts_reference() => self.read_reference()?,
                _ => {
                    self.text.push(ch);
                    self.position += 1;
                }
            }
        }

        self.flush_text();
        if self.tokens.is_empty() {
            return Err(LexError::Unrecognized {
                lexer: "SubPatternsLexer",
                value: self.source.to_string(),
            });
        }
        Ok(self.tokens)
    }

    // ── Character helpers ──────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    fn malformed(&self, offset: usize, reason: &str) -> LexError {
        LexError::Malformed {
            value: self.source.to_string(),
            offset,
            reason: reason.to_string(),
        }
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.tokens.push(Token::new(text, TokenType::String));
        }
    }

    fn push(&mut self, lexeme: String, kind: TokenType) {
        self.flush_text();
        self.tokens.push(Token::new(lexeme, kind));
    }

    fn name_end(&self, start: usize, accept: fn(char) -> bool) -> usize {
        let mut end = start;
        while self.input.get(end).is_some_and(|c| accept(*c)) {
            end += 1;
        }
        end
    }

    // ── Parameters & functions ─────────────────────────────

    fn read_parameter(&mut self) -> Result<(), LexError> {
        let start = self.position;
        let mut end = start + 2;
        while end + 1 < self.input.len() && !(self.input[end] == '}' && self.input[end + 1] == '>') {
            end += 1;
        }
        if end + 1 >= self.input.len() {
            return Err(self.malformed(start, "unterminated parameter, expected \"}>\""));
        }

        let lexeme = self.slice(start, end + 2);
        self.position = end + 2;
        self.push(lexeme, TokenType::Parameter);
        Ok(())
    }

    /// `<` followed by a name and an opening parenthesis
    fn starts_function(&self) -> bool {
        let name_end = self.name_end(self.position + 1, is_name_char);
        name_end > self.position + 1 && self.input.get(name_end) == Some(&'(')
    }

    fn read_function(&mut self) -> Result<(), LexError> {
        let start = self.position;
        let mut cursor = self.name_end(start + 1, is_name_char);
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut previous: Option<char> = None;

        while let Some(&c) = self.input.get(cursor) {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
            } else {
                match c {
                    '\'' | '"' if matches!(previous, Some('(' | ',')) => quote = Some(c),
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
            if !c.is_whitespace() {
                previous = Some(c);
            }
            cursor += 1;
        }

        if depth != 0 || self.input.get(cursor) != Some(&')') {
            return Err(self.malformed(start, "unterminated function call, expected \")\""));
        }
        if self.input.get(cursor + 1) != Some(&'>') {
            return Err(self.malformed(cursor + 1, "function call must end with \")>\""));
        }

        let lexeme = self.slice(start, cursor + 2);
        self.position = cursor + 2;
        self.push(lexeme, TokenType::Function);
        Ok(())
    }

    // ── Variables ──────────────────────────────────────────

    fn read_variable(&mut self) {
        let start = self.position;
        let end = self.name_end(start + 1, is_name_char);
        let lexeme = self.slice(start, end);
        self.position = end;
        self.push(lexeme, TokenType::Variable);
    }

    // ── References ─────────────────────────────────────────

    /// `@` not glued to a preceding word and followed by an id character
    fn starts_reference(&self) -> bool {
        let glued = self.position > 0 && self.input[self.position - 1].is_alphanumeric();
        !glued && self.peek_ahead(1).is_some_and(is_reference_char)
    }

    fn read_reference(&mut self) -> Result<(), LexError> {
        let start = self.position;
        let mut end = self.name_end(start + 1, is_reference_char);
        // A trailing dot ends the sentence, not the id
        while end > start + 1 && self.input[end - 1] == '.' {
            end -= 1;
        }

        let id = self.slice(start + 1, end);
        let mut kind = if id == "self" {
            TokenType::SelfReference
        } else {
            TokenType::SimpleReference
        };

        match self.input.get(end) {
            Some('*') => {
                kind = TokenType::WildcardReference;
                end += 1;
            }
            Some('{') => {
                let close = (end..self.input.len())
                    .find(|i| self.input[*i] == '}')
                    .ok_or_else(|| self.malformed(end, "unterminated reference range, expected \"}\""))?;
                let inner = self.slice(end + 1, close);
                kind = if inner.contains("..") {
                    TokenType::RangeReference
                } else if inner.contains(',') {
                    TokenType::ListReference
                } else {
                    return Err(self.malformed(end, "expected a range \"{1..5}\" or a list \"{a, b}\""));
                };
                end = close + 1;
            }
            _ => {}
        }

        if self.input.get(end) == Some(&'-') && self.input.get(end + 1) == Some(&'>') {
            let property_end = self.name_end(end + 2, is_name_char);
            if property_end == end + 2 {
                return Err(self.malformed(end, "expected a property name after \"->\""));
            }
            kind = TokenType::PropertyReference;
            end = property_end;
        }

        let lexeme = self.slice(start, end);
        self.position = end;
        self.push(lexeme, kind);
        Ok(())
    }
}
