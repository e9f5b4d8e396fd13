use super::Lexer;
use crate::error::LexError;
use crate::expression::{Token, TokenType};

/// Lexes the empty value into a single empty string token
pub struct EmptyValueLexer;

impl Lexer for EmptyValueLexer {
    fn lex(&self, value: &str) -> Result<Vec<Token>, LexError> {
        if value.is_empty() {
            return Ok(vec![Token::new("", TokenType::String)]);
        }

        Err(LexError::Unrecognized {
            lexer: "EmptyValueLexer",
            value: value.to_string(),
        })
    }
}
