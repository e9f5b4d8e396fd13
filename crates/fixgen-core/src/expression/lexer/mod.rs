//! Lexer chain: turns a raw field value into tokens
//!
//! Each lexer recognises one shape of raw value. `LexerRegistry` tries them in
//! order and returns the first successful tokenization unchanged. When every
//! lexer fails, the failure of the last one is kept as the cause since it is
//! the most generic and therefore the most informative.

mod empty;
mod global;
mod sub_patterns;

pub use empty::EmptyValueLexer;
pub use global::GlobalPatternsLexer;
pub use sub_patterns::SubPatternsLexer;

pub(crate) use global::{split_dynamic_array, split_optional};

use crate::error::LexError;
use crate::expression::Token;

/// Something that can tokenize a raw value
pub trait Lexer: Send + Sync {
    fn lex(&self, value: &str) -> Result<Vec<Token>, LexError>;
}

/// Ordered chain of lexers; the first one to succeed wins
pub struct LexerRegistry {
    lexers: Vec<Box<dyn Lexer>>,
}

impl LexerRegistry {
    pub fn new(lexers: Vec<Box<dyn Lexer>>) -> Self {
        LexerRegistry { lexers }
    }

    /// Empty values first, whole-value patterns next, sub-patterns last
    pub fn with_default_lexers() -> Self {
        LexerRegistry::new(vec![
            Box::new(EmptyValueLexer),
            Box::new(GlobalPatternsLexer),
            Box::new(SubPatternsLexer),
        ])
    }

    pub fn len(&self) -> usize {
        self.lexers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexers.is_empty()
    }
}

impl Default for LexerRegistry {
    fn default() -> Self {
        Self::with_default_lexers()
    }
}

impl Lexer for LexerRegistry {
    fn lex(&self, value: &str) -> Result<Vec<Token>, LexError> {
        let mut last_failure = None;

        for lexer in &self.lexers {
            match lexer.lex(value) {
                Ok(tokens) => return Ok(tokens),
                Err(err) => {
                    tracing::trace!(value, reason = %err, "lexer rejected value");
                    last_failure = Some(err);
                }
            }
        }

        Err(LexError::CouldNotLex {
            value: value.to_string(),
            source: last_failure.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::expression::TokenType;

    struct FakeLexer {
        result: Result<Vec<Token>, LexError>,
        calls: Arc<AtomicUsize>,
    }

    impl FakeLexer {
        fn boxed(result: Result<Vec<Token>, LexError>) -> (Box<dyn Lexer>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let lexer = FakeLexer {
                result,
                calls: Arc::clone(&calls),
            };
            (Box::new(lexer), calls)
        }
    }

    impl Lexer for FakeLexer {
        fn lex(&self, _value: &str) -> Result<Vec<Token>, LexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn rejection(lexer: &'static str) -> LexError {
        LexError::Unrecognized {
            lexer,
            value: "random".into(),
        }
    }

    #[test]
    fn test_picks_the_first_suitable_lexer() {
        let expected = vec![Token::new("random", TokenType::String)];
        let (first, first_calls) = FakeLexer::boxed(Err(rejection("first")));
        let (second, second_calls) = FakeLexer::boxed(Ok(expected.clone()));
        let (third, third_calls) = FakeLexer::boxed(Ok(vec![]));

        let registry = LexerRegistry::new(vec![first, second, third]);
        let actual = registry.lex("random").unwrap();

        assert_eq!(actual, expected);
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fails_when_no_lexer_is_registered() {
        let err = LexerRegistry::new(vec![]).lex("").unwrap_err();
        assert_eq!(err.to_string(), "Could not lex the value \"\"");
        assert_eq!(
            err,
            LexError::CouldNotLex {
                value: String::new(),
                source: None
            }
        );
    }

    #[test]
    fn test_uses_the_last_failure_as_cause() {
        let (first, _) = FakeLexer::boxed(Err(rejection("foo")));
        let (second, _) = FakeLexer::boxed(Err(rejection("bar")));

        let err = LexerRegistry::new(vec![first, second]).lex("").unwrap_err();
        match err {
            LexError::CouldNotLex { value, source } => {
                assert_eq!(value, "");
                assert_eq!(source.as_deref(), Some(&rejection("bar")));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_reordering_a_non_matching_lexer_keeps_result() {
        let tokens = vec![Token::new("plain text", TokenType::String)];
        let (a, _) = FakeLexer::boxed(Err(rejection("a")));
        let (b, _) = FakeLexer::boxed(Ok(tokens.clone()));
        let forward = LexerRegistry::new(vec![a, b]).lex("plain text").unwrap();

        let (b, _) = FakeLexer::boxed(Ok(tokens.clone()));
        let (a, _) = FakeLexer::boxed(Err(rejection("a")));
        let backward = LexerRegistry::new(vec![b, a]).lex("plain text").unwrap();

        assert_eq!(forward, tokens);
        assert_eq!(backward, tokens);
    }

    #[test]
    fn test_default_chain_lexes_plain_text_as_one_string() {
        let tokens = LexerRegistry::with_default_lexers().lex("plain text").unwrap();
        assert_eq!(tokens, vec![Token::new("plain text", TokenType::String)]);
    }

    #[test]
    fn test_default_chain_accepts_empty_value() {
        let tokens = LexerRegistry::with_default_lexers().lex("").unwrap();
        assert_eq!(tokens, vec![Token::new("", TokenType::String)]);
    }

    #[test]
    fn test_default_chain_reports_sub_pattern_failure() {
        let err = LexerRegistry::with_default_lexers()
            .lex("<name(")
            .unwrap_err();
        match err {
            LexError::CouldNotLex { source, .. } => {
                assert!(matches!(source.as_deref(), Some(LexError::Malformed { .. })));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_lex_determinism_100_iterations() {
        let registry = LexerRegistry::with_default_lexers();
        let input = "Hello <firstName()> from @city->name, see <{site}>";
        let first = registry.lex(input).unwrap();
        for i in 0..100 {
            assert_eq!(first, registry.lex(input).unwrap(), "Determinism failure at iteration {}", i);
        }
    }
}
