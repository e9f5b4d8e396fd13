use super::Lexer;
use crate::error::LexError;
use crate::expression::scan::{find_top_level, is_enclosed};
use crate::expression::{Token, TokenType};

/// Lexes values whose whole shape is a single construct: optional values,
/// dynamic arrays and string arrays. Anything else is left to the next lexer.
pub struct GlobalPatternsLexer;

impl Lexer for GlobalPatternsLexer {
    fn lex(&self, value: &str) -> Result<Vec<Token>, LexError> {
        let kind = if split_optional(value).is_some() {
            TokenType::Optional
        } else if split_dynamic_array(value).is_some() {
            TokenType::DynamicArray
        } else if is_enclosed(value.trim(), '[', ']') {
            TokenType::StringArray
        } else {
            return Err(LexError::Unrecognized {
                lexer: "GlobalPatternsLexer",
                value: value.to_string(),
            });
        };

        Ok(vec![Token::new(value, kind)])
    }
}

/// `NN%? first` or `NN%? first : second`
///
/// Returns the percentage, the first branch and the optional second branch.
pub(crate) fn split_optional(value: &str) -> Option<(&str, &str, Option<&str>)> {
    let marker = value.find("%?")?;
    let percentage = value[..marker].trim();
    if !is_quantity(percentage, true) {
        return None;
    }

    let rest = value[marker + 2..].trim();
    if rest.is_empty() {
        return None;
    }

    match find_top_level(rest, " : ") {
        Some(split) => {
            let first = rest[..split].trim();
            let second = rest[split + 3..].trim();
            if first.is_empty() || second.is_empty() {
                return None;
            }
            Some((percentage, first, Some(second)))
        }
        None => Some((percentage, rest, None)),
    }
}

/// `Nx element` or `<quantifier()>x element`
pub(crate) fn split_dynamic_array(value: &str) -> Option<(&str, &str)> {
    let value = value.trim_start();
    let marker = find_top_level(value, "x ")?;
    let quantifier = value[..marker].trim();
    if !is_quantity(quantifier, false) {
        return None;
    }

    let element = value[marker + 2..].trim();
    if element.is_empty() {
        return None;
    }
    Some((quantifier, element))
}

/// A literal number or a single `<...>` construct
fn is_quantity(text: &str, allow_decimal: bool) -> bool {
    if text.is_empty() {
        return false;
    }
    if text.starts_with('<') && text.ends_with('>') {
        return !text[1..text.len() - 1].contains('<');
    }
    if allow_decimal {
        text.parse::<f64>().is_ok() && text.chars().all(|c| c.is_ascii_digit() || c == '.')
    } else {
        text.chars().all(|c| c.is_ascii_digit())
    }
}
