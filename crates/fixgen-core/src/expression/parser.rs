//! Expression parser: converts tokens into a `ValueNode` tree
//!
//! Composite tokens (function calls, arrays, optional values, dynamic arrays)
//! carry their whole lexeme; the parser splits them and sends every nested
//! piece back through the lexer chain, so nesting is unbounded.

use super::lexer::{split_dynamic_array, split_optional};
use super::scan::{is_name_char, split_top_level, unquote};
use super::{Lexer, LexerRegistry, Token, TokenType, ValueNode};
use crate::error::ParseError;
use crate::value::Value;

/// Lexes and parses raw values
pub struct ExpressionParser {
    lexer: Box<dyn Lexer>,
}

impl Default for ExpressionParser {
    fn default() -> Self {
        ExpressionParser::new(Box::new(LexerRegistry::with_default_lexers()))
    }
}

impl ExpressionParser {
    pub fn new(lexer: Box<dyn Lexer>) -> Self {
        ExpressionParser { lexer }
    }

    pub fn lexer(&self) -> &dyn Lexer {
        self.lexer.as_ref()
    }

    /// Lex then parse a raw string value
    pub fn parse_value(&self, raw: &str) -> crate::Result<ValueNode> {
        let tokens = self.lexer.lex(raw)?;
        Ok(self.parse(&tokens)?)
    }

    /// Parse a definition value: strings are expressions, arrays and
    /// objects are parsed element by element, other scalars are constants.
    pub fn parse_definition_value(&self, raw: &serde_json::Value) -> crate::Result<ValueNode> {
        match raw {
            serde_json::Value::String(s) => self.parse_value(s),
            serde_json::Value::Array(items) => Ok(ValueNode::Array(
                items
                    .iter()
                    .map(|item| self.parse_definition_value(item))
                    .collect::<crate::Result<Vec<_>>>()?,
            )),
            serde_json::Value::Object(map) => Ok(ValueNode::Map(
                map.iter()
                    .map(|(key, item)| Ok((key.clone(), self.parse_definition_value(item)?)))
                    .collect::<crate::Result<Vec<_>>>()?,
            )),
            other => Ok(ValueNode::Constant(Value::from_json(other))),
        }
    }

    /// Parse a token sequence.
    ///
    /// A single token yields its own node; several tokens yield a `List`
    /// whose adjacent literal parts are merged.
    pub fn parse(&self, tokens: &[Token]) -> Result<ValueNode, ParseError> {
        let mut nodes: Vec<ValueNode> = Vec::with_capacity(tokens.len());

        for token in tokens {
            let node = self.parse_token(token)?;
            if let (Some(ValueNode::Literal(previous)), ValueNode::Literal(text)) =
                (nodes.last_mut(), &node)
            {
                previous.push_str(text);
                continue;
            }
            nodes.push(node);
        }

        match nodes.len() {
            0 => Err(ParseError::Empty),
            1 => Ok(nodes.remove(0)),
            _ => Ok(ValueNode::List(nodes)),
        }
    }

    fn parse_token(&self, token: &Token) -> Result<ValueNode, ParseError> {
        let lexeme = token.lexeme.as_str();
        match token.kind {
            TokenType::String => Ok(ValueNode::literal(lexeme)),
            TokenType::EscapedValue => {
                let escaped = lexeme
                    .strip_prefix('\\')
                    .filter(|rest| !rest.is_empty())
                    .ok_or_else(|| malformed(token, "expected a backslash and one character"))?;
                Ok(ValueNode::literal(escaped))
            }
            TokenType::Function => self.parse_function(token),
            TokenType::Parameter => {
                let name = lexeme
                    .strip_prefix("<{")
                    .and_then(|rest| rest.strip_suffix("}>"))
                    .map(str::trim)
                    .ok_or_else(|| malformed(token, "expected \"<{name}>\""))?;
                if name.is_empty() || !name.chars().all(|c| is_name_char(c) || c == '.') {
                    return Err(malformed(token, "invalid parameter name"));
                }
                Ok(ValueNode::Parameter(name.to_string()))
            }
            TokenType::Variable => {
                let name = lexeme
                    .strip_prefix('$')
                    .filter(|name| !name.is_empty() && name.chars().all(is_name_char))
                    .ok_or_else(|| malformed(token, "invalid variable name"))?;
                Ok(ValueNode::Variable(name.to_string()))
            }
            TokenType::SimpleReference
            | TokenType::SelfReference
            | TokenType::WildcardReference
            | TokenType::RangeReference
            | TokenType::ListReference => parse_reference(token, token.kind, lexeme),
            TokenType::PropertyReference => {
                let arrow = lexeme
                    .rfind("->")
                    .ok_or_else(|| malformed(token, "expected \"->\""))?;
                let (left, property) = (&lexeme[..arrow], &lexeme[arrow + 2..]);
                if property.is_empty() || !property.chars().all(is_name_char) {
                    return Err(malformed(token, "invalid property name"));
                }
                let reference = parse_reference(token, classify_reference(left), left)?;
                Ok(ValueNode::PropertyReference {
                    reference: Box::new(reference),
                    property: property.to_string(),
                })
            }
            TokenType::Optional => {
                let (percentage, first, second) = split_optional(lexeme)
                    .ok_or_else(|| malformed(token, "expected \"NN%? value\" or \"NN%? value : other\""))?;
                Ok(ValueNode::Optional {
                    percentage: Box::new(self.parse_nested(percentage)?),
                    first: Box::new(self.parse_nested(first)?),
                    second: match second {
                        Some(second) => Some(Box::new(self.parse_nested(second)?)),
                        None => None,
                    },
                })
            }
            TokenType::DynamicArray => {
                let (quantifier, element) = split_dynamic_array(lexeme)
                    .ok_or_else(|| malformed(token, "expected \"Nx element\""))?;
                Ok(ValueNode::DynamicArray {
                    quantifier: Box::new(self.parse_nested(quantifier)?),
                    element: Box::new(self.parse_nested(element)?),
                })
            }
            TokenType::StringArray => {
                let trimmed = lexeme.trim();
                let inner = trimmed
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(|| malformed(token, "expected \"[a, b]\""))?;
                let elements = split_top_level(inner, ',')
                    .into_iter()
                    .map(|element| {
                        if element.is_empty() {
                            Err(malformed(token, "empty array element"))
                        } else {
                            self.parse_nested(element)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ValueNode::Array(elements))
            }
        }
    }

    fn parse_function(&self, token: &Token) -> Result<ValueNode, ParseError> {
        let lexeme = token.lexeme.as_str();
        let body = lexeme
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix(")>"))
            .ok_or_else(|| malformed(token, "expected \"<name(arguments)>\""))?;
        let open = body
            .find('(')
            .ok_or_else(|| malformed(token, "missing argument list"))?;

        let name = &body[..open];
        if name.is_empty() || !name.chars().all(is_name_char) {
            return Err(malformed(token, "invalid function name"));
        }

        let arguments = split_top_level(&body[open + 1..], ',')
            .into_iter()
            .map(|argument| {
                if argument.is_empty() {
                    Err(malformed(token, "empty argument"))
                } else {
                    self.parse_nested(argument)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ValueNode::Function {
            name: name.to_string(),
            arguments,
        })
    }

    /// Quoted pieces are literals; anything else goes through the lexer again
    fn parse_nested(&self, raw: &str) -> Result<ValueNode, ParseError> {
        if let Some(literal) = unquote(raw) {
            return Ok(ValueNode::literal(literal));
        }

        let tokens = self
            .lexer
            .lex(raw)
            .map_err(|source| ParseError::NestedLex {
                value: raw.to_string(),
                source,
            })?;
        self.parse(&tokens)
    }
}

fn malformed(token: &Token, reason: &str) -> ParseError {
    ParseError::Malformed {
        kind: token.kind,
        lexeme: token.lexeme.clone(),
        reason: reason.to_string(),
    }
}

/// Reference kind of the left-hand side of a property reference
fn classify_reference(reference: &str) -> TokenType {
    if reference == "@self" {
        TokenType::SelfReference
    } else if reference.ends_with('*') {
        TokenType::WildcardReference
    } else if reference.ends_with('}') {
        if reference.contains("..") {
            TokenType::RangeReference
        } else {
            TokenType::ListReference
        }
    } else {
        TokenType::SimpleReference
    }
}

fn parse_reference(token: &Token, kind: TokenType, reference: &str) -> Result<ValueNode, ParseError> {
    let body = reference
        .strip_prefix('@')
        .filter(|body| !body.is_empty())
        .ok_or_else(|| malformed(token, "expected \"@\" followed by a fixture id"))?;

    match kind {
        TokenType::SelfReference => Ok(ValueNode::SelfReference),
        TokenType::WildcardReference => {
            let prefix = body
                .strip_suffix('*')
                .filter(|prefix| !prefix.is_empty())
                .ok_or_else(|| malformed(token, "expected \"@prefix*\""))?;
            Ok(ValueNode::WildcardReference(prefix.to_string()))
        }
        TokenType::RangeReference | TokenType::ListReference => {
            let open = body
                .find('{')
                .ok_or_else(|| malformed(token, "expected \"{\""))?;
            let prefix = &body[..open];
            let inner = body[open + 1..]
                .strip_suffix('}')
                .ok_or_else(|| malformed(token, "expected \"}\""))?;

            if kind == TokenType::RangeReference {
                let (from, to) = inner
                    .split_once("..")
                    .ok_or_else(|| malformed(token, "expected \"{from..to}\""))?;
                let from: i64 = from
                    .trim()
                    .parse()
                    .map_err(|_| malformed(token, "range bounds must be integers"))?;
                let to: i64 = to
                    .trim()
                    .parse()
                    .map_err(|_| malformed(token, "range bounds must be integers"))?;
                if from > to {
                    return Err(malformed(token, "range start is greater than its end"));
                }
                Ok(ValueNode::RangeReference {
                    prefix: prefix.to_string(),
                    from,
                    to,
                })
            } else {
                let items: Vec<String> = inner.split(',').map(|item| item.trim().to_string()).collect();
                if items.iter().any(String::is_empty) {
                    return Err(malformed(token, "empty list element"));
                }
                Ok(ValueNode::ListReference {
                    prefix: prefix.to_string(),
                    items,
                })
            }
        }
        _ => Ok(ValueNode::FixtureReference(body.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::LexError;

    fn parse(raw: &str) -> ValueNode {
        ExpressionParser::default().parse_value(raw).unwrap()
    }

    fn parse_err(raw: &str) -> crate::Error {
        ExpressionParser::default().parse_value(raw).unwrap_err()
    }

    fn lit(s: &str) -> ValueNode {
        ValueNode::literal(s)
    }

    fn boxed(node: ValueNode) -> Box<ValueNode> {
        Box::new(node)
    }

    #[test]
    fn test_plain_text_is_a_literal() {
        assert_eq!(parse("plain text"), lit("plain text"));
        assert_eq!(parse(""), lit(""));
    }

    #[test]
    fn test_function_arguments_are_parsed_recursively() {
        assert_eq!(
            parse("<join([a, <word()>], '-')>"),
            ValueNode::Function {
                name: "join".into(),
                arguments: vec![
                    ValueNode::Array(vec![
                        lit("a"),
                        ValueNode::Function {
                            name: "word".into(),
                            arguments: vec![],
                        },
                    ]),
                    lit("-"),
                ],
            }
        );
    }

    #[test]
    fn test_nested_function_calls_keep_their_depth() {
        assert_eq!(
            parse("<upper(<lower(<identity(x)>)>)>"),
            ValueNode::Function {
                name: "upper".into(),
                arguments: vec![ValueNode::Function {
                    name: "lower".into(),
                    arguments: vec![ValueNode::Function {
                        name: "identity".into(),
                        arguments: vec![lit("x")],
                    }],
                }],
            }
        );
    }

    #[test]
    fn test_mixed_value_becomes_a_list() {
        assert_eq!(
            parse("$username@<{domain}>"),
            ValueNode::List(vec![
                ValueNode::Variable("username".into()),
                lit("@"),
                ValueNode::Parameter("domain".into()),
            ])
        );
    }

    #[test]
    fn test_escaped_values_merge_into_one_literal() {
        assert_eq!(parse(r"\@user0 is \$5"), lit("@user0 is $5"));
    }

    #[test]
    fn test_references() {
        assert_eq!(parse("@user0"), ValueNode::FixtureReference("user0".into()));
        assert_eq!(parse("@self"), ValueNode::SelfReference);
        assert_eq!(parse("@user*"), ValueNode::WildcardReference("user".into()));
        assert_eq!(
            parse("@user{1..3}"),
            ValueNode::RangeReference {
                prefix: "user".into(),
                from: 1,
                to: 3
            }
        );
        assert_eq!(
            parse("@user_{alice, bob}"),
            ValueNode::ListReference {
                prefix: "user_".into(),
                items: vec!["alice".into(), "bob".into()]
            }
        );
        assert_eq!(
            parse("@user{1..2}->email"),
            ValueNode::PropertyReference {
                reference: boxed(ValueNode::RangeReference {
                    prefix: "user".into(),
                    from: 1,
                    to: 2
                }),
                property: "email".into(),
            }
        );
    }

    #[test]
    fn test_optional() {
        assert_eq!(
            parse("80%? <word()> : @user0"),
            ValueNode::Optional {
                percentage: boxed(lit("80")),
                first: boxed(ValueNode::Function {
                    name: "word".into(),
                    arguments: vec![]
                }),
                second: Some(boxed(ValueNode::FixtureReference("user0".into()))),
            }
        );
        assert_eq!(
            parse("50%? yes"),
            ValueNode::Optional {
                percentage: boxed(lit("50")),
                first: boxed(lit("yes")),
                second: None,
            }
        );
    }

    #[test]
    fn test_dynamic_array() {
        assert_eq!(
            parse("3x @tag*"),
            ValueNode::DynamicArray {
                quantifier: boxed(lit("3")),
                element: boxed(ValueNode::WildcardReference("tag".into())),
            }
        );
    }

    #[test]
    fn test_definition_values() {
        let parser = ExpressionParser::default();
        let node = parser
            .parse_definition_value(&serde_json::json!({"n": 3, "tags": ["@tag1", true]}))
            .unwrap();
        assert_eq!(
            node,
            ValueNode::Map(vec![
                ("n".into(), ValueNode::Constant(Value::Integer(3))),
                (
                    "tags".into(),
                    ValueNode::Array(vec![
                        ValueNode::FixtureReference("tag1".into()),
                        ValueNode::Constant(Value::Bool(true)),
                    ])
                ),
            ])
        );
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(
            parse_err("<f(a,,b)>"),
            crate::Error::Parse(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse_err("@user{3..1}"),
            crate::Error::Parse(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse_err("<{ }>"),
            crate::Error::Parse(ParseError::Malformed { .. })
        ));
        assert!(matches!(
            parse_err("[a, , b]"),
            crate::Error::Parse(ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_nested_lex_failure_is_reported() {
        match parse_err("[a, <broken(]") {
            crate::Error::Parse(ParseError::NestedLex { value, source }) => {
                assert_eq!(value, "<broken(");
                assert!(matches!(source, LexError::CouldNotLex { .. }));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_token_sequence() {
        assert_eq!(ExpressionParser::default().parse(&[]), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_determinism_100_iterations() {
        let parser = ExpressionParser::default();
        let input = "50%? <numberBetween(1, <{max}>)> : [@user*, $name]";
        let first = parser.parse_value(input).unwrap();
        for i in 0..100 {
            assert_eq!(first, parser.parse_value(input).unwrap(), "Determinism failure at iteration {}", i);
        }
    }
}
