//! Tokens of the fixture expression language
//!
//! A token is the lexeme of one sub-pattern of a raw value together with its
//! classification. Lexers produce them; the parser consumes them right away.

/// Classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Plain text, kept as-is
    String,
    /// `\@`, `\<`, `\$`, `\\`
    EscapedValue,
    /// `<name(args)>`
    Function,
    /// `<{name}>`
    Parameter,
    /// `$name`
    Variable,
    /// `@id`
    SimpleReference,
    /// `@self`
    SelfReference,
    /// `@prefix*`
    WildcardReference,
    /// `@prefix{1..5}`
    RangeReference,
    /// `@prefix{a, b}`
    ListReference,
    /// `@id->property`
    PropertyReference,
    /// `50%? value : other`
    Optional,
    /// `5x element`
    DynamicArray,
    /// `[a, b]`
    StringArray,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenType::String => "STRING_TYPE",
            TokenType::EscapedValue => "ESCAPED_VALUE_TYPE",
            TokenType::Function => "FUNCTION_TYPE",
            TokenType::Parameter => "PARAMETER_TYPE",
            TokenType::Variable => "VARIABLE_TYPE",
            TokenType::SimpleReference => "SIMPLE_REFERENCE_TYPE",
            TokenType::SelfReference => "SELF_REFERENCE_TYPE",
            TokenType::WildcardReference => "WILDCARD_REFERENCE_TYPE",
            TokenType::RangeReference => "RANGE_REFERENCE_TYPE",
            TokenType::ListReference => "LIST_REFERENCE_TYPE",
            TokenType::PropertyReference => "PROPERTY_REFERENCE_TYPE",
            TokenType::Optional => "OPTIONAL_TYPE",
            TokenType::DynamicArray => "DYNAMIC_ARRAY_TYPE",
            TokenType::StringArray => "STRING_ARRAY_TYPE",
        };
        f.write_str(name)
    }
}

/// A lexeme with its type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenType,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenType) -> Self {
        Token {
            lexeme: lexeme.into(),
            kind,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}) {}", self.kind, self.lexeme)
    }
}
