//! Error types for fixture generation
//!
//! All fallible operations return `Result<T, Error>`.
//! Every stage of the pipeline (lex, parse, resolve, instantiate, hydrate)
//! owns one error kind; `Error` wraps them, and `Error::Generation` records
//! which fixture and field was being built when the failure happened.

use std::collections::BTreeMap;

use thiserror::Error;

/// No lexer could tokenize a raw value, or a lexer rejected it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// Raised by the lexer chain once every member has failed
    #[error("Could not lex the value \"{value}\"")]
    CouldNotLex {
        value: String,
        #[source]
        source: Option<Box<LexError>>,
    },

    /// The lexer does not handle values of this shape
    #[error("{lexer} does not handle the value \"{value}\"")]
    Unrecognized { lexer: &'static str, value: String },

    /// The value has a recognised shape but is malformed
    #[error("Malformed value \"{value}\" at offset {offset}: {reason}")]
    Malformed {
        value: String,
        offset: usize,
        reason: String,
    },
}

/// A token sequence does not form a valid expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Cannot parse an empty token sequence")]
    Empty,

    #[error("Invalid {kind} token \"{lexeme}\": {reason}")]
    Malformed {
        kind: crate::expression::TokenType,
        lexeme: String,
        reason: String,
    },

    #[error("Could not lex the nested value \"{value}\"")]
    NestedLex {
        value: String,
        #[source]
        source: LexError,
    },
}

/// A resolution key was entered again while still being resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Circular reference detected for the key \"{}\" (resolving: {})",
    .key,
    render_counts(.resolving)
)]
pub struct CircularReferenceError {
    pub key: String,
    pub resolving: BTreeMap<String, u32>,
}

fn render_counts(resolving: &BTreeMap<String, u32>) -> String {
    resolving
        .iter()
        .map(|(key, count)| format!("{}: {}", key, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure reported by a fixture function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FunctionError {
    pub message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        FunctionError {
            message: message.into(),
        }
    }
}

/// A value resolver could not produce a value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// No resolver in the chain claims this expression kind
    #[error("No resolver registered for {kind} values")]
    ResolverNotFound { kind: &'static str },

    #[error("Unknown function \"{name}\"")]
    UnknownFunction { name: String },

    #[error("Call to \"{name}\" failed")]
    FunctionCallFailed {
        name: String,
        #[source]
        source: FunctionError,
    },

    #[error("Could not find the parameter \"{name}\"")]
    UnknownParameter { name: String },

    #[error("Could not find the variable \"{name}\" in the fixture scope")]
    UnknownVariable { name: String },

    #[error("Could not find the fixture \"{id}\"")]
    FixtureNotFound { id: String },

    #[error("No fixture matches the reference \"{pattern}\"")]
    NoMatchingFixture { pattern: String },

    #[error("The fixture \"{id}\" has no property \"{property}\"")]
    PropertyNotFound { id: String, property: String },

    #[error("Invalid quantifier {value}: expected an integer between 0 and 10000")]
    InvalidQuantifier { value: String },

    #[error("Invalid percentage {value}: expected a number between 0 and 100")]
    InvalidPercentage { value: String },
}

/// Every instantiation strategy failed, or one failed for good
#[derive(Debug, Error)]
pub enum InstantiationError {
    #[error("The class \"{class}\" of the fixture \"{fixture_id}\" is not registered")]
    UnknownClass { fixture_id: String, class: String },

    /// The strategy does not apply to this fixture
    #[error("{instantiator} cannot instantiate the fixture \"{fixture_id}\": {reason}")]
    NotApplicable {
        instantiator: &'static str,
        fixture_id: String,
        reason: String,
    },

    #[error("The class \"{class}\" has no factory \"{method}\" (fixture \"{fixture_id}\")")]
    UnknownFactory {
        fixture_id: String,
        class: String,
        method: String,
    },

    #[error("Missing the required argument \"{parameter}\" to instantiate the fixture \"{fixture_id}\"")]
    MissingArgument {
        fixture_id: String,
        parameter: String,
    },

    #[error("Unexpected argument \"{argument}\" for the fixture \"{fixture_id}\"")]
    UnexpectedArgument {
        fixture_id: String,
        argument: String,
    },

    #[error("Too many arguments for the fixture \"{fixture_id}\": expected at most {expected}, got {given}")]
    TooManyArguments {
        fixture_id: String,
        expected: usize,
        given: usize,
    },

    /// A non-instantiation failure raised while creating the instance
    #[error("Could not create the instance of the fixture \"{fixture_id}\"")]
    CreationFailed {
        fixture_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No suitable instantiator found for the fixture \"{fixture_id}\"")]
    NoSuitableInstantiator {
        fixture_id: String,
        #[source]
        source: Option<Box<InstantiationError>>,
    },
}

/// A resolved property could not be applied onto an instance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrationError {
    #[error("The class \"{class}\" has no property \"{property}\" (fixture \"{fixture_id}\")")]
    UnknownProperty {
        fixture_id: String,
        class: String,
        property: String,
    },

    #[error("Cannot hydrate the fixture \"{fixture_id}\": it has not been instantiated")]
    NotInstantiated { fixture_id: String },
}

/// Fixture file could not be turned into definitions
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Invalid fixture file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid fixture \"{id}\": {reason}")]
    InvalidFixture { id: String, reason: String },

    #[error("Invalid class \"{class}\": {reason}")]
    InvalidClass { class: String, reason: String },

    #[error("Invalid fixture id template \"{template}\": {reason}")]
    InvalidIdTemplate { template: String, reason: String },

    #[error("The fixture \"{id}\" is defined more than once")]
    DuplicateFixture { id: String },
}

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    CircularReference(#[from] CircularReferenceError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Instantiation(#[from] InstantiationError),

    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// Failure raised while building one fixture
    #[error(
        "An error occurred while generating the fixture \"{}\"{}",
        .fixture_id,
        render_field(.field)
    )]
    Generation {
        fixture_id: String,
        field: Option<String>,
        #[source]
        source: Box<Error>,
    },
}

fn render_field(field: &Option<String>) -> String {
    match field {
        Some(field) => format!(" (field \"{}\")", field),
        None => String::new(),
    }
}

impl Error {
    /// Wrap a failure with the fixture (and field) being generated
    pub fn generation(fixture_id: &str, field: Option<&str>, source: Error) -> Self {
        Error::Generation {
            fixture_id: fixture_id.to_string(),
            field: field.map(str::to_string),
            source: Box::new(source),
        }
    }

    /// Walk through `Generation` layers down to the originating failure
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Generation { source, .. } = current {
            current = source;
        }
        current
    }

    /// The fixture ids of every `Generation` layer, outermost first
    pub fn fixture_trail(&self) -> Vec<&str> {
        let mut trail = Vec::new();
        let mut current = self;
        while let Error::Generation {
            fixture_id, source, ..
        } = current
        {
            trail.push(fixture_id.as_str());
            current = source;
        }
        trail
    }

    pub fn as_circular_reference(&self) -> Option<&CircularReferenceError> {
        match self.root_cause() {
            Error::CircularReference(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for fixgen operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_message() {
        let err = LexError::CouldNotLex {
            value: "".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "Could not lex the value \"\"");
    }

    #[test]
    fn test_circular_reference_message_lists_counts() {
        let mut resolving = BTreeMap::new();
        resolving.insert("a".to_string(), 2);
        resolving.insert("b".to_string(), 1);
        let err = CircularReferenceError {
            key: "a".into(),
            resolving,
        };
        let msg = err.to_string();
        assert!(msg.contains("\"a\""));
        assert!(msg.contains("a: 2, b: 1"));
    }

    #[test]
    fn test_root_cause_walks_generation_layers() {
        let leaf = Error::from(ResolutionError::UnknownFunction { name: "nope".into() });
        let inner = Error::generation("b", Some("friend"), leaf);
        let outer = Error::generation("a", None, inner);

        assert_eq!(outer.fixture_trail(), vec!["a", "b"]);
        assert!(matches!(
            outer.root_cause(),
            Error::Resolution(ResolutionError::UnknownFunction { name }) if name == "nope"
        ));
        assert!(outer.to_string().contains("\"a\""));
        assert!(outer.as_circular_reference().is_none());
    }

    #[test]
    fn test_generation_message_names_field() {
        let err = Error::generation(
            "user1",
            Some("email"),
            ResolutionError::UnknownVariable { name: "x".into() }.into(),
        );
        assert_eq!(
            err.to_string(),
            "An error occurred while generating the fixture \"user1\" (field \"email\")"
        );
    }
}
