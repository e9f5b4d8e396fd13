//! Class model: what fixtures are instantiated as
//!
//! A `ClassDescriptor` tells the instantiator chain how a class may be
//! constructed (constructor, named factories, or no constructor at all) and
//! tells the hydrator which properties it accepts.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::value::{Value, ValueKind};

/// One constructor or factory parameter
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: Option<ValueKind>,
    /// Value used when the fixture does not supply the argument
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ParameterDescriptor {
            name: name.into(),
            kind: None,
            default: None,
        }
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Check a supplied value against the declared kind
    pub fn check(&self, value: &Value) -> Result<(), ArgumentTypeError> {
        match self.kind {
            Some(kind) if !value.is_compatible_with(kind) => Err(ArgumentTypeError {
                parameter: self.name.clone(),
                expected: kind,
                actual: value.kind(),
            }),
            _ => Ok(()),
        }
    }
}

/// A supplied argument does not match the declared parameter kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The argument \"{parameter}\" expects a {expected} value, got {actual}")]
pub struct ArgumentTypeError {
    pub parameter: String,
    pub expected: ValueKind,
    pub actual: ValueKind,
}

fn default_instantiable_without_constructor() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassDescriptor {
    /// Filled from the registry key when loaded from a file
    #[serde(default)]
    pub name: String,
    /// `None` when the class has no constructor
    #[serde(default)]
    pub constructor: Option<Vec<ParameterDescriptor>>,
    #[serde(default)]
    pub factories: BTreeMap<String, Vec<ParameterDescriptor>>,
    /// Accepted properties; empty means any property is accepted
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default = "default_instantiable_without_constructor")]
    pub instantiable_without_constructor: bool,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        ClassDescriptor {
            name: name.into(),
            constructor: None,
            factories: BTreeMap::new(),
            properties: Vec::new(),
            instantiable_without_constructor: true,
        }
    }

    pub fn with_constructor(mut self, parameters: Vec<ParameterDescriptor>) -> Self {
        self.constructor = Some(parameters);
        self
    }

    pub fn with_factory(mut self, method: impl Into<String>, parameters: Vec<ParameterDescriptor>) -> Self {
        self.factories.insert(method.into(), parameters);
        self
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_instantiable_without_constructor(mut self, allowed: bool) -> Self {
        self.instantiable_without_constructor = allowed;
        self
    }

    /// Whether `name` may be written by the hydrator
    pub fn accepts_property(&self, name: &str) -> bool {
        if self.properties.is_empty() || self.properties.iter().any(|p| p == name) {
            return true;
        }
        self.constructor
            .as_ref()
            .map(|parameters| parameters.iter().any(|p| p.name == name))
            .unwrap_or(false)
    }
}

/// A constructed fixture object
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstance {
    pub class: String,
    pub fields: BTreeMap<String, Value>,
}

impl ObjectInstance {
    pub fn new(class: impl Into<String>) -> Self {
        ObjectInstance {
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_fields(class: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        ObjectInstance {
            class: class.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::json!({ "class": self.class, "fields": fields })
    }
}

/// Class descriptors by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassRegistry {
    classes: BTreeMap<String, ClassDescriptor>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassDescriptor) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn with(mut self, class: ClassDescriptor) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassDescriptor> for ClassRegistry {
    fn from_iter<T: IntoIterator<Item = ClassDescriptor>>(iter: T) -> Self {
        let mut registry = ClassRegistry::new();
        for class in iter {
            registry.register(class);
        }
        registry
    }
}
