//! JSON fixture files
//!
//! ```json
//! {
//!   "options":    { "seed": 42 },
//!   "parameters": { "domain": "example.org" },
//!   "classes":    { "User": { "constructor": [{ "name": "username" }], "properties": ["email"] } },
//!   "fixtures":   { "User": { "user{1..3}": { "__construct": ["<current()>"], "email": "$username@<{domain}>" } } }
//! }
//! ```
//!
//! Fixtures are grouped by class and keep their declaration order, as do the
//! properties of each fixture. A class used by fixtures but not declared
//! under `"classes"` accepts any property and needs no constructor.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::class::{ClassDescriptor, ClassRegistry};
use crate::definition::{expand_id_template, ConstructorDefinition, FixtureBag, FixtureDefinition, MethodArguments};
use crate::error::LoadError;
use crate::generator::{GenerationOptions, CONSTRUCTOR_FIELD};

/// Everything a generation run needs
#[derive(Debug, Clone, Default)]
pub struct FixtureFile {
    pub options: GenerationOptions,
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub classes: ClassRegistry,
    pub fixtures: FixtureBag,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    #[serde(default)]
    options: GenerationOptions,
    #[serde(default)]
    parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    classes: BTreeMap<String, ClassDescriptor>,
    #[serde(default)]
    fixtures: serde_json::Map<String, serde_json::Value>,
}

pub fn load_str(json: &str) -> Result<FixtureFile, LoadError> {
    let raw: RawFile = serde_json::from_str(json)?;

    let mut classes = ClassRegistry::new();
    for (name, mut class) in raw.classes {
        class.name = name;
        validate_class(&class)?;
        classes.register(class);
    }

    let mut fixtures = FixtureBag::new();
    for (class, group) in &raw.fixtures {
        let group = group.as_object().ok_or_else(|| LoadError::InvalidClass {
            class: class.clone(),
            reason: "expected an object of fixtures".to_string(),
        })?;
        if !classes.contains(class) {
            classes.register(ClassDescriptor::new(class.as_str()));
        }
        let descriptor = classes.get(class);

        for (template, body) in group {
            for (id, current) in expand_id_template(template)? {
                let mut fixture = load_fixture(&id, class, descriptor, body)?;
                fixture.value_for_current = current;
                fixtures.insert(fixture)?;
            }
        }
    }

    tracing::debug!(
        fixtures = fixtures.len(),
        classes = classes.len(),
        parameters = raw.parameters.len(),
        "loaded fixture file"
    );
    Ok(FixtureFile {
        options: raw.options,
        parameters: raw.parameters,
        classes,
        fixtures,
    })
}

fn validate_class(class: &ClassDescriptor) -> Result<(), LoadError> {
    let signatures = class
        .constructor
        .iter()
        .chain(class.factories.values());
    for parameters in signatures {
        for (i, parameter) in parameters.iter().enumerate() {
            if parameters[..i].iter().any(|p| p.name == parameter.name) {
                return Err(LoadError::InvalidClass {
                    class: class.name.clone(),
                    reason: format!("the parameter \"{}\" is declared twice", parameter.name),
                });
            }
        }
    }
    Ok(())
}

fn load_fixture(
    id: &str,
    class: &str,
    descriptor: Option<&ClassDescriptor>,
    body: &serde_json::Value,
) -> Result<FixtureDefinition, LoadError> {
    let mut fixture = FixtureDefinition::new(id, class);
    let entries = match body {
        serde_json::Value::Null => return Ok(fixture),
        serde_json::Value::Object(entries) => entries,
        _ => {
            return Err(LoadError::InvalidFixture {
                id: id.to_string(),
                reason: "expected an object of properties".to_string(),
            })
        }
    };

    for (key, value) in entries {
        if key == CONSTRUCTOR_FIELD {
            fixture.constructor = load_constructor(id, descriptor, value)?;
        } else {
            fixture = fixture.with_property(key.as_str(), value.clone());
        }
    }
    Ok(fixture)
}

fn load_constructor(
    id: &str,
    descriptor: Option<&ClassDescriptor>,
    value: &serde_json::Value,
) -> Result<ConstructorDefinition, LoadError> {
    match value {
        serde_json::Value::Null => Ok(ConstructorDefinition::Default),
        serde_json::Value::Bool(false) => Ok(ConstructorDefinition::Disabled),
        serde_json::Value::Array(arguments) => Ok(ConstructorDefinition::Arguments(MethodArguments::Positional(
            arguments.clone(),
        ))),
        serde_json::Value::Object(entries) => {
            if let Some((method, serde_json::Value::Array(arguments))) = single_entry(entries) {
                let is_factory = descriptor.is_some_and(|class| class.factories.contains_key(method));
                if is_factory {
                    return Ok(ConstructorDefinition::Factory {
                        method: method.clone(),
                        arguments: MethodArguments::Positional(arguments.clone()),
                    });
                }
            }
            Ok(ConstructorDefinition::Arguments(MethodArguments::Named(
                entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            )))
        }
        _ => Err(LoadError::InvalidFixture {
            id: id.to_string(),
            reason: format!("\"{}\" must be false, an array or an object", CONSTRUCTOR_FIELD),
        }),
    }
}

fn single_entry(entries: &serde_json::Map<String, serde_json::Value>) -> Option<(&String, &serde_json::Value)> {
    let mut iter = entries.iter();
    match (iter.next(), iter.next()) {
        (Some(entry), None) => Some(entry),
        _ => None,
    }
}
