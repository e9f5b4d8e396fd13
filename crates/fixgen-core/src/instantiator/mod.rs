//! Instantiator chain: creates the object of a fixture
//!
//! Strategies implement `ChainableInstantiator::create_instance`; the provided
//! `instantiate` method is the shared wrapper that rewraps foreign failures,
//! passes instantiation failures through unchanged and folds the new instance
//! into the fixture set.
//!
//! `InstantiatorRegistry` tries strategies in order and keeps the first
//! success. When all of them fail it reports the last failure; every earlier
//! one is logged at debug level as the chain falls through.

mod strategies;

use std::collections::BTreeMap;

pub use strategies::{
    MatchingConstructorInstantiator, NoConstructorInstantiator, StaticFactoryInstantiator, ZeroArgumentInstantiator,
};

use crate::class::{ClassDescriptor, ClassRegistry, ObjectInstance, ParameterDescriptor};
use crate::definition::FixtureDefinition;
use crate::error::InstantiationError;
use crate::fixture_set::ResolvedFixtureSet;
use crate::value::Value;

/// Boxed failure of a strategy; anything but an `InstantiationError` is
/// rewrapped as `InstantiationError::CreationFailed`
pub type CreationError = Box<dyn std::error::Error + Send + Sync>;

/// Constructor or factory arguments after resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedArguments {
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

/// Everything a strategy needs to build one instance
pub struct InstantiationRequest<'a> {
    pub fixture: &'a FixtureDefinition,
    pub class: &'a ClassDescriptor,
    /// Present when the fixture declares constructor or factory arguments
    pub arguments: Option<&'a ResolvedArguments>,
}

pub trait ChainableInstantiator: Send + Sync {
    fn name(&self) -> &'static str;

    fn create_instance(&self, request: &InstantiationRequest<'_>) -> Result<ObjectInstance, CreationError>;

    fn instantiate(
        &self,
        request: &InstantiationRequest<'_>,
        set: ResolvedFixtureSet,
    ) -> Result<ResolvedFixtureSet, InstantiationError> {
        let fixture_id = &request.fixture.id;
        match self.create_instance(request) {
            Ok(instance) => Ok(set.with_objects([(fixture_id.clone(), instance)])),
            Err(err) => match err.downcast::<InstantiationError>() {
                Ok(domain) => Err(*domain),
                Err(source) => Err(InstantiationError::CreationFailed {
                    fixture_id: fixture_id.clone(),
                    source,
                }),
            },
        }
    }
}

pub struct InstantiatorRegistry {
    instantiators: Vec<Box<dyn ChainableInstantiator>>,
}

impl InstantiatorRegistry {
    pub fn new(instantiators: Vec<Box<dyn ChainableInstantiator>>) -> Self {
        InstantiatorRegistry { instantiators }
    }

    pub fn with_default_instantiators() -> Self {
        InstantiatorRegistry::new(vec![
            Box::new(StaticFactoryInstantiator),
            Box::new(MatchingConstructorInstantiator),
            Box::new(ZeroArgumentInstantiator),
            Box::new(NoConstructorInstantiator),
        ])
    }

    pub fn len(&self) -> usize {
        self.instantiators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instantiators.is_empty()
    }

    /// Instantiate `fixture` and return the set extended with its instance
    pub fn instantiate(
        &self,
        fixture: &FixtureDefinition,
        classes: &ClassRegistry,
        arguments: Option<&ResolvedArguments>,
        set: ResolvedFixtureSet,
    ) -> Result<ResolvedFixtureSet, InstantiationError> {
        let class = classes
            .get(&fixture.class)
            .ok_or_else(|| InstantiationError::UnknownClass {
                fixture_id: fixture.id.clone(),
                class: fixture.class.clone(),
            })?;
        let request = InstantiationRequest {
            fixture,
            class,
            arguments,
        };

        let mut failure: Option<InstantiationError> = None;
        for instantiator in &self.instantiators {
            match instantiator.instantiate(&request, set.clone()) {
                Ok(next) => {
                    tracing::trace!(fixture = %fixture.id, instantiator = instantiator.name(), "instantiated");
                    return Ok(next);
                }
                Err(err) => {
                    tracing::debug!(
                        fixture = %fixture.id,
                        instantiator = instantiator.name(),
                        reason = %err,
                        "instantiator failed, trying the next one"
                    );
                    failure = Some(err);
                }
            }
        }

        Err(InstantiationError::NoSuitableInstantiator {
            fixture_id: fixture.id.clone(),
            source: failure.map(Box::new),
        })
    }
}

impl Default for InstantiatorRegistry {
    fn default() -> Self {
        Self::with_default_instantiators()
    }
}

/// Bind arguments to parameters: named by name, positional by order,
/// defaults for the rest
pub(crate) fn bind_arguments(
    fixture_id: &str,
    parameters: &[ParameterDescriptor],
    arguments: Option<&ResolvedArguments>,
) -> Result<BTreeMap<String, Value>, CreationError> {
    let mut supplied: BTreeMap<String, Value> = BTreeMap::new();
    match arguments {
        None => {}
        Some(ResolvedArguments::Positional(values)) => {
            if values.len() > parameters.len() {
                return Err(Box::new(InstantiationError::TooManyArguments {
                    fixture_id: fixture_id.to_string(),
                    expected: parameters.len(),
                    given: values.len(),
                }));
            }
            for (parameter, value) in parameters.iter().zip(values) {
                supplied.insert(parameter.name.clone(), value.clone());
            }
        }
        Some(ResolvedArguments::Named(values)) => {
            for (name, value) in values {
                if !parameters.iter().any(|p| &p.name == name) {
                    return Err(Box::new(InstantiationError::UnexpectedArgument {
                        fixture_id: fixture_id.to_string(),
                        argument: name.clone(),
                    }));
                }
                supplied.insert(name.clone(), value.clone());
            }
        }
    }

    let mut fields = BTreeMap::new();
    for parameter in parameters {
        let value = match (supplied.remove(&parameter.name), &parameter.default) {
            (Some(value), _) => value,
            (None, Some(default)) => Value::from_json(default),
            (None, None) => {
                return Err(Box::new(InstantiationError::MissingArgument {
                    fixture_id: fixture_id.to_string(),
                    parameter: parameter.name.clone(),
                }))
            }
        };
        parameter.check(&value)?;
        fields.insert(parameter.name.clone(), value);
    }
    Ok(fields)
}
