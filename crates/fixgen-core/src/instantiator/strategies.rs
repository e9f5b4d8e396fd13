//! Default instantiation strategies, in chain order

use std::collections::BTreeMap;

use super::{bind_arguments, ChainableInstantiator, CreationError, InstantiationRequest};
use crate::class::ObjectInstance;
use crate::definition::ConstructorDefinition;
use crate::error::InstantiationError;
use crate::value::Value;

fn not_applicable(instantiator: &'static str, request: &InstantiationRequest<'_>, reason: &str) -> CreationError {
    Box::new(InstantiationError::NotApplicable {
        instantiator,
        fixture_id: request.fixture.id.clone(),
        reason: reason.to_string(),
    })
}

/// Named factory of the class, for `{"__construct": {"create": [...]}}`
pub struct StaticFactoryInstantiator;

impl ChainableInstantiator for StaticFactoryInstantiator {
    fn name(&self) -> &'static str {
        "StaticFactoryInstantiator"
    }

    fn create_instance(&self, request: &InstantiationRequest<'_>) -> Result<ObjectInstance, CreationError> {
        let ConstructorDefinition::Factory { method, .. } = &request.fixture.constructor else {
            return Err(not_applicable(self.name(), request, "no factory is declared"));
        };
        let parameters = request.class.factories.get(method).ok_or_else(|| {
            Box::new(InstantiationError::UnknownFactory {
                fixture_id: request.fixture.id.clone(),
                class: request.class.name.clone(),
                method: method.clone(),
            }) as CreationError
        })?;

        let fields = bind_arguments(&request.fixture.id, parameters, request.arguments)?;
        Ok(ObjectInstance::with_fields(request.class.name.clone(), fields))
    }
}

/// Class constructor, with arguments bound by name or position
pub struct MatchingConstructorInstantiator;

impl ChainableInstantiator for MatchingConstructorInstantiator {
    fn name(&self) -> &'static str {
        "MatchingConstructorInstantiator"
    }

    fn create_instance(&self, request: &InstantiationRequest<'_>) -> Result<ObjectInstance, CreationError> {
        match request.fixture.constructor {
            ConstructorDefinition::Default | ConstructorDefinition::Arguments(_) => {}
            _ => return Err(not_applicable(self.name(), request, "the constructor is not used")),
        }
        let parameters = request
            .class
            .constructor
            .as_ref()
            .ok_or_else(|| not_applicable(self.name(), request, "the class has no constructor"))?;

        let fields = bind_arguments(&request.fixture.id, parameters, request.arguments)?;
        Ok(ObjectInstance::with_fields(request.class.name.clone(), fields))
    }
}

/// Constructor called without arguments
pub struct ZeroArgumentInstantiator;

impl ChainableInstantiator for ZeroArgumentInstantiator {
    fn name(&self) -> &'static str {
        "ZeroArgumentInstantiator"
    }

    fn create_instance(&self, request: &InstantiationRequest<'_>) -> Result<ObjectInstance, CreationError> {
        if request.fixture.constructor != ConstructorDefinition::Default {
            return Err(not_applicable(self.name(), request, "constructor arguments are declared"));
        }

        let mut fields = BTreeMap::new();
        for parameter in request.class.constructor.iter().flatten() {
            let default = parameter.default.as_ref().ok_or_else(|| {
                not_applicable(
                    self.name(),
                    request,
                    &format!("the constructor requires \"{}\"", parameter.name),
                )
            })?;
            fields.insert(parameter.name.clone(), Value::from_json(default));
        }
        Ok(ObjectInstance::with_fields(request.class.name.clone(), fields))
    }
}

/// Bare instance, no constructor involved
pub struct NoConstructorInstantiator;

impl ChainableInstantiator for NoConstructorInstantiator {
    fn name(&self) -> &'static str {
        "NoConstructorInstantiator"
    }

    fn create_instance(&self, request: &InstantiationRequest<'_>) -> Result<ObjectInstance, CreationError> {
        match request.fixture.constructor {
            ConstructorDefinition::Default | ConstructorDefinition::Disabled => {}
            _ => return Err(not_applicable(self.name(), request, "constructor arguments are declared")),
        }
        if !request.class.instantiable_without_constructor {
            return Err(not_applicable(
                self.name(),
                request,
                "the class cannot be created without its constructor",
            ));
        }
        Ok(ObjectInstance::new(request.class.name.clone()))
    }
}
