use crate::error::{ResolutionError, Result};
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::function::{CallContext, FunctionRegistry};
use crate::generator::GenerationContext;
use crate::resolver::{unsupported, ChainableValueResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ValueResolver};
use crate::value::Value;

/// `<name(arguments)>`: arguments first, left to right, then the call
pub struct FunctionCallResolver {
    functions: FunctionRegistry,
}

impl FunctionCallResolver {
    pub fn new(functions: FunctionRegistry) -> Self {
        FunctionCallResolver { functions }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }
}

impl ValueResolver for FunctionCallResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::Function { name, arguments } = node else {
            return Err(unsupported(node));
        };
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| ResolutionError::UnknownFunction { name: name.clone() })?;

        let mut set = set;
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let (value, next) = env.resolve(argument, set, context)?.into_parts();
            values.push(value);
            set = next;
        }

        let mut call = CallContext {
            rng: &mut context.rng,
            current: env.fixture.value_for_current.as_deref(),
            locale: context.locale.as_deref(),
        };
        let value = function
            .call(&values, &mut call)
            .map_err(|source| ResolutionError::FunctionCallFailed {
                name: name.clone(),
                source,
            })?;
        Ok(ResolvedValueWithFixtureSet::new(value, set))
    }
}

impl ChainableValueResolver for FunctionCallResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::Function { .. })
    }
}
