use crate::error::{ResolutionError, Result};
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::generator::GenerationContext;
use crate::resolver::{unsupported, ChainableValueResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ValueResolver};

/// `<{name}>`, read from the parameters resolved before any fixture
pub struct ParameterResolver;

impl ValueResolver for ParameterResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        _env: &ResolutionEnv<'_>,
        _context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::Parameter(name) = node else {
            return Err(unsupported(node));
        };
        let value = set
            .parameter(name)
            .cloned()
            .ok_or_else(|| ResolutionError::UnknownParameter { name: name.clone() })?;
        Ok(ResolvedValueWithFixtureSet::new(value, set))
    }
}

impl ChainableValueResolver for ParameterResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::Parameter(_))
    }
}

/// `$name`, read from the values already resolved for the current fixture
pub struct VariableResolver;

impl ValueResolver for VariableResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        _context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::Variable(name) = node else {
            return Err(unsupported(node));
        };
        let value = env
            .scope
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::UnknownVariable { name: name.clone() })?;
        Ok(ResolvedValueWithFixtureSet::new(value, set))
    }
}

impl ChainableValueResolver for VariableResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::Variable(_))
    }
}
