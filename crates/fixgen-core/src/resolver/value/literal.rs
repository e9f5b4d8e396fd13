use crate::error::Result;
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::generator::GenerationContext;
use crate::resolver::{unsupported, ChainableValueResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ValueResolver};
use crate::value::Value;

/// Text and scalar constants, returned unchanged
pub struct LiteralResolver;

impl ValueResolver for LiteralResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        _env: &ResolutionEnv<'_>,
        _context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let value = match node {
            ValueNode::Literal(text) => Value::String(text.clone()),
            ValueNode::Constant(value) => value.clone(),
            _ => return Err(unsupported(node)),
        };
        Ok(ResolvedValueWithFixtureSet::new(value, set))
    }
}

impl ChainableValueResolver for LiteralResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::Literal(_) | ValueNode::Constant(_))
    }
}
