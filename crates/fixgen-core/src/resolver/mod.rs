//! Resolver chain: turns expression trees into values
//!
//! Each `ChainableValueResolver` handles one or a few node kinds. The
//! `ResolverRegistry` dispatches a node to the first member claiming its
//! kind; a kind nobody claims is a configuration error, not a fallback.
//!
//! Resolution is depth-first and may generate other fixtures on the way, so
//! every resolver takes the current `ResolvedFixtureSet` by value and hands
//! back the (possibly extended) snapshot next to the value.
//!
//! ```text
//! ValueNode ──▶ ResolverRegistry ──▶ XxxResolver ──▶ (Value, ResolvedFixtureSet)
//!                    ▲                    │
//!                    └── nested nodes ────┤
//!                                         └──▶ ObjectGenerator (references)
//! ```

pub mod context;
pub mod parameter;
pub mod value;

use std::collections::BTreeMap;

pub use context::ResolvingContext;
pub use parameter::ParameterBagResolver;
pub use value::{
    ArrayResolver, DynamicArrayResolver, FixtureReferenceResolver, FunctionCallResolver, ListResolver,
    LiteralResolver, OptionalResolver, ParameterResolver, PropertyReferenceResolver, RangeReferenceResolver,
    SelfReferenceResolver, VariableResolver, WildcardReferenceResolver,
};

use crate::definition::FixtureDefinition;
use crate::error::{ResolutionError, Result};
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::function::FunctionRegistry;
use crate::generator::{GenerationContext, ObjectGenerator};
use crate::value::Value;

/// What a resolver may call back into while resolving one fixture's value
pub struct ResolutionEnv<'a> {
    /// Entry point for nested nodes, usually the whole registry
    pub resolver: &'a dyn ValueResolver,
    /// Generates referenced fixtures
    pub generator: &'a dyn ObjectGenerator,
    /// Fixture the value belongs to
    pub fixture: &'a FixtureDefinition,
    /// Values already resolved for this fixture, readable as `$name`
    pub scope: &'a BTreeMap<String, Value>,
}

impl<'a> ResolutionEnv<'a> {
    /// Resolve a child node through the full chain
    pub fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        self.resolver.resolve(node, set, self, context)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedValueWithFixtureSet {
    pub value: Value,
    pub set: ResolvedFixtureSet,
}

impl ResolvedValueWithFixtureSet {
    pub fn new(value: Value, set: ResolvedFixtureSet) -> Self {
        ResolvedValueWithFixtureSet { value, set }
    }

    pub fn into_parts(self) -> (Value, ResolvedFixtureSet) {
        (self.value, self.set)
    }
}

/// Error for a node handed to a resolver that does not claim its kind
pub(crate) fn unsupported(node: &ValueNode) -> crate::Error {
    ResolutionError::ResolverNotFound {
        kind: node.kind().name(),
    }
    .into()
}

pub trait ValueResolver: Send + Sync {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet>;
}

/// Member of the resolver chain
pub trait ChainableValueResolver: ValueResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool;
}

pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn ChainableValueResolver>>,
}

impl ResolverRegistry {
    pub fn new(resolvers: Vec<Box<dyn ChainableValueResolver>>) -> Self {
        ResolverRegistry { resolvers }
    }

    pub fn with_default_resolvers(functions: FunctionRegistry) -> Self {
        ResolverRegistry::new(vec![
            Box::new(LiteralResolver),
            Box::new(ArrayResolver),
            Box::new(ListResolver),
            Box::new(DynamicArrayResolver),
            Box::new(OptionalResolver),
            Box::new(FunctionCallResolver::new(functions)),
            Box::new(ParameterResolver),
            Box::new(VariableResolver),
            Box::new(FixtureReferenceResolver),
            Box::new(SelfReferenceResolver),
            Box::new(WildcardReferenceResolver),
            Box::new(RangeReferenceResolver),
            Box::new(PropertyReferenceResolver),
        ])
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_default_resolvers(FunctionRegistry::with_builtins())
    }
}

impl ValueResolver for ResolverRegistry {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let resolver = self
            .resolvers
            .iter()
            .find(|resolver| resolver.can_resolve(node))
            .ok_or(ResolutionError::ResolverNotFound {
                kind: node.kind().name(),
            })?;

        tracing::trace!(fixture = %env.fixture.id, node = %node, "resolving value");
        resolver.resolve(node, set, env, context)
    }
}
