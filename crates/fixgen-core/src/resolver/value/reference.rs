//! Fixture references: `@id`, `@self`, `@prefix*`, `@prefix{1..5}`,
//! `@prefix{a, b}` and `<reference>->property`
//!
//! A reference resolves to `Value::Object(id)` once the referenced fixture is
//! in the set. Generating it (or finding it already generated) is left to the
//! `ObjectGenerator`, which owns cycle detection.

use rand::Rng;

use crate::error::{ResolutionError, Result};
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::generator::GenerationContext;
use crate::resolver::{unsupported, ChainableValueResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ValueResolver};
use crate::value::Value;

fn generate_reference(
    id: &str,
    set: ResolvedFixtureSet,
    env: &ResolutionEnv<'_>,
    context: &mut GenerationContext,
) -> Result<ResolvedValueWithFixtureSet> {
    let set = env.generator.generate(id, set, context)?;
    Ok(ResolvedValueWithFixtureSet::new(Value::Object(id.to_string()), set))
}

/// Pick one of `candidates` uniformly and generate it.
///
/// The fixture being generated and fixtures still on the resolution stack are
/// never picked.
fn pick_reference(
    candidates: Vec<String>,
    pattern: &ValueNode,
    set: ResolvedFixtureSet,
    env: &ResolutionEnv<'_>,
    context: &mut GenerationContext,
) -> Result<ResolvedValueWithFixtureSet> {
    let candidates: Vec<String> = candidates
        .into_iter()
        .filter(|id| *id != env.fixture.id && set.fixtures().contains(id) && context.resolving.count(id) == 0)
        .collect();
    if candidates.is_empty() {
        return Err(ResolutionError::NoMatchingFixture {
            pattern: pattern.to_string(),
        }
        .into());
    }

    let index = context.rng.gen_range(0..candidates.len());
    tracing::trace!(pattern = %pattern, picked = %candidates[index], "picked reference");
    generate_reference(&candidates[index], set, env, context)
}

pub struct FixtureReferenceResolver;

impl ValueResolver for FixtureReferenceResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::FixtureReference(id) = node else {
            return Err(unsupported(node));
        };
        generate_reference(id, set, env, context)
    }
}

impl ChainableValueResolver for FixtureReferenceResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::FixtureReference(_))
    }
}

/// `@self`: the fixture being generated, already instantiated
pub struct SelfReferenceResolver;

impl ValueResolver for SelfReferenceResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        _context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        if !matches!(node, ValueNode::SelfReference) {
            return Err(unsupported(node));
        }
        Ok(ResolvedValueWithFixtureSet::new(
            Value::Object(env.fixture.id.clone()),
            set,
        ))
    }
}

impl ChainableValueResolver for SelfReferenceResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::SelfReference)
    }
}

pub struct WildcardReferenceResolver;

impl ValueResolver for WildcardReferenceResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::WildcardReference(prefix) = node else {
            return Err(unsupported(node));
        };
        let candidates = set
            .fixtures()
            .ids()
            .filter(|id| id.starts_with(prefix.as_str()))
            .map(str::to_string)
            .collect();
        pick_reference(candidates, node, set, env, context)
    }
}

impl ChainableValueResolver for WildcardReferenceResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::WildcardReference(_))
    }
}

/// Whether `id` is `prefix` followed by an integer in `from..=to`, written
/// the way `format!` would write it (`user7`, not `user07`)
fn in_range(id: &str, prefix: &str, from: i64, to: i64) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.parse::<i64>().ok().filter(|n| n.to_string() == rest))
        .map_or(false, |n| (from..=to).contains(&n))
}

/// `@prefix{1..5}` and `@prefix{a, b}`
///
/// Range candidates come from the ids in the bag, so the width of the range
/// does not matter.
pub struct RangeReferenceResolver;

impl ValueResolver for RangeReferenceResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let candidates = match node {
            ValueNode::RangeReference { prefix, from, to } => set
                .fixtures()
                .ids()
                .filter(|id| in_range(id, prefix, *from, *to))
                .map(str::to_string)
                .collect(),
            ValueNode::ListReference { prefix, items } => {
                items.iter().map(|item| format!("{}{}", prefix, item)).collect()
            }
            _ => return Err(unsupported(node)),
        };
        pick_reference(candidates, node, set, env, context)
    }
}

impl ChainableValueResolver for RangeReferenceResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(
            node,
            ValueNode::RangeReference { .. } | ValueNode::ListReference { .. }
        )
    }
}

/// `<reference>->property`: generate the target, then read one of its fields
pub struct PropertyReferenceResolver;

impl ValueResolver for PropertyReferenceResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::PropertyReference { reference, property } = node else {
            return Err(unsupported(node));
        };

        let (target, set) = env.resolve(reference, set, context)?.into_parts();
        let not_found = || ResolutionError::PropertyNotFound {
            id: target.to_string(),
            property: property.clone(),
        };
        let id = target.as_object().ok_or_else(not_found)?;

        // The current fixture is only partially hydrated; its scope is ahead of the set
        let from_scope = if id == env.fixture.id {
            env.scope.get(property).cloned()
        } else {
            None
        };
        let value = from_scope
            .or_else(|| set.object(id).and_then(|o| o.field(property)).cloned())
            .ok_or_else(|| ResolutionError::PropertyNotFound {
                id: id.to_string(),
                property: property.clone(),
            })?;
        Ok(ResolvedValueWithFixtureSet::new(value, set))
    }
}

impl ChainableValueResolver for PropertyReferenceResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::PropertyReference { .. })
    }
}
