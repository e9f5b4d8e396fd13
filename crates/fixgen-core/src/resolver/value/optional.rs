use rand::Rng;

use crate::error::{ResolutionError, Result};
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::generator::GenerationContext;
use crate::resolver::{unsupported, ChainableValueResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ValueResolver};
use crate::value::Value;

/// `NN%? first : second`: one draw per resolution, only the chosen branch
/// is resolved
pub struct OptionalResolver;

impl ValueResolver for OptionalResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::Optional {
            percentage,
            first,
            second,
        } = node
        else {
            return Err(unsupported(node));
        };

        let (resolved, set) = env.resolve(percentage, set, context)?.into_parts();
        let chance = resolved
            .as_float()
            .filter(|p| (0.0..=100.0).contains(p))
            .ok_or_else(|| ResolutionError::InvalidPercentage {
                value: format!("\"{}\"", resolved),
            })?;

        let draw = f64::from(context.rng.gen_range(1..=100_u32));
        if draw <= chance {
            env.resolve(first, set, context)
        } else {
            match second {
                Some(second) => env.resolve(second, set, context),
                None => Ok(ResolvedValueWithFixtureSet::new(Value::Null, set)),
            }
        }
    }
}

impl ChainableValueResolver for OptionalResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::Optional { .. })
    }
}
