//! Arrays, maps, concatenated lists and dynamic arrays

use std::collections::BTreeMap;

use crate::error::{ResolutionError, Result};
use crate::expression::ValueNode;
use crate::fixture_set::ResolvedFixtureSet;
use crate::generator::GenerationContext;
use crate::resolver::{unsupported, ChainableValueResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ValueResolver};
use crate::value::Value;

/// Resolve `nodes` one after the other, threading the set through
fn resolve_all(
    nodes: &[ValueNode],
    mut set: ResolvedFixtureSet,
    env: &ResolutionEnv<'_>,
    context: &mut GenerationContext,
) -> Result<(Vec<Value>, ResolvedFixtureSet)> {
    let mut values = Vec::with_capacity(nodes.len());
    for node in nodes {
        let (value, next) = env.resolve(node, set, context)?.into_parts();
        values.push(value);
        set = next;
    }
    Ok((values, set))
}

/// `[a, b]` and definition arrays/objects, element by element in source order
pub struct ArrayResolver;

impl ValueResolver for ArrayResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        match node {
            ValueNode::Array(elements) => {
                let (values, set) = resolve_all(elements, set, env, context)?;
                Ok(ResolvedValueWithFixtureSet::new(Value::Array(values), set))
            }
            ValueNode::Map(entries) => {
                let mut set = set;
                let mut map = BTreeMap::new();
                for (key, entry) in entries {
                    let (value, next) = env.resolve(entry, set, context)?.into_parts();
                    map.insert(key.clone(), value);
                    set = next;
                }
                Ok(ResolvedValueWithFixtureSet::new(Value::Map(map), set))
            }
            _ => Err(unsupported(node)),
        }
    }
}

impl ChainableValueResolver for ArrayResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::Array(_) | ValueNode::Map(_))
    }
}

/// Several sub-patterns of one value, concatenated as text
pub struct ListResolver;

impl ValueResolver for ListResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::List(parts) = node else {
            return Err(unsupported(node));
        };
        let (values, set) = resolve_all(parts, set, env, context)?;
        let text: String = values.iter().map(Value::to_string).collect();
        Ok(ResolvedValueWithFixtureSet::new(Value::String(text), set))
    }
}

impl ChainableValueResolver for ListResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::List(_))
    }
}

/// Largest quantity a dynamic array accepts
pub const MAX_DYNAMIC_ARRAY_LEN: i64 = 10_000;

/// `Nx element`: the element is resolved N times independently
pub struct DynamicArrayResolver;

impl ValueResolver for DynamicArrayResolver {
    fn resolve(
        &self,
        node: &ValueNode,
        set: ResolvedFixtureSet,
        env: &ResolutionEnv<'_>,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let ValueNode::DynamicArray { quantifier, element } = node else {
            return Err(unsupported(node));
        };

        let (quantity, mut set) = env.resolve(quantifier, set, context)?.into_parts();
        let count = quantity
            .as_integer()
            .filter(|n| (0..=MAX_DYNAMIC_ARRAY_LEN).contains(n))
            .ok_or_else(|| ResolutionError::InvalidQuantifier {
                value: format!("\"{}\"", quantity),
            })?;

        let mut values = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (value, next) = env.resolve(element, set, context)?.into_parts();
            values.push(value);
            set = next;
        }
        Ok(ResolvedValueWithFixtureSet::new(Value::Array(values), set))
    }
}

impl ChainableValueResolver for DynamicArrayResolver {
    fn can_resolve(&self, node: &ValueNode) -> bool {
        matches!(node, ValueNode::DynamicArray { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::resolver::value::testing::{lit, resolve, set_with};

    #[test]
    fn test_array_keeps_source_order() {
        let node = ValueNode::Array(vec![lit("b"), ValueNode::Constant(Value::Integer(1)), lit("a")]);
        let resolved = resolve(&node, set_with(&[])).unwrap();
        assert_eq!(
            resolved.value,
            Value::Array(vec![Value::from("b"), Value::Integer(1), Value::from("a")])
        );
    }

    #[test]
    fn test_map_entries_are_resolved() {
        let node = ValueNode::Map(vec![
            ("host".into(), ValueNode::Parameter("domain".into())),
            ("port".into(), ValueNode::Constant(Value::Integer(80))),
        ]);
        let resolved = resolve(&node, set_with(&[])).unwrap();
        let Value::Map(map) = resolved.value else {
            panic!("expected a map");
        };
        assert_eq!(map.get("host"), Some(&Value::from("example.org")));
        assert_eq!(map.get("port"), Some(&Value::Integer(80)));
    }

    #[test]
    fn test_list_concatenates_parts() {
        let node = ValueNode::List(vec![
            ValueNode::Variable("username".into()),
            lit("@"),
            ValueNode::Parameter("domain".into()),
        ]);
        let resolved = resolve(&node, set_with(&[])).unwrap();
        assert_eq!(resolved.value, Value::from("alice@example.org"));
    }

    #[test]
    fn test_list_with_reference_generates_the_target() {
        let node = ValueNode::List(vec![lit("friend of "), ValueNode::FixtureReference("user0".into())]);
        let resolved = resolve(&node, set_with(&["user0"])).unwrap();
        assert_eq!(resolved.value, Value::from("friend of @user0"));
        assert!(resolved.set.has_object("user0"));
    }

    #[test]
    fn test_dynamic_array_repeats_the_element() {
        let node = ValueNode::DynamicArray {
            quantifier: Box::new(ValueNode::Parameter("count".into())),
            element: Box::new(ValueNode::Function {
                name: "numberBetween".into(),
                arguments: vec![lit("1"), lit("9")],
            }),
        };
        let resolved = resolve(&node, set_with(&[])).unwrap();
        let Value::Array(values) = resolved.value else {
            panic!("expected an array");
        };
        assert_eq!(values.len(), 3);
        assert!(values.iter().all(|v| matches!(v.as_integer(), Some(1..=9))));
    }

    #[test]
    fn test_dynamic_array_with_zero_elements() {
        let node = ValueNode::DynamicArray {
            quantifier: Box::new(lit("0")),
            element: Box::new(lit("x")),
        };
        assert_eq!(resolve(&node, set_with(&[])).unwrap().value, Value::Array(vec![]));
    }

    #[test]
    fn test_dynamic_array_rejects_bad_quantifiers() {
        for quantifier in ["-1", "many"] {
            let node = ValueNode::DynamicArray {
                quantifier: Box::new(lit(quantifier)),
                element: Box::new(lit("x")),
            };
            let err = resolve(&node, set_with(&[])).unwrap_err();
            assert!(
                matches!(err, Error::Resolution(ResolutionError::InvalidQuantifier { .. })),
                "{} should be rejected",
                quantifier
            );
        }
    }

    #[test]
    fn test_dynamic_array_rejects_oversized_quantifiers() {
        let too_many = (MAX_DYNAMIC_ARRAY_LEN + 1).to_string();
        for quantifier in [too_many.as_str(), "99999999999999999"] {
            let node = ValueNode::DynamicArray {
                quantifier: Box::new(lit(quantifier)),
                element: Box::new(lit("x")),
            };
            let err = resolve(&node, set_with(&[])).unwrap_err();
            assert!(
                matches!(err, Error::Resolution(ResolutionError::InvalidQuantifier { .. })),
                "{} should be rejected",
                quantifier
            );
        }
    }

    #[test]
    fn test_dynamic_array_accepts_the_largest_quantity() {
        let node = ValueNode::DynamicArray {
            quantifier: Box::new(lit(&MAX_DYNAMIC_ARRAY_LEN.to_string())),
            element: Box::new(lit("x")),
        };
        let Value::Array(values) = resolve(&node, set_with(&[])).unwrap().value else {
            panic!("expected an array");
        };
        assert_eq!(values.len() as i64, MAX_DYNAMIC_ARRAY_LEN);
    }
}
