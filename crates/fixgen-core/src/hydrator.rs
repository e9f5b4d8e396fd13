//! Property hydration: writes resolved property values onto an instance

use crate::class::ClassDescriptor;
use crate::error::HydrationError;
use crate::fixture_set::ResolvedFixtureSet;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyHydrator;

impl PropertyHydrator {
    /// Set one property of the instance of `fixture_id` and return the new set
    pub fn hydrate(
        &self,
        set: ResolvedFixtureSet,
        fixture_id: &str,
        class: &ClassDescriptor,
        property: &str,
        value: Value,
    ) -> Result<ResolvedFixtureSet, HydrationError> {
        if !class.accepts_property(property) {
            return Err(HydrationError::UnknownProperty {
                fixture_id: fixture_id.to_string(),
                class: class.name.clone(),
                property: property.to_string(),
            });
        }

        let mut instance = set
            .object(fixture_id)
            .cloned()
            .ok_or_else(|| HydrationError::NotInstantiated {
                fixture_id: fixture_id.to_string(),
            })?;
        instance.fields.insert(property.to_string(), value);
        Ok(set.with_object(fixture_id, instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ObjectInstance;

    #[test]
    fn test_hydrate_sets_the_field() {
        let class = ClassDescriptor::new("User").with_properties(["email"]);
        let set = ResolvedFixtureSet::default().with_object("user0", ObjectInstance::new("User"));

        let next = PropertyHydrator
            .hydrate(set.clone(), "user0", &class, "email", Value::from("a@b.c"))
            .unwrap();
        assert_eq!(
            next.object("user0").and_then(|o| o.field("email")),
            Some(&Value::from("a@b.c"))
        );
        assert!(set.object("user0").and_then(|o| o.field("email")).is_none());
    }

    #[test]
    fn test_unknown_property() {
        let class = ClassDescriptor::new("User").with_properties(["email"]);
        let set = ResolvedFixtureSet::default().with_object("user0", ObjectInstance::new("User"));
        let err = PropertyHydrator
            .hydrate(set, "user0", &class, "age", Value::Integer(3))
            .unwrap_err();
        assert_eq!(
            err,
            HydrationError::UnknownProperty {
                fixture_id: "user0".into(),
                class: "User".into(),
                property: "age".into(),
            }
        );
    }

    #[test]
    fn test_not_instantiated() {
        let class = ClassDescriptor::new("User");
        let err = PropertyHydrator
            .hydrate(ResolvedFixtureSet::default(), "user0", &class, "email", Value::Null)
            .unwrap_err();
        assert!(matches!(err, HydrationError::NotInstantiated { .. }));
    }
}
