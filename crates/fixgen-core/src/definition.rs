//! Fixture definitions: the unresolved input of a generation run
//!
//! Leaf values are kept as raw JSON: strings hold expressions, other
//! scalars are taken as-is, arrays and objects are resolved element-wise.

use std::collections::BTreeMap;

use crate::error::LoadError;

/// Arguments of a constructor or factory call
#[derive(Debug, Clone, PartialEq)]
pub enum MethodArguments {
    Positional(Vec<serde_json::Value>),
    Named(Vec<(String, serde_json::Value)>),
}

impl MethodArguments {
    pub fn len(&self) -> usize {
        match self {
            MethodArguments::Positional(values) => values.len(),
            MethodArguments::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a fixture wants its instance to be created
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConstructorDefinition {
    /// Nothing declared: let the instantiator chain pick
    #[default]
    Default,
    /// Explicitly created without calling any constructor
    Disabled,
    /// Constructor called with these arguments
    Arguments(MethodArguments),
    /// Named factory called with these arguments
    Factory {
        method: String,
        arguments: MethodArguments,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,
    pub value: serde_json::Value,
}

/// A named fixture: one definition yields exactly one instance
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDefinition {
    pub id: String,
    pub class: String,
    pub constructor: ConstructorDefinition,
    /// Applied in declaration order
    pub properties: Vec<PropertyDefinition>,
    /// Value of `<current()>` for fixtures expanded from an id template
    pub value_for_current: Option<String>,
}

impl FixtureDefinition {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        FixtureDefinition {
            id: id.into(),
            class: class.into(),
            constructor: ConstructorDefinition::Default,
            properties: Vec::new(),
            value_for_current: None,
        }
    }

    pub fn with_constructor(mut self, constructor: ConstructorDefinition) -> Self {
        self.constructor = constructor;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_value_for_current(mut self, current: impl Into<String>) -> Self {
        self.value_for_current = Some(current.into());
        self
    }
}

/// Fixture definitions by id, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureBag {
    fixtures: Vec<FixtureDefinition>,
    index: BTreeMap<String, usize>,
}

impl FixtureBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag in iteration order, failing on the first repeated id
    pub fn try_from_iter<T: IntoIterator<Item = FixtureDefinition>>(iter: T) -> Result<Self, LoadError> {
        let mut bag = FixtureBag::new();
        for fixture in iter {
            bag.insert(fixture)?;
        }
        Ok(bag)
    }

    pub fn insert(&mut self, fixture: FixtureDefinition) -> Result<(), LoadError> {
        if self.index.contains_key(&fixture.id) {
            return Err(LoadError::DuplicateFixture { id: fixture.id });
        }
        self.index.insert(fixture.id.clone(), self.fixtures.len());
        self.fixtures.push(fixture);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&FixtureDefinition> {
        self.index.get(id).map(|i| &self.fixtures[*i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.fixtures.iter().map(|f| f.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixtureDefinition> {
        self.fixtures.iter()
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl FromIterator<FixtureDefinition> for FixtureBag {
    /// The first definition of an id wins and later ones are dropped. Use
    /// [`FixtureBag::try_from_iter`] to reject duplicates instead.
    fn from_iter<T: IntoIterator<Item = FixtureDefinition>>(iter: T) -> Self {
        let mut bag = FixtureBag::new();
        for fixture in iter {
            let _ = bag.insert(fixture);
        }
        bag
    }
}

/// Most ids one range template may expand to
pub const MAX_TEMPLATE_SPAN: i64 = 10_000;

/// Expand an id template into `(id, value_for_current)` pairs.
///
/// `user{1..3}` gives `user1`, `user2`, `user3`; `user_{alice, bob}` gives
/// `user_alice`, `user_bob`. An id without braces is returned unchanged.
pub fn expand_id_template(template: &str) -> Result<Vec<(String, Option<String>)>, LoadError> {
    let invalid = |reason: &str| LoadError::InvalidIdTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let Some(open) = template.find('{') else {
        return Ok(vec![(template.to_string(), None)]);
    };
    let close = template[open..]
        .find('}')
        .map(|offset| open + offset)
        .ok_or_else(|| invalid("missing \"}\""))?;

    let (prefix, inner, suffix) = (&template[..open], &template[open + 1..close], &template[close + 1..]);
    let values: Vec<String> = if let Some((from, to)) = inner.split_once("..") {
        let from: i64 = from
            .trim()
            .parse()
            .map_err(|_| invalid("range bounds must be integers"))?;
        let to: i64 = to
            .trim_start_matches('.')
            .trim()
            .parse()
            .map_err(|_| invalid("range bounds must be integers"))?;
        if from > to {
            return Err(invalid("range start is greater than its end"));
        }
        if to.checked_sub(from).map_or(true, |span| span >= MAX_TEMPLATE_SPAN) {
            return Err(invalid("range expands to more than 10000 ids"));
        }
        (from..=to).map(|i| i.to_string()).collect()
    } else if inner.contains(',') {
        let items: Vec<String> = inner.split(',').map(|item| item.trim().to_string()).collect();
        if items.iter().any(String::is_empty) {
            return Err(invalid("empty list element"));
        }
        items
    } else {
        return Err(invalid("expected a range \"{1..5}\" or a list \"{a, b}\""));
    };

    Ok(values
        .into_iter()
        .map(|value| (format!("{}{}{}", prefix, value, suffix), Some(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_range_template() {
        let ids = expand_id_template("user{1..3}").unwrap();
        assert_eq!(
            ids,
            vec![
                ("user1".to_string(), Some("1".to_string())),
                ("user2".to_string(), Some("2".to_string())),
                ("user3".to_string(), Some("3".to_string())),
            ]
        );
    }

    #[test]
    fn test_expand_list_template_with_suffix() {
        let ids: Vec<String> = expand_id_template("user_{alice, bob}_admin")
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["user_alice_admin", "user_bob_admin"]);
    }

    #[test]
    fn test_plain_id_is_kept() {
        assert_eq!(
            expand_id_template("admin").unwrap(),
            vec![("admin".to_string(), None)]
        );
    }

    #[test]
    fn test_invalid_templates() {
        for template in ["user{3..1}", "user{1..", "user{x}", "user{a,,b}", "user{a..b}"] {
            assert!(
                matches!(expand_id_template(template), Err(LoadError::InvalidIdTemplate { .. })),
                "{} should be rejected",
                template
            );
        }
    }

    #[test]
    fn test_range_template_span_is_limited() {
        let widest = format!("user{{1..{}}}", MAX_TEMPLATE_SPAN);
        assert_eq!(expand_id_template(&widest).unwrap().len() as i64, MAX_TEMPLATE_SPAN);

        let too_wide = format!("user{{0..{}}}", MAX_TEMPLATE_SPAN);
        for template in [too_wide.as_str(), "user{1..99999999999}", "user{-9223372036854775808..9223372036854775807}"] {
            let err = expand_id_template(template).unwrap_err();
            assert!(
                matches!(&err, LoadError::InvalidIdTemplate { reason, .. } if reason.contains("10000")),
                "{} should be rejected, got {}",
                template,
                err
            );
        }
    }

    #[test]
    fn test_from_iter_keeps_the_first_definition() {
        let bag: FixtureBag = vec![
            FixtureDefinition::new("a", "User"),
            FixtureDefinition::new("a", "Group"),
        ]
        .into_iter()
        .collect();
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("a").map(|f| f.class.as_str()), Some("User"));
    }

    #[test]
    fn test_try_from_iter_rejects_duplicates() {
        let ok = FixtureBag::try_from_iter(vec![
            FixtureDefinition::new("a", "User"),
            FixtureDefinition::new("b", "User"),
        ])
        .unwrap();
        assert_eq!(ok.ids().collect::<Vec<_>>(), vec!["a", "b"]);

        let err = FixtureBag::try_from_iter(vec![
            FixtureDefinition::new("a", "User"),
            FixtureDefinition::new("a", "Group"),
        ])
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateFixture { id } if id == "a"));
    }

    #[test]
    fn test_bag_rejects_duplicates_and_keeps_order() {
        let mut bag = FixtureBag::new();
        bag.insert(FixtureDefinition::new("b", "User")).unwrap();
        bag.insert(FixtureDefinition::new("a", "User")).unwrap();
        assert!(matches!(
            bag.insert(FixtureDefinition::new("a", "Group")),
            Err(LoadError::DuplicateFixture { .. })
        ));
        assert_eq!(bag.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(bag.get("a").map(|f| f.class.as_str()), Some("User"));
    }
}
