//! Object generation: builds fixtures into the resolved fixture set
//!
//! Generating one fixture:
//!
//! 1. Enter its id in the resolving context and fail if it was already on
//!    the stack.
//! 2. Return the set unchanged if the fixture was completed earlier.
//! 3. Resolve constructor arguments, instantiate through the instantiator
//!    chain, then resolve and hydrate each property in declaration order.
//! 4. Leave the id and return the new set.
//!
//! References met in step 3 call back into `generate`, so fixtures are built
//! depth-first and on demand.
//!
//! # Determinism
//!
//! Every random draw goes through one `StdRng` per run. The same seed and the
//! same definitions give the same resolved set.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::class::ClassRegistry;
use crate::definition::{ConstructorDefinition, FixtureBag, FixtureDefinition, MethodArguments};
use crate::error::{Error, InstantiationError, ResolutionError, Result};
use crate::expression::ExpressionParser;
use crate::fixture_set::ResolvedFixtureSet;
use crate::function::FunctionRegistry;
use crate::hydrator::PropertyHydrator;
use crate::instantiator::{InstantiatorRegistry, ResolvedArguments};
use crate::resolver::{
    ParameterBagResolver, ResolutionEnv, ResolvedValueWithFixtureSet, ResolverRegistry, ResolvingContext,
    ValueResolver,
};
use crate::value::Value;

/// Key of the constructor entry in fixture files, and the field named by
/// errors raised while resolving constructor arguments
pub const CONSTRUCTOR_FIELD: &str = "__construct";

// ── Options & context ─────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationOptions {
    /// Seed of the random source; drawn from entropy when absent
    pub seed: Option<u64>,
    /// Handed to functions, not interpreted by the generator
    pub locale: Option<String>,
}

impl GenerationOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Mutable state of one generation run
pub struct GenerationContext {
    pub resolving: ResolvingContext,
    pub rng: StdRng,
    pub locale: Option<String>,
}

impl GenerationContext {
    pub fn new(options: &GenerationOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        GenerationContext {
            resolving: ResolvingContext::new(),
            rng,
            locale: options.locale.clone(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(&GenerationOptions::default().with_seed(seed))
    }
}

/// Something that can bring a fixture into the set
pub trait ObjectGenerator: Send + Sync {
    fn generate(
        &self,
        fixture_id: &str,
        set: ResolvedFixtureSet,
        context: &mut GenerationContext,
    ) -> Result<ResolvedFixtureSet>;
}

// ── Fixture generator ─────────────────────────────────────

pub struct FixtureGenerator {
    parser: ExpressionParser,
    resolvers: ResolverRegistry,
    instantiators: InstantiatorRegistry,
    hydrator: PropertyHydrator,
    parameters: ParameterBagResolver,
    classes: ClassRegistry,
}

impl FixtureGenerator {
    /// Default chains with the built-in functions
    pub fn new(classes: ClassRegistry) -> Self {
        Self::with_functions(classes, FunctionRegistry::with_builtins())
    }

    pub fn with_functions(classes: ClassRegistry, functions: FunctionRegistry) -> Self {
        Self::from_parts(
            ExpressionParser::default(),
            ResolverRegistry::with_default_resolvers(functions),
            InstantiatorRegistry::with_default_instantiators(),
            classes,
        )
    }

    pub fn from_parts(
        parser: ExpressionParser,
        resolvers: ResolverRegistry,
        instantiators: InstantiatorRegistry,
        classes: ClassRegistry,
    ) -> Self {
        FixtureGenerator {
            parser,
            resolvers,
            instantiators,
            hydrator: PropertyHydrator,
            parameters: ParameterBagResolver,
            classes,
        }
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn parser(&self) -> &ExpressionParser {
        &self.parser
    }

    /// Resolve the parameters, then generate every fixture in bag order.
    ///
    /// Each top-level fixture starts with a fresh resolving context; fixtures
    /// already generated through a reference are cache hits.
    #[tracing::instrument(level = "debug", skip_all, fields(fixtures = fixtures.len(), parameters = parameters.len()))]
    pub fn generate_all(
        &self,
        fixtures: FixtureBag,
        parameters: &BTreeMap<String, serde_json::Value>,
        options: &GenerationOptions,
    ) -> Result<ResolvedFixtureSet> {
        let mut context = GenerationContext::new(options);
        let parameters = self.parameters.resolve(parameters, BTreeMap::new())?;

        let ids: Vec<String> = fixtures.ids().map(str::to_string).collect();
        let mut set = ResolvedFixtureSet::new(parameters, fixtures);
        for id in &ids {
            context.resolving = ResolvingContext::new();
            set = self.generate(id, set, &mut context)?;
        }

        tracing::debug!(objects = set.objects().len(), "generation finished");
        Ok(set)
    }

    fn resolve_raw(
        &self,
        raw: &serde_json::Value,
        fixture: &FixtureDefinition,
        scope: &BTreeMap<String, Value>,
        set: ResolvedFixtureSet,
        context: &mut GenerationContext,
    ) -> Result<ResolvedValueWithFixtureSet> {
        let node = self.parser.parse_definition_value(raw)?;
        let env = ResolutionEnv {
            resolver: &self.resolvers,
            generator: self,
            fixture,
            scope,
        };
        self.resolvers.resolve(&node, set, &env, context)
    }

    /// Named arguments enter the scope as they resolve
    fn resolve_arguments(
        &self,
        fixture: &FixtureDefinition,
        arguments: &MethodArguments,
        scope: &mut BTreeMap<String, Value>,
        mut set: ResolvedFixtureSet,
        context: &mut GenerationContext,
    ) -> Result<(ResolvedArguments, ResolvedFixtureSet)> {
        match arguments {
            MethodArguments::Positional(raw) => {
                let mut values = Vec::with_capacity(raw.len());
                for argument in raw {
                    let (value, next) = self.resolve_raw(argument, fixture, scope, set, context)?.into_parts();
                    values.push(value);
                    set = next;
                }
                Ok((ResolvedArguments::Positional(values), set))
            }
            MethodArguments::Named(raw) => {
                let mut values = Vec::with_capacity(raw.len());
                for (name, argument) in raw {
                    let (value, next) = self.resolve_raw(argument, fixture, scope, set, context)?.into_parts();
                    scope.insert(name.clone(), value.clone());
                    values.push((name.clone(), value));
                    set = next;
                }
                Ok((ResolvedArguments::Named(values), set))
            }
        }
    }

    fn build(
        &self,
        fixture: &FixtureDefinition,
        set: ResolvedFixtureSet,
        context: &mut GenerationContext,
    ) -> Result<ResolvedFixtureSet> {
        let id = fixture.id.as_str();
        let mut scope = BTreeMap::new();

        let (arguments, set) = match &fixture.constructor {
            ConstructorDefinition::Arguments(arguments) | ConstructorDefinition::Factory { arguments, .. } => {
                let (resolved, set) = self
                    .resolve_arguments(fixture, arguments, &mut scope, set, context)
                    .map_err(|err| Error::generation(id, Some(CONSTRUCTOR_FIELD), err))?;
                (Some(resolved), set)
            }
            ConstructorDefinition::Default | ConstructorDefinition::Disabled => (None, set),
        };

        let mut set = self
            .instantiators
            .instantiate(fixture, &self.classes, arguments.as_ref(), set)
            .map_err(|err| Error::generation(id, None, err.into()))?;
        let class = self.classes.get(&fixture.class).ok_or_else(|| {
            let err = InstantiationError::UnknownClass {
                fixture_id: id.to_string(),
                class: fixture.class.clone(),
            };
            Error::generation(id, None, err.into())
        })?;
        if let Some(instance) = set.object(id) {
            scope.extend(instance.fields.clone());
        }

        for property in &fixture.properties {
            let field = Some(property.name.as_str());
            let (value, next) = self
                .resolve_raw(&property.value, fixture, &scope, set, context)
                .map_err(|err| Error::generation(id, field, err))?
                .into_parts();
            set = self
                .hydrator
                .hydrate(next, id, class, &property.name, value.clone())
                .map_err(|err| Error::generation(id, field, err.into()))?;
            scope.insert(property.name.clone(), value);
        }

        Ok(set)
    }
}

impl ObjectGenerator for FixtureGenerator {
    #[tracing::instrument(level = "debug", skip_all, fields(fixture = fixture_id))]
    fn generate(
        &self,
        fixture_id: &str,
        set: ResolvedFixtureSet,
        context: &mut GenerationContext,
    ) -> Result<ResolvedFixtureSet> {
        context.resolving.add(fixture_id);
        context.resolving.check_for_circular_reference(fixture_id)?;

        if set.has_object(fixture_id) {
            context.resolving.release(fixture_id);
            tracing::trace!("already generated");
            return Ok(set);
        }

        let fixture = set
            .fixtures()
            .get(fixture_id)
            .cloned()
            .ok_or_else(|| ResolutionError::FixtureNotFound {
                id: fixture_id.to_string(),
            })?;
        let set = self.build(&fixture, set, context)?;

        context.resolving.release(fixture_id);
        tracing::debug!("generated");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::class::{ClassDescriptor, ObjectInstance, ParameterDescriptor};
    use crate::error::HydrationError;
    use crate::instantiator::{ChainableInstantiator, CreationError, InstantiationRequest};

    fn classes() -> ClassRegistry {
        ClassRegistry::new()
            .with(ClassDescriptor::new("Dummy"))
            .with(
                ClassDescriptor::new("User")
                    .with_constructor(vec![ParameterDescriptor::new("username")])
                    .with_properties(["email", "friend"]),
            )
    }

    fn bag(fixtures: Vec<FixtureDefinition>) -> FixtureBag {
        fixtures.into_iter().collect()
    }

    fn run(fixtures: Vec<FixtureDefinition>) -> Result<ResolvedFixtureSet> {
        FixtureGenerator::new(classes()).generate_all(
            bag(fixtures),
            &BTreeMap::new(),
            &GenerationOptions::default().with_seed(1),
        )
    }

    fn field<'a>(set: &'a ResolvedFixtureSet, id: &str, name: &str) -> Option<&'a Value> {
        set.object(id).and_then(|o| o.field(name))
    }

    struct CountingInstantiator {
        calls: Arc<AtomicUsize>,
    }

    impl ChainableInstantiator for CountingInstantiator {
        fn name(&self) -> &'static str {
            "CountingInstantiator"
        }

        fn create_instance(&self, request: &InstantiationRequest<'_>) -> std::result::Result<ObjectInstance, CreationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ObjectInstance::new(request.class.name.clone()))
        }
    }

    #[test]
    fn test_plain_text_property() {
        let set = run(vec![FixtureDefinition::new("dummy", "Dummy").with_property("name", json!("plain text"))])
            .unwrap();
        assert_eq!(field(&set, "dummy", "name"), Some(&Value::from("plain text")));
    }

    #[test]
    fn test_reference_instantiates_once_then_hits_the_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let generator = FixtureGenerator::from_parts(
            ExpressionParser::default(),
            ResolverRegistry::default(),
            InstantiatorRegistry::new(vec![Box::new(CountingInstantiator {
                calls: Arc::clone(&calls),
            })]),
            classes(),
        );
        let fixtures = bag(vec![
            FixtureDefinition::new("post", "Dummy")
                .with_property("author", json!("@user0"))
                .with_property("reviewer", json!("@user0")),
            FixtureDefinition::new("user0", "Dummy"),
        ]);

        let set = generator
            .generate_all(fixtures, &BTreeMap::new(), &GenerationOptions::default())
            .unwrap();

        assert_eq!(field(&set, "post", "author"), Some(&Value::Object("user0".into())));
        assert_eq!(field(&set, "post", "reviewer"), Some(&Value::Object("user0".into())));
        assert_eq!(set.objects().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mutual_references_are_a_cycle() {
        let err = run(vec![
            FixtureDefinition::new("a", "Dummy").with_property("friend", json!("@b")),
            FixtureDefinition::new("b", "Dummy").with_property("friend", json!("@a")),
        ])
        .unwrap_err();

        let cycle = err.as_circular_reference().expect("circular reference");
        assert_eq!(cycle.key, "a");
        assert!(cycle.resolving.get("a").copied().unwrap_or(0) >= 2);
        assert_eq!(err.fixture_trail(), vec!["a", "b"]);
        assert!(matches!(err, Error::Generation { ref field, .. } if field.as_deref() == Some("friend")));
    }

    #[test]
    fn test_reference_to_itself_is_a_cycle() {
        let err = run(vec![FixtureDefinition::new("a", "Dummy").with_property("me", json!("@a"))]).unwrap_err();
        assert_eq!(err.as_circular_reference().map(|c| c.key.as_str()), Some("a"));
    }

    #[test]
    fn test_self_reference_is_not_a_cycle() {
        let set = run(vec![FixtureDefinition::new("a", "Dummy")
            .with_property("name", json!("alpha"))
            .with_property("me", json!("@self"))
            .with_property("echo", json!("@self->name"))])
        .unwrap();
        assert_eq!(field(&set, "a", "me"), Some(&Value::Object("a".into())));
        assert_eq!(field(&set, "a", "echo"), Some(&Value::from("alpha")));
    }

    #[test]
    fn test_sibling_references_are_not_a_cycle() {
        let set = run(vec![
            FixtureDefinition::new("a", "Dummy")
                .with_property("x", json!("@c"))
                .with_property("y", json!(["@c", "@c"])),
            FixtureDefinition::new("b", "Dummy").with_property("x", json!("@c->name")),
            FixtureDefinition::new("c", "Dummy").with_property("name", json!("shared")),
        ])
        .unwrap();
        assert_eq!(field(&set, "b", "x"), Some(&Value::from("shared")));
        assert_eq!(set.objects().len(), 3);
    }

    #[test]
    fn test_acyclic_chain_terminates() {
        let depth = 50;
        let fixtures = (0..depth)
            .map(|i| {
                let fixture = FixtureDefinition::new(format!("f{}", i), "Dummy");
                if i + 1 < depth {
                    fixture.with_property("next", json!(format!("@f{}", i + 1)))
                } else {
                    fixture
                }
            })
            .collect();

        let set = run(fixtures).unwrap();
        assert_eq!(set.objects().len(), depth);
        assert_eq!(field(&set, "f0", "next"), Some(&Value::Object("f1".into())));
    }

    #[test]
    fn test_constructor_arguments_enter_the_scope() {
        let mut raw = BTreeMap::new();
        raw.insert("domain".to_string(), json!("example.org"));
        let fixtures = bag(vec![FixtureDefinition::new("user1", "User")
            .with_constructor(ConstructorDefinition::Arguments(MethodArguments::Positional(vec![
                json!("<current()>"),
            ])))
            .with_value_for_current("1")
            .with_property("email", json!("user$username@<{domain}>"))]);

        let set = FixtureGenerator::new(classes())
            .generate_all(fixtures, &raw, &GenerationOptions::default())
            .unwrap();
        assert_eq!(field(&set, "user1", "username"), Some(&Value::from("1")));
        assert_eq!(field(&set, "user1", "email"), Some(&Value::from("user1@example.org")));
    }

    #[test]
    fn test_errors_name_the_fixture_and_field() {
        let err = run(vec![FixtureDefinition::new("a", "Dummy").with_property("name", json!("<nope()>"))])
            .unwrap_err();
        match &err {
            Error::Generation { fixture_id, field, .. } => {
                assert_eq!(fixture_id, "a");
                assert_eq!(field.as_deref(), Some("name"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(matches!(
            err.root_cause(),
            Error::Resolution(ResolutionError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn test_unknown_property_is_reported() {
        let err = run(vec![FixtureDefinition::new("u", "User")
            .with_constructor(ConstructorDefinition::Arguments(MethodArguments::Positional(vec![json!("bob")])))
            .with_property("age", json!(3))])
        .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::Hydration(HydrationError::UnknownProperty { property, .. }) if property == "age"
        ));
    }

    #[test]
    fn test_unknown_fixture_id() {
        let generator = FixtureGenerator::new(classes());
        let mut context = GenerationContext::seeded(0);
        let err = generator
            .generate("ghost", ResolvedFixtureSet::default(), &mut context)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Resolution(ResolutionError::FixtureNotFound { ref id }) if id == "ghost"
        ));
    }

    #[test]
    fn test_generate_leaves_the_input_snapshot_unchanged() {
        let generator = FixtureGenerator::new(classes());
        let set = ResolvedFixtureSet::new(
            BTreeMap::new(),
            bag(vec![FixtureDefinition::new("a", "Dummy").with_property("x", json!("1"))]),
        );
        let mut context = GenerationContext::seeded(0);
        let next = generator.generate("a", set.clone(), &mut context).unwrap();

        assert!(!set.has_object("a"));
        assert!(next.has_object("a"));
        assert_eq!(context.resolving.count("a"), 0);
    }

    #[test]
    fn test_same_seed_same_output() {
        let fixtures = || {
            vec![
                FixtureDefinition::new("a", "Dummy")
                    .with_property("n", json!("<numberBetween(1, 1000000)>"))
                    .with_property("maybe", json!("50%? yes : no"))
                    .with_property("pick", json!("@b*")),
                FixtureDefinition::new("b1", "Dummy"),
                FixtureDefinition::new("b2", "Dummy"),
                FixtureDefinition::new("b3", "Dummy"),
            ]
        };
        let first = run(fixtures()).unwrap().to_json();
        for i in 0..100 {
            assert_eq!(first, run(fixtures()).unwrap().to_json(), "Determinism failure at iteration {}", i);
        }
    }
}
