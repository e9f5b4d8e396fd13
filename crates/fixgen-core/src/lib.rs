//! fixgen core - declarative test fixtures resolved into object graphs
//!
//! Fixtures are declared as raw values (`"<numberBetween(1, 10)>"`,
//! `"@user*"`, `"$username@<{domain}>"`, ...). The generator turns each
//! definition into an object instance, following references depth-first and
//! reporting cycles instead of recursing forever.
//!
//! # Architecture
//!
//! ```text
//! JSON file → Loader → FixtureBag + ClassRegistry + parameters
//!                              ↓
//!                     ParameterBagResolver → resolved parameters
//!                              ↓
//! raw value → LexerRegistry → Tokens → ExpressionParser → ValueNode
//!                              ↓
//!                     ResolverRegistry → Value (+ referenced fixtures)
//!                              ↓
//!                     InstantiatorRegistry → ObjectInstance
//!                              ↓
//!                     PropertyHydrator → ResolvedFixtureSet
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: the same seed and definitions give the same set
//! - **Cycle-safe**: a fixture needing itself fails with the resolving trail
//! - **Snapshots**: every step returns a new `ResolvedFixtureSet`, earlier
//!   snapshots never change

pub mod class;
pub mod definition;
pub mod error;
pub mod expression;
pub mod fixture_set;
pub mod function;
pub mod generator;
pub mod hydrator;
pub mod instantiator;
pub mod loader;
pub mod resolver;
pub mod value;

pub use class::{ClassDescriptor, ClassRegistry, ObjectInstance, ParameterDescriptor};
pub use definition::{ConstructorDefinition, FixtureBag, FixtureDefinition, MethodArguments};
pub use error::{Error, Result};
pub use fixture_set::ResolvedFixtureSet;
pub use function::{CallContext, FixtureFunction, FunctionRegistry};
pub use generator::{FixtureGenerator, GenerationContext, GenerationOptions, ObjectGenerator};
pub use loader::{load_str, FixtureFile};
pub use value::{Value, ValueKind};

/// Version of the fixgen-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generate every fixture of a loaded file with the built-in functions
pub fn generate(file: FixtureFile) -> Result<ResolvedFixtureSet> {
    let FixtureFile {
        options,
        parameters,
        classes,
        fixtures,
    } = file;
    FixtureGenerator::new(classes).generate_all(fixtures, &parameters, &options)
}

/// Load and generate a JSON fixture file
pub fn generate_str(json: &str) -> Result<ResolvedFixtureSet> {
    generate(load_str(json)?)
}
