//! Fixture functions: the callables behind `<name(arguments)>`
//!
//! Arguments arrive already resolved. Every random draw goes through the
//! run's seeded generator handed over in `CallContext`, so a fixed seed
//! yields the same values on every run.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::FunctionError;
use crate::value::Value;

/// What a function may use besides its arguments
pub struct CallContext<'a> {
    pub rng: &'a mut StdRng,
    /// `value_for_current` of the fixture being generated
    pub current: Option<&'a str>,
    pub locale: Option<&'a str>,
}

pub trait FixtureFunction: Send + Sync {
    fn call(&self, arguments: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError>;
}

impl<F> FixtureFunction for F
where
    F: Fn(&[Value], &mut CallContext<'_>) -> Result<Value, FunctionError> + Send + Sync,
{
    fn call(&self, arguments: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError> {
        self(arguments, context)
    }
}

pub struct FunctionRegistry {
    functions: BTreeMap<String, Box<dyn FixtureFunction>>,
}

impl FunctionRegistry {
    /// Registry without any function
    pub fn new() -> Self {
        FunctionRegistry {
            functions: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = FunctionRegistry::new();
        registry.register_fn("identity", identity);
        registry.register_fn("current", current);
        registry.register_fn("numberBetween", number_between);
        registry.register_fn("randomElement", random_element);
        registry.register_fn("boolean", boolean);
        registry.register_fn("randomNumber", random_number);
        registry.register_fn("join", join);
        registry.register_fn("upper", upper);
        registry.register_fn("lower", lower);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, function: impl FixtureFunction + 'static) {
        self.functions.insert(name.into(), Box::new(function));
    }

    /// Register a closure or function item
    pub fn register_fn<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value], &mut CallContext<'_>) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
    }

    pub fn get(&self, name: &str) -> Option<&dyn FixtureFunction> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── Built-ins ─────────────────────────────────────────────

fn integer_argument(function: &str, arguments: &[Value], index: usize, default: i64) -> Result<i64, FunctionError> {
    match arguments.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value.as_integer().ok_or_else(|| {
            FunctionError::new(format!(
                "{}() expects an integer as argument {}, got \"{}\"",
                function,
                index + 1,
                value
            ))
        }),
    }
}

fn string_argument(function: &str, arguments: &[Value]) -> Result<String, FunctionError> {
    arguments
        .first()
        .map(|value| value.to_string())
        .ok_or_else(|| FunctionError::new(format!("{}() expects one argument", function)))
}

fn identity(arguments: &[Value], _: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    arguments
        .first()
        .cloned()
        .ok_or_else(|| FunctionError::new("identity() expects one argument"))
}

fn current(_: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    context
        .current
        .map(Value::from)
        .ok_or_else(|| FunctionError::new("current() is only available in fixtures created from an id template"))
}

fn number_between(arguments: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    let min = integer_argument("numberBetween", arguments, 0, 0)?;
    let max = integer_argument("numberBetween", arguments, 1, i64::from(i32::MAX))?;
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    Ok(Value::Integer(context.rng.gen_range(low..=high)))
}

fn random_element(arguments: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    let elements = match arguments {
        [Value::Array(elements)] => elements.as_slice(),
        [] => return Err(FunctionError::new("randomElement() expects an array")),
        many => many,
    };
    if elements.is_empty() {
        return Err(FunctionError::new("randomElement() cannot pick from an empty array"));
    }
    let index = context.rng.gen_range(0..elements.len());
    Ok(elements[index].clone())
}

fn boolean(arguments: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    let chance = integer_argument("boolean", arguments, 0, 50)?;
    if !(0..=100).contains(&chance) {
        return Err(FunctionError::new(format!(
            "boolean() expects a percentage between 0 and 100, got {}",
            chance
        )));
    }
    Ok(Value::Bool(context.rng.gen_range(1..=100) <= chance))
}

fn random_number(arguments: &[Value], context: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    let digits = match arguments.first() {
        None | Some(Value::Null) => context.rng.gen_range(1..=9),
        Some(_) => integer_argument("randomNumber", arguments, 0, 0)?,
    };
    if !(1..=18).contains(&digits) {
        return Err(FunctionError::new(format!(
            "randomNumber() expects between 1 and 18 digits, got {}",
            digits
        )));
    }
    let upper = 10_i64.pow(digits as u32);
    Ok(Value::Integer(context.rng.gen_range(0..upper)))
}

fn join(arguments: &[Value], _: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    let glue = arguments.get(1).map(|g| g.to_string()).unwrap_or_default();
    match arguments.first() {
        Some(Value::Array(items)) => Ok(Value::String(
            items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(&glue),
        )),
        Some(other) => Ok(Value::String(other.to_string())),
        None => Err(FunctionError::new("join() expects an array")),
    }
}

fn upper(arguments: &[Value], _: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    string_argument("upper", arguments).map(|s| Value::String(s.to_uppercase()))
}

fn lower(arguments: &[Value], _: &mut CallContext<'_>) -> Result<Value, FunctionError> {
    string_argument("lower", arguments).map(|s| Value::String(s.to_lowercase()))
}
