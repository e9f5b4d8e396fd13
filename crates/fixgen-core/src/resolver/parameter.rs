//! Parameter bag resolution
//!
//! Parameters are resolved once, before any fixture. A parameter may refer to
//! others through `<{name}>`: a value that is exactly one placeholder takes
//! the referenced value with its type, any other string gets the referenced
//! values interpolated as text.

use std::collections::BTreeMap;

use crate::error::{ResolutionError, Result};
use crate::resolver::ResolvingContext;
use crate::value::Value;

#[derive(Debug, Default, Clone, Copy)]
pub struct ParameterBagResolver;

impl ParameterBagResolver {
    /// Resolve every raw parameter. `injected` values are taken as already
    /// resolved and win over raw ones of the same name.
    pub fn resolve(
        &self,
        raw: &BTreeMap<String, serde_json::Value>,
        injected: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let mut resolved = injected;
        for key in raw.keys() {
            if !resolved.contains_key(key) {
                let context = ResolvingContext::create_from(None, key);
                self.resolve_parameter(key, raw, &mut resolved, context)?;
            }
        }
        Ok(resolved)
    }

    fn resolve_parameter(
        &self,
        key: &str,
        raw: &BTreeMap<String, serde_json::Value>,
        resolved: &mut BTreeMap<String, Value>,
        mut context: ResolvingContext,
    ) -> Result<(Value, ResolvingContext)> {
        context.check_for_circular_reference(key)?;
        let definition = raw
            .get(key)
            .ok_or_else(|| ResolutionError::UnknownParameter { name: key.to_string() })?;

        let (value, mut context) = self.resolve_json(definition, raw, resolved, context)?;
        context.release(key);
        resolved.insert(key.to_string(), value.clone());
        tracing::trace!(parameter = key, value = %value, "resolved parameter");
        Ok((value, context))
    }

    /// Value of the parameter `name`, resolving it first if needed
    fn lookup(
        &self,
        name: &str,
        raw: &BTreeMap<String, serde_json::Value>,
        resolved: &mut BTreeMap<String, Value>,
        mut context: ResolvingContext,
    ) -> Result<(Value, ResolvingContext)> {
        if let Some(value) = resolved.get(name) {
            return Ok((value.clone(), context));
        }
        if !raw.contains_key(name) {
            return Err(ResolutionError::UnknownParameter { name: name.to_string() }.into());
        }
        context.add(name);
        self.resolve_parameter(name, raw, resolved, context)
    }

    fn resolve_json(
        &self,
        definition: &serde_json::Value,
        raw: &BTreeMap<String, serde_json::Value>,
        resolved: &mut BTreeMap<String, Value>,
        mut context: ResolvingContext,
    ) -> Result<(Value, ResolvingContext)> {
        match definition {
            serde_json::Value::String(text) => {
                if let Some(name) = sole_placeholder(text) {
                    return self.lookup(name, raw, resolved, context);
                }
                let mut output = String::new();
                let mut rest = text.as_str();
                while let Some((before, name, after)) = next_placeholder(rest) {
                    output.push_str(before);
                    let (value, next) = self.lookup(name, raw, resolved, context)?;
                    output.push_str(&value.to_string());
                    context = next;
                    rest = after;
                }
                output.push_str(rest);
                Ok((Value::String(output), context))
            }
            serde_json::Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let (value, next) = self.resolve_json(item, raw, resolved, context)?;
                    values.push(value);
                    context = next;
                }
                Ok((Value::Array(values), context))
            }
            serde_json::Value::Object(entries) => {
                let mut map = BTreeMap::new();
                for (key, entry) in entries {
                    let (value, next) = self.resolve_json(entry, raw, resolved, context)?;
                    map.insert(key.clone(), value);
                    context = next;
                }
                Ok((Value::Map(map), context))
            }
            scalar => Ok((Value::from_json(scalar), context)),
        }
    }
}

/// `name` when `text` is exactly `<{name}>`
fn sole_placeholder(text: &str) -> Option<&str> {
    let name = text.strip_prefix("<{")?.strip_suffix("}>")?;
    (!name.is_empty() && !name.contains("}>") && !name.contains("<{")).then(|| name.trim())
}

/// Split at the first `<{name}>`: text before, name, text after
fn next_placeholder(text: &str) -> Option<(&str, &str, &str)> {
    let start = text.find("<{")?;
    let length = text[start + 2..].find("}>")?;
    let name = &text[start + 2..start + 2 + length];
    Some((&text[..start], name.trim(), &text[start + 2 + length + 2..]))
}
