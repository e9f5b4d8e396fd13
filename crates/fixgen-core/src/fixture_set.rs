//! Resolved fixture set: the snapshot threaded through a generation run
//!
//! Every `with_*` call returns a new snapshot and leaves the receiver
//! untouched. Parameters and objects live in persistent `im::OrdMap`s, so a
//! new snapshot shares every node it did not touch with the one it came from
//! and one write costs `O(log n)` regardless of how many fixtures were built.

use std::collections::BTreeMap;
use std::sync::Arc;

use im::OrdMap;

use crate::class::ObjectInstance;
use crate::definition::FixtureBag;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct ResolvedFixtureSet {
    parameters: OrdMap<String, Value>,
    objects: OrdMap<String, ObjectInstance>,
    fixtures: Arc<FixtureBag>,
}

impl ResolvedFixtureSet {
    pub fn new(parameters: BTreeMap<String, Value>, fixtures: FixtureBag) -> Self {
        ResolvedFixtureSet {
            parameters: parameters.into_iter().collect(),
            objects: OrdMap::new(),
            fixtures: Arc::new(fixtures),
        }
    }

    pub fn with_parameters(&self, parameters: BTreeMap<String, Value>) -> Self {
        ResolvedFixtureSet {
            parameters: parameters.into_iter().collect(),
            ..self.clone()
        }
    }

    /// Add or replace the instance of one fixture
    pub fn with_object(&self, id: impl Into<String>, instance: ObjectInstance) -> Self {
        ResolvedFixtureSet {
            objects: self.objects.update(id.into(), instance),
            ..self.clone()
        }
    }

    pub fn with_objects(&self, instances: impl IntoIterator<Item = (String, ObjectInstance)>) -> Self {
        let mut objects = self.objects.clone();
        objects.extend(instances);
        ResolvedFixtureSet {
            objects,
            ..self.clone()
        }
    }

    pub fn parameters(&self) -> &OrdMap<String, Value> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn objects(&self) -> &OrdMap<String, ObjectInstance> {
        &self.objects
    }

    pub fn object(&self, id: &str) -> Option<&ObjectInstance> {
        self.objects.get(id)
    }

    pub fn has_object(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn fixtures(&self) -> &FixtureBag {
        &self.fixtures
    }

    /// JSON view: `{"parameters": {...}, "objects": {id: {"class", "fields"}}}`
    pub fn to_json(&self) -> serde_json::Value {
        let parameters: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        let objects: serde_json::Map<String, serde_json::Value> = self
            .objects
            .iter()
            .map(|(id, instance)| (id.clone(), instance.to_json()))
            .collect();
        serde_json::json!({ "parameters": parameters, "objects": objects })
    }
}
