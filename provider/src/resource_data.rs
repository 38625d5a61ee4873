//! Attribute store handed to resource and data-source handlers

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ProviderError, Result};

/// Current values of one resource instance, with the prior state kept for
/// change detection.
///
/// A missing attribute and an explicit `null` are the same thing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    values: Map<String, Value>,
    prior: Map<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Planned values for a resource with no prior state.
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            id: None,
            values,
            prior: Map::new(),
        }
    }

    /// Stored state of an existing resource; nothing is changed yet.
    pub fn from_state(id: impl Into<String>, state: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            values: state.clone(),
            prior: state,
        }
    }

    /// Record a desired value without touching the prior state.
    pub fn plan(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// String value, empty when unset.
    pub fn get_string(&self, key: &str) -> String {
        self.get_str(key).unwrap_or_default().to_string()
    }

    /// String map value, empty when unset.
    pub fn get_string_map(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let Some(value) = self.get(key) else {
            return Ok(BTreeMap::new());
        };
        let invalid = || ProviderError::InvalidAttributeType {
            attribute: key.to_string(),
            expected: "map of strings",
        };
        let map = value.as_object().ok_or_else(invalid)?;
        map.iter()
            .map(|(k, v)| {
                v.as_str()
                    .map(|s| (k.clone(), s.to_string()))
                    .ok_or_else(invalid)
            })
            .collect()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the resource as gone; the caller drops it from state.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn has_change(&self, key: &str) -> bool {
        normalized(self.values.get(key)) != normalized(self.prior.get(key))
    }

    /// True when any attribute other than `except` changed.
    pub fn has_changes_except(&self, except: &[&str]) -> bool {
        self.changed_keys()
            .iter()
            .any(|key| !except.contains(&key.as_str()))
    }

    /// Changed attribute names, sorted.
    pub fn changed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .keys()
            .chain(self.prior.keys())
            .filter(|key| self.has_change(key))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Values with the id folded in, as persisted after an operation.
    pub fn state(&self) -> Map<String, Value> {
        let mut state = self.values.clone();
        if let Some(id) = self.id() {
            state.insert("id".to_string(), Value::String(id.to_string()));
        }
        state
    }
}

fn normalized(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}
