//! Index creation settings.

use crate::error::Result;
use serde_json::{Map, Value, json};

/// Settings and mapping for a new index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSettings {
    /// Number of shards.
    pub number_of_shards: Option<i32>,
    /// Number of replicas.
    pub number_of_replicas: Option<i32>,
    /// Refresh interval.
    pub refresh_interval: Option<String>,
    /// Raw mapping body, sent as-is under `mappings`.
    pub mappings: Option<Value>,
}

impl IndexSettings {
    /// Empty settings; the engine applies its defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of shards.
    pub fn shards(mut self, shards: i32) -> Self {
        self.number_of_shards = Some(shards);
        self
    }

    /// Set number of replicas.
    pub fn replicas(mut self, replicas: i32) -> Self {
        self.number_of_replicas = Some(replicas);
        self
    }

    /// Set refresh interval.
    pub fn refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.refresh_interval = Some(interval.into());
        self
    }

    /// Set the mapping.
    pub fn mappings(mut self, mappings: Value) -> Self {
        self.mappings = Some(mappings);
        self
    }

    /// Set the mapping from its JSON text.
    pub fn mapping_str(self, mapping: &str) -> Result<Self> {
        let mappings: Value = serde_json::from_str(mapping)?;
        Ok(self.mappings(mappings))
    }

    /// Request body for index creation. Unset parts are omitted.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        let mut settings = Map::new();

        if let Some(shards) = self.number_of_shards {
            settings.insert("number_of_shards".to_string(), json!(shards));
        }
        if let Some(replicas) = self.number_of_replicas {
            settings.insert("number_of_replicas".to_string(), json!(replicas));
        }
        if let Some(interval) = &self.refresh_interval {
            settings.insert("refresh_interval".to_string(), json!(interval));
        }

        if !settings.is_empty() {
            body.insert("settings".to_string(), Value::Object(settings));
        }

        if let Some(mappings) = &self.mappings {
            body.insert("mappings".to_string(), mappings.clone());
        }

        Value::Object(body)
    }
}
