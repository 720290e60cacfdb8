use serde::{Deserialize, Serialize};

use super::object_definition::ObjectDefinition;

/// A scripted global event stored alongside the sector's objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorEvent {
    pub definition_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub activation_time_ms: i64,
}

impl SectorEvent {
    pub fn new(definition_id: impl Into<String>, enabled: bool, activation_time_ms: i64) -> Self {
        Self {
            definition_id: definition_id.into(),
            enabled,
            activation_time_ms,
        }
    }
}

/// Persisted definition of a whole sector.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SectorDefinition {
    pub position: [i32; 3],
    #[serde(default)]
    pub app_version: i32,
    #[serde(default)]
    pub events: Vec<SectorEvent>,
    #[serde(default)]
    pub objects: Vec<ObjectDefinition>,
}
