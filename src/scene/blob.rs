use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Background;
use crate::element::{ObjectId, VisualObject};
use crate::error::DeserializationError;

/// Schema version written into every blob
pub const SCENE_BLOB_VERSION: u32 = 1;

fn first_version() -> u32 {
    1
}

/// Persisted form of a scene, stored as JSON in the project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBlob {
    #[serde(default = "first_version")]
    pub version: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub objects: Vec<VisualObject>,
}

impl SceneBlob {
    /// Parse and validate a blob. Nothing about the result is trusted until
    /// this returns `Ok`.
    pub fn parse(json: &str) -> Result<Self, DeserializationError> {
        let blob: SceneBlob = serde_json::from_str(json)?;
        if blob.version > SCENE_BLOB_VERSION {
            return Err(DeserializationError::UnsupportedVersion {
                found: blob.version,
                supported: SCENE_BLOB_VERSION,
            });
        }

        let mut seen = HashSet::with_capacity(blob.objects.len());
        for object in &blob.objects {
            if !seen.insert(object.id()) {
                return Err(DeserializationError::DuplicateObject(object.id().to_string()));
            }
        }

        Ok(blob)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut VisualObject> {
        self.objects.iter_mut().find(|object| object.id() == id)
    }
}
