//! Server-side materialization of casks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cask::Cask;

/// Instance lifecycle status.
pub mod status {
    /// The instance is not ready for use.
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
    /// An update is pending; the active version is still online.
    pub const PENDING: &str = "PENDING";
    /// All past updates completed.
    pub const ACTIVE: &str = "ACTIVE";
    /// The pending update failed; the active version is still online.
    pub const FAILED: &str = "FAILED";
}

/// A provisioned cask as reported by the list operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: Cask,
    #[serde(default)]
    pub opts: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub pending: String,
}

/// Envelope of the list operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instances {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Instance>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_decoding() {
        let body = r#"{"items": [
            {"id": "hnsw:example1", "opts": "{}", "status": "ACTIVE",
             "updated": "2024-08-18T10:40:34Z", "version": "NjqOYyOkpMHfg3.6"},
            {"id": "hnsw:example2", "status": "PENDING", "pending": "NjqOYyOkpMHfg3.7"}
        ]}"#;
        let instances: Instances = serde_json::from_str(body).unwrap();
        assert_eq!(instances.items.len(), 2);
        assert_eq!(instances.items[0].id.name(), "example1");
        assert_eq!(instances.items[0].status, status::ACTIVE);
        assert!(instances.items[0].updated.is_some());
        assert_eq!(instances.items[1].pending, "NjqOYyOkpMHfg3.7");
        assert!(instances.items[1].updated.is_none());
    }

    #[test]
    fn test_empty_instances() {
        let instances: Instances = serde_json::from_str("{}").unwrap();
        assert!(instances.items.is_empty());
    }
}
