//! Vector records and nearest-neighbor queries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::serde_helpers::{base64_bytes, base64_opt, duration_nanos};

/// Maximum length of a unique key accepted by the service.
pub const MAX_KEY_LEN: usize = 32;

/// A point in k-dimensional space addressed by a unique key.
///
/// The dimension is fixed per cask; the client does not check it, the
/// service does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// Caller-assigned identifier, used by the service for upserts.
    #[serde(
        rename = "id",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "base64_bytes"
    )]
    pub unique_key: Vec<u8>,

    /// Optional secondary key.
    #[serde(
        rename = "sk",
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_opt"
    )]
    pub sort_key: Option<Vec<u8>>,

    /// Components of the vector.
    #[serde(rename = "v")]
    pub vector: Vec<f32>,
}

impl Vector {
    /// Create a vector record without a sort key.
    pub fn new(unique_key: impl Into<Vec<u8>>, vector: Vec<f32>) -> Self {
        Self {
            unique_key: unique_key.into(),
            sort_key: None,
            vector,
        }
    }

    /// Attach a sort key.
    pub fn with_sort_key(mut self, sort_key: impl Into<Vec<u8>>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }
}

/// Nearest-neighbor query against a vector cask.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Number of neighbors to return (server default if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,

    /// Size of the dynamic candidate list used during search.
    #[serde(rename = "efSearch", default, skip_serializing_if = "Option::is_none")]
    pub ef_search: Option<u32>,

    /// Maximum distance of accepted neighbors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,

    /// The query vector.
    pub query: Vec<f32>,
}

impl Query {
    /// Query for `query` with server defaults for every option.
    pub fn new(query: Vec<f32>) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }
}

/// Version of the cask that answered a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub cask: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub size: u64,
}

/// A single neighbor returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(
        rename = "key",
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "base64_bytes"
    )]
    pub unique_key: Vec<u8>,

    #[serde(
        rename = "sort",
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_opt"
    )]
    pub sort_key: Option<Vec<u8>>,

    #[serde(default)]
    pub rank: f32,
}

/// Result of a vector query. Hits are kept in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default, with = "duration_nanos")]
    pub took: Duration,

    #[serde(default, alias = "version")]
    pub source: Source,

    #[serde(default)]
    pub hits: Vec<Hit>,
}
