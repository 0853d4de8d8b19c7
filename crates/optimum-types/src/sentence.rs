//! Natural-language text records for text corpus casks.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::serde_helpers::duration_nanos;
use crate::vector::Source;

/// A short block of text with its provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Short text block.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// URL of the original work this text block is derived from.
    #[serde(rename = "isPartOf", default, skip_serializing_if = "String::is_empty")]
    pub is_part_of: String,

    /// Headline(s) of the text block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headline: Vec<String>,

    /// Relevant keywords for the text block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// External URIs associated with the text block.
    ///
    /// The format is chosen by the client; a URI with a fragment or a
    /// markdown link both work, e.g.
    /// `[An Example Article](http://example.com/article123)`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

impl Sentence {
    /// Create a text block without provenance.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Nearest-neighbor query against a text corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<u32>,

    #[serde(rename = "efSearch", default, skip_serializing_if = "Option::is_none")]
    pub ef_search: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,

    pub text: String,
}

/// A text block returned by a query together with its rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    #[serde(flatten)]
    pub sentence: Sentence,

    #[serde(default)]
    pub rank: f32,
}

/// Result of a text query, hits in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    #[serde(default, with = "duration_nanos")]
    pub took: Duration,

    #[serde(default)]
    pub source: Source,

    #[serde(default)]
    pub hits: Vec<TextHit>,
}
