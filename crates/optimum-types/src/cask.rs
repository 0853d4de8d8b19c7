//! Cask identity.
//!
//! A cask is a named collection hosted by the service. It is addressed by
//! the algorithm family backing it (the class, e.g. `hnsw`) and a unique
//! name, written together as `class:name`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::OptimumError;

/// Identity of a remote collection, e.g. `hnsw:example`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cask {
    class: String,
    name: String,
}

impl Cask {
    /// Build a cask from its class and name.
    ///
    /// # Errors
    ///
    /// Returns `OptimumError::InvalidCask` if either part is empty or
    /// contains the `:` separator.
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Result<Self, OptimumError> {
        let class = class.into();
        let name = name.into();

        if class.is_empty() || name.is_empty() {
            return Err(OptimumError::InvalidCask(format!(
                "class and name must be non-empty, got '{}:{}'",
                class, name
            )));
        }
        if class.contains(':') || name.contains(':') {
            return Err(OptimumError::InvalidCask(format!(
                "class and name must not contain ':', got '{}' / '{}'",
                class, name
            )));
        }

        Ok(Self { class, name })
    }

    /// Algorithm family (URL path segment after `/ds/`).
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Unique cask name within its class.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for Cask {
    type Err = OptimumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((class, name)) => Cask::new(class, name),
            None => Err(OptimumError::InvalidCask(format!(
                "expected 'class:name', got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Cask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.name)
    }
}

impl Serialize for Cask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cask() {
        let cask: Cask = "hnsw:example".parse().unwrap();
        assert_eq!(cask.class(), "hnsw");
        assert_eq!(cask.name(), "example");
        assert_eq!(cask.to_string(), "hnsw:example");
    }

    #[test]
    fn test_parse_cask_without_separator() {
        let result = "example".parse::<Cask>();
        assert!(matches!(result, Err(OptimumError::InvalidCask(_))));
    }

    #[test]
    fn test_parse_cask_empty_parts() {
        assert!(":example".parse::<Cask>().is_err());
        assert!("hnsw:".parse::<Cask>().is_err());
    }

    #[test]
    fn test_parse_cask_extra_separator() {
        assert!("hnsw:a:b".parse::<Cask>().is_err());
    }

    #[test]
    fn test_cask_serde_as_string() {
        let cask = Cask::new("hnsw", "example").unwrap();
        let json = serde_json::to_string(&cask).unwrap();
        assert_eq!(json, r#""hnsw:example""#);

        let decoded: Cask = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, cask);
    }
}
