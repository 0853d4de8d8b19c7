//! # optimum-types
//!
//! Shared domain types for the optimum vector ingestion client.
//!
//! This crate defines the data structures exchanged with the service:
//! - Cask: identity of a remote collection (`class:name`)
//! - Vector, Query, QueryResult: vector records and nearest-neighbor queries
//! - Sentence, TextQuery, TextResult: text corpus records
//! - Receipt, Job, JobStatus: asynchronous create/commit jobs
//! - Instance: server view of a cask
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use optimum_types::{Cask, Vector};
//!
//! let cask: Cask = "hnsw:example".parse().unwrap();
//! let v = Vector::new(b"key".to_vec(), vec![0.1, 0.2]);
//! assert_eq!(cask.class(), "hnsw");
//! assert_eq!(v.vector.len(), 2);
//! ```

pub mod cask;
pub mod config;
pub mod error;
pub mod instance;
pub mod job;
pub mod sentence;
pub mod serde_helpers;
pub mod vector;

pub use cask::Cask;
pub use config::{KeyPolicy, Settings, WireFormat};
pub use error::OptimumError;
pub use instance::{Instance, Instances};
pub use job::{Job, JobStatus, Receipt, STATUS_FAILED, STATUS_SUCCEEDED};
pub use sentence::{Sentence, TextHit, TextQuery, TextResult};
pub use vector::{Hit, Query, QueryResult, Source, Vector, MAX_KEY_LEN};
