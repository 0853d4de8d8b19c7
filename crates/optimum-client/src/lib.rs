//! Client library for the optimum vector service.
//!
//! This crate provides:
//! - `OptimumClient`: one request per call against the HTTP surface
//!   (list, create, commit, remove, write, query, status)
//! - `VectorWriter` / `SentenceWriter`: batched ingestion into gzip
//!   segments flushed at a compressed-size threshold
//! - `JobPoller`: fixed-interval polling of create/commit jobs
//!
//! # Example
//!
//! ```rust,no_run
//! use optimum_client::{JobPoller, OptimumClient, VectorWriter, WriterConfig};
//! use optimum_types::{Settings, Vector};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load(None)?;
//!     let client = OptimumClient::from_settings(&settings)?;
//!     let cask = "hnsw:example".parse()?;
//!     let cancel = CancellationToken::new();
//!
//!     let mut writer = VectorWriter::new(client.clone(), cask, WriterConfig::from(&settings));
//!     writer.write(Vector::new(b"a".to_vec(), vec![0.1, 0.2]), &cancel).await?;
//!     writer.sync(&cancel).await?;
//!
//!     let receipt = client.commit(writer.segment().cask()).await?;
//!     let status = JobPoller::from_settings(client, &settings)
//!         .wait(&receipt.job, &cancel)
//!         .await?;
//!     println!("commit {}: {}", receipt.version, status.status);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod embedding;
pub mod error;
pub mod job;
pub mod segment;
pub mod transport;
pub mod writer;

pub use client::OptimumClient;
pub use codec::{Codec, SentenceCodec, UploadRoute, VectorCodec};
pub use embedding::{content_key, EmbeddingWriter, Embeddings};
pub use error::ClientError;
pub use job::{JobPoller, StatusSource};
pub use segment::SegmentBuffer;
pub use transport::Transport;
pub use writer::{SegmentSink, SegmentWriter, SentenceWriter, VectorWriter, WriterConfig};
