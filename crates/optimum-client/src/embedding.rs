//! Writing text through an embedding model.

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use tokio_util::sync::CancellationToken;

use optimum_types::Vector;

use crate::client::OptimumClient;
use crate::error::ClientError;
use crate::writer::{SegmentSink, VectorWriter};

/// Turns text into a vector.
#[async_trait]
pub trait Embeddings: Send + Sync {
    async fn embedding(&self, text: &str) -> Result<Vec<f32>, ClientError>;
}

/// Content-derived unique key of a text: its SHA-1 digest (20 bytes).
///
/// Keys match those of existing text streams, so re-ingesting a text
/// upserts it instead of adding a duplicate.
pub fn content_key(text: &str) -> Vec<u8> {
    Sha1::digest(text.as_bytes()).to_vec()
}

/// Vector writer fed with text.
///
/// Identical texts map to the same key, so rewriting a text upserts it.
pub struct EmbeddingWriter<E: Embeddings, S: SegmentSink = OptimumClient> {
    embeddings: E,
    writer: VectorWriter<S>,
}

impl<E: Embeddings, S: SegmentSink> EmbeddingWriter<E, S> {
    /// Wrap `writer`, embedding every text with `embeddings`.
    pub fn new(embeddings: E, writer: VectorWriter<S>) -> Self {
        Self { embeddings, writer }
    }

    /// Embed `text` and buffer it under its content key.
    pub async fn write(&mut self, text: &str, cancel: &CancellationToken) -> Result<(), ClientError> {
        let vector = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            v = self.embeddings.embedding(text) => v?,
        };

        self.writer
            .write(Vector::new(content_key(text), vector), cancel)
            .await
    }

    /// Upload the open segment.
    pub async fn sync(&mut self, cancel: &CancellationToken) -> Result<(), ClientError> {
        self.writer.sync(cancel).await
    }

    /// Give back the wrapped vector writer.
    pub fn into_inner(self) -> VectorWriter<S> {
        self.writer
    }
}
