//! Batched ingestion writers.
//!
//! A writer owns one segment bound to one cask. Records are encoded and
//! compressed as they arrive; once the compressed size reaches the
//! threshold the segment is uploaded in a single request. Callers flush the
//! final partial segment with `sync`.
//!
//! One producer per writer. Concurrent ingestion uses one writer per task,
//! all sharing a cloned `OptimumClient`.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use optimum_types::{Cask, KeyPolicy, Settings, Vector, WireFormat, MAX_KEY_LEN};

use crate::client::OptimumClient;
use crate::codec::{Codec, SentenceCodec, UploadRoute, VectorCodec};
use crate::error::ClientError;
use crate::segment::SegmentBuffer;

/// Destination of finished segments.
#[async_trait]
pub trait SegmentSink: Send + Sync {
    async fn upload(&self, cask: &Cask, route: UploadRoute, body: Bytes)
        -> Result<(), ClientError>;
}

#[async_trait]
impl SegmentSink for OptimumClient {
    async fn upload(
        &self,
        cask: &Cask,
        route: UploadRoute,
        body: Bytes,
    ) -> Result<(), ClientError> {
        match route {
            UploadRoute::Bulk => self.write(cask, body).await,
            UploadRoute::Objects => self.append_objects(cask, body).await,
        }
    }
}

/// Finished segment whose upload has not succeeded yet.
#[derive(Debug)]
struct Undelivered {
    body: Bytes,
    records: usize,
}

/// Writer of compressed segments for any codec.
#[derive(Debug)]
pub struct SegmentWriter<C: Codec, S: SegmentSink = OptimumClient> {
    sink: S,
    cask: Cask,
    codec: C,
    threshold: usize,
    buffer: SegmentBuffer,
    scratch: Vec<u8>,
    undelivered: Option<Undelivered>,
    flushed_segments: u64,
    flushed_bytes: u64,
}

impl<C: Codec, S: SegmentSink> SegmentWriter<C, S> {
    /// Create a writer flushing whenever the compressed segment reaches
    /// `threshold` bytes.
    ///
    /// The threshold is approximate. The compressor holds back up to its
    /// window of pending input, so a segment can overshoot `threshold` by
    /// that much before the size check sees it.
    pub fn new(sink: S, cask: Cask, codec: C, threshold: usize) -> Self {
        Self {
            sink,
            cask,
            codec,
            threshold: threshold.max(1),
            buffer: SegmentBuffer::new(),
            scratch: Vec::new(),
            undelivered: None,
            flushed_segments: 0,
            flushed_bytes: 0,
        }
    }

    /// Cask receiving the segments.
    pub fn cask(&self) -> &Cask {
        &self.cask
    }

    /// Records waiting in the open segment.
    pub fn buffered_records(&self) -> usize {
        self.buffer.records()
    }

    /// Size of a finished segment whose upload failed, if any.
    pub fn undelivered_bytes(&self) -> Option<usize> {
        self.undelivered.as_ref().map(|u| u.body.len())
    }

    /// Segments and bytes uploaded so far.
    pub fn flushed(&self) -> (u64, u64) {
        (self.flushed_segments, self.flushed_bytes)
    }

    /// Encode `record` into the open segment, flushing it once the
    /// threshold is reached.
    ///
    /// # Errors
    ///
    /// `UndeliveredSegment` if a failed segment awaits `sync` or `discard`;
    /// `Encoding` on codec failure; any upload error from the flush.
    pub async fn write(
        &mut self,
        record: &C::Record,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        if let Some(u) = &self.undelivered {
            return Err(ClientError::UndeliveredSegment(u.body.len()));
        }

        self.scratch.clear();
        self.codec.encode(&mut self.scratch, record)?;
        self.buffer.append(&self.scratch)?;

        if self.buffer.size() >= self.threshold {
            debug!(
                cask = %self.cask,
                bytes = self.buffer.size(),
                threshold = self.threshold,
                "Segment threshold reached"
            );
            self.sync(cancel).await?;
        }

        Ok(())
    }

    /// Close the open segment and upload it.
    ///
    /// A no-op when nothing was written. A segment whose previous upload
    /// failed is retried as is. On cancellation the finished segment is kept
    /// for a later `sync`.
    pub async fn sync(&mut self, cancel: &CancellationToken) -> Result<(), ClientError> {
        let (body, records) = match &self.undelivered {
            Some(u) => (u.body.clone(), u.records),
            None => {
                if self.buffer.is_empty() {
                    self.buffer.reset();
                    return Ok(());
                }
                let records = self.buffer.records();
                let body = Bytes::from(self.buffer.finish()?);
                self.undelivered = Some(Undelivered {
                    body: body.clone(),
                    records,
                });
                (body, records)
            }
        };

        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let bytes = body.len();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            r = self.sink.upload(&self.cask, self.codec.route(), body) => r,
        };

        match result {
            Ok(()) => {
                self.undelivered = None;
                self.flushed_segments += 1;
                self.flushed_bytes += bytes as u64;
                info!(cask = %self.cask, records, bytes, "Segment uploaded");
                Ok(())
            }
            Err(ClientError::Cancelled) => {
                warn!(cask = %self.cask, records, bytes, "Segment upload cancelled");
                Err(ClientError::Cancelled)
            }
            Err(e) => {
                if self.codec.retain_on_failure() {
                    warn!(cask = %self.cask, records, bytes, error = %e, "Segment upload failed");
                } else {
                    self.undelivered = None;
                    warn!(
                        cask = %self.cask,
                        records,
                        bytes,
                        error = %e,
                        "Segment upload failed, segment abandoned"
                    );
                }
                Err(e)
            }
        }
    }

    /// Drop the undelivered segment and the open one.
    ///
    /// Returns the number of records thrown away.
    pub fn discard(&mut self) -> usize {
        let dropped = self.undelivered.take().map(|u| u.records).unwrap_or(0)
            + self.buffer.records();
        self.buffer.reset();
        if dropped > 0 {
            warn!(cask = %self.cask, records = dropped, "Discarded buffered records");
        }
        dropped
    }
}

/// Immutable options of a vector writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Approximate flush threshold in compressed bytes. Segments may exceed
    /// it by up to the compressor's window.
    pub chunk_bytes: usize,
    pub wire_format: WireFormat,
    pub key_policy: KeyPolicy,
    pub key_limit: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for WriterConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            chunk_bytes: settings.chunk_bytes,
            wire_format: settings.wire_format,
            key_policy: settings.key_policy,
            key_limit: settings.key_limit,
        }
    }
}

impl WriterConfig {
    /// Apply the key policy to an oversized unique key.
    pub fn admit(&self, mut v: Vector) -> Result<Vector, ClientError> {
        let limit = if self.key_limit == 0 {
            MAX_KEY_LEN
        } else {
            self.key_limit
        };
        let len = v.unique_key.len();
        if len <= limit {
            return Ok(v);
        }

        match self.key_policy {
            KeyPolicy::Truncate => {
                warn!(len, limit, "Truncating unique key");
                v.unique_key.truncate(limit);
                Ok(v)
            }
            KeyPolicy::Reject => Err(ClientError::KeyTooLong { len, limit }),
        }
    }
}

/// Streaming writer of vector records to one cask.
#[derive(Debug)]
pub struct VectorWriter<S: SegmentSink = OptimumClient> {
    inner: SegmentWriter<VectorCodec, S>,
    config: WriterConfig,
}

impl<S: SegmentSink> VectorWriter<S> {
    /// Create a writer for `cask` using the codec and threshold in `config`.
    pub fn new(sink: S, cask: Cask, config: WriterConfig) -> Self {
        let codec = VectorCodec::new(config.wire_format);
        Self {
            inner: SegmentWriter::new(sink, cask, codec, config.chunk_bytes),
            config,
        }
    }

    /// Buffer one vector. Oversized keys are handled by the key policy.
    pub async fn write(
        &mut self,
        vector: Vector,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        let vector = self.config.admit(vector)?;
        self.inner.write(&vector, cancel).await
    }

    /// Upload the open segment. See `SegmentWriter::sync`.
    pub async fn sync(&mut self, cancel: &CancellationToken) -> Result<(), ClientError> {
        self.inner.sync(cancel).await
    }

    /// Drop buffered and undelivered records. See `SegmentWriter::discard`.
    pub fn discard(&mut self) -> usize {
        self.inner.discard()
    }

    /// The underlying segment writer, for counters and state.
    pub fn segment(&self) -> &SegmentWriter<VectorCodec, S> {
        &self.inner
    }
}

/// Streaming writer of text blocks to a text corpus cask.
pub type SentenceWriter<S = OptimumClient> = SegmentWriter<SentenceCodec, S>;

impl<S: SegmentSink> SegmentWriter<SentenceCodec, S> {
    /// Create a text writer flushing at `chunk_bytes` compressed bytes.
    pub fn sentences(sink: S, cask: Cask, chunk_bytes: usize) -> Self {
        Self::new(sink, cask, SentenceCodec, chunk_bytes)
    }
}
