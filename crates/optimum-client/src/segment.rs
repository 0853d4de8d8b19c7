//! Compressed in-memory segment.

use std::io::{self, Write};
use std::mem;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Gzip image of the records appended since the last reset.
///
/// Each segment is an independent gzip stream. There is no record-level
/// undo: bytes are either finished and handed out, or dropped by `reset`.
pub struct SegmentBuffer {
    zip: GzEncoder<Vec<u8>>,
    records: usize,
}

impl std::fmt::Debug for SegmentBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentBuffer")
            .field("size", &self.size())
            .field("records", &self.records)
            .finish()
    }
}

impl Default for SegmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentBuffer {
    /// Create an empty buffer with an open compression stream.
    pub fn new() -> Self {
        Self {
            zip: GzEncoder::new(Vec::new(), Compression::default()),
            records: 0,
        }
    }

    /// Compress one encoded record into the segment.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.zip.write_all(bytes)?;
        self.records += 1;
        Ok(())
    }

    /// Compressed bytes emitted so far.
    ///
    /// The compressor holds back a window of pending input, so the size
    /// grows in steps and lags behind the appended data.
    pub fn size(&self) -> usize {
        self.zip.get_ref().len()
    }

    /// Records appended since the last reset.
    pub fn records(&self) -> usize {
        self.records
    }

    /// True when no record was appended since the last reset.
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Drop buffered bytes and start a new compression stream.
    pub fn reset(&mut self) {
        self.zip = GzEncoder::new(Vec::new(), Compression::default());
        self.records = 0;
    }

    /// Close the compression stream and take the complete body.
    ///
    /// The buffer is left empty with a fresh stream, ready for appends.
    pub fn finish(&mut self) -> io::Result<Vec<u8>> {
        let zip = mem::replace(
            &mut self.zip,
            GzEncoder::new(Vec::new(), Compression::default()),
        );
        self.records = 0;
        zip.finish()
    }
}
