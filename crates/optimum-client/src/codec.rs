//! Wire codecs for buffered records.
//!
//! A codec appends one record to an open stream. It never validates the
//! record: key lengths and vector dimensions are the caller's and the
//! service's concern. Errors come only from the underlying stream.
//!
//! Binary frame layout (all integers big-endian):
//!
//! ```text
//! u32 key_len | key | u32 sort_len | sort | u32 dim | f32 × dim
//! ```
//!
//! JSON layout: one `Vector` object per line, byte strings in base64.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;

use optimum_types::{Sentence, Vector, WireFormat};

/// Where a finished segment is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    /// PUT `/ds/{class}/{name}` with an octet-stream body.
    Bulk,
    /// POST `/ds/{class}/{name}/objects` with a JSON envelope.
    Objects,
}

/// Encodes records of one kind into a segment.
pub trait Codec: Send + Sync {
    type Record;

    /// Append `record` to `out`.
    fn encode<W: Write>(&self, out: &mut W, record: &Self::Record) -> io::Result<()>;

    /// Endpoint accepting segments produced by this codec.
    fn route(&self) -> UploadRoute;

    /// Whether a segment whose upload failed is kept for another sync.
    fn retain_on_failure(&self) -> bool {
        true
    }
}

/// Codec for vector records in the deployment's wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorCodec {
    format: WireFormat,
}

impl VectorCodec {
    /// Create a codec writing `format`.
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }
}

impl Codec for VectorCodec {
    type Record = Vector;

    fn encode<W: Write>(&self, out: &mut W, record: &Vector) -> io::Result<()> {
        match self.format {
            WireFormat::Binary => encode_binary(out, record),
            WireFormat::Json => encode_json(out, record),
        }
    }

    fn route(&self) -> UploadRoute {
        match self.format {
            WireFormat::Binary => UploadRoute::Bulk,
            WireFormat::Json => UploadRoute::Objects,
        }
    }
}

/// Codec for text corpus records: JSON lines.
///
/// Segments that fail to upload are abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentenceCodec;

impl Codec for SentenceCodec {
    type Record = Sentence;

    fn encode<W: Write>(&self, out: &mut W, record: &Sentence) -> io::Result<()> {
        serde_json::to_writer(&mut *out, record).map_err(io::Error::from)?;
        out.write_all(b"\n")
    }

    fn route(&self) -> UploadRoute {
        UploadRoute::Objects
    }

    fn retain_on_failure(&self) -> bool {
        false
    }
}

fn write_len<W: Write>(out: &mut W, len: usize) -> io::Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length exceeds u32"))?;
    out.write_all(&len.to_be_bytes())
}

/// Append one binary frame.
pub fn encode_binary<W: Write>(out: &mut W, v: &Vector) -> io::Result<()> {
    let sort_key = v.sort_key.as_deref().unwrap_or_default();

    write_len(out, v.unique_key.len())?;
    out.write_all(&v.unique_key)?;
    write_len(out, sort_key.len())?;
    out.write_all(sort_key)?;
    write_len(out, v.vector.len())?;
    for x in &v.vector {
        out.write_all(&x.to_be_bytes())?;
    }

    Ok(())
}

/// Append one JSON line.
pub fn encode_json<W: Write>(out: &mut W, v: &Vector) -> io::Result<()> {
    serde_json::to_writer(&mut *out, v).map_err(io::Error::from)?;
    out.write_all(b"\n")
}

/// Read a u32 length, or `None` at a clean end of stream.
fn read_len<R: Read>(r: &mut R) -> io::Result<Option<usize>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated length prefix",
            ));
        }
        filled += n;
    }
    Ok(Some(u32::from_be_bytes(buf) as usize))
}

fn read_exact_len<R: Read>(r: &mut R) -> io::Result<usize> {
    read_len(r)?.ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "truncated frame"))
}

fn read_bytes<R: Read>(r: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Decode a stream of binary frames.
pub fn decode_binary<R: Read>(mut r: R) -> io::Result<Vec<Vector>> {
    let mut out = Vec::new();

    while let Some(key_len) = read_len(&mut r)? {
        let unique_key = read_bytes(&mut r, key_len)?;

        let sort_len = read_exact_len(&mut r)?;
        let sort_key = read_bytes(&mut r, sort_len)?;

        let dim = read_exact_len(&mut r)?;
        let mut vector = Vec::with_capacity(dim);
        let mut f = [0u8; 4];
        for _ in 0..dim {
            r.read_exact(&mut f)?;
            vector.push(f32::from_be_bytes(f));
        }

        out.push(Vector {
            unique_key,
            sort_key: (!sort_key.is_empty()).then_some(sort_key),
            vector,
        });
    }

    Ok(out)
}

/// Decode a stream of JSON lines.
pub fn decode_json<R: Read>(r: R) -> io::Result<Vec<Vector>> {
    serde_json::Deserializer::from_reader(r)
        .into_iter::<Vector>()
        .map(|v| v.map_err(io::Error::from))
        .collect()
}

/// Decompress and decode a whole segment body.
pub fn decode_segment(body: &[u8], format: WireFormat) -> io::Result<Vec<Vector>> {
    let r = GzDecoder::new(body);
    match format {
        WireFormat::Binary => decode_binary(r),
        WireFormat::Json => decode_json(r),
    }
}
