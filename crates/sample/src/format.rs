//! Record header constants and encode/decode helpers.
//!
//! Decoding never trusts a declared size blindly: every helper checks the
//! size against the bytes it was actually given and fails with a
//! [`FormatError`] instead of reading past the end.

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::{Result, SeriesId, Timestamp};

/// Size of the fixed record header:
/// 8 (`timestamp`) + 8 (`series_id`) + 4 (`kind`) + 4 (`size`).
pub const HEADER_BYTES: usize = 8 + 8 + 4 + 4;

/// Size of a record carrying a single `f64` value.
pub const FLOAT_SAMPLE_BYTES: usize = HEADER_BYTES + 8;

/// Payload kind of a 64-bit floating point value.
pub const KIND_FLOAT: u32 = 1;

/// Payload kind of an opaque byte string.
pub const KIND_BLOB: u32 = 2;

const TS_OFFSET: usize = 0;
const ID_OFFSET: usize = 8;
const KIND_OFFSET: usize = 16;
const SIZE_OFFSET: usize = 20;

/// Errors raised while encoding or decoding records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Fewer bytes than a record header.
    #[error("truncated header: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },

    /// The header declares a record shorter than the header itself.
    #[error("record size {declared} is smaller than the 24-byte header")]
    Undersized {
        /// Declared record size.
        declared: usize,
    },

    /// The header declares more bytes than the buffer holds.
    #[error("record size {declared} overruns buffer ({available} bytes left)")]
    Overrun {
        /// Declared record size.
        declared: usize,
        /// Bytes remaining in the buffer.
        available: usize,
    },

    /// A float record whose size is not [`FLOAT_SAMPLE_BYTES`].
    #[error("float record has size {declared}, expected 32")]
    FloatSize {
        /// Declared record size.
        declared: usize,
    },

    /// Payload too large for the `size` field.
    #[error("record of {len} bytes does not fit the size field")]
    TooLarge {
        /// Total record length that was requested.
        len: usize,
    },
}

/// The fixed part of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleHeader {
    pub timestamp: Timestamp,
    pub series_id: SeriesId,
    pub kind: u32,
    /// Whole record length, header included.
    pub size: u32,
}

impl SampleHeader {
    /// Reads a header from the front of `buf` and checks that the declared
    /// record fits in `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_BYTES {
            return Err(FormatError::Truncated {
                needed: HEADER_BYTES,
                available: buf.len(),
            });
        }
        let header = Self::read(buf);
        header.check_extent(buf.len())?;
        Ok(header)
    }

    /// Reads the header fields without checking the declared size. Meant for
    /// buffers whose records were already validated.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`HEADER_BYTES`].
    #[must_use]
    pub fn read(buf: &[u8]) -> Self {
        Self {
            timestamp: LittleEndian::read_u64(&buf[TS_OFFSET..ID_OFFSET]),
            series_id: LittleEndian::read_u64(&buf[ID_OFFSET..KIND_OFFSET]),
            kind: LittleEndian::read_u32(&buf[KIND_OFFSET..SIZE_OFFSET]),
            size: LittleEndian::read_u32(&buf[SIZE_OFFSET..HEADER_BYTES]),
        }
    }

    /// Writes the header into the first [`HEADER_BYTES`] of `dest`.
    ///
    /// # Panics
    ///
    /// Panics if `dest` is shorter than [`HEADER_BYTES`].
    pub fn encode(&self, dest: &mut [u8]) {
        LittleEndian::write_u64(&mut dest[TS_OFFSET..ID_OFFSET], self.timestamp);
        LittleEndian::write_u64(&mut dest[ID_OFFSET..KIND_OFFSET], self.series_id);
        LittleEndian::write_u32(&mut dest[KIND_OFFSET..SIZE_OFFSET], self.kind);
        LittleEndian::write_u32(&mut dest[SIZE_OFFSET..HEADER_BYTES], self.size);
    }

    /// Declared length of the whole record.
    #[must_use]
    pub fn record_len(&self) -> usize {
        self.size as usize
    }

    /// Checks the declared size against the `available` bytes starting at
    /// this header.
    pub fn check_extent(&self, available: usize) -> Result<()> {
        let declared = self.record_len();
        if declared < HEADER_BYTES {
            return Err(FormatError::Undersized { declared });
        }
        if declared > available {
            return Err(FormatError::Overrun {
                declared,
                available,
            });
        }
        Ok(())
    }
}

/// Writes a float record into the front of `dest` and returns its length.
///
/// # Panics
///
/// Panics if `dest` is shorter than [`FLOAT_SAMPLE_BYTES`].
pub fn encode_float(dest: &mut [u8], timestamp: Timestamp, series_id: SeriesId, value: f64) -> usize {
    SampleHeader {
        timestamp,
        series_id,
        kind: KIND_FLOAT,
        size: FLOAT_SAMPLE_BYTES as u32,
    }
    .encode(dest);
    LittleEndian::write_f64(&mut dest[HEADER_BYTES..FLOAT_SAMPLE_BYTES], value);
    FLOAT_SAMPLE_BYTES
}

/// Appends a float record to `out`.
pub fn append_float(out: &mut Vec<u8>, timestamp: Timestamp, series_id: SeriesId, value: f64) {
    let start = out.len();
    out.resize(start + FLOAT_SAMPLE_BYTES, 0);
    encode_float(&mut out[start..], timestamp, series_id, value);
}

/// Appends a record with an opaque payload of the given `kind` to `out` and
/// returns the record length.
pub fn encode_blob(
    out: &mut Vec<u8>,
    timestamp: Timestamp,
    series_id: SeriesId,
    kind: u32,
    payload: &[u8],
) -> Result<usize> {
    let len = HEADER_BYTES + payload.len();
    let size = u32::try_from(len).map_err(|_| FormatError::TooLarge { len })?;
    let start = out.len();
    out.resize(start + HEADER_BYTES, 0);
    SampleHeader {
        timestamp,
        series_id,
        kind,
        size,
    }
    .encode(&mut out[start..]);
    out.extend_from_slice(payload);
    Ok(len)
}

/// Decoded payload of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Float(f64),
    /// Any non-float kind; the bytes are kept as they were.
    Raw { kind: u32, bytes: Vec<u8> },
}

/// A fully decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub series_id: SeriesId,
    pub payload: Payload,
}

impl Sample {
    /// Convenience constructor for a float sample.
    #[must_use]
    pub fn float(timestamp: Timestamp, series_id: SeriesId, value: f64) -> Self {
        Self {
            timestamp,
            series_id,
            payload: Payload::Float(value),
        }
    }

    /// Decodes the record at the front of `buf`, returning it with its
    /// length.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let header = SampleHeader::decode(buf)?;
        let len = header.record_len();
        let body = &buf[HEADER_BYTES..len];
        let payload = if header.kind == KIND_FLOAT {
            if len != FLOAT_SAMPLE_BYTES {
                return Err(FormatError::FloatSize { declared: len });
            }
            Payload::Float(LittleEndian::read_f64(body))
        } else {
            Payload::Raw {
                kind: header.kind,
                bytes: body.to_vec(),
            }
        };
        Ok((
            Self {
                timestamp: header.timestamp,
                series_id: header.series_id,
                payload,
            },
            len,
        ))
    }

    /// Appends the encoded record to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<usize> {
        match &self.payload {
            Payload::Float(v) => {
                append_float(out, self.timestamp, self.series_id, *v);
                Ok(FLOAT_SAMPLE_BYTES)
            }
            Payload::Raw { kind, bytes } => {
                encode_blob(out, self.timestamp, self.series_id, *kind, bytes)
            }
        }
    }

    /// The float value, if this is a float sample.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(v) => Some(v),
            Payload::Raw { .. } => None,
        }
    }
}

/// Iterates over the records packed in `buf`, yielding each one's raw bytes.
///
/// Stops after the first malformed record.
#[must_use]
pub fn records(buf: &[u8]) -> Records<'_> {
    Records {
        buf,
        pos: 0,
        failed: false,
    }
}

/// Iterator returned by [`records`].
#[derive(Debug)]
pub struct Records<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Records<'a> {
    /// Byte offset of the next record.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];
        match SampleHeader::decode(rest) {
            Ok(header) => {
                let len = header.record_len();
                self.pos += len;
                Some(Ok(&rest[..len]))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
