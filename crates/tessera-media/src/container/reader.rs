//! Sequential tagged-chunk reader.
//!
//! Every chunk on disk is `tag[4] + size_be[4] + payload[size]`, with the
//! payload padded to an even byte boundary. The pad byte is not counted in
//! `size`. All multi-byte container integers are big-endian and byte-swapped
//! on read.

use super::ChunkTag;
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Maximum allowed chunk payload size (16 MB) to prevent OOM on malformed files.
const MAX_CHUNK_SIZE: u32 = 16 * 1024 * 1024;

/// Parsed chunk header.
#[derive(Debug, Clone, Copy)]
pub struct ChunkHeader {
    /// Chunk tag code.
    pub tag: ChunkTag,
    /// Payload size in bytes, excluding the pad byte.
    pub size: u32,
}

impl ChunkHeader {
    /// Payload size including the even-boundary pad byte.
    pub fn padded_size(&self) -> u64 {
        (self.size as u64 + 1) & !1
    }
}

/// Sequential chunk reader over an abstract stream.
pub struct ChunkReader<R> {
    inner: R,
}

impl<R> ChunkReader<R> {
    /// Create a new chunk reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Consume the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Current stream position in bytes.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Seek to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Read the next chunk header.
    ///
    /// Returns `None` on a clean end of stream (no bytes left). A header
    /// truncated mid-way is a format error.
    pub fn read_header(&mut self) -> Result<Option<ChunkHeader>> {
        let mut header = [0u8; 8];
        let mut filled = 0;
        while filled < header.len() {
            let n = self.inner.read(&mut header[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < header.len() {
            return Err(Error::format("truncated chunk header at end of stream"));
        }

        let tag = ChunkTag::from_bytes([header[0], header[1], header[2], header[3]]);
        let size = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        if size > MAX_CHUNK_SIZE {
            return Err(Error::format(format!(
                "chunk '{}' size {} exceeds maximum {}",
                tag, size, MAX_CHUNK_SIZE
            )));
        }

        Ok(Some(ChunkHeader { tag, size }))
    }

    /// Read a chunk payload, consuming the pad byte when present.
    pub fn read_payload(&mut self, header: &ChunkHeader) -> Result<Vec<u8>> {
        let mut data = vec![0u8; header.size as usize];
        self.inner.read_exact(&mut data)?;
        if header.size % 2 == 1 {
            let mut pad = [0u8; 1];
            self.inner.read_exact(&mut pad)?;
        }
        Ok(data)
    }

    /// Skip a chunk payload (including the pad byte) without reading it.
    pub fn skip(&mut self, header: &ChunkHeader) -> Result<()> {
        self.inner.seek(SeekFrom::Current(header.padded_size() as i64))?;
        Ok(())
    }
}
