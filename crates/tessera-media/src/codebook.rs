//! Differential codebook assembly.
//!
//! A group of consecutive frames shares one vector-quantization dictionary.
//! Each dictionary arrives either as one full chunk or as `group_size`
//! partial chunks accumulated across the group. Assembly happens in a scratch
//! buffer owned by the loader; committing produces an immutable [`Codebook`]
//! behind an `Arc`, and every frame records the handle that was committed at
//! the moment its pixel payload arrived. A recorded handle can therefore
//! never be clobbered by later assembly.

use crate::compress::Decompressor;
use crate::{Error, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

/// Fixed headroom in the back-anchored compressed-partial offset.
///
/// The first compressed partial of a group lands at
/// `capacity - (chunk_size * group_size + PARTIAL_MARGIN)`, a worst-case
/// estimate of the group's total compressed size inherited from the wire
/// format. Changing it would break compatibility with existing movie files.
pub const PARTIAL_MARGIN: usize = 0x100;

/// One committed vector-quantization dictionary.
#[derive(Debug)]
pub struct Codebook {
    data: Bytes,
    compressed: bool,
    expanded_capacity: usize,
    expanded: Mutex<Option<Bytes>>,
}

impl Codebook {
    /// Resolve the dictionary to its plain byte form.
    ///
    /// Decompresses at most once; later callers sharing this codebook reuse
    /// the expanded buffer.
    pub fn resolve(&self, codec: &dyn Decompressor) -> Result<Bytes> {
        if !self.compressed {
            return Ok(self.data.clone());
        }
        let mut cache = self.expanded.lock();
        if let Some(expanded) = cache.as_ref() {
            return Ok(expanded.clone());
        }
        let mut plain = vec![0u8; self.expanded_capacity];
        let produced = codec.decompress(&self.data, &mut plain)?;
        plain.truncate(produced);
        let plain = Bytes::from(plain);
        *cache = Some(plain.clone());
        Ok(plain)
    }

    /// Whether the raw payload is still compressed.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Raw payload length in bytes.
    pub fn raw_len(&self) -> usize {
        self.data.len()
    }
}

/// Accumulates full or partial codebook chunks and commits dictionaries.
#[derive(Debug)]
pub struct CodebookAssembler {
    buf: Vec<u8>,
    capacity: usize,
    group_size: u32,
    partial_chunks: u32,
    write_pos: usize,
    anchor: usize,
    compressed: bool,
}

impl CodebookAssembler {
    /// Create an assembler for dictionaries of the given expanded capacity.
    pub fn new(capacity: usize, group_size: u8) -> Self {
        Self {
            buf: vec![0u8; capacity],
            capacity,
            group_size: group_size as u32,
            partial_chunks: 0,
            write_pos: 0,
            anchor: 0,
            compressed: false,
        }
    }

    /// Replace the assembling dictionary wholesale and commit it.
    ///
    /// Resets the partial accumulator; the returned handle becomes the
    /// committed dictionary for frames loaded from here on.
    pub fn load_full(&mut self, bytes: &[u8], compressed: bool) -> Result<Arc<Codebook>> {
        if bytes.len() > self.capacity {
            return Err(Error::format(format!(
                "full codebook chunk of {} bytes exceeds capacity {}",
                bytes.len(),
                self.capacity
            )));
        }
        self.reset();
        Ok(Arc::new(Codebook {
            data: Bytes::copy_from_slice(bytes),
            compressed,
            expanded_capacity: self.capacity,
            expanded: Mutex::new(None),
        }))
    }

    /// Append one partial chunk.
    ///
    /// Returns the committed dictionary once exactly `group_size` partials
    /// have accumulated since the last commit, `None` before that.
    pub fn load_partial(
        &mut self,
        bytes: &[u8],
        compressed: bool,
    ) -> Result<Option<Arc<Codebook>>> {
        if self.partial_chunks == 0 {
            self.compressed = compressed;
            if compressed {
                // Back-anchored placement; see PARTIAL_MARGIN. Underflow here
                // means the encoder violated its own worst-case bound, which
                // the legacy format treats as impossible.
                let reserve = bytes.len() * self.group_size as usize + PARTIAL_MARGIN;
                debug_assert!(reserve <= self.capacity, "partial codebook back-anchor underflow");
                self.anchor = self.capacity - reserve;
                self.write_pos = self.anchor;
            } else {
                self.anchor = 0;
                self.write_pos = 0;
            }
        } else if compressed != self.compressed {
            return Err(Error::format(
                "mixed raw and compressed partial codebook chunks in one group",
            ));
        }

        let end = self.write_pos + bytes.len();
        if end > self.capacity {
            return Err(Error::format(format!(
                "partial codebook overflow: {} bytes past capacity {}",
                end, self.capacity
            )));
        }
        self.buf[self.write_pos..end].copy_from_slice(bytes);
        self.write_pos = end;
        self.partial_chunks += 1;

        if self.partial_chunks < self.group_size {
            return Ok(None);
        }

        let data = Bytes::copy_from_slice(&self.buf[self.anchor..self.write_pos]);
        let committed = Arc::new(Codebook {
            data,
            compressed: self.compressed,
            expanded_capacity: self.capacity,
            expanded: Mutex::new(None),
        });
        self.reset();
        Ok(Some(committed))
    }

    /// Discard any accumulated partials (used when seeking to a group start).
    pub fn reset(&mut self) {
        self.partial_chunks = 0;
        self.write_pos = 0;
        self.anchor = 0;
        self.compressed = false;
    }

    /// Partial chunks accumulated since the last commit.
    pub fn pending_partials(&self) -> u32 {
        self.partial_chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Passthrough;

    #[test]
    fn test_full_commit_resets_accumulator() {
        let mut asm = CodebookAssembler::new(64, 4);
        assert!(asm.load_partial(&[1; 8], false).unwrap().is_none());
        assert_eq!(asm.pending_partials(), 1);

        let cb = asm.load_full(&[7; 32], false).unwrap();
        assert_eq!(asm.pending_partials(), 0);
        assert_eq!(cb.resolve(&Passthrough).unwrap().as_ref(), &[7u8; 32][..]);
    }

    #[test]
    fn test_group_size_partials_commit() {
        let mut asm = CodebookAssembler::new(64, 3);
        assert!(asm.load_partial(&[1; 4], false).unwrap().is_none());
        assert!(asm.load_partial(&[2; 4], false).unwrap().is_none());
        let cb = asm.load_partial(&[3; 4], false).unwrap().expect("commit");

        let plain = cb.resolve(&Passthrough).unwrap();
        assert_eq!(plain.as_ref(), &[1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3][..]);
        assert_eq!(asm.pending_partials(), 0);
    }

    #[test]
    fn test_one_short_of_group_does_not_commit() {
        let mut asm = CodebookAssembler::new(64, 3);
        assert!(asm.load_partial(&[1; 4], false).unwrap().is_none());
        assert!(asm.load_partial(&[2; 4], false).unwrap().is_none());
        assert_eq!(asm.pending_partials(), 2);
    }

    #[test]
    fn test_compressed_partials_back_anchor() {
        // capacity 1024, group 2, first chunk 100 bytes:
        // anchor = 1024 - (100 * 2 + 0x100) = 568.
        let mut asm = CodebookAssembler::new(1024, 2);
        assert!(asm.load_partial(&[0xAA; 100], true).unwrap().is_none());
        assert_eq!(asm.anchor, 568);
        let cb = asm.load_partial(&[0xBB; 60], true).unwrap().expect("commit");

        assert!(cb.is_compressed());
        assert_eq!(cb.raw_len(), 160);
        // Passthrough "decompresses" the concatenated compressed stream.
        let plain = cb.resolve(&Passthrough).unwrap();
        assert_eq!(&plain[..100], &[0xAA; 100][..]);
        assert_eq!(&plain[100..], &[0xBB; 60][..]);
    }

    #[test]
    fn test_resolve_is_memoized() {
        struct Counting(std::cell::Cell<u32>);
        impl Decompressor for Counting {
            fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
                self.0.set(self.0.get() + 1);
                Passthrough.decompress(src, dst)
            }
        }

        let mut asm = CodebookAssembler::new(1024, 1);
        let cb = asm.load_partial(&[5; 16], true).unwrap().expect("commit");
        let codec = Counting(std::cell::Cell::new(0));
        cb.resolve(&codec).unwrap();
        cb.resolve(&codec).unwrap();
        assert_eq!(codec.0.get(), 1);
    }

    #[test]
    fn test_mixed_partial_kinds_rejected() {
        let mut asm = CodebookAssembler::new(4096, 2);
        assert!(asm.load_partial(&[1; 8], false).unwrap().is_none());
        assert!(asm.load_partial(&[2; 8], true).is_err());
    }

    #[test]
    fn test_oversized_full_chunk_rejected() {
        let mut asm = CodebookAssembler::new(16, 2);
        assert!(asm.load_full(&[0; 32], false).is_err());
    }
}
