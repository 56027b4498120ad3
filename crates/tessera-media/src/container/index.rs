//! Frame-offset index (FINF) parsing.
//!
//! One u32 per frame: bit 31 marks a key frame, bit 30 marks a frame that
//! carries a palette chunk, and bits 0..=29 hold the file offset of the
//! frame's first chunk divided by two (all chunks start on even offsets).

use crate::{Error, Result};

const KEY_BIT: u32 = 1 << 31;
const PALETTE_BIT: u32 = 1 << 30;
const OFFSET_MASK: u32 = (1 << 30) - 1;

/// Per-frame file offsets and flags, used for seeking.
#[derive(Debug, Clone)]
pub struct FrameIndex {
    entries: Vec<u32>,
}

impl FrameIndex {
    /// Parse a FINF payload for the given frame count.
    pub fn parse(data: &[u8], frame_count: u16) -> Result<Self> {
        let expected = frame_count as usize * 4;
        if data.len() < expected {
            return Err(Error::format(format!(
                "frame index payload is {} bytes, need {} for {} frames",
                data.len(),
                expected,
                frame_count
            )));
        }
        let entries = data[..expected]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { entries })
    }

    /// Number of indexed frames.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File offset of the frame's first chunk (audio sub-chunks included).
    pub fn offset_of(&self, frame: u32) -> Option<u64> {
        self.entries
            .get(frame as usize)
            .map(|e| ((e & OFFSET_MASK) as u64) << 1)
    }

    /// Whether the frame is a key frame.
    pub fn is_key(&self, frame: u32) -> bool {
        self.entries
            .get(frame as usize)
            .is_some_and(|e| e & KEY_BIT != 0)
    }

    /// Whether the frame carries a palette chunk.
    pub fn has_palette(&self, frame: u32) -> bool {
        self.entries
            .get(frame as usize)
            .is_some_and(|e| e & PALETTE_BIT != 0)
    }

    /// Find the most recent palette-carrying frame at or before the given one.
    pub fn last_palette_at_or_before(&self, frame: u32) -> Option<u32> {
        let last = (frame as usize).min(self.entries.len().saturating_sub(1));
        (0..=last)
            .rev()
            .find(|&i| self.entries[i] & PALETTE_BIT != 0)
            .map(|i| i as u32)
    }
}

/// Encode a frame index entry (offset must be even).
pub fn encode_index_entry(offset: u64, key: bool, palette: bool) -> u32 {
    let mut entry = (offset >> 1) as u32 & OFFSET_MASK;
    if key {
        entry |= KEY_BIT;
    }
    if palette {
        entry |= PALETTE_BIT;
    }
    entry
}
