//! Frame pool: a fixed ring of frame slots shared by loader and drawer.
//!
//! The loader fills the slot at the write cursor; the drawer consumes slots
//! strictly in ascending frame order from the read cursor. A slot stays
//! unavailable to the loader from the moment it is marked loaded until the
//! drawer releases it, which is the no-clobber guarantee for in-flight
//! frames. Bounded ring size is the backpressure mechanism: when the next
//! write slot is still held, the loader reports "no buffer" and consumes no
//! input.

use crate::codebook::Codebook;
use std::sync::Arc;

/// How a frame's pointer payload is stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Plain big-endian u16 grid.
    Raw,
    /// Compressed grid.
    Compressed,
    /// Compressed grid, alternate legacy layout.
    CompressedAlt,
    /// Compressed grid that also marks the frame as a key frame.
    CompressedKey,
}

impl PointerKind {
    /// Whether the payload needs decompression before decode.
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::Raw)
    }
}

/// One pending or decoded frame.
#[derive(Debug)]
pub struct FrameSlot {
    /// Frame number stamped at load completion.
    pub frame_num: u32,
    /// Pointer payload (per-tile codebook indices, possibly compressed).
    pub pointer: Vec<u8>,
    /// Wire form of the pointer payload.
    pub pointer_kind: PointerKind,
    /// Palette payload (possibly compressed), empty when absent.
    pub palette: Vec<u8>,
    /// Whether the palette payload is compressed.
    pub palette_compressed: bool,
    /// Whether this frame carries a palette.
    pub has_palette: bool,
    /// Whether this is a key frame (never skipped during catch-up).
    pub key: bool,
    /// Dictionary committed when this frame's pixel payload arrived.
    pub codebook: Option<Arc<Codebook>>,
    /// Set only after the full payload was read without error.
    pub loaded: bool,
    claimed: bool,
}

impl FrameSlot {
    fn new() -> Self {
        Self {
            frame_num: 0,
            pointer: Vec::new(),
            pointer_kind: PointerKind::Raw,
            palette: Vec::new(),
            palette_compressed: false,
            has_palette: false,
            key: false,
            codebook: None,
            loaded: false,
            claimed: false,
        }
    }

    /// Clear per-frame state before reloading this slot.
    pub fn begin_load(&mut self) {
        self.pointer.clear();
        self.pointer_kind = PointerKind::Raw;
        self.palette.clear();
        self.palette_compressed = false;
        self.has_palette = false;
        self.key = false;
        self.codebook = None;
        self.loaded = false;
        self.claimed = false;
    }

    /// Whether the drawer currently holds this slot.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// Fixed-size ring of frame slots.
pub struct FramePool {
    slots: Vec<FrameSlot>,
    write: usize,
    read: usize,
}

impl FramePool {
    /// Create a pool with the given slot count.
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| FrameSlot::new()).collect(),
            write: 0,
            read: 0,
        }
    }

    /// Slot count.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool has no slots (never true for a valid configuration).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the loader may fill the slot at the write cursor.
    pub fn can_write(&self) -> bool {
        let slot = &self.slots[self.write];
        !slot.loaded && !slot.claimed
    }

    /// Mutable access to the write-cursor slot, if the drawer has released it.
    pub fn write_slot_mut(&mut self) -> Option<&mut FrameSlot> {
        if self.can_write() {
            Some(&mut self.slots[self.write])
        } else {
            None
        }
    }

    /// Advance the write cursor after a completed load.
    pub fn advance_write(&mut self) {
        self.write = (self.write + 1) % self.slots.len();
    }

    /// The slot the drawer will consume next.
    pub fn pending(&self) -> &FrameSlot {
        &self.slots[self.read]
    }

    /// Claim the pending slot for decode/present.
    pub fn claim_pending(&mut self) {
        self.slots[self.read].claimed = true;
    }

    /// Release the pending slot back to the loader and advance the read cursor.
    pub fn release_pending(&mut self) {
        let slot = &mut self.slots[self.read];
        slot.loaded = false;
        slot.claimed = false;
        self.read = (self.read + 1) % self.slots.len();
    }

    /// Number of slots currently holding a loaded, unconsumed frame.
    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.loaded).count()
    }

    /// Drop all frames and reset both cursors (used by seek).
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.begin_load();
        }
        self.write = 0;
        self.read = 0;
    }
}
