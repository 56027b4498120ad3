//! Frame loader.
//!
//! The loader is the producer side of the playback pipeline: it pulls chunks
//! from the container reader, routes codebook chunks to the assembler,
//! palette and pointer chunks to the current frame slot, and audio blocks to
//! the host sink, until a frame is complete or a resource is exhausted.
//!
//! "No buffer" and "sleeping" are non-blocking flow control, not errors: in
//! both cases no input is consumed and no state changes, so the caller may
//! retry after making progress elsewhere.

use crate::audio::{AudioCodec, AudioSink, QueueResult};
use crate::codebook::{Codebook, CodebookAssembler};
use crate::container::{ChunkHeader, ChunkReader, ChunkTag, MovieHeader};
use crate::pool::{FramePool, FrameSlot, PointerKind};
use crate::{Error, Result};
use std::io::{Read, Seek};
use std::sync::Arc;

/// Outcome of one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// A frame was completed and stamped.
    Loaded,
    /// The next ring slot is still claimed by the drawer; nothing consumed.
    NoBuffer,
    /// Audio staging is full; nothing consumed.
    Sleeping,
    /// All frames have been loaded.
    EndOfStream,
}

/// Producer state machine.
pub struct Loader {
    next_frame: u32,
    frame_count: u32,
    done: bool,
    committed: Option<Arc<Codebook>>,
    assembler: CodebookAssembler,
    span_bytes: u32,
    max_frame_bytes: u32,
    frames_loaded: u64,
    suppress_audio: bool,
}

impl Loader {
    /// Create a loader for the given movie.
    pub fn new(header: &MovieHeader) -> Self {
        Self {
            next_frame: 0,
            frame_count: header.frame_count as u32,
            done: false,
            committed: None,
            assembler: CodebookAssembler::new(header.codebook_bytes(), header.group_size),
            span_bytes: 0,
            max_frame_bytes: 0,
            frames_loaded: 0,
            suppress_audio: false,
        }
    }

    /// Whether every frame has been loaded.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Frame number the next completed load will be stamped with.
    pub fn next_frame(&self) -> u32 {
        self.next_frame
    }

    /// Largest frame span observed so far, in bytes.
    pub fn max_frame_bytes(&self) -> u32 {
        self.max_frame_bytes
    }

    /// Total frames loaded so far.
    pub fn frames_loaded(&self) -> u64 {
        self.frames_loaded
    }

    /// Drop audio blocks instead of queueing them (seek replay).
    pub fn set_suppress_audio(&mut self, suppress: bool) {
        self.suppress_audio = suppress;
    }

    /// Rewind the loader to a group boundary (seek).
    ///
    /// Clears the committed dictionary and the partial accumulator; the
    /// caller is responsible for positioning the reader at the boundary
    /// frame's first chunk.
    pub fn restart_at(&mut self, frame: u32) {
        self.next_frame = frame;
        self.done = false;
        self.committed = None;
        self.assembler.reset();
        self.span_bytes = 0;
    }

    /// Load the next frame into the pool.
    pub fn load_next_frame<R: Read + Seek>(
        &mut self,
        reader: &mut ChunkReader<R>,
        pool: &mut FramePool,
        audio: &mut dyn AudioSink,
    ) -> Result<LoadStatus> {
        if self.done {
            return Ok(LoadStatus::EndOfStream);
        }
        if !pool.can_write() {
            return Ok(LoadStatus::NoBuffer);
        }

        loop {
            let position = reader.position()?;
            let chunk = reader.read_header()?.ok_or_else(|| {
                Error::format(format!(
                    "stream ended at frame {} of {}",
                    self.next_frame, self.frame_count
                ))
            })?;

            match chunk.tag {
                tag if tag.is_audio() => {
                    if self.suppress_audio {
                        reader.skip(&chunk)?;
                        continue;
                    }
                    let codec = AudioCodec::from_tag(tag)
                        .ok_or_else(|| Error::format(format!("bad audio tag '{}'", tag)))?;
                    let payload = reader.read_payload(&chunk)?;
                    match audio.queue(codec, &payload)? {
                        QueueResult::Accepted => {
                            self.span_bytes += chunk.size;
                        }
                        QueueResult::Full => {
                            // Back out of the chunk entirely so the retry
                            // re-offers the same block.
                            reader.seek_to(position)?;
                            return Ok(LoadStatus::Sleeping);
                        }
                    }
                }
                ChunkTag::CAP0 => {
                    reader.skip(&chunk)?;
                }
                tag if tag.is_frame_container() => {
                    let key_container = tag == ChunkTag::VQFK;
                    let slot = match pool.write_slot_mut() {
                        Some(slot) => slot,
                        None => return Ok(LoadStatus::NoBuffer),
                    };
                    slot.begin_load();
                    slot.key = key_container;
                    let body_bytes =
                        Self::read_frame_body(reader, &chunk, slot, &mut self.assembler, &mut self.committed)?;

                    slot.frame_num = self.next_frame;
                    slot.loaded = true;

                    let frame_bytes = self.span_bytes + body_bytes;
                    self.max_frame_bytes = self.max_frame_bytes.max(frame_bytes);
                    self.span_bytes = 0;
                    self.frames_loaded += 1;
                    self.next_frame += 1;
                    if self.next_frame >= self.frame_count {
                        self.done = true;
                    }
                    pool.advance_write();
                    tracing::trace!(frame = self.next_frame - 1, bytes = frame_bytes, "frame loaded");
                    return Ok(LoadStatus::Loaded);
                }
                tag => {
                    tracing::debug!(tag = %tag, frame = self.next_frame, "skipping unrecognized chunk between frames");
                    reader.skip(&chunk)?;
                }
            }
        }
    }

    /// Read the sub-chunks of one frame container into the slot.
    fn read_frame_body<R: Read + Seek>(
        reader: &mut ChunkReader<R>,
        container: &ChunkHeader,
        slot: &mut FrameSlot,
        assembler: &mut CodebookAssembler,
        committed: &mut Option<Arc<Codebook>>,
    ) -> Result<u32> {
        let end = reader.position()? + container.padded_size();
        let mut have_pointer = false;

        while reader.position()? < end {
            let chunk = reader
                .read_header()?
                .ok_or_else(|| Error::format("truncated frame container"))?;
            if reader.position()? + chunk.padded_size() > end {
                return Err(Error::format(format!(
                    "chunk '{}' overruns its frame container",
                    chunk.tag
                )));
            }

            match chunk.tag {
                ChunkTag::CBF0 | ChunkTag::CBFZ => {
                    let payload = reader.read_payload(&chunk)?;
                    let compressed = chunk.tag == ChunkTag::CBFZ;
                    *committed = Some(assembler.load_full(&payload, compressed)?);
                }
                ChunkTag::CBP0 | ChunkTag::CBPZ => {
                    let payload = reader.read_payload(&chunk)?;
                    let compressed = chunk.tag == ChunkTag::CBPZ;
                    if let Some(codebook) = assembler.load_partial(&payload, compressed)? {
                        *committed = Some(codebook);
                    }
                }
                ChunkTag::CPL0 | ChunkTag::CPLZ => {
                    slot.palette = reader.read_payload(&chunk)?;
                    slot.palette_compressed = chunk.tag == ChunkTag::CPLZ;
                    slot.has_palette = true;
                }
                ChunkTag::VPT0 | ChunkTag::VPTZ | ChunkTag::VPTR | ChunkTag::VPTK => {
                    slot.pointer = reader.read_payload(&chunk)?;
                    slot.pointer_kind = match chunk.tag {
                        ChunkTag::VPT0 => PointerKind::Raw,
                        ChunkTag::VPTZ => PointerKind::Compressed,
                        ChunkTag::VPTR => PointerKind::CompressedAlt,
                        _ => PointerKind::CompressedKey,
                    };
                    if chunk.tag == ChunkTag::VPTK {
                        slot.key = true;
                    }
                    // Bind the dictionary that is committed as the pixel
                    // payload arrives; later assembly must never affect
                    // this frame.
                    slot.codebook = committed.clone();
                    have_pointer = true;
                }
                tag => {
                    return Err(Error::format(format!(
                        "unexpected chunk '{}' inside frame container",
                        tag
                    )));
                }
            }
        }

        if !have_pointer {
            return Err(Error::format("frame container without pointer data"));
        }
        Ok(container.size)
    }
}
