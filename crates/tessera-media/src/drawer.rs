//! Frame drawer.
//!
//! The drawer is the consumer side of the playback pipeline: it selects the
//! next frame to show or skip against the playback clock, decodes it through
//! the configured block expander, and hands the finished raster to the host
//! presenter. Rasters are double-buffered: the previous raster is reused
//! only after the presenter reports completion (by returning).

use crate::clock::{Clock, TICK_RATE};
use crate::compress::{decompress_exact, Decompressor};
use crate::container::MovieHeader;
use crate::expand::{expand_frame, BlockGeometry};
use crate::pool::{FramePool, FrameSlot};
use crate::{Error, Result};

/// A decoded frame ready for presentation.
#[derive(Debug)]
pub struct VideoFrame<'a> {
    /// Frame number.
    pub frame: u32,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// 8-bit indexed pixels, row-major.
    pub pixels: &'a [u8],
    /// Active palette, 256 RGB triplets.
    pub palette: &'a [u8],
}

/// Host presentation seam. Returning from `present` reports completion.
pub trait Presenter {
    /// Present one decoded frame.
    fn present(&mut self, frame: &VideoFrame<'_>) -> Result<()>;
}

/// Presenter that drops frames (headless playback).
#[derive(Debug, Default)]
pub struct DiscardPresenter;

impl Presenter for DiscardPresenter {
    fn present(&mut self, _frame: &VideoFrame<'_>) -> Result<()> {
        Ok(())
    }
}

/// Outcome of one draw attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStatus {
    /// The given frame was decoded and presented.
    Drew(u32),
    /// The pending frame is not due yet.
    NotTimeYet,
    /// The pending frame is not loaded yet.
    NoBuffer,
}

/// Consumer state machine.
pub struct Drawer {
    geometry: BlockGeometry,
    width: usize,
    height: usize,
    blocks_per_row: usize,
    block_rows: usize,
    pointer_bytes: usize,
    palette_bytes: usize,
    frame_rate: u32,
    draw_rate: u32,
    rasters: [Vec<u8>; 2],
    front: usize,
    palette: Vec<u8>,
    pointer_scratch: Vec<u8>,
    palette_scratch: Vec<u8>,
    last_drawn: Option<u32>,
    last_draw_tick: Option<i64>,
    frames_drawn: u64,
    frames_skipped: u64,
}

impl Drawer {
    /// Configure the drawer from the movie header.
    ///
    /// Selects the block expander once; an unsupported geometry fails here.
    pub fn new(header: &MovieHeader, draw_rate: u32) -> Result<Self> {
        let geometry = BlockGeometry::for_block_size(header.block_width, header.block_height)?;
        if draw_rate == 0 || draw_rate > header.frame_rate as u32 {
            return Err(Error::resource(format!(
                "draw rate {} outside 1..={}",
                draw_rate, header.frame_rate
            )));
        }
        let raster_bytes = header.raster_bytes();
        Ok(Self {
            geometry,
            width: header.width as usize,
            height: header.height as usize,
            blocks_per_row: header.blocks_per_row(),
            block_rows: header.block_rows(),
            pointer_bytes: header.pointer_bytes(),
            palette_bytes: header.palette_bytes(),
            frame_rate: header.frame_rate as u32,
            draw_rate,
            rasters: [vec![0u8; raster_bytes], vec![0u8; raster_bytes]],
            front: 0,
            palette: vec![0u8; 768],
            pointer_scratch: Vec::new(),
            palette_scratch: Vec::new(),
            last_drawn: None,
            last_draw_tick: None,
            frames_drawn: 0,
            frames_skipped: 0,
        })
    }

    /// The selected block geometry.
    pub fn geometry(&self) -> BlockGeometry {
        self.geometry
    }

    /// Last frame number drawn, if any.
    pub fn last_drawn(&self) -> Option<u32> {
        self.last_drawn
    }

    /// Frames decoded and presented.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Frames released without rendering during catch-up.
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Forget draw timing after a seek.
    pub fn reset_timing(&mut self) {
        self.last_drawn = None;
        self.last_draw_tick = None;
    }

    /// Apply a frame's palette to the active palette without rendering.
    ///
    /// Used both when skipping stale frames and when replaying a palette
    /// during seek.
    pub fn apply_palette(&mut self, slot: &FrameSlot, codec: &dyn Decompressor) -> Result<()> {
        if !slot.has_palette {
            return Ok(());
        }
        self.apply_palette_bytes(&slot.palette, slot.palette_compressed, codec)
    }

    /// Apply a raw palette payload to the active palette.
    pub fn apply_palette_bytes(
        &mut self,
        data: &[u8],
        compressed: bool,
        codec: &dyn Decompressor,
    ) -> Result<()> {
        if compressed {
            self.palette_scratch.resize(self.palette_bytes, 0);
            decompress_exact(codec, data, &mut self.palette_scratch)?;
            self.palette[..self.palette_bytes].copy_from_slice(&self.palette_scratch);
        } else {
            if data.len() != self.palette_bytes {
                return Err(Error::format(format!(
                    "palette payload is {} bytes, expected {}",
                    data.len(),
                    self.palette_bytes
                )));
            }
            self.palette[..self.palette_bytes].copy_from_slice(data);
        }
        Ok(())
    }

    /// Select, decode, and present the next due frame.
    ///
    /// In single-step mode the pending frame is accepted unconditionally.
    pub fn draw_next(
        &mut self,
        pool: &mut FramePool,
        clock: &Clock,
        single_step: bool,
        codec: &dyn Decompressor,
        presenter: &mut dyn Presenter,
    ) -> Result<DrawStatus> {
        if !pool.pending().loaded {
            return Ok(DrawStatus::NoBuffer);
        }

        let now = clock.now();
        if !single_step {
            let desired = now * self.frame_rate as i64 / TICK_RATE as i64;

            if self.draw_rate == self.frame_rate {
                if pool.pending().frame_num as i64 > desired {
                    return Ok(DrawStatus::NotTimeYet);
                }
            } else {
                let period = (TICK_RATE / self.draw_rate) as i64;
                if let Some(last) = self.last_draw_tick {
                    if now - last < period {
                        return Ok(DrawStatus::NotTimeYet);
                    }
                }
            }

            // A run this far behind is force-accepted as-is, bounding the
            // length of catch-up skip runs.
            let catch_up_limit = (self.frame_rate / 5).max(1) as i64;
            let behind = desired - pool.pending().frame_num as i64;
            if behind < catch_up_limit {
                // Release stale frames up to the target, carrying their
                // palettes forward. A key frame always stops the run: it is
                // the only reachable baseline.
                loop {
                    let slot = pool.pending();
                    if !slot.loaded || slot.key || slot.frame_num as i64 >= desired {
                        break;
                    }
                    self.apply_palette(pool.pending(), codec)?;
                    pool.release_pending();
                    self.frames_skipped += 1;
                }
                if !pool.pending().loaded {
                    return Ok(DrawStatus::NoBuffer);
                }
            }
        }

        pool.claim_pending();
        let frame_num = pool.pending().frame_num;
        self.decode_pending(pool, codec)?;

        let back = 1 - self.front;
        let frame = VideoFrame {
            frame: frame_num,
            width: self.width as u32,
            height: self.height as u32,
            pixels: &self.rasters[back],
            palette: &self.palette,
        };
        presenter.present(&frame)?;
        self.front = back;

        pool.release_pending();
        self.last_drawn = Some(frame_num);
        self.last_draw_tick = Some(now);
        self.frames_drawn += 1;
        Ok(DrawStatus::Drew(frame_num))
    }

    /// Decode the pending slot into the back raster.
    fn decode_pending(&mut self, pool: &FramePool, codec: &dyn Decompressor) -> Result<()> {
        let slot = pool.pending();
        self.apply_palette(slot, codec)?;

        let codebook = slot
            .codebook
            .as_ref()
            .ok_or_else(|| Error::format("frame has no committed codebook"))?;
        let blocks = codebook.resolve(codec)?;

        if slot.pointer_kind.is_compressed() {
            self.pointer_scratch.resize(self.pointer_bytes, 0);
            decompress_exact(codec, &slot.pointer, &mut self.pointer_scratch)?;
        } else {
            self.pointer_scratch.clear();
            self.pointer_scratch.extend_from_slice(&slot.pointer);
        }

        let back = 1 - self.front;
        expand_frame(
            self.geometry,
            &self.pointer_scratch,
            &blocks,
            &mut self.rasters[back],
            self.width,
            self.blocks_per_row,
            self.block_rows,
        )
    }
}
