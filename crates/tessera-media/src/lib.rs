//! Tessera-Media: streaming vector-quantization movie codec and player.
//!
//! This crate implements the playback pipeline for tessera's chunked movie
//! container: frames are fixed-size pixel blocks looked up in per-group
//! dictionaries (vector quantization), and a software decoder reconstructs
//! rasters in real time against an audio, interrupt, or wall clock.
//!
//! # Modules
//!
//! - `container` - tagged-chunk reader, movie header, frame-offset index
//! - `codebook` - differential dictionary assembly (full/partial groups)
//! - `pool` - bounded frame ring shared by loader and drawer
//! - `loader` - producer: chunk dispatch until a frame completes
//! - `expand` - the four block-geometry expanders
//! - `drawer` - consumer: frame selection, catch-up skipping, decode
//! - `clock` - audio/interrupt/wall time sources with calibration
//! - `audio` - audio codec dispatch seam (backends live in the host)
//! - `compress` - decompression seam (codecs live in the host)
//! - `player` - open/play/seek/close orchestration
//!
//! # Architecture
//!
//! The loader and drawer are cooperative state machines advanced by the
//! player's single loop. The loader pulls chunks and fills ring slots; the
//! drawer consumes slots strictly in frame order, skipping stale non-key
//! frames to stay synchronized with the clock. Bounded ring sizes stall the
//! producer without data loss; "no buffer" and "sleeping" are retryable
//! flow-control statuses, not errors.

pub mod audio;
pub mod clock;
pub mod codebook;
pub mod compress;
pub mod container;
pub mod drawer;
pub mod error;
pub mod expand;
pub mod info;
pub mod loader;
pub mod player;
pub mod pool;

pub use audio::{AudioCodec, AudioSink, NullAudioSink, QueueResult};
pub use clock::{frame_ticks, AudioCounters, Clock, ClockMethod, TICK_RATE};
pub use codebook::{Codebook, CodebookAssembler};
pub use compress::{Decompressor, Passthrough};
pub use container::{ChunkReader, ChunkTag, FrameIndex, MovieHeader};
pub use drawer::{DiscardPresenter, DrawStatus, Drawer, Presenter, VideoFrame};
pub use error::{Error, Result};
pub use expand::BlockGeometry;
pub use info::{MovieInfo, PlayerStats};
pub use loader::{LoadStatus, Loader};
pub use player::{PlayMode, PlayStatus, Player, PlayerConfig};
pub use pool::{FramePool, FrameSlot, PointerKind};
