//! Movie player orchestration.
//!
//! The player advances the loader and drawer as cooperative state machines
//! from a single loop: neither side blocks, and "no buffer" / "sleeping"
//! statuses tell the loop to make progress elsewhere and retry. The only
//! concurrency in the subsystem is the clock's raw counters, written by the
//! host's audio or interrupt callbacks.

use crate::audio::{AudioSink, NullAudioSink};
use crate::clock::{frame_ticks, AudioCounters, Clock};
use crate::compress::{Decompressor, Passthrough};
use crate::container::{read_preamble, ChunkReader, ChunkTag, FrameIndex, MovieHeader};
use crate::drawer::{DrawStatus, Drawer, Presenter};
use crate::info::{MovieInfo, PlayerStats};
use crate::loader::{LoadStatus, Loader};
use crate::pool::FramePool;
use crate::{Error, Result};
use std::io::{Read, Seek};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

/// How one `play` call advances the movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Continuous playback against the clock.
    Run,
    /// Single-step: draw exactly one frame, ignoring the clock.
    Walk,
}

/// Outcome of one `play` call. Drawn frames are delivered through the
/// [`Presenter`]; these statuses describe why control returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStatus {
    /// Playback is paused; call `resume` first.
    Paused,
    /// The pending frame is not due yet.
    NotTimeYet,
    /// Audio staging is full; retry after the backend drains.
    Sleeping,
    /// Waiting for the loader to complete a frame.
    NoBuffer,
    /// Every frame has been loaded and drawn.
    EndOfFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerState {
    Unprimed,
    Playing,
    Paused,
    Finished,
}

/// Player configuration.
#[derive(Clone)]
pub struct PlayerConfig {
    /// Frame ring size.
    pub frame_slots: usize,
    /// Draw rate override in frames per second; defaults to the movie rate.
    pub draw_rate: Option<u32>,
    /// Whether frames are decoded and presented at all.
    pub drawing_enabled: bool,
    /// External periodic tick counter for the interrupt clock method.
    pub interrupt_ticks: Option<Arc<AtomicU64>>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            frame_slots: 8,
            draw_rate: None,
            drawing_enabled: true,
            interrupt_ticks: None,
        }
    }
}

/// A playing movie instance.
///
/// All buffers are owned by the instance; multiple movies can play
/// concurrently from independent instances.
pub struct Player<R> {
    reader: ChunkReader<R>,
    header: MovieHeader,
    index: FrameIndex,
    pool: FramePool,
    loader: Loader,
    drawer: Drawer,
    clock: Clock,
    audio: Box<dyn AudioSink>,
    codec: Box<dyn Decompressor>,
    state: PlayerState,
    pause_time: i64,
    drawing: bool,
}

impl<R: Read + Seek> Player<R> {
    /// Open a movie with silent audio and a passthrough decompressor.
    pub fn open(reader: R, config: PlayerConfig) -> Result<Self> {
        Self::open_with(
            reader,
            config,
            Box::new(NullAudioSink::new()),
            Box::new(Passthrough),
        )
    }

    /// Open a movie with a host audio backend and decompressor.
    pub fn open_with(
        reader: R,
        config: PlayerConfig,
        audio: Box<dyn AudioSink>,
        codec: Box<dyn Decompressor>,
    ) -> Result<Self> {
        if config.frame_slots == 0 {
            return Err(Error::resource("frame ring needs at least one slot"));
        }

        let mut reader = ChunkReader::new(reader);
        let preamble = read_preamble(&mut reader)?;
        let header = preamble.header;

        let draw_rate = config.draw_rate.unwrap_or(header.frame_rate as u32);
        let drawer = Drawer::new(&header, draw_rate)?;
        let loader = Loader::new(&header);
        let pool = FramePool::new(config.frame_slots);

        let counters: Arc<AudioCounters> = audio.counters();
        let clock = Clock::new(counters, header.audio_byte_rate(), config.interrupt_ticks);

        tracing::debug!(
            frames = header.frame_count,
            width = header.width,
            height = header.height,
            geometry = %drawer.geometry(),
            fps = header.frame_rate,
            audio = header.has_audio(),
            "movie opened"
        );

        Ok(Self {
            reader,
            header,
            index: preamble.index,
            pool,
            loader,
            drawer,
            clock,
            audio,
            codec,
            state: PlayerState::Unprimed,
            pause_time: 0,
            drawing: config.drawing_enabled,
        })
    }

    /// Static movie description.
    pub fn info(&self) -> MovieInfo {
        MovieInfo::from_header(&self.header)
    }

    /// Running playback statistics.
    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            frames_loaded: self.loader.frames_loaded(),
            frames_drawn: self.drawer.frames_drawn(),
            frames_skipped: self.drawer.frames_skipped(),
            max_frame_bytes: self.loader.max_frame_bytes(),
            last_drawn: self.drawer.last_drawn(),
        }
    }

    /// Whether playback has consumed and drawn every frame.
    pub fn is_finished(&self) -> bool {
        self.state == PlayerState::Finished
    }

    /// One-time setup before the first frame: start audio if present and
    /// initialize the clock to the first frame's time.
    fn prime(&mut self) -> Result<()> {
        if self.header.has_audio() {
            self.audio.start(
                self.header.audio_rate as u32,
                self.header.audio_channels,
                self.header.audio_bits,
            )?;
        }
        self.clock.reselect(self.audio.is_active());
        self.clock.set_timer(frame_ticks(0, self.header.frame_rate));
        self.state = PlayerState::Playing;
        Ok(())
    }

    /// Pause playback, snapshotting the presented time.
    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.audio.stop();
        self.pause_time = self.clock.now();
        self.clock.reselect(false);
        self.state = PlayerState::Paused;
    }

    /// Resume playback, excluding the paused interval from the clock.
    pub fn resume(&mut self) -> Result<()> {
        if self.state != PlayerState::Paused {
            return Ok(());
        }
        if self.header.has_audio() {
            self.audio.start(
                self.header.audio_rate as u32,
                self.header.audio_channels,
                self.header.audio_bits,
            )?;
        }
        self.clock.reselect(self.audio.is_active());
        self.clock.set_timer(self.pause_time);
        self.state = PlayerState::Playing;
        Ok(())
    }

    /// Stop playback permanently. In-flight chunk reads have already
    /// completed when this is reachable, so no partial chunk is consumed.
    pub fn stop(&mut self) {
        self.audio.stop();
        self.state = PlayerState::Finished;
    }

    /// Tear the player down, returning the underlying stream.
    pub fn close(mut self) -> R {
        self.audio.stop();
        self.reader.into_inner()
    }

    /// Advance playback.
    ///
    /// In `Run` mode this loads and draws until nothing further can progress
    /// right now; in `Walk` mode it performs one load/draw cycle and draws
    /// at most one frame regardless of the clock. Drawn frames arrive at the
    /// presenter before this returns.
    pub fn play(&mut self, mode: PlayMode, presenter: &mut dyn Presenter) -> Result<PlayStatus> {
        match self.state {
            PlayerState::Paused => return Ok(PlayStatus::Paused),
            PlayerState::Finished => return Ok(PlayStatus::EndOfFile),
            PlayerState::Unprimed => self.prime()?,
            PlayerState::Playing => {}
        }

        loop {
            let mut progressed = false;
            let mut sleeping = false;

            if !self.loader.is_done() {
                match self.loader.load_next_frame(
                    &mut self.reader,
                    &mut self.pool,
                    self.audio.as_mut(),
                )? {
                    LoadStatus::Loaded => progressed = true,
                    LoadStatus::Sleeping => sleeping = true,
                    LoadStatus::NoBuffer | LoadStatus::EndOfStream => {}
                }
            }

            let draw = if self.drawing {
                self.drawer.draw_next(
                    &mut self.pool,
                    &self.clock,
                    mode == PlayMode::Walk,
                    self.codec.as_ref(),
                    presenter,
                )?
            } else if self.pool.pending().loaded {
                // Drawing disabled: consume frames so the loader keeps
                // pace, carrying palettes for a later re-enable.
                self.drawer
                    .apply_palette(self.pool.pending(), self.codec.as_ref())?;
                let frame = self.pool.pending().frame_num;
                self.pool.release_pending();
                DrawStatus::Drew(frame)
            } else {
                DrawStatus::NoBuffer
            };

            if let DrawStatus::Drew(frame) = draw {
                progressed = true;
                tracing::trace!(frame, "frame presented");
            }

            if self.loader.is_done() && self.pool.loaded_count() == 0 {
                self.audio.stop();
                self.state = PlayerState::Finished;
                return Ok(PlayStatus::EndOfFile);
            }

            if mode == PlayMode::Walk {
                return Ok(match draw {
                    DrawStatus::Drew(_) | DrawStatus::NotTimeYet => PlayStatus::NotTimeYet,
                    DrawStatus::NoBuffer if sleeping => PlayStatus::Sleeping,
                    DrawStatus::NoBuffer => PlayStatus::NoBuffer,
                });
            }

            if progressed {
                continue;
            }
            return Ok(match draw {
                DrawStatus::NotTimeYet => PlayStatus::NotTimeYet,
                _ if sleeping => PlayStatus::Sleeping,
                _ => PlayStatus::NoBuffer,
            });
        }
    }

    /// Seek to a frame.
    ///
    /// Codebook state is differential, so there is no random-access decode:
    /// the player rewinds to the target's group boundary, re-applies the
    /// most recent palette, and replay-loads every frame up to the target
    /// without rendering, which reconstructs the codebook state exactly.
    pub fn seek(&mut self, target: u32) -> Result<u32> {
        if target >= self.header.frame_count as u32 {
            return Err(Error::format(format!(
                "seek target {} past last frame {}",
                target,
                self.header.frame_count - 1
            )));
        }
        if self.state == PlayerState::Unprimed {
            self.prime()?;
        }
        tracing::debug!(target, "seeking");

        self.audio.stop();
        self.clock.reselect(false);

        let group_start = target - target % self.header.group_size as u32;

        // A palette set before the replay window must be re-applied
        // separately; palettes inside the window are picked up by the
        // replay itself.
        if let Some(palette_frame) = self.index.last_palette_at_or_before(target) {
            if palette_frame < group_start {
                self.apply_palette_from(palette_frame)?;
            }
        }

        let offset = self
            .index
            .offset_of(group_start)
            .ok_or_else(|| Error::format("frame index missing seek target"))?;
        self.reader.seek_to(offset)?;
        self.pool.reset();
        self.loader.restart_at(group_start);
        self.loader.set_suppress_audio(true);

        let replay = (|| -> Result<()> {
            while self.loader.next_frame() <= target && !self.loader.is_done() {
                match self.loader.load_next_frame(
                    &mut self.reader,
                    &mut self.pool,
                    self.audio.as_mut(),
                )? {
                    LoadStatus::Loaded => {
                        if self.pool.pending().frame_num < target {
                            self.drawer
                                .apply_palette(self.pool.pending(), self.codec.as_ref())?;
                            self.pool.release_pending();
                        }
                    }
                    status => {
                        return Err(Error::format(format!(
                            "seek replay stalled with {:?}",
                            status
                        )));
                    }
                }
            }
            Ok(())
        })();
        self.loader.set_suppress_audio(false);
        replay?;

        if self.state == PlayerState::Playing && self.header.has_audio() {
            self.audio.start(
                self.header.audio_rate as u32,
                self.header.audio_channels,
                self.header.audio_bits,
            )?;
        }
        self.clock.reselect(self.audio.is_active());
        let target_ticks = frame_ticks(target, self.header.frame_rate);
        self.clock.set_timer(target_ticks);
        self.pause_time = target_ticks;
        self.drawer.reset_timing();
        if self.state == PlayerState::Finished {
            self.state = PlayerState::Playing;
        }
        Ok(target)
    }

    /// Re-apply the palette carried by an arbitrary earlier frame.
    fn apply_palette_from(&mut self, frame: u32) -> Result<()> {
        let offset = self
            .index
            .offset_of(frame)
            .ok_or_else(|| Error::format("frame index missing palette frame"))?;
        self.reader.seek_to(offset)?;

        loop {
            let chunk = self
                .reader
                .read_header()?
                .ok_or_else(|| Error::format("stream ended inside palette frame"))?;
            if chunk.tag.is_frame_container() {
                let end = self.reader.position()? + chunk.padded_size();
                while self.reader.position()? < end {
                    let sub = self
                        .reader
                        .read_header()?
                        .ok_or_else(|| Error::format("truncated frame container"))?;
                    match sub.tag {
                        ChunkTag::CPL0 | ChunkTag::CPLZ => {
                            let payload = self.reader.read_payload(&sub)?;
                            let compressed = sub.tag == ChunkTag::CPLZ;
                            self.drawer.apply_palette_bytes(
                                &payload,
                                compressed,
                                self.codec.as_ref(),
                            )?;
                        }
                        _ => self.reader.skip(&sub)?,
                    }
                }
                return Ok(());
            }
            self.reader.skip(&chunk)?;
        }
    }
}
