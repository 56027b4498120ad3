//! Read-only playback snapshots.

use crate::container::MovieHeader;

/// Static movie description, derived from the header at open.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieInfo {
    /// Total frame count.
    pub frame_count: u16,
    /// Image width in pixels.
    pub width: u16,
    /// Image height in pixels.
    pub height: u16,
    /// Block width in pixels.
    pub block_width: u8,
    /// Block height in pixels.
    pub block_height: u8,
    /// Frames per second.
    pub frame_rate: u8,
    /// Partial codebook chunks per group.
    pub group_size: u8,
    /// Palette entries used.
    pub colors: u16,
    /// Codebook entry capacity.
    pub max_blocks: u16,
    /// Whether the movie carries audio.
    pub has_audio: bool,
    /// Audio sample rate (zero when no audio).
    pub audio_rate: u16,
    /// Audio channel count.
    pub audio_channels: u8,
    /// Audio bits per sample.
    pub audio_bits: u8,
}

impl MovieInfo {
    /// Build the snapshot from a parsed header.
    pub fn from_header(header: &MovieHeader) -> Self {
        Self {
            frame_count: header.frame_count,
            width: header.width,
            height: header.height,
            block_width: header.block_width,
            block_height: header.block_height,
            frame_rate: header.frame_rate,
            group_size: header.group_size,
            colors: header.colors,
            max_blocks: header.max_blocks,
            has_audio: header.has_audio(),
            audio_rate: header.audio_rate,
            audio_channels: header.audio_channels,
            audio_bits: header.audio_bits,
        }
    }

    /// Movie duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.frame_rate as f64
    }
}

/// Running playback statistics.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerStats {
    /// Frames assembled by the loader.
    pub frames_loaded: u64,
    /// Frames decoded and presented.
    pub frames_drawn: u64,
    /// Frames released without rendering during catch-up.
    pub frames_skipped: u64,
    /// Largest frame span observed, in bytes.
    pub max_frame_bytes: u32,
    /// Last frame number drawn, if any.
    pub last_drawn: Option<u32>,
}
