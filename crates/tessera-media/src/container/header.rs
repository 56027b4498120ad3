//! Movie header parsing.

use crate::{Error, Result};

/// Size of the MVHD payload in bytes.
pub const MOVIE_HEADER_SIZE: usize = 42;

/// Header flag bit: the movie carries an audio track.
const FLAG_HAS_AUDIO: u16 = 1;

/// Static movie descriptor, read once at open and immutable thereafter.
#[derive(Debug, Clone)]
pub struct MovieHeader {
    /// Format version.
    pub version: u16,
    /// Feature flags.
    pub flags: u16,
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
    /// Largest frame size hint from the encoder (may be zero).
    pub max_frame_size: u32,
    /// Audio sample rate (zero when no audio).
    pub audio_rate: u16,
    /// Audio channel count.
    pub audio_channels: u8,
    /// Audio bits per sample.
    pub audio_bits: u8,
}

impl MovieHeader {
    /// Parse an MVHD payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MOVIE_HEADER_SIZE {
            return Err(Error::format(format!(
                "movie header payload is {} bytes, need {}",
                data.len(),
                MOVIE_HEADER_SIZE
            )));
        }

        let header = Self {
            version: u16::from_be_bytes([data[0], data[1]]),
            flags: u16::from_be_bytes([data[2], data[3]]),
            frame_count: u16::from_be_bytes([data[4], data[5]]),
            width: u16::from_be_bytes([data[6], data[7]]),
            height: u16::from_be_bytes([data[8], data[9]]),
            block_width: data[10],
            block_height: data[11],
            frame_rate: data[12],
            group_size: data[13],
            colors: u16::from_be_bytes([data[14], data[15]]),
            max_blocks: u16::from_be_bytes([data[16], data[17]]),
            max_frame_size: u32::from_be_bytes([data[18], data[19], data[20], data[21]]),
            audio_rate: u16::from_be_bytes([data[22], data[23]]),
            audio_channels: data[24],
            audio_bits: data[25],
        };
        header.validate()?;
        Ok(header)
    }

    fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(Error::format("movie has zero frames"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::format("zero image dimensions"));
        }
        if self.block_width == 0 || self.block_height == 0 {
            return Err(Error::format("zero block dimensions"));
        }
        if self.width % self.block_width as u16 != 0 || self.height % self.block_height as u16 != 0
        {
            return Err(Error::format(format!(
                "image {}x{} is not a whole number of {}x{} blocks",
                self.width, self.height, self.block_width, self.block_height
            )));
        }
        if self.frame_rate == 0 {
            return Err(Error::format("zero frame rate"));
        }
        if self.group_size == 0 {
            return Err(Error::format("zero codebook group size"));
        }
        if self.colors == 0 || self.colors > 256 {
            return Err(Error::format(format!("invalid color count {}", self.colors)));
        }
        if self.max_blocks == 0 {
            return Err(Error::format("zero codebook capacity"));
        }
        if self.has_audio() && (self.audio_channels == 0 || self.audio_bits == 0) {
            return Err(Error::format("audio flagged but audio parameters are zero"));
        }
        Ok(())
    }

    /// Whether the movie carries audio.
    pub fn has_audio(&self) -> bool {
        self.flags & FLAG_HAS_AUDIO != 0 && self.audio_rate > 0
    }

    /// Tiles per raster row.
    pub fn blocks_per_row(&self) -> usize {
        (self.width / self.block_width as u16) as usize
    }

    /// Tile rows per raster.
    pub fn block_rows(&self) -> usize {
        (self.height / self.block_height as u16) as usize
    }

    /// Size of one frame's pointer data in bytes (one big-endian u16 per tile).
    pub fn pointer_bytes(&self) -> usize {
        self.blocks_per_row() * self.block_rows() * 2
    }

    /// Size of one raster in bytes (8-bit indexed).
    pub fn raster_bytes(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Fully-expanded codebook capacity in bytes.
    pub fn codebook_bytes(&self) -> usize {
        self.max_blocks as usize * self.block_width as usize * self.block_height as usize
    }

    /// Size of the raw palette payload in bytes.
    pub fn palette_bytes(&self) -> usize {
        self.colors as usize * 3
    }

    /// Audio data rate in bytes per second (zero when no audio).
    pub fn audio_byte_rate(&self) -> u32 {
        self.audio_rate as u32 * self.audio_channels as u32 * (self.audio_bits as u32 / 8).max(1)
    }
}
