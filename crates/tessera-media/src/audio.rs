//! Audio dispatch seam.
//!
//! The loader recognizes three audio codecs and hands their blocks to an
//! [`AudioSink`] supplied by the host. The codecs themselves live in the
//! audio backend, outside this crate; only the dispatch points are defined
//! here. A sink reports staging backpressure through [`QueueResult::Full`],
//! which the loader surfaces as a non-consuming "sleeping" status.

use crate::clock::AudioCounters;
use crate::container::ChunkTag;
use crate::Result;
use std::sync::Arc;

/// Audio sub-chunk codec, mapped from the chunk tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// SND0: raw PCM.
    Raw,
    /// SND1: run-length coded.
    RunLength,
    /// SND2: ADPCM coded.
    Adpcm,
}

impl AudioCodec {
    /// Map an audio chunk tag to its codec.
    pub fn from_tag(tag: ChunkTag) -> Option<Self> {
        match tag {
            ChunkTag::SND0 => Some(Self::Raw),
            ChunkTag::SND1 => Some(Self::RunLength),
            ChunkTag::SND2 => Some(Self::Adpcm),
            _ => None,
        }
    }
}

/// Outcome of queueing one audio block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueResult {
    /// The block was staged for playback.
    Accepted,
    /// Staging is full; retry the same block later.
    Full,
}

/// Host-provided audio backend.
pub trait AudioSink {
    /// Begin playback with the given stream parameters.
    fn start(&mut self, sample_rate: u32, channels: u8, bits: u8) -> Result<()>;

    /// Stop playback.
    fn stop(&mut self);

    /// Offer one coded audio block to the staging buffer.
    fn queue(&mut self, codec: AudioCodec, data: &[u8]) -> Result<QueueResult>;

    /// Progress counters feeding the playback clock.
    fn counters(&self) -> Arc<AudioCounters>;

    /// Whether the sink is currently playing.
    fn is_active(&self) -> bool;
}

/// Sink for silent playback: accepts every block and credits it as played
/// immediately, so the audio clock method never starves.
#[derive(Debug, Default)]
pub struct NullAudioSink {
    counters: Arc<AudioCounters>,
    active: bool,
}

impl NullAudioSink {
    /// Create a new null sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for NullAudioSink {
    fn start(&mut self, _sample_rate: u32, _channels: u8, _bits: u8) -> Result<()> {
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn queue(&mut self, _codec: AudioCodec, data: &[u8]) -> Result<QueueResult> {
        self.counters.add_played(data.len() as u64);
        Ok(QueueResult::Accepted)
    }

    fn counters(&self) -> Arc<AudioCounters> {
        self.counters.clone()
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_from_tag() {
        assert_eq!(AudioCodec::from_tag(ChunkTag::SND0), Some(AudioCodec::Raw));
        assert_eq!(AudioCodec::from_tag(ChunkTag::SND1), Some(AudioCodec::RunLength));
        assert_eq!(AudioCodec::from_tag(ChunkTag::SND2), Some(AudioCodec::Adpcm));
        assert_eq!(AudioCodec::from_tag(ChunkTag::CPL0), None);
    }

    #[test]
    fn test_null_sink_credits_playback() {
        let mut sink = NullAudioSink::new();
        sink.start(22050, 1, 8).unwrap();
        assert!(sink.is_active());
        assert_eq!(
            sink.queue(AudioCodec::Raw, &[0; 128]).unwrap(),
            QueueResult::Accepted
        );
        assert_eq!(sink.counters().effective_bytes(), 128);
        sink.stop();
        assert!(!sink.is_active());
    }
}
