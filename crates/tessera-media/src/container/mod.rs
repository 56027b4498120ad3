//! Tagged-chunk movie container.
//!
//! This module provides the container layer for tessera movies:
//!
//! - `tags` - four-character chunk tag codes
//! - `reader` - sequential chunk reader over an abstract stream
//! - `header` - static movie descriptor (MVHD)
//! - `index` - per-frame offsets and flags (FINF)

mod header;
mod index;
mod reader;
mod tags;

pub use header::{MovieHeader, MOVIE_HEADER_SIZE};
pub use index::{encode_index_entry, FrameIndex};
pub use reader::{ChunkHeader, ChunkReader};
pub use tags::ChunkTag;

use crate::{Error, Result};
use std::io::{Read, Seek};

/// The container preamble: validated magic plus the mandatory header chunks.
#[derive(Debug, Clone)]
pub struct MoviePreamble {
    /// Parsed movie header.
    pub header: MovieHeader,
    /// Parsed frame-offset index.
    pub index: FrameIndex,
    /// File offset of the first frame's span.
    pub first_frame_offset: u64,
}

/// Read and validate the container preamble.
///
/// Expects `FORM` magic with a `TVQA` form type, then scans top-level chunks
/// for the mandatory `MVHD` and `FINF`. Unknown chunks between frames are
/// skippable, so anything unrecognized before the first frame container is
/// skipped with a log line. Hitting a frame container (or end of stream)
/// before both mandatory chunks were seen is a format error.
pub fn read_preamble<R: Read + Seek>(reader: &mut ChunkReader<R>) -> Result<MoviePreamble> {
    let form = reader
        .read_header()?
        .ok_or_else(|| Error::format("empty stream"))?;
    if form.tag != ChunkTag::FORM {
        return Err(Error::format(format!(
            "bad container magic '{}', expected 'FORM'",
            form.tag
        )));
    }

    let mut form_type = [0u8; 4];
    let type_chunk = ChunkHeader {
        tag: ChunkTag::FORM,
        size: 4,
    };
    let type_bytes = reader.read_payload(&type_chunk)?;
    form_type.copy_from_slice(&type_bytes);
    if ChunkTag::from_bytes(form_type) != ChunkTag::TVQA {
        return Err(Error::format(format!(
            "bad form type '{}', expected 'TVQA'",
            ChunkTag::from_bytes(form_type)
        )));
    }

    let mut header: Option<MovieHeader> = None;
    let mut index: Option<FrameIndex> = None;

    loop {
        let position = reader.position()?;
        let chunk = match reader.read_header()? {
            Some(chunk) => chunk,
            None => break,
        };
        match chunk.tag {
            ChunkTag::MVHD => {
                let payload = reader.read_payload(&chunk)?;
                header = Some(MovieHeader::parse(&payload)?);
            }
            ChunkTag::FINF => {
                let frames = header
                    .as_ref()
                    .ok_or_else(|| Error::format("frame index before movie header"))?
                    .frame_count;
                let payload = reader.read_payload(&chunk)?;
                index = Some(FrameIndex::parse(&payload, frames)?);
            }
            tag if tag.is_frame_container() || tag.is_audio() => {
                // Start of the first frame's span; rewind so the loader
                // begins exactly here.
                reader.seek_to(position)?;
                let header = header.ok_or_else(|| Error::format("missing movie header"))?;
                let index = index.ok_or_else(|| Error::format("missing frame index"))?;
                return Ok(MoviePreamble {
                    header,
                    index,
                    first_frame_offset: position,
                });
            }
            tag => {
                tracing::debug!(tag = %tag, "skipping unrecognized chunk before first frame");
                reader.skip(&chunk)?;
            }
        }
    }

    Err(Error::format("stream ended before the first frame"))
}
