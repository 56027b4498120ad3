//! Decompression seam.
//!
//! Codebook, palette, pointer, and caption payloads share one general-purpose
//! byte decompressor. It lives outside this crate's core; callers supply an
//! implementation through the [`Decompressor`] trait.

use crate::{Error, Result};

/// General-purpose byte decompressor.
pub trait Decompressor {
    /// Decompress `src` into `dst`, returning the number of bytes produced.
    ///
    /// `dst.len()` bounds the output; producing more than fits is an error.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize>;
}

/// Identity codec: payloads are stored rather than compressed.
///
/// Useful for tests and for movies written without a compressor.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Decompressor for Passthrough {
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        if src.len() > dst.len() {
            return Err(Error::format(format!(
                "decompressed output {} exceeds buffer capacity {}",
                src.len(),
                dst.len()
            )));
        }
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len())
    }
}

/// Decompress a payload whose expanded size is known exactly.
///
/// A mismatch between the produced size and `dst.len()` means the payload is
/// corrupt.
pub fn decompress_exact(codec: &dyn Decompressor, src: &[u8], dst: &mut [u8]) -> Result<()> {
    let produced = codec.decompress(src, dst)?;
    if produced != dst.len() {
        return Err(Error::format(format!(
            "decompressed size mismatch: produced {}, expected {}",
            produced,
            dst.len()
        )));
    }
    Ok(())
}
