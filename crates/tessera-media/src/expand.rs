//! Block-geometry expansion.
//!
//! Decoding a frame walks its pointer grid in row-major tile order and copies
//! the referenced codebook block into the destination raster. Only four block
//! geometries exist in the wire format; the variant is chosen once at open
//! time from the header dimensions.

use crate::{Error, Result};

/// The four supported block geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockGeometry {
    /// 2x2 pixel blocks.
    B2x2,
    /// 2 wide, 3 tall.
    B2x3,
    /// 4 wide, 2 tall.
    B4x2,
    /// 4x4 pixel blocks.
    B4x4,
}

impl BlockGeometry {
    /// Select the expander for the given block dimensions.
    ///
    /// Any other ratio is a configuration error in the movie header.
    pub fn for_block_size(width: u8, height: u8) -> Result<Self> {
        match (width, height) {
            (2, 2) => Ok(Self::B2x2),
            (2, 3) => Ok(Self::B2x3),
            (4, 2) => Ok(Self::B4x2),
            (4, 4) => Ok(Self::B4x4),
            (w, h) => Err(Error::unsupported(format!("block geometry {}x{}", w, h))),
        }
    }

    /// Block width in pixels.
    pub fn width(&self) -> usize {
        match self {
            Self::B2x2 | Self::B2x3 => 2,
            Self::B4x2 | Self::B4x4 => 4,
        }
    }

    /// Block height in pixels.
    pub fn height(&self) -> usize {
        match self {
            Self::B2x2 | Self::B4x2 => 2,
            Self::B2x3 => 3,
            Self::B4x4 => 4,
        }
    }

    /// Bytes per codebook block (8-bit indexed pixels).
    pub fn block_bytes(&self) -> usize {
        self.width() * self.height()
    }
}

impl std::fmt::Display for BlockGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

/// Expand one frame's pointer grid into the destination raster.
///
/// `pointers` holds one big-endian u16 codebook index per tile in row-major
/// order; `blocks` is the resolved codebook; `dst` is the full raster with
/// `raster_width` pixels per row.
pub fn expand_frame(
    geometry: BlockGeometry,
    pointers: &[u8],
    blocks: &[u8],
    dst: &mut [u8],
    raster_width: usize,
    blocks_per_row: usize,
    block_rows: usize,
) -> Result<()> {
    let expected = blocks_per_row * block_rows * 2;
    if pointers.len() != expected {
        return Err(Error::format(format!(
            "pointer data is {} bytes, expected {}",
            pointers.len(),
            expected
        )));
    }
    // Highest byte any tile copy can touch; covers rasters wider than the
    // tile grid as well as exact-fit ones.
    let raster_needed = (block_rows * geometry.height()).saturating_sub(1) * raster_width
        + blocks_per_row * geometry.width();
    if dst.len() < raster_needed {
        return Err(Error::format(format!(
            "raster buffer is {} bytes, need at least {}",
            dst.len(),
            raster_needed
        )));
    }
    match geometry {
        BlockGeometry::B2x2 => {
            expand_tiles::<2, 2>(pointers, blocks, dst, raster_width, blocks_per_row)
        }
        BlockGeometry::B2x3 => {
            expand_tiles::<2, 3>(pointers, blocks, dst, raster_width, blocks_per_row)
        }
        BlockGeometry::B4x2 => {
            expand_tiles::<4, 2>(pointers, blocks, dst, raster_width, blocks_per_row)
        }
        BlockGeometry::B4x4 => {
            expand_tiles::<4, 4>(pointers, blocks, dst, raster_width, blocks_per_row)
        }
    }
}

fn expand_tiles<const W: usize, const H: usize>(
    pointers: &[u8],
    blocks: &[u8],
    dst: &mut [u8],
    raster_width: usize,
    blocks_per_row: usize,
) -> Result<()> {
    let block_bytes = W * H;
    let block_count = blocks.len() / block_bytes;

    for (tile, index_bytes) in pointers.chunks_exact(2).enumerate() {
        let index = u16::from_be_bytes([index_bytes[0], index_bytes[1]]) as usize;
        if index >= block_count {
            return Err(Error::format(format!(
                "tile {} references codebook entry {} of {}",
                tile, index, block_count
            )));
        }
        let block = &blocks[index * block_bytes..(index + 1) * block_bytes];

        let tile_x = (tile % blocks_per_row) * W;
        let tile_y = (tile / blocks_per_row) * H;
        for row in 0..H {
            let dst_start = (tile_y + row) * raster_width + tile_x;
            dst[dst_start..dst_start + W].copy_from_slice(&block[row * W..(row + 1) * W]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_selection() {
        assert_eq!(BlockGeometry::for_block_size(2, 2).unwrap(), BlockGeometry::B2x2);
        assert_eq!(BlockGeometry::for_block_size(2, 3).unwrap(), BlockGeometry::B2x3);
        assert_eq!(BlockGeometry::for_block_size(4, 2).unwrap(), BlockGeometry::B4x2);
        assert_eq!(BlockGeometry::for_block_size(4, 4).unwrap(), BlockGeometry::B4x4);
        assert!(matches!(
            BlockGeometry::for_block_size(8, 8),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_expand_places_tiles() {
        // 4x4 raster of 2x2 blocks; codebook has two blocks.
        let blocks = [
            1, 1, 1, 1, // block 0
            2, 2, 2, 2, // block 1
        ];
        let pointers = [
            0, 0, 0, 1, // top row: block 0, block 1
            0, 1, 0, 0, // bottom row: block 1, block 0
        ];
        let mut dst = [0u8; 16];
        expand_frame(BlockGeometry::B2x2, &pointers, &blocks, &mut dst, 4, 2, 2).unwrap();

        #[rustfmt::skip]
        let expected = [
            1, 1, 2, 2,
            1, 1, 2, 2,
            2, 2, 1, 1,
            2, 2, 1, 1,
        ];
        assert_eq!(dst, expected);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let blocks = [0u8; 4]; // one 2x2 block
        let pointers = [0, 5, 0, 0, 0, 0, 0, 0];
        let mut dst = [0u8; 16];
        let err =
            expand_frame(BlockGeometry::B2x2, &pointers, &blocks, &mut dst, 4, 2, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_undersized_raster_rejected() {
        let blocks = [0u8; 4]; // one 2x2 block
        let pointers = [0u8; 8]; // four tiles need a 16-byte raster
        let mut dst = [0u8; 8];
        let err =
            expand_frame(BlockGeometry::B2x2, &pointers, &blocks, &mut dst, 4, 2, 2).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_pointer_size_mismatch_rejected() {
        let blocks = [0u8; 4];
        let mut dst = [0u8; 16];
        let err = expand_frame(BlockGeometry::B2x2, &[0, 0], &blocks, &mut dst, 4, 2, 2)
            .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    /// Synthetic encode of a raster: one codebook block per tile, identity
    /// pointers. Decoding must reproduce the raster exactly for every
    /// geometry.
    #[test]
    fn test_round_trip_all_geometries() {
        for geometry in [
            BlockGeometry::B2x2,
            BlockGeometry::B2x3,
            BlockGeometry::B4x2,
            BlockGeometry::B4x4,
        ] {
            let blocks_per_row = 3;
            let block_rows = 2;
            let width = blocks_per_row * geometry.width();
            let height = block_rows * geometry.height();

            let raster: Vec<u8> = (0..width * height).map(|i| (i % 251) as u8).collect();

            // Cut the raster into per-tile blocks.
            let mut blocks = Vec::new();
            let mut pointers = Vec::new();
            for tile in 0..blocks_per_row * block_rows {
                let tx = (tile % blocks_per_row) * geometry.width();
                let ty = (tile / blocks_per_row) * geometry.height();
                for row in 0..geometry.height() {
                    let start = (ty + row) * width + tx;
                    blocks.extend_from_slice(&raster[start..start + geometry.width()]);
                }
                pointers.extend_from_slice(&(tile as u16).to_be_bytes());
            }

            let mut dst = vec![0u8; width * height];
            expand_frame(
                geometry,
                &pointers,
                &blocks,
                &mut dst,
                width,
                blocks_per_row,
                block_rows,
            )
            .unwrap();
            assert_eq!(dst, raster, "geometry {}", geometry);
        }
    }
}
