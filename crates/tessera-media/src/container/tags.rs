//! Chunk tag definitions.

/// Four-character chunk tag code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    /// Container magic.
    pub const FORM: Self = Self(*b"FORM");
    /// Form type identifying a tessera movie.
    pub const TVQA: Self = Self(*b"TVQA");
    /// Movie header.
    pub const MVHD: Self = Self(*b"MVHD");
    /// Frame-offset index.
    pub const FINF: Self = Self(*b"FINF");
    /// Caption chunk (skipped).
    pub const CAP0: Self = Self(*b"CAP0");
    /// Frame container, normal layout.
    pub const VQFR: Self = Self(*b"VQFR");
    /// Frame container, key-frame layout.
    pub const VQFK: Self = Self(*b"VQFK");
    /// Full codebook, raw.
    pub const CBF0: Self = Self(*b"CBF0");
    /// Full codebook, compressed.
    pub const CBFZ: Self = Self(*b"CBFZ");
    /// Partial codebook, raw.
    pub const CBP0: Self = Self(*b"CBP0");
    /// Partial codebook, compressed.
    pub const CBPZ: Self = Self(*b"CBPZ");
    /// Palette, raw.
    pub const CPL0: Self = Self(*b"CPL0");
    /// Palette, compressed.
    pub const CPLZ: Self = Self(*b"CPLZ");
    /// Pointer data, raw.
    pub const VPT0: Self = Self(*b"VPT0");
    /// Pointer data, compressed.
    pub const VPTZ: Self = Self(*b"VPTZ");
    /// Pointer data, compressed alternate layout.
    pub const VPTR: Self = Self(*b"VPTR");
    /// Pointer data, compressed key frame.
    pub const VPTK: Self = Self(*b"VPTK");
    /// Audio block, raw PCM.
    pub const SND0: Self = Self(*b"SND0");
    /// Audio block, run-length coded.
    pub const SND1: Self = Self(*b"SND1");
    /// Audio block, ADPCM coded.
    pub const SND2: Self = Self(*b"SND2");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Whether this tag opens a frame container.
    pub fn is_frame_container(&self) -> bool {
        matches!(*self, Self::VQFR | Self::VQFK)
    }

    /// Whether this tag carries an audio block.
    pub fn is_audio(&self) -> bool {
        matches!(*self, Self::SND0 | Self::SND1 | Self::SND2)
    }
}

impl std::fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
