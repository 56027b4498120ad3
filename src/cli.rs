use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Vector-quantization movie toolkit")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display movie information
    Info {
        /// Movie file to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode frames to PNG images
    Decode {
        /// Movie file to decode
        #[arg(required = true)]
        file: PathBuf,

        /// Output directory for decoded frames
        #[arg(short, long, default_value = "frames")]
        out: PathBuf,

        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u32>,
    },

    /// Play a movie headless in real time and report statistics
    Play {
        /// Movie file to play
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}
