mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use tessera_media::{
    DiscardPresenter, PlayMode, PlayStatus, Player, PlayerConfig, Presenter, VideoFrame,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "tessera=trace,tessera_media=trace".to_string()
        } else {
            "tessera=info,tessera_media=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Info { file, json } => info_file(&file, json),
        Commands::Decode { file, out, frames } => decode_file(&file, &out, frames),
        Commands::Play { file } => play_file(&file),
        Commands::Version => {
            println!("tessera {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_movie(path: &Path) -> Result<Player<BufReader<File>>> {
    tracing::debug!(path = %path.display(), "opening movie");
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Player::open(BufReader::new(file), PlayerConfig::default())
        .with_context(|| format!("reading movie {}", path.display()))
}

fn info_file(path: &Path, json: bool) -> Result<()> {
    let player = open_movie(path)?;
    let info = player.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", path.display());
    println!(
        "Frames: {} ({:.1}s at {} fps)",
        info.frame_count,
        info.duration_secs(),
        info.frame_rate
    );
    println!(
        "Video: {}x{}, {}x{} blocks, {} colors, {} codebook entries",
        info.width, info.height, info.block_width, info.block_height, info.colors, info.max_blocks
    );
    if info.has_audio {
        println!(
            "Audio: {} Hz, {} channel(s), {}-bit",
            info.audio_rate, info.audio_channels, info.audio_bits
        );
    } else {
        println!("Audio: none");
    }
    Ok(())
}

/// Presenter that expands each indexed frame through its palette and writes
/// it out as a numbered PNG.
struct PngWriter<'a> {
    dir: &'a Path,
    written: u32,
}

impl Presenter for PngWriter<'_> {
    fn present(&mut self, frame: &VideoFrame<'_>) -> tessera_media::Result<()> {
        let mut rgb = image::RgbImage::new(frame.width, frame.height);
        for (i, pixel) in rgb.pixels_mut().enumerate() {
            let entry = frame.pixels[i] as usize * 3;
            *pixel = image::Rgb([
                frame.palette[entry],
                frame.palette[entry + 1],
                frame.palette[entry + 2],
            ]);
        }
        let path = self.dir.join(format!("frame_{:05}.png", frame.frame));
        rgb.save(&path).map_err(|e| {
            tessera_media::Error::resource(format!("writing {}: {}", path.display(), e))
        })?;
        self.written += 1;
        Ok(())
    }
}

fn decode_file(path: &Path, out: &Path, frames: Option<u32>) -> Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("creating output directory {}", out.display()))?;
    let mut player = open_movie(path)?;

    let mut writer = PngWriter { dir: out, written: 0 };
    loop {
        if frames.is_some_and(|limit| writer.written >= limit) {
            break;
        }
        if player.play(PlayMode::Walk, &mut writer)? == PlayStatus::EndOfFile {
            break;
        }
    }

    println!("Decoded {} frame(s) to {}", writer.written, out.display());
    Ok(())
}

fn play_file(path: &Path) -> Result<()> {
    let mut player = open_movie(path)?;
    let info = player.info();
    println!(
        "Playing {} ({} frames, {:.1}s)",
        path.display(),
        info.frame_count,
        info.duration_secs()
    );

    let mut presenter = DiscardPresenter;
    loop {
        match player.play(PlayMode::Run, &mut presenter)? {
            PlayStatus::EndOfFile => break,
            PlayStatus::NotTimeYet => std::thread::sleep(Duration::from_millis(5)),
            PlayStatus::Sleeping | PlayStatus::NoBuffer => {
                std::thread::sleep(Duration::from_millis(2))
            }
            PlayStatus::Paused => break,
        }
    }

    let stats = player.stats();
    println!("Frames drawn:   {}", stats.frames_drawn);
    println!("Frames skipped: {}", stats.frames_skipped);
    println!("Largest frame:  {} bytes", stats.max_frame_bytes);
    Ok(())
}
