//! CLI end-to-end tests
//!
//! Tests for the tessera command-line interface against a small synthetic
//! movie written to a temp directory.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

#[allow(deprecated)]
fn tessera_cmd() -> Command {
    Command::cargo_bin("tessera").unwrap()
}

fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// Eight-frame 16x16 movie with 4x4 blocks and a group size of four.
fn write_movie(path: &Path) {
    const FRAMES: u16 = 8;
    const GROUP: u32 = 4;

    let mut mvhd = vec![0u8; 42];
    mvhd[0..2].copy_from_slice(&1u16.to_be_bytes());
    mvhd[4..6].copy_from_slice(&FRAMES.to_be_bytes());
    mvhd[6..8].copy_from_slice(&16u16.to_be_bytes()); // width
    mvhd[8..10].copy_from_slice(&16u16.to_be_bytes()); // height
    mvhd[10] = 4; // block width
    mvhd[11] = 4; // block height
    mvhd[12] = 15; // frame rate
    mvhd[13] = GROUP as u8;
    mvhd[14..16].copy_from_slice(&256u16.to_be_bytes());
    mvhd[16..18].copy_from_slice(&4u16.to_be_bytes()); // max blocks

    let mut frames: Vec<Vec<u8>> = Vec::new();
    for n in 0..FRAMES as u32 {
        let boundary = n % GROUP == 0;
        let mut body = Vec::new();
        if boundary {
            let mut codebook = Vec::new();
            for block in 0..4u8 {
                codebook.extend(std::iter::repeat(block * 16).take(16));
            }
            body.extend_from_slice(&chunk(b"CBF0", &codebook));
        }
        if n == 0 {
            body.extend_from_slice(&chunk(b"CPL0", &[0x30; 768]));
        }
        let mut pointers = Vec::new();
        for _ in 0..16 {
            pointers.extend_from_slice(&((n % GROUP) as u16).to_be_bytes());
        }
        body.extend_from_slice(&chunk(b"VPT0", &pointers));
        frames.push(chunk(if boundary { b"VQFK" } else { b"VQFR" }, &body));
    }

    let preamble_len = 12 + 8 + 42 + 8 + FRAMES as usize * 4;
    let mut index = Vec::new();
    let mut offset = preamble_len as u64;
    for (n, span) in frames.iter().enumerate() {
        let mut entry = (offset >> 1) as u32;
        if n as u32 % GROUP == 0 {
            entry |= 1 << 31;
        }
        if n == 0 {
            entry |= 1 << 30;
        }
        index.extend_from_slice(&entry.to_be_bytes());
        offset += span.len() as u64;
    }

    let mut body = Vec::new();
    body.extend_from_slice(b"TVQA");
    body.extend_from_slice(&chunk(b"MVHD", &mvhd));
    body.extend_from_slice(&chunk(b"FINF", &index));
    for span in &frames {
        body.extend_from_slice(span);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"FORM");
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    fs::write(path, out).unwrap();
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = tessera_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = tessera_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tessera"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = tessera_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tessera"));
}

#[test]
fn test_cli_info_missing_file_fails() {
    let mut cmd = tessera_cmd();
    cmd.args(["info", "/no/such/movie.tvq"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("opening"));
}

#[test]
fn test_cli_info_prints_summary() {
    let dir = tempdir().unwrap();
    let movie = dir.path().join("sample.tvq");
    write_movie(&movie);

    let mut cmd = tessera_cmd();
    cmd.arg("info")
        .arg(&movie)
        .assert()
        .success()
        .stdout(predicate::str::contains("Frames: 8"))
        .stdout(predicate::str::contains("16x16"))
        .stdout(predicate::str::contains("Audio: none"));
}

#[test]
fn test_cli_info_json_output() {
    let dir = tempdir().unwrap();
    let movie = dir.path().join("sample.tvq");
    write_movie(&movie);

    let mut cmd = tessera_cmd();
    let output = cmd.arg("info").arg(&movie).arg("--json").output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["frame_count"], 8);
    assert_eq!(parsed["width"], 16);
    assert_eq!(parsed["has_audio"], false);
}

#[test]
fn test_cli_decode_writes_pngs() {
    let dir = tempdir().unwrap();
    let movie = dir.path().join("sample.tvq");
    write_movie(&movie);
    let out = dir.path().join("frames");

    let mut cmd = tessera_cmd();
    cmd.arg("decode")
        .arg(&movie)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Decoded 8 frame(s)"));

    for n in 0..8 {
        assert!(out.join(format!("frame_{:05}.png", n)).exists());
    }
}

#[test]
fn test_cli_decode_respects_frame_limit() {
    let dir = tempdir().unwrap();
    let movie = dir.path().join("sample.tvq");
    write_movie(&movie);
    let out = dir.path().join("frames");

    let mut cmd = tessera_cmd();
    cmd.arg("decode")
        .arg(&movie)
        .args(["--frames", "3"])
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Decoded 3 frame(s)"));

    assert!(out.join("frame_00002.png").exists());
    assert!(!out.join("frame_00003.png").exists());
}
