//! Prepare a devotional text for narration and optionally lay music under a
//! recorded or synthesized WAV.
//!
//! Usage:
//!   cargo run --example prepare -- --input devotion.txt
//!   cargo run --example prepare -- --text "约翰福音 3:16 神爱世人" --year 2025
//!   cargo run --example prepare -- --input devotion.txt --speech voice.wav --bgm ./bgm --output out
//!
//! Set `RUST_LOG=devotts=debug` to see every pipeline decision.

use std::path::{Path, PathBuf};

use anyhow::Context;
use devotts::{
    extract_date_from_text, extract_filename_prefix, extract_verse_from_text, generate_filename,
    BackgroundMixer, BgmOptions, PreprocessorConfig, TextPreprocessor,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Parse simple CLI arguments ───────────────────────────────────────────
    let mut args = std::env::args().skip(1);

    let mut input: Option<PathBuf> = None;
    let mut text = "FilenamePrefix: 晨光\n2025-11-14\n[玫瑰]约翰福音 3:16\n\u{3000}神爱世人".to_string();
    let mut year: Option<i32> = None;
    let mut base = "VOTD".to_string();
    let mut speech: Option<PathBuf> = None;
    let mut bgm_dir: Option<PathBuf> = None;
    let mut bgm_file: Option<String> = None;
    let mut volume = -20.0f32;
    let mut seed: Option<u64> = None;
    let mut output = PathBuf::from(".");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--input"    => { if let Some(v) = args.next() { input    = Some(v.into()); } }
            "--text"     => { if let Some(v) = args.next() { text     = v; } }
            "--year"     => { if let Some(v) = args.next() { year     = v.parse().ok(); } }
            "--base"     => { if let Some(v) = args.next() { base     = v; } }
            "--speech"   => { if let Some(v) = args.next() { speech   = Some(v.into()); } }
            "--bgm"      => { if let Some(v) = args.next() { bgm_dir  = Some(v.into()); } }
            "--bgm-file" => { if let Some(v) = args.next() { bgm_file = Some(v); } }
            "--volume"   => { if let Some(v) = args.next() { volume   = v.parse().unwrap_or(-20.0); } }
            "--seed"     => { if let Some(v) = args.next() { seed     = v.parse().ok(); } }
            "--output"   => { if let Some(v) = args.next() { output   = v.into(); } }
            "--help"     => {
                println!(
                    "Usage: prepare [--input FILE | --text TEXT] [--year YYYY] [--base NAME] \
                     [--speech WAV --bgm DIR [--bgm-file NAME] [--volume DB] [--seed N]] \
                     [--output DIR]"
                );
                return Ok(());
            }
            _ => {}
        }
    }

    if let Some(path) = &input {
        text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
    }

    // ── Text side ────────────────────────────────────────────────────────────
    let preprocessor = TextPreprocessor::with_config(PreprocessorConfig {
        reference_year: year,
        ..PreprocessorConfig::default()
    });
    let verse = extract_verse_from_text(&text);
    let date = extract_date_from_text(&text)
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());
    let prefix = extract_filename_prefix(&text);
    let filename = generate_filename(verse.as_deref().unwrap_or(""), &date, prefix.as_deref(), &base);

    println!("Citation : {}", verse.as_deref().unwrap_or("-"));
    println!("Date     : {}", date);
    println!("Prefix   : {}", prefix.as_deref().unwrap_or("-"));
    println!("Filename : {}", filename);
    println!();
    println!("{}", preprocessor.process(&text));

    // ── Audio side (optional) ────────────────────────────────────────────────
    let (Some(speech), Some(directory)) = (speech, bgm_dir) else {
        return Ok(());
    };
    let foreground = devotts::decode::load_audio(&speech)?;
    let options = BgmOptions { directory, file: bgm_file, volume_db: volume, ..BgmOptions::default() };
    let mixer = match seed {
        Some(s) => BackgroundMixer::with_seed(s),
        None => BackgroundMixer::new(),
    };
    let mixed = mixer.mix(&foreground, &options);

    let out_path = output_path(&output, &filename);
    devotts::export::write_wav(&mixed, &out_path)?;
    println!();
    println!(
        "Mixed {:.1} s of speech into {:.1} s → {}",
        foreground.duration().as_secs_f32(),
        mixed.duration().as_secs_f32(),
        out_path.display()
    );
    Ok(())
}

fn output_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(filename).with_extension("wav")
}
