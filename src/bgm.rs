//! Background-music mixing.
//!
//! A music bed is chosen from a directory, levelled, looped or trimmed to
//! `intro + speech + tail`, faded at both ends, and the speech is laid on top
//! after the intro.  Mixing is best-effort: a missing directory, an empty
//! directory or an undecodable track all return the speech unchanged.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{frames_for, AudioBuffer, AudioError};
use crate::decode::{has_audio_extension, load_audio};

/// Fade applied to the start of the music bed.
pub const FADE_IN: Duration = Duration::from_millis(2_000);
/// Fade applied to the end of the music bed.
pub const FADE_OUT: Duration = Duration::from_millis(3_000);

/// Where to find the music bed and how to lay it under the speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BgmOptions {
    pub directory: PathBuf,
    /// File name inside `directory`; `None` (or a missing file) picks one at random.
    pub file: Option<String>,
    /// Level change applied to the music, negative is quieter.
    pub volume_db: f32,
    pub intro_delay_ms: u64,
    pub tail_padding_ms: u64,
}

impl Default for BgmOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("bgm"),
            file: None,
            volume_db: -20.0,
            intro_delay_ms: 4_000,
            tail_padding_ms: 5_000,
        }
    }
}

impl BgmOptions {
    pub fn intro_delay(&self) -> Duration {
        Duration::from_millis(self.intro_delay_ms)
    }

    pub fn tail_padding(&self) -> Duration {
        Duration::from_millis(self.tail_padding_ms)
    }
}

/// Mixes music beds under narration.  Holds the RNG used for random picks.
pub struct BackgroundMixer {
    rng: Mutex<StdRng>,
}

impl Default for BackgroundMixer {
    fn default() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }
}

impl BackgroundMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mixer with reproducible track selection.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Resolve the track to use, or `None` when no eligible file exists.
    pub fn choose_track(&self, options: &BgmOptions) -> Option<PathBuf> {
        let dir = &options.directory;
        if !dir.is_dir() {
            info!(dir = %dir.display(), "background music directory not found");
            return None;
        }

        if let Some(name) = options.file.as_deref() {
            let explicit = dir.join(name);
            if explicit.is_file() {
                return Some(explicit);
            }
            info!(file = %explicit.display(), "requested background track missing, picking at random");
        }

        let mut candidates = eligible_tracks(dir);
        if candidates.is_empty() {
            info!(dir = %dir.display(), "no background tracks found");
            return None;
        }
        // Directory order is unspecified; sort so a seeded pick is reproducible.
        candidates.sort();
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        candidates.choose(&mut *rng).cloned()
    }

    /// Lay `foreground` over a music bed described by `options`.
    ///
    /// Never fails: every problem with the music is logged and the
    /// foreground is returned as is.
    pub fn mix(&self, foreground: &AudioBuffer, options: &BgmOptions) -> AudioBuffer {
        let Some(track) = self.choose_track(options) else {
            return foreground.clone();
        };
        debug!(track = %track.display(), "mixing background music");

        let background = match load_audio(&track) {
            Ok(bg) => bg,
            Err(e) => {
                warn!(track = %track.display(), error = %e, "cannot load background music");
                return foreground.clone();
            }
        };

        match mix_with_track(foreground, &background, options) {
            Ok(mixed) => mixed,
            Err(e) => {
                warn!(track = %track.display(), error = %e, "background mixing failed");
                foreground.clone()
            }
        }
    }
}

fn eligible_tracks(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot list background music directory");
            return Vec::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_audio_extension(path))
        .collect()
}

/// Mix an already decoded music bed under `foreground`.
///
/// The output has the foreground's rate and channel layout and lasts exactly
/// `intro_delay + foreground + tail_padding`.  An empty bed leaves the
/// foreground unchanged.
pub fn mix_with_track(
    foreground: &AudioBuffer,
    background: &AudioBuffer,
    options: &BgmOptions,
) -> Result<AudioBuffer, AudioError> {
    if background.is_empty() {
        debug!("background track is empty, skipping");
        return Ok(foreground.clone());
    }
    let rate = foreground.sample_rate();
    let intro = frames_for(options.intro_delay(), rate);
    let tail = frames_for(options.tail_padding(), rate);
    let required = intro + foreground.frames() + tail;

    let bed = background
        .conformed_to(rate, foreground.channels())?
        .with_gain_db(options.volume_db)
        .looped_to(required)
        .fade_in(FADE_IN)
        .fade_out(FADE_OUT);

    Ok(bed.overlay(foreground, intro))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8_000;

    fn constant(value: f32, seconds: f64) -> AudioBuffer {
        AudioBuffer::from_mono(vec![value; (seconds * RATE as f64) as usize], RATE)
    }

    fn write_wav(path: &Path, value: i16, frames: usize) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn options(dir: &Path) -> BgmOptions {
        BgmOptions {
            directory: dir.to_path_buf(),
            file: None,
            volume_db: 0.0,
            intro_delay_ms: 1_000,
            tail_padding_ms: 1_000,
        }
    }

    #[test]
    fn test_duration_is_intro_plus_speech_plus_tail() {
        let fg = constant(0.5, 5.0);
        let bg = constant(0.2, 0.3);
        let mixed = mix_with_track(&fg, &bg, &options(Path::new("unused"))).unwrap();
        assert_eq!(mixed.frames(), 7 * RATE as usize);
        assert_eq!(mixed.duration(), Duration::from_secs(7));
    }

    #[test]
    fn test_fades_and_overlay() {
        let fg = constant(0.5, 5.0);
        let bg = constant(0.2, 0.3);
        let mixed = mix_with_track(&fg, &bg, &options(Path::new("unused"))).unwrap();

        assert_eq!(mixed.samples()[0], 0.0, "fade-in starts silent");
        assert_eq!(*mixed.samples().last().unwrap(), 0.0, "fade-out ends silent");
        // 2.5 s in: past the fade-in, speech active, before the fade-out
        let s = mixed.samples()[20_000];
        assert!((s - 0.7).abs() < 1e-5, "got: {}", s);
        // During the intro only music plays (still fading in)
        assert!(mixed.samples()[4_000] < 0.2, "got: {}", mixed.samples()[4_000]);
    }

    #[test]
    fn test_volume_applied() {
        let fg = constant(0.5, 5.0);
        let bg = constant(0.2, 1.0);
        let mut opts = options(Path::new("unused"));
        opts.volume_db = -20.0;
        let mixed = mix_with_track(&fg, &bg, &opts).unwrap();
        assert!((mixed.samples()[20_000] - 0.52).abs() < 1e-5, "got: {}", mixed.samples()[20_000]);
    }

    #[test]
    fn test_long_track_trimmed() {
        let fg = constant(0.0, 1.0);
        let bg = constant(0.2, 60.0);
        let mixed = mix_with_track(&fg, &bg, &options(Path::new("unused"))).unwrap();
        assert_eq!(mixed.frames(), 3 * RATE as usize);
    }

    #[test]
    fn test_background_matches_foreground_format() {
        let fg = AudioBuffer::new(vec![0.0; 2 * 8 * RATE as usize], RATE, 2);
        let bg = AudioBuffer::from_mono(vec![0.2; 16_000], 16_000);
        let mixed = mix_with_track(&fg, &bg, &options(Path::new("unused"))).unwrap();
        assert_eq!(mixed.sample_rate(), RATE);
        assert_eq!(mixed.channels(), 2);
        assert_eq!(mixed.frames(), 10 * RATE as usize);
    }

    #[test]
    fn test_missing_directory_returns_foreground() {
        let fg = constant(0.5, 1.0);
        let mixer = BackgroundMixer::with_seed(7);
        let out = mixer.mix(&fg, &options(Path::new("/no/such/bgm/dir")));
        assert_eq!(out, fg);
    }

    #[test]
    fn test_no_eligible_files_returns_foreground() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "hymns go here").unwrap();
        let fg = constant(0.5, 1.0);
        let out = BackgroundMixer::with_seed(7).mix(&fg, &options(dir.path()));
        assert_eq!(out, fg);
    }

    #[test]
    fn test_undecodable_track_returns_foreground() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.wav"), b"not a wav").unwrap();
        let fg = constant(0.5, 1.0);
        let out = BackgroundMixer::with_seed(7).mix(&fg, &options(dir.path()));
        assert_eq!(out, fg);
    }

    #[test]
    fn test_mix_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("hymn.wav"), 6_554, 2_000);
        let fg = constant(0.0, 5.0);
        let out = BackgroundMixer::with_seed(1).mix(&fg, &options(dir.path()));
        assert_eq!(out.frames(), 7 * RATE as usize);
        assert!((out.samples()[20_000] - 0.2).abs() < 1e-3, "got: {}", out.samples()[20_000]);
    }

    #[test]
    fn test_explicit_file_used() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 3_277, 2_000);
        write_wav(&dir.path().join("b.wav"), 29_491, 2_000);
        let mut opts = options(dir.path());
        opts.file = Some("b.wav".to_string());

        let mixer = BackgroundMixer::with_seed(3);
        assert_eq!(mixer.choose_track(&opts), Some(dir.path().join("b.wav")));
        let out = mixer.mix(&constant(0.0, 5.0), &opts);
        assert!((out.samples()[20_000] - 0.9).abs() < 1e-3, "got: {}", out.samples()[20_000]);
    }

    #[test]
    fn test_missing_explicit_file_falls_back_to_random() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("only.wav"), 3_277, 100);
        let mut opts = options(dir.path());
        opts.file = Some("gone.mp3".to_string());
        let chosen = BackgroundMixer::with_seed(3).choose_track(&opts);
        assert_eq!(chosen, Some(dir.path().join("only.wav")));
    }

    #[test]
    fn test_seeded_choice_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.mp3", "b.WAV", "c.m4a", "d.wav", "e.ogg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let opts = options(dir.path());
        let first = BackgroundMixer::with_seed(42).choose_track(&opts).unwrap();
        let second = BackgroundMixer::with_seed(42).choose_track(&opts).unwrap();
        assert_eq!(first, second);
        assert_ne!(first.extension().unwrap(), "ogg");
    }

    #[test]
    fn test_options_from_json() {
        let opts: BgmOptions =
            serde_json::from_str(r#"{"directory": "music", "volume_db": -12.5}"#).unwrap();
        assert_eq!(opts.directory, PathBuf::from("music"));
        assert_eq!(opts.volume_db, -12.5);
        assert_eq!(opts.file, None);
        assert_eq!(opts.intro_delay(), Duration::from_secs(4));
    }
}
