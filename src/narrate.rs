//! End-to-end narration: raw devotional text in, finished audio and filename out.
//!
//! ```text
//! raw text ─┬─ extract citation / date / prefix ──► filename
//!           └─ TextPreprocessor ─► paragraphs ─► SpeechSynthesizer (per paragraph)
//!                                             ─► Assembler ─► BackgroundMixer ─► audio
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assemble::Assembler;
use crate::audio::AudioBuffer;
use crate::bgm::BackgroundMixer;
use crate::citation::extract_verse_from_text;
use crate::config::NarrationConfig;
use crate::date::extract_date_from_text;
use crate::export::title_from_text;
use crate::filename::{extract_filename_prefix, generate_filename, is_prefix_directive};
use crate::preprocess::{PreprocessorConfig, TextPreprocessor};
use crate::synth::SpeechSynthesizer;

// ─────────────────────────────────────────────────────────────────────────────
// Voice planning
// ─────────────────────────────────────────────────────────────────────────────

fn default_intro_paragraphs() -> usize {
    1
}

/// How paragraphs are assigned to voices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VoicePlan {
    /// One voice reads everything.
    Single { voice: String },
    /// The first `intro_paragraphs` paragraphs use `intro_voice`, the rest `body_voice`.
    IntroBody {
        intro_voice: String,
        body_voice: String,
        #[serde(default = "default_intro_paragraphs")]
        intro_paragraphs: usize,
    },
    /// Paragraph `i` uses `voices[i % voices.len()]`.
    Rotation { voices: Vec<String> },
}

impl Default for VoicePlan {
    fn default() -> Self {
        VoicePlan::Single { voice: "default".to_string() }
    }
}

impl VoicePlan {
    /// Voice for the paragraph at `index`; `None` only for an empty rotation.
    pub fn voice_for(&self, index: usize) -> Option<&str> {
        match self {
            VoicePlan::Single { voice } => Some(voice.as_str()),
            VoicePlan::IntroBody { intro_voice, body_voice, intro_paragraphs } => {
                if index < *intro_paragraphs {
                    Some(intro_voice.as_str())
                } else {
                    Some(body_voice.as_str())
                }
            }
            VoicePlan::Rotation { voices } => {
                if voices.is_empty() {
                    None
                } else {
                    Some(voices[index % voices.len()].as_str())
                }
            }
        }
    }
}

/// Non-empty trimmed lines of `text`, without `FilenamePrefix:` directives.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_prefix_directive(line))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Narrator
// ─────────────────────────────────────────────────────────────────────────────

/// A finished narration, ready to be saved.
#[derive(Debug, Clone)]
pub struct Narration {
    pub audio: AudioBuffer,
    /// Derived `.mp3` filename (see [`generate_filename`]).
    pub filename: String,
    pub title: Option<String>,
    pub artist: String,
}

impl Narration {
    /// Write the narration into `dir` and return the path written.
    ///
    /// With the `mp3` feature the derived `.mp3` name is used as is;
    /// otherwise a `.wav` file with the same stem is written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        #[cfg(feature = "mp3")]
        {
            let path = dir.join(&self.filename);
            let tags = crate::export::Mp3Tags {
                title: self.title.clone().unwrap_or_default(),
                artist: self.artist.clone(),
            };
            crate::export::write_mp3(&self.audio, &path, &tags)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            Ok(path)
        }
        #[cfg(not(feature = "mp3"))]
        {
            let path = dir.join(&self.filename).with_extension("wav");
            crate::export::write_wav(&self.audio, &path)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            Ok(path)
        }
    }
}

/// Drives one synthesizer through the whole pipeline.
pub struct Narrator<S> {
    config: NarrationConfig,
    synthesizer: S,
    preprocessor: TextPreprocessor,
    assembler: Assembler,
    mixer: BackgroundMixer,
    today: NaiveDate,
}

impl<S: SpeechSynthesizer> Narrator<S> {
    pub fn new(config: NarrationConfig, synthesizer: S) -> Self {
        let preprocessor = TextPreprocessor::with_config(PreprocessorConfig {
            reference_year: config.reference_year,
            ..PreprocessorConfig::default()
        });
        let assembler = Assembler { silence: config.silence(), target_rate: config.sample_rate };
        Self {
            config,
            synthesizer,
            preprocessor,
            assembler,
            mixer: BackgroundMixer::new(),
            today: Local::now().date_naive(),
        }
    }

    /// Replace the background mixer (e.g. with a seeded one).
    pub fn with_mixer(mut self, mixer: BackgroundMixer) -> Self {
        self.mixer = mixer;
        self
    }

    /// Date used in the filename when the text carries none.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &NarrationConfig {
        &self.config
    }

    /// Output filename for `text`, from the unrewritten text.
    pub fn filename_for(&self, text: &str) -> String {
        let verse = extract_verse_from_text(text);
        if verse.is_none() {
            debug!("no Bible citation found, filename carries no reference");
        }
        let date = extract_date_from_text(text)
            .unwrap_or_else(|| self.today.format("%Y-%m-%d").to_string());
        let prefix = extract_filename_prefix(text);
        generate_filename(
            verse.as_deref().unwrap_or(""),
            &date,
            prefix.as_deref(),
            &self.config.base_name,
        )
    }

    /// Normalise, synthesize and assemble `text`.
    pub fn narrate(&self, text: &str) -> Result<Narration> {
        let filename = self.filename_for(text);

        let processed = self.preprocessor.process(text);
        let paragraphs = split_paragraphs(&processed);
        if paragraphs.is_empty() {
            bail!("Nothing to narrate: text has no readable paragraphs");
        }
        info!(paragraphs = paragraphs.len(), %filename, "narrating");

        let mut segments = Vec::with_capacity(paragraphs.len());
        for (i, paragraph) in paragraphs.iter().enumerate() {
            let voice = self
                .config
                .voices
                .voice_for(i)
                .context("Voice plan has no voices")?;
            let voice = self.config.resolve_voice(voice);
            debug!(paragraph = i + 1, voice, "synthesizing");
            let segment = self
                .synthesizer
                .synthesize(paragraph, voice)
                .with_context(|| format!("Synthesis failed for paragraph {} ({:?})", i + 1, voice))?;
            segments.push(segment);
        }

        let mut audio = self
            .assembler
            .assemble(&segments)
            .context("Failed to assemble narration")?;
        if let Some(bgm) = &self.config.bgm {
            audio = self.mixer.mix(&audio, bgm);
        }

        Ok(Narration {
            audio,
            filename,
            title: title_from_text(&processed),
            artist: self.config.artist.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
