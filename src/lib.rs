//! # devotts
//!
//! Text normalisation and audio assembly for narrated Chinese devotional
//! audio: daily verses, prayers and reflections read by a TTS voice over a
//! quiet music bed.
//!
//! Speech synthesis itself is not part of this crate.  Any back-end (cloud
//! API or local model) plugs in through [`SpeechSynthesizer`].
//!
//! ## Quick start
//!
//! ```no_run
//! use devotts::{AudioBuffer, NarrationConfig, Narrator, SpeechSynthesizer};
//!
//! struct MyVoice;
//!
//! impl SpeechSynthesizer for MyVoice {
//!     fn synthesize(&self, _text: &str, _voice: &str) -> anyhow::Result<AudioBuffer> {
//!         // call your TTS engine here
//!         Ok(AudioBuffer::silence(std::time::Duration::from_secs(1), 24_000, 1))
//!     }
//! }
//!
//! let config = NarrationConfig::load(std::path::Path::new("narration.json")).unwrap();
//! let narrator = Narrator::new(config, MyVoice);
//! let narration = narrator.narrate("2025-11-14\n约翰福音 3:16\n神爱世人").unwrap();
//! println!("{}", narration.filename); // VOTD_John-3-16_2025-11-14.mp3
//! narration.save(std::path::Path::new("out")).unwrap();
//! ```
//!
//! The text helpers work on their own as well:
//!
//! ```
//! assert_eq!(devotts::convert_bible_reference("犹大书 24-25"), "犹大书24至25节");
//! assert_eq!(
//!     devotts::generate_filename("John 3:16", "2025-01-01", None, "VOTD"),
//!     "VOTD_John-3-16_2025-01-01.mp3"
//! );
//! ```
//!
//! ## Pipeline
//! 1. **Sanitising**: bidi controls, chat emoji tokens and the reverence
//!    space removed; URLs spelled out.
//! 2. **Citations**: `约翰福音 3:16` → `约翰福音3章16节`.
//! 3. **Dates**: `2025-11-14`, `11/14`, `20251114` → `2025年11月14日`.
//! 4. **Synthesis**: one segment per paragraph, voice chosen by [`VoicePlan`].
//! 5. **Assembly**: segments resampled to one rate, joined with silence.
//! 6. **Background music**: looped, faded and laid under the speech.
//! 7. **Export**: WAV, or MP3 with ID3 tags (`mp3` feature).
//!
//! The filename is derived from the *unrewritten* text in parallel.

pub mod assemble;
pub mod audio;
pub mod bgm;
pub mod catalog;
pub mod citation;
pub mod config;
pub mod date;
pub mod decode;
pub mod export;
pub mod filename;
pub mod narrate;
pub mod preprocess;
pub mod synth;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use assemble::{assemble, Assembler};
pub use audio::{AudioBuffer, AudioError};
pub use bgm::{BackgroundMixer, BgmOptions};
pub use citation::{convert_bible_reference, extract_verse_from_text, find_citations, Citation};
pub use config::NarrationConfig;
pub use date::{convert_dates_in_text, extract_date_from_text, DateNormalizer};
pub use filename::{extract_filename_prefix, generate_filename};
pub use narrate::{Narration, Narrator, VoicePlan};
pub use preprocess::{clean_text, PreprocessorConfig, TextPreprocessor};
pub use synth::SpeechSynthesizer;
