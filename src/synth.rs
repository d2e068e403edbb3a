//! Seam between narration and whatever produces speech.
//!
//! Cloud APIs and local models are all driven through [`SpeechSynthesizer`];
//! a program picks one implementation at start-up and hands it to
//! [`Narrator`](crate::narrate::Narrator).

use anyhow::Result;

use crate::audio::AudioBuffer;

/// Turns one paragraph of normalised text into speech.
pub trait SpeechSynthesizer {
    /// Synthesize `text` with the back-end specific `voice` identifier.
    ///
    /// Implementations may return any sample rate or channel layout; the
    /// assembler conforms segments afterwards.
    fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer>;
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for &T {
    fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer> {
        (**self).synthesize(text, voice)
    }
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<T> {
    fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer> {
        (**self).synthesize(text, voice)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
