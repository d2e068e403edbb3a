//! In-memory PCM buffers and the transforms used by assembly and mixing.
//!
//! Samples are interleaved `f32` in `[-1.0, 1.0]`.  Every transform borrows
//! `self` and returns a new buffer, so a background track loaded once can be
//! reused for several mixes without aliasing.

use std::path::PathBuf;
use std::time::Duration;

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

/// Input block size handed to the FFT resampler.
const RESAMPLE_CHUNK: usize = 1024;

/// Errors raised while loading, converting or writing audio.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },
    #[error("{0} contains no playable audio track")]
    NoTrack(PathBuf),
    #[error("resampler setup failed: {0}")]
    ResamplerSetup(#[from] rubato::ResamplerConstructionError),
    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),
    #[error("WAV I/O failed: {0}")]
    Wav(#[from] hound::Error),
    #[error("MP3 encoding failed: {0}")]
    Encode(String),
}

/// Interleaved PCM audio.
///
/// Fields are private so the channel count can never be zero; build buffers
/// through [`AudioBuffer::new`] and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

/// Number of frames covering `duration` at `sample_rate`, rounded.
pub fn frames_for(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64).round() as usize
}

/// Linear gain for a level change in decibels.
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self { samples, sample_rate, channels: channels.max(1) }
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, sample_rate, 1)
    }

    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    pub fn silence(duration: Duration, sample_rate: u32, channels: u16) -> Self {
        let frames = frames_for(duration, sample_rate);
        Self::new(vec![0.0; frames * channels.max(1) as usize], sample_rate, channels)
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count, always at least 1.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Playing time; zero for a buffer without a sample rate.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self { samples, sample_rate: self.sample_rate, channels: self.channels }
    }

    // ── Level ────────────────────────────────────────────────────────────────

    /// Attenuate (negative `db`) or boost the buffer.
    pub fn with_gain_db(&self, db: f32) -> Self {
        let gain = db_to_gain(db);
        self.with_samples(self.samples.iter().map(|s| s * gain).collect())
    }

    /// Linear fade from silence over the first `duration`.
    pub fn fade_in(&self, duration: Duration) -> Self {
        let len = frames_for(duration, self.sample_rate).min(self.frames());
        let ch = self.channels as usize;
        let mut samples = self.samples.clone();
        for frame in 0..len {
            let gain = frame as f32 / len as f32;
            for s in &mut samples[frame * ch..(frame + 1) * ch] {
                *s *= gain;
            }
        }
        self.with_samples(samples)
    }

    /// Linear fade to silence over the last `duration`.
    pub fn fade_out(&self, duration: Duration) -> Self {
        let frames = self.frames();
        let len = frames_for(duration, self.sample_rate).min(frames);
        let ch = self.channels as usize;
        let start = frames - len;
        let mut samples = self.samples.clone();
        for frame in start..frames {
            let gain = (frames - 1 - frame) as f32 / len as f32;
            for s in &mut samples[frame * ch..(frame + 1) * ch] {
                *s *= gain;
            }
        }
        self.with_samples(samples)
    }

    // ── Length ───────────────────────────────────────────────────────────────

    /// First `frames` frames (or the whole buffer if shorter).
    pub fn trimmed_to(&self, frames: usize) -> Self {
        let end = frames.min(self.frames()) * self.channels as usize;
        self.with_samples(self.samples[..end].to_vec())
    }

    /// Repeat the whole buffer until it covers `frames`, then trim to exactly
    /// that length.  An empty buffer stays empty.
    pub fn looped_to(&self, frames: usize) -> Self {
        if self.is_empty() {
            return self.clone();
        }
        let wanted = frames * self.channels as usize;
        let samples = self.samples.iter().copied().cycle().take(wanted).collect();
        self.with_samples(samples)
    }

    /// `self` followed by `other`.  Both must share rate and channel count.
    pub fn concat(&self, other: &AudioBuffer) -> Self {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        debug_assert_eq!(self.channels, other.channels);
        let mut samples = Vec::with_capacity(self.samples.len() + other.samples.len());
        samples.extend_from_slice(&self.samples);
        samples.extend_from_slice(&other.samples);
        self.with_samples(samples)
    }

    /// Mix `other` into `self` starting `offset` frames in.
    ///
    /// The result keeps `self`'s length; whatever of `other` runs past the
    /// end is dropped.  Sums are clipped to `[-1.0, 1.0]`.
    pub fn overlay(&self, other: &AudioBuffer, offset: usize) -> Self {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        debug_assert_eq!(self.channels, other.channels);
        let mut samples = self.samples.clone();
        let start = (offset * self.channels as usize).min(samples.len());
        for (dst, src) in samples[start..].iter_mut().zip(&other.samples) {
            *dst = (*dst + src).clamp(-1.0, 1.0);
        }
        self.with_samples(samples)
    }

    // ── Format ───────────────────────────────────────────────────────────────

    /// Convert the channel layout: mono→N duplicates, N→mono averages,
    /// otherwise channels are dropped or repeated cyclically.
    pub fn with_channels(&self, channels: u16) -> Self {
        let channels = channels.max(1);
        if channels == self.channels {
            return self.clone();
        }
        let src = self.channels as usize;
        let dst = channels as usize;
        let mut samples = Vec::with_capacity(self.frames() * dst);
        for frame in self.samples.chunks_exact(src) {
            if dst == 1 {
                samples.push(frame.iter().sum::<f32>() / src as f32);
            } else {
                samples.extend((0..dst).map(|c| frame[c % src]));
            }
        }
        Self { samples, sample_rate: self.sample_rate, channels }
    }

    /// Resample to `rate`.  The output holds exactly
    /// `round(frames * rate / sample_rate)` frames.
    pub fn resampled(&self, rate: u32) -> Result<Self, AudioError> {
        if rate == self.sample_rate {
            return Ok(self.clone());
        }
        let ch = self.channels as usize;
        let frames = self.frames();
        if frames == 0 || self.sample_rate == 0 {
            return Ok(Self::empty(rate, self.channels));
        }
        let expected =
            (frames as f64 * rate as f64 / self.sample_rate as f64).round() as usize;

        let planar: Vec<Vec<f32>> = (0..ch)
            .map(|c| self.samples.iter().skip(c).step_by(ch).copied().collect())
            .collect();

        let mut resampler =
            FftFixedIn::<f32>::new(self.sample_rate as usize, rate as usize, RESAMPLE_CHUNK, 2, ch)?;
        let delay = resampler.output_delay();
        let mut out: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); ch];

        // Feed input (zero-padded at the end) until the delayed output is covered.
        let mut pos = 0;
        while out[0].len() < expected + delay {
            let need = resampler.input_frames_next();
            let block: Vec<Vec<f32>> = planar
                .iter()
                .map(|channel| {
                    let mut chunk = vec![0.0; need];
                    if pos < frames {
                        let end = (pos + need).min(frames);
                        chunk[..end - pos].copy_from_slice(&channel[pos..end]);
                    }
                    chunk
                })
                .collect();
            let produced = resampler.process(&block, None)?;
            for (dst, src) in out.iter_mut().zip(produced) {
                dst.extend(src);
            }
            pos += need;
        }

        let mut samples = Vec::with_capacity(expected * ch);
        for frame in delay..delay + expected {
            samples.extend(out.iter().map(|channel| channel[frame]));
        }
        Ok(Self { samples, sample_rate: rate, channels: self.channels })
    }

    /// Match another buffer's rate and channel layout.
    pub fn conformed_to(&self, sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        self.with_channels(channels).resampled(sample_rate)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
