//! Stitch synthesized segments into one narration track.

use std::time::Duration;

use tracing::debug;

use crate::audio::{AudioBuffer, AudioError};

/// Concatenates segments with a fixed silence between neighbours.
///
/// All segments are converted to one sample rate and channel layout first:
/// `target_rate` if set, otherwise the first segment's rate.  The channel
/// count is the widest found among the segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assembler {
    pub silence: Duration,
    pub target_rate: Option<u32>,
}

impl Default for Assembler {
    fn default() -> Self {
        Self { silence: Duration::from_millis(500), target_rate: None }
    }
}

impl Assembler {
    pub fn new(silence: Duration) -> Self {
        Self { silence, target_rate: None }
    }

    pub fn with_target_rate(mut self, rate: u32) -> Self {
        self.target_rate = Some(rate);
        self
    }

    /// `segments[0] + gap + segments[1] + gap + … + segments[n-1]`.
    ///
    /// No gap is added before the first or after the last segment.  An empty
    /// list yields an empty buffer at the target rate (24 kHz mono if unset).
    pub fn assemble(&self, segments: &[AudioBuffer]) -> Result<AudioBuffer, AudioError> {
        let Some(first) = segments.first() else {
            return Ok(AudioBuffer::empty(self.target_rate.unwrap_or(24_000), 1));
        };
        let rate = self.target_rate.unwrap_or(first.sample_rate());
        let channels = segments.iter().map(|s| s.channels()).max().unwrap_or(1);
        let gap = AudioBuffer::silence(self.silence, rate, channels);

        let mut out = AudioBuffer::empty(rate, channels);
        for (i, segment) in segments.iter().enumerate() {
            if segment.sample_rate() != rate {
                debug!(segment = i, from = segment.sample_rate(), to = rate, "resampling segment");
            }
            let segment = segment.conformed_to(rate, channels)?;
            if i > 0 {
                out = out.concat(&gap);
            }
            out = out.concat(&segment);
        }
        debug!(
            segments = segments.len(),
            seconds = out.duration().as_secs_f32(),
            "assembled narration"
        );
        Ok(out)
    }
}

/// Assemble `segments` with `silence` between them, at the first segment's rate.
pub fn assemble(segments: &[AudioBuffer], silence: Duration) -> Result<AudioBuffer, AudioError> {
    Assembler::new(silence).assemble(segments)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: f32, frames: usize, rate: u32) -> AudioBuffer {
        AudioBuffer::from_mono(vec![value; frames], rate)
    }

    #[test]
    fn test_three_segments_two_gaps() {
        let segs = [
            constant(0.1, 1_000, 24_000),
            constant(0.2, 2_000, 24_000),
            constant(0.3, 3_000, 24_000),
        ];
        let out = assemble(&segs, Duration::from_millis(500)).unwrap();
        assert_eq!(out.frames(), 1_000 + 2_000 + 3_000 + 2 * 12_000);

        // No leading or trailing silence
        assert_eq!(out.samples()[0], 0.1);
        assert_eq!(*out.samples().last().unwrap(), 0.3);
        // Gap right after the first segment
        assert_eq!(out.samples()[1_000], 0.0);
        assert_eq!(out.samples()[1_000 + 12_000 - 1], 0.0);
        assert_eq!(out.samples()[1_000 + 12_000], 0.2);
    }

    #[test]
    fn test_single_segment_unchanged() {
        let seg = constant(0.5, 480, 24_000);
        let out = assemble(std::slice::from_ref(&seg), Duration::from_secs(1)).unwrap();
        assert_eq!(out, seg);
    }

    #[test]
    fn test_empty_list() {
        let out = assemble(&[], Duration::from_millis(500)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_mixed_rates_are_resampled() {
        // One second at 16 kHz and one second at 24 kHz must both last one
        // second in the output, not 2/3 s.
        let segs = [constant(0.25, 16_000, 16_000), constant(0.25, 24_000, 24_000)];
        let out = Assembler::new(Duration::ZERO).with_target_rate(24_000).assemble(&segs).unwrap();
        assert_eq!(out.sample_rate(), 24_000);
        assert_eq!(out.frames(), 48_000);
        assert!((out.duration().as_secs_f64() - 2.0).abs() < 1e-9, "got: {:?}", out.duration());
    }

    #[test]
    fn test_rate_defaults_to_first_segment() {
        let segs = [constant(0.1, 22_050, 22_050), constant(0.1, 44_100, 44_100)];
        let out = assemble(&segs, Duration::from_millis(100)).unwrap();
        assert_eq!(out.sample_rate(), 22_050);
        assert_eq!(out.frames(), 22_050 + 2_205 + 22_050);
    }

    #[test]
    fn test_channel_layout_widened() {
        let stereo = AudioBuffer::new(vec![0.1, -0.1, 0.1, -0.1], 8_000, 2);
        let mono = constant(0.4, 2, 8_000);
        let out = assemble(&[mono, stereo], Duration::ZERO).unwrap();
        assert_eq!(out.channels(), 2);
        assert_eq!(out.frames(), 4);
        assert_eq!(&out.samples()[..4], &[0.4, 0.4, 0.4, 0.4]);
    }
}
