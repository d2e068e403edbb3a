//! Writing finished narrations to disk.

use std::path::Path;

use tracing::info;

use crate::audio::{AudioBuffer, AudioError};
use crate::filename::is_prefix_directive;

/// Convert f32 [-1.0, 1.0] → i16 [-32768, 32767].
fn to_i16(sample: f32) -> i16 {
    (sample * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Title for tagging: the first non-empty line of `text`, trimmed.
/// `FilenamePrefix:` directive lines are not titles and are skipped.
pub fn title_from_text(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !is_prefix_directive(line))
        .map(str::to_string)
}

/// Write `audio` to a 16-bit PCM WAV file at its own rate and channel count.
///
/// 16-bit PCM rather than 32-bit float: some mobile players accept an
/// IEEE-float header and then play silence.
pub fn write_wav(audio: &AudioBuffer, output_path: &Path) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: audio.channels(),
        sample_rate: audio.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)?;
    for &s in audio.samples() {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    info!(
        path = %output_path.display(),
        seconds = audio.duration().as_secs_f32(),
        "saved WAV"
    );
    Ok(())
}

/// ID3 fields written into MP3 output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mp3Tags {
    pub title: String,
    pub artist: String,
}

/// Encode `audio` as a 192 kbps MP3 with an ID3 title/artist tag.
///
/// More than two channels are down-mixed to stereo first.
#[cfg(feature = "mp3")]
pub fn write_mp3(audio: &AudioBuffer, output_path: &Path, tags: &Mp3Tags) -> Result<(), AudioError> {
    use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, Id3Tag, MonoPcm, Quality};

    let encode_err = |e: &dyn std::fmt::Debug| AudioError::Encode(format!("{e:?}"));

    let audio = if audio.channels() > 2 { audio.with_channels(2) } else { audio.clone() };
    let pcm: Vec<i16> = audio.samples().iter().map(|&s| to_i16(s)).collect();

    let mut builder = Builder::new()
        .ok_or_else(|| AudioError::Encode("cannot allocate LAME encoder".to_string()))?;
    builder.set_num_channels(audio.channels() as u8).map_err(|e| encode_err(&e))?;
    builder.set_sample_rate(audio.sample_rate()).map_err(|e| encode_err(&e))?;
    builder.set_brate(Bitrate::Kbps192).map_err(|e| encode_err(&e))?;
    builder.set_quality(Quality::Best).map_err(|e| encode_err(&e))?;
    builder
        .set_id3_tag(Id3Tag {
            title: tags.title.as_bytes(),
            artist: tags.artist.as_bytes(),
            album: &[],
            album_art: &[],
            year: &[],
            comment: &[],
        })
        .map_err(|e| encode_err(&e))?;
    let mut encoder = builder.build().map_err(|e| encode_err(&e))?;

    let mut mp3 = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(audio.frames()));
    if audio.channels() == 1 {
        encoder.encode_to_vec(MonoPcm(&pcm), &mut mp3).map_err(|e| encode_err(&e))?;
    } else {
        let left: Vec<i16> = pcm.iter().step_by(2).copied().collect();
        let right: Vec<i16> = pcm.iter().skip(1).step_by(2).copied().collect();
        encoder
            .encode_to_vec(DualPcm { left: &left, right: &right }, &mut mp3)
            .map_err(|e| encode_err(&e))?;
    }
    encoder.flush_to_vec::<FlushNoGap>(&mut mp3).map_err(|e| encode_err(&e))?;

    std::fs::write(output_path, &mp3)
        .map_err(|source| AudioError::Io { path: output_path.to_path_buf(), source })?;
    info!(
        path = %output_path.display(),
        seconds = audio.duration().as_secs_f32(),
        bytes = mp3.len(),
        "saved MP3"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_text() {
        assert_eq!(
            title_from_text("\n  \n  晨更灵修：神爱世人  \n正文"),
            Some("晨更灵修：神爱世人".to_string())
        );
        assert_eq!(title_from_text(" \n\t"), None);
        assert_eq!(title_from_text("FilenamePrefix: X\n主祷文"), Some("主祷文".to_string()));
    }

    #[test]
    fn test_i16_conversion_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), i16::MIN);
    }

    #[test]
    fn test_write_wav_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let audio = AudioBuffer::new(vec![0.5, -0.5, 0.25, -0.25], 24_000, 2);
        write_wav(&audio, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 24_000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![16_383, -16_383, 8_191, -8_191]);
    }

    #[test]
    fn test_write_wav_bad_path() {
        let audio = AudioBuffer::from_mono(vec![0.0; 10], 24_000);
        let err = write_wav(&audio, Path::new("/no/such/dir/out.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Wav(_)), "got: {}", err);
    }

    #[cfg(feature = "mp3")]
    #[test]
    fn test_write_mp3() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp3");
        let samples = (0..24_000).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        let audio = AudioBuffer::from_mono(samples, 24_000);
        let tags = Mp3Tags { title: "神爱世人".to_string(), artist: "devotts".to_string() };
        write_mp3(&audio, &path, &tags).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 1_000, "got: {}", bytes.len());
    }
}
