//! Narration settings, normally read from a JSON file.
//!
//! ```json
//! {
//!   "base_name": "VOTD",
//!   "silence_ms": 800,
//!   "sample_rate": 24000,
//!   "voices": { "mode": "intro_body", "intro_voice": "yunxi", "body_voice": "xiaoxiao" },
//!   "voice_aliases": { "yunxi": "zh-CN-YunxiNeural" },
//!   "bgm": { "directory": "bgm", "volume_db": -18 },
//!   "reference_year": 2025
//! }
//! ```
//!
//! Every field is optional; missing ones take the values of
//! [`NarrationConfig::default`].

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::bgm::BgmOptions;
use crate::narrate::VoicePlan;

/// Everything a [`Narrator`](crate::narrate::Narrator) needs besides the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Middle part of every output filename.
    pub base_name: String,

    /// Silence inserted between paragraphs.
    pub silence_ms: u64,

    /// Output rate; `None` keeps the rate of the first synthesized paragraph.
    pub sample_rate: Option<u32>,

    pub voices: VoicePlan,

    /// Friendly voice name → back-end voice identifier.
    pub voice_aliases: HashMap<String, String>,

    /// Background music; `None` disables mixing.
    pub bgm: Option<BgmOptions>,

    /// Artist written into MP3 tags.
    pub artist: String,

    /// Year for `M/D` dates; `None` means the current year.
    pub reference_year: Option<i32>,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            base_name: "VOTD".to_string(),
            silence_ms: 500,
            sample_rate: None,
            voices: VoicePlan::default(),
            voice_aliases: HashMap::new(),
            bgm: None,
            artist: "devotts".to_string(),
            reference_year: None,
        }
    }
}

impl NarrationConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Cannot read config: {}", path.display()))?;
        let config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_name.trim().is_empty() {
            bail!("base_name must not be empty");
        }
        if self.sample_rate == Some(0) {
            bail!("sample_rate must be positive");
        }
        match &self.voices {
            VoicePlan::Rotation { voices } if voices.is_empty() => {
                bail!("voice rotation needs at least one voice")
            }
            _ => Ok(()),
        }
    }

    pub fn silence(&self) -> Duration {
        Duration::from_millis(self.silence_ms)
    }

    /// Back-end identifier for `voice`, following `voice_aliases`.
    pub fn resolve_voice<'a>(&'a self, voice: &'a str) -> &'a str {
        self.voice_aliases.get(voice).map(String::as_str).unwrap_or(voice)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NarrationConfig::default();
        assert_eq!(config.base_name, "VOTD");
        assert_eq!(config.silence(), Duration::from_millis(500));
        assert!(config.bgm.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: NarrationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NarrationConfig::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narration.json");
        std::fs::write(
            &path,
            r#"{
                "base_name": "DailyBread",
                "silence_ms": 800,
                "sample_rate": 24000,
                "voices": {"mode": "rotation", "voices": ["a", "b"]},
                "voice_aliases": {"a": "zh-CN-YunxiNeural"},
                "bgm": {"directory": "music", "volume_db": -18},
                "reference_year": 2025
            }"#,
        )
        .unwrap();

        let config = NarrationConfig::load(&path).unwrap();
        assert_eq!(config.base_name, "DailyBread");
        assert_eq!(config.sample_rate, Some(24_000));
        assert_eq!(config.voices, VoicePlan::Rotation { voices: vec!["a".into(), "b".into()] });
        assert_eq!(config.resolve_voice("a"), "zh-CN-YunxiNeural");
        assert_eq!(config.resolve_voice("b"), "b");
        let bgm = config.bgm.unwrap();
        assert_eq!(bgm.volume_db, -18.0);
        assert_eq!(bgm.tail_padding_ms, BgmOptions::default().tail_padding_ms);
        assert_eq!(config.reference_year, Some(2025));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NarrationConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(missing.to_string().contains("Cannot read config"), "got: {}", missing);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(NarrationConfig::load(&bad).is_err());

        let empty_rotation = dir.path().join("rotation.json");
        std::fs::write(&empty_rotation, r#"{"voices": {"mode": "rotation", "voices": []}}"#).unwrap();
        let err = NarrationConfig::load(&empty_rotation).unwrap_err();
        assert!(err.to_string().contains("at least one voice"), "got: {}", err);
    }
}
