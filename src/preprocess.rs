//! Text preprocessing pipeline.
//!
//! Turns a devotional text copied from chat apps and web pages into a form
//! a Chinese TTS voice reads correctly:
//!
//! 1. **Bidi controls**: invisible direction marks and isolates removed.
//! 2. **Decorative tokens**: chat emoji such as `[玫瑰]` removed.
//! 3. **Reverence space**: the full-width space written before `神` dropped.
//! 4. **URLs**: spelled out letter by letter, dots read as `点`.
//! 5. **Citations**: `约翰福音 3:16` → `约翰福音3章16节` (see [`crate::citation`]).
//! 6. **Dates**: `2025-11-14` → `2025年11月14日` (see [`crate::date`]).
//!
//! Steps 1–4 are available on their own as [`clean_text`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::citation::convert_bible_reference;
use crate::date::DateNormalizer;

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

/// Bidirectional formatting characters: ALM, LRM, RLM, embeddings/overrides
/// (LRE…RLO) and isolates (LRI…PDI).
const BIDI_CONTROLS: &[char] = &[
    '\u{061C}', '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}', '\u{202C}', '\u{202D}',
    '\u{202E}', '\u{2066}', '\u{2067}', '\u{2068}', '\u{2069}',
];

/// Bracketed chat-emoji names dropped by [`remove_decorative_tokens`].
const DECORATIVE_TOKENS: &[&str] = &[
    "玫瑰", "爱心", "心", "强", "握手", "祈祷", "抱拳", "合十", "太阳", "月亮", "微笑",
    "鼓掌", "拥抱", "庆祝", "烟花", "福", "红包", "胜利", "愉快", "花", "礼物", "蛋糕",
    "OK", "Rose", "Heart", "Pray", "Sun", "Moon", "Smile", "Hug", "Party", "ThumbsUp",
];

/// Full-width space traditionally written before `神`.
const REVERENCE_SPACE: &str = "\u{3000}神";

static RE_BRACKET_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]\n]{1,12})\]").unwrap());
/// A bare or `http(s)://` host with a common TLD and an optional path.  The
/// `host` group ends at the TLD; neighbours are checked by [`spell_urls`].
static RE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?P<host>(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+(?:com|org|net|cn|io|tw|hk|edu|gov|info|me|cc|app|tv))(?:/[a-z0-9._~%/?#=&+-]*)?",
    )
    .unwrap()
});
static RE_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

// ─────────────────────────────────────────────────────────────────────────────
// Sanitiser passes
// ─────────────────────────────────────────────────────────────────────────────

pub fn strip_bidi_controls(text: &str) -> String {
    text.chars().filter(|c| !BIDI_CONTROLS.contains(c)).collect()
}

pub fn remove_decorative_tokens(text: &str) -> String {
    RE_BRACKET_TOKEN
        .replace_all(text, |caps: &Captures| {
            if DECORATIVE_TOKENS.contains(&&caps[1]) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

pub fn remove_reverence_space(text: &str) -> String {
    text.replace(REVERENCE_SPACE, "神")
}

/// Spell a URL for TTS: `www.bible.com` → `W W W 点 B I B L E 点 C O M`.
pub fn spell_url(url: &str) -> String {
    let bare = RE_SCHEME.replace(url, "");
    let mut tokens: Vec<String> = Vec::with_capacity(bare.len());
    for c in bare.chars() {
        match c {
            '.' => tokens.push("点".to_string()),
            c if c.is_ascii_alphanumeric() => tokens.push(c.to_ascii_uppercase().to_string()),
            _ => {}
        }
    }
    tokens.join(" ")
}

/// Spell every URL in `text`.  A match glued to an e-mail local part, a
/// longer dotted name or a longer TLD (`bible.community`) is left alone.
pub fn spell_urls(text: &str) -> String {
    RE_URL
        .replace_all(text, |caps: &Captures| {
            let (Some(whole), Some(host)) = (caps.get(0), caps.name("host")) else {
                return caps[0].to_string();
            };
            let before = text[..whole.start()].chars().next_back();
            let after = text[host.end()..].chars().next();
            let glued = before.is_some_and(|c| c.is_ascii_alphanumeric() || c == '@' || c == '.')
                || after.is_some_and(|c| c.is_ascii_alphanumeric());
            if glued {
                whole.as_str().to_string()
            } else {
                spell_url(whole.as_str())
            }
        })
        .into_owned()
}

/// Run the four sanitiser passes (no citation or date rewriting).
pub fn clean_text(text: &str) -> String {
    let text = strip_bidi_controls(text);
    let text = remove_decorative_tokens(&text);
    let text = remove_reverence_space(&text);
    spell_urls(&text)
}

// ─────────────────────────────────────────────────────────────────────────────
// TextPreprocessor: full pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the text preprocessing pipeline.
#[derive(Debug, Clone)]
pub struct PreprocessorConfig {
    pub strip_bidi_controls: bool,
    pub remove_decorative_tokens: bool,
    pub remove_reverence_space: bool,
    pub spell_urls: bool,
    pub convert_citations: bool,
    pub convert_dates: bool,
    /// Year used for `M/D` dates; `None` means the current year.
    pub reference_year: Option<i32>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            strip_bidi_controls: true,
            remove_decorative_tokens: true,
            remove_reverence_space: true,
            spell_urls: true,
            convert_citations: true,
            convert_dates: true,
            reference_year: None,
        }
    }
}

/// Full text preprocessing pipeline.
pub struct TextPreprocessor {
    pub config: PreprocessorConfig,
    dates: DateNormalizer,
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::with_config(PreprocessorConfig::default())
    }
}

impl TextPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PreprocessorConfig) -> Self {
        let dates = config
            .reference_year
            .map(DateNormalizer::new)
            .unwrap_or_default();
        Self { config, dates }
    }

    pub fn process(&self, text: &str) -> String {
        let cfg = &self.config;
        let mut text = text.to_string();

        if cfg.strip_bidi_controls {
            text = strip_bidi_controls(&text);
        }
        if cfg.remove_decorative_tokens {
            text = remove_decorative_tokens(&text);
        }
        if cfg.remove_reverence_space {
            text = remove_reverence_space(&text);
        }
        if cfg.spell_urls {
            text = spell_urls(&text);
        }
        if cfg.convert_citations {
            text = convert_bible_reference(&text);
        }
        if cfg.convert_dates {
            text = self.dates.convert(&text);
        }

        text
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
