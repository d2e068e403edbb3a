//! Output filename derivation.
//!
//! Filenames follow the template
//! `[<prefix>_]<base_name>_<Book>-<chapter>-<verse>_<date>.mp3`, e.g.
//! `MyPrefix_VOTD_Psalm-23-1_2025-11-14.mp3`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::lookup_book;

/// Programme names recognised anywhere in a text and used verbatim as the
/// filename prefix.  Checked before any `FilenamePrefix:` directive.
pub const KNOWN_PREFIXES: &[&str] = &["每日灵粮", "晨更灵修", "主日讲章"];

static RE_PREFIX_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*FilenamePrefix[ \t]*[:：](.*)$").unwrap());

// Book glued to the chapter, e.g. "John3:16" or "诗篇23:1".
static RE_GLUED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)([0-9]+:.*)$").unwrap());

fn split_reference(verse_ref: &str) -> (String, String) {
    let normalized = verse_ref.replace('：', ":");
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
    let Some(last) = tokens.pop() else {
        return (String::new(), String::new());
    };
    if !tokens.is_empty() {
        return (tokens.concat(), last.to_string());
    }
    match RE_GLUED.captures(last) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (String::new(), last.to_string()),
    }
}

/// Build the output filename for a verse reference and date.
///
/// `verse_ref` is `"<book> <chapter>:<verse>"`; the book may be any catalog
/// spelling (translated to its English identifier) or anything else (kept
/// as is).  `date` is embedded exactly as given.  Never fails: malformed
/// references degrade to whatever could be parsed.
pub fn generate_filename(
    verse_ref: &str,
    date: &str,
    prefix: Option<&str>,
    base_name: &str,
) -> String {
    let (book, chapter_verse) = split_reference(verse_ref);
    let english = lookup_book(&book).unwrap_or(book.as_str());
    let location = chapter_verse.replace(':', "-");

    let reference = match (english.is_empty(), location.is_empty()) {
        (false, false) => format!("{}-{}", english, location),
        (false, true) => english.to_string(),
        (true, _) => location,
    };

    let mut parts: Vec<&str> = Vec::with_capacity(4);
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        parts.push(prefix);
    }
    parts.push(base_name);
    if !reference.is_empty() {
        parts.push(&reference);
    }
    parts.push(date);
    format!("{}.mp3", parts.join("_"))
}

/// Filename prefix requested by the text itself.
///
/// A known programme name anywhere in the text wins; otherwise the value of
/// a `FilenamePrefix: <value>` line is returned, trimmed.
pub fn extract_filename_prefix(text: &str) -> Option<String> {
    if let Some(known) = KNOWN_PREFIXES.iter().find(|p| text.contains(*p)) {
        return Some((*known).to_string());
    }
    RE_PREFIX_DIRECTIVE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .find(|value| !value.is_empty())
}

/// Whether `line` is a `FilenamePrefix:` directive rather than narration.
pub fn is_prefix_directive(line: &str) -> bool {
    RE_PREFIX_DIRECTIVE.is_match(line)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
