//! Bible citation rewriting and extraction.
//!
//! Two citation shapes are recognised:
//!
//! | Shape         | Example            | Rewritten as         |
//! |---------------|--------------------|----------------------|
//! | chaptered     | `约翰福音 3:16-18` | `约翰福音3章16至18节` |
//! | single-chapter| `犹大书 24-25`     | `犹大书24至25节`      |
//!
//! The book candidate is the run of 1–15 CJK / ASCII letters immediately
//! before the numbers.  The longest trailing substring of the candidate that
//! names a book wins; anything in front of it is running text and is kept
//! verbatim (`参考申命记6:4` → `参考申命记6章4节`).
//!
//! The single-chapter shape only applies to books in the one-chapter set and
//! runs after the chaptered shape, over the already-rewritten text.  It
//! refuses numbers followed by `:`, `至`, `节`, `章` or `，<digit>`, which is
//! what rewritten output looks like, so a second pass changes nothing.
//!
//! One-character abbreviations are also ordinary words.  The chaptered shape
//! still accepts them behind running text, so `大约 10:30` reads as John
//! 10:30.  The single-chapter shape only takes a one-character abbreviation
//! that stands alone (`门 6`), never one glued to running text (`出门3次`).
//!
//! Patterns use the linear-time `regex` engine; the look-around checks are
//! done on the haystack after each match.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::catalog::{is_single_chapter, lookup_book, split_book_suffix};

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

static RE_CHAPTERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<cand>[\p{Han}A-Za-z]{1,15}?)[ \t\x{3000}]?(?P<chapter>[0-9]+)[:：](?P<verses>[0-9]+(?:[-–—,]+[0-9]+)*)",
    )
    .unwrap()
});

static RE_SINGLE_CHAPTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<cand>[\p{Han}A-Za-z]{1,15}?)[ \t\x{3000}]?(?P<verses>[0-9]+(?:[-–—,]+[0-9]+)*)",
    )
    .unwrap()
});

static RE_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-–—]+").unwrap());

/// Characters that may not follow a single-chapter verse list.
const REFUSED_AFTER_VERSES: &[char] = &[':', '：', '至', '节', '章'];

/// Whether the single-chapter match ending at `end` runs into more citation
/// syntax (`:`, `至`, `节`, `章`, `，<digit>`).
fn continues_citation(text: &str, end: usize) -> bool {
    let mut rest = text[end..].chars();
    match rest.next() {
        Some(c) if REFUSED_AFTER_VERSES.contains(&c) => true,
        Some('，') => rest.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Chaptered,
    SingleChapter,
}

impl Shape {
    fn regex(self) -> &'static Regex {
        match self {
            Shape::Chaptered => &RE_CHAPTERED,
            Shape::SingleChapter => &RE_SINGLE_CHAPTER,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Citation
// ─────────────────────────────────────────────────────────────────────────────

/// One `start` or `start-end` entry of a verse list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseRange {
    pub start: u32,
    pub end: Option<u32>,
}

/// A citation located in a text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    /// Book spelling as it appeared in the text.
    pub book: String,
    /// Canonical English identifier of `book`.
    pub canonical: &'static str,
    /// Always 1 for single-chapter books.
    pub chapter: u32,
    pub verses: Vec<VerseRange>,
    pub single_chapter: bool,
    /// Byte range of the citation (book through last verse) in the scanned text.
    pub span: Range<usize>,
    chapter_text: Option<String>,
    verse_text: String,
}

impl Citation {
    /// Chinese reading form, e.g. `约翰福音3章16至18节` or `犹大书24至25节`.
    pub fn to_chinese(&self) -> String {
        let verses = RE_DASHES.replace_all(&self.verse_text, "至").replace(',', "，");
        match &self.chapter_text {
            Some(chapter) => format!("{}{}章{}节", self.book, chapter, verses),
            None => format!("{}{}节", self.book, verses),
        }
    }

    /// Compact reference, e.g. `约翰福音 3:16-18` or `犹大书 1:24-25`.
    pub fn to_reference(&self) -> String {
        let verses = RE_DASHES.replace_all(&self.verse_text, "-");
        format!("{} {}:{}", self.book, self.chapter, verses)
    }
}

fn parse_verses(text: &str) -> Option<Vec<VerseRange>> {
    text.split(',')
        .filter(|item| !item.is_empty())
        .map(|item| {
            let mut bounds = RE_DASHES.split(item).filter(|b| !b.is_empty());
            let start = bounds.next()?.parse().ok()?;
            let end = match bounds.last() {
                Some(last) => Some(last.parse().ok()?),
                None => None,
            };
            Some(VerseRange { start, end })
        })
        .collect()
}

/// Validate one regex match found in `text`. Returns the untouched
/// running-text prefix and the citation, or `None` when the candidate names
/// no suitable book.
fn citation_from<'t>(text: &str, caps: &Captures<'t>, shape: Shape) -> Option<(&'t str, Citation)> {
    let whole = caps.get(0)?;
    let cand = caps.name("cand")?;
    let (prefix, book) = split_book_suffix(cand.as_str())?;
    let single_chapter = is_single_chapter(book);
    if shape == Shape::SingleChapter {
        let glued_abbreviation = !prefix.is_empty() && book.chars().count() == 1;
        if !single_chapter || glued_abbreviation || continues_citation(text, whole.end()) {
            return None;
        }
    }
    let canonical = lookup_book(book)?;

    let verse_text = caps.name("verses")?.as_str();
    let verses = parse_verses(verse_text)?;
    let (chapter, chapter_text) = match shape {
        Shape::Chaptered => {
            let raw = caps.name("chapter")?.as_str();
            (raw.parse().ok()?, Some(raw.to_string()))
        }
        Shape::SingleChapter => (1, None),
    };

    let citation = Citation {
        book: book.to_string(),
        canonical,
        chapter,
        verses,
        single_chapter,
        span: cand.start() + prefix.len()..whole.end(),
        chapter_text,
        verse_text: verse_text.to_string(),
    };
    Some((prefix, citation))
}

fn rewrite_shape(text: &str, shape: Shape) -> String {
    shape
        .regex()
        .replace_all(text, |caps: &Captures| match citation_from(text, caps, shape) {
            Some((prefix, citation)) => format!("{}{}", prefix, citation.to_chinese()),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn scan_shape(text: &str, shape: Shape) -> impl Iterator<Item = Citation> + '_ {
    shape
        .regex()
        .captures_iter(text)
        .filter_map(move |caps| citation_from(text, &caps, shape).map(|(_, citation)| citation))
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Rewrite every recognised citation in `text` into its Chinese reading form.
///
/// Text that does not form a valid citation is left untouched.  Applying the
/// function twice gives the same result as applying it once.
pub fn convert_bible_reference(text: &str) -> String {
    let text = rewrite_shape(text, Shape::Chaptered);
    rewrite_shape(&text, Shape::SingleChapter)
}

/// Every citation in `text`, ordered by position.
///
/// Single-chapter matches overlapping a chaptered citation are dropped.
pub fn find_citations(text: &str) -> Vec<Citation> {
    let mut found: Vec<Citation> = scan_shape(text, Shape::Chaptered).collect();
    let single: Vec<Citation> = scan_shape(text, Shape::SingleChapter)
        .filter(|c| {
            !found
                .iter()
                .any(|f| c.span.start < f.span.end && f.span.start < c.span.end)
        })
        .collect();
    found.extend(single);
    found.sort_by_key(|c| c.span.start);
    found
}

/// First citation in `text`, formatted as `"<book> <chapter>:<verses>"`.
///
/// Chaptered citations take priority over single-chapter ones regardless of
/// position.  The book keeps the spelling found in the text; verse ranges
/// use an ASCII hyphen.
pub fn extract_verse_from_text(text: &str) -> Option<String> {
    scan_shape(text, Shape::Chaptered)
        .next()
        .or_else(|| scan_shape(text, Shape::SingleChapter).next())
        .map(|c| c.to_reference())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
