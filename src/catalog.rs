//! Bible book catalog.
//!
//! Maps every Chinese spelling of a book name (full name and common
//! abbreviations, simplified and traditional script) to a canonical English
//! identifier.  Identifiers contain no whitespace so they can be dropped
//! straight into a filename.
//!
//! Lookups are exact, case-sensitive string matches.  Several one-character
//! abbreviations (`约`, `门`, `出`) are also everyday words; callers that
//! match them inside running text need their own context rules (see
//! [`crate::citation`]).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

// ─────────────────────────────────────────────────────────────────────────────
// Static tables
// ─────────────────────────────────────────────────────────────────────────────

/// `(canonical id, spellings)`. The first spelling is always the simplified
/// full name.
const BOOKS: &[(&str, &[&str])] = &[
    // ── Old Testament ────────────────────────────────────────────────────────
    ("Genesis", &["创世记", "創世記", "创", "創"]),
    ("Exodus", &["出埃及记", "出埃及記", "出"]),
    ("Leviticus", &["利未记", "利未記", "利"]),
    ("Numbers", &["民数记", "民數記", "民"]),
    ("Deuteronomy", &["申命记", "申命記", "申"]),
    ("Joshua", &["约书亚记", "約書亞記", "书", "書"]),
    ("Judges", &["士师记", "士師記", "士"]),
    ("Ruth", &["路得记", "路得記", "得"]),
    ("1Samuel", &["撒母耳记上", "撒母耳記上", "撒上"]),
    ("2Samuel", &["撒母耳记下", "撒母耳記下", "撒下"]),
    ("1Kings", &["列王纪上", "列王紀上", "王上"]),
    ("2Kings", &["列王纪下", "列王紀下", "王下"]),
    ("1Chronicles", &["历代志上", "歷代志上", "代上"]),
    ("2Chronicles", &["历代志下", "歷代志下", "代下"]),
    ("Ezra", &["以斯拉记", "以斯拉記", "拉"]),
    ("Nehemiah", &["尼希米记", "尼希米記", "尼"]),
    ("Esther", &["以斯帖记", "以斯帖記", "斯"]),
    ("Job", &["约伯记", "約伯記", "伯"]),
    ("Psalm", &["诗篇", "詩篇", "诗", "詩"]),
    ("Proverbs", &["箴言", "箴"]),
    ("Ecclesiastes", &["传道书", "傳道書", "传", "傳"]),
    ("SongOfSongs", &["雅歌", "歌"]),
    ("Isaiah", &["以赛亚书", "以賽亞書", "赛", "賽"]),
    ("Jeremiah", &["耶利米书", "耶利米書", "耶"]),
    ("Lamentations", &["耶利米哀歌", "哀"]),
    ("Ezekiel", &["以西结书", "以西結書", "结", "結"]),
    ("Daniel", &["但以理书", "但以理書", "但"]),
    ("Hosea", &["何西阿书", "何西阿書", "何"]),
    ("Joel", &["约珥书", "約珥書", "珥"]),
    ("Amos", &["阿摩司书", "阿摩司書", "摩"]),
    ("Obadiah", &["俄巴底亚书", "俄巴底亞書", "俄"]),
    ("Jonah", &["约拿书", "約拿書", "拿"]),
    ("Micah", &["弥迦书", "彌迦書", "弥", "彌"]),
    ("Nahum", &["那鸿书", "那鴻書", "鸿", "鴻"]),
    ("Habakkuk", &["哈巴谷书", "哈巴谷書", "哈"]),
    ("Zephaniah", &["西番雅书", "西番雅書", "番"]),
    ("Haggai", &["哈该书", "哈該書", "该", "該"]),
    ("Zechariah", &["撒迦利亚书", "撒迦利亞書", "亚", "亞"]),
    ("Malachi", &["玛拉基书", "瑪拉基書", "玛", "瑪"]),
    // ── New Testament ────────────────────────────────────────────────────────
    ("Matthew", &["马太福音", "馬太福音", "太"]),
    ("Mark", &["马可福音", "馬可福音", "可"]),
    ("Luke", &["路加福音", "路"]),
    ("John", &["约翰福音", "約翰福音", "约", "約"]),
    ("Acts", &["使徒行传", "使徒行傳", "徒"]),
    ("Romans", &["罗马书", "羅馬書", "罗", "羅"]),
    ("1Corinthians", &["哥林多前书", "哥林多前書", "林前"]),
    ("2Corinthians", &["哥林多后书", "哥林多後書", "林后", "林後"]),
    ("Galatians", &["加拉太书", "加拉太書", "加"]),
    ("Ephesians", &["以弗所书", "以弗所書", "弗"]),
    ("Philippians", &["腓立比书", "腓立比書", "腓"]),
    ("Colossians", &["歌罗西书", "歌羅西書", "西"]),
    ("1Thessalonians", &["帖撒罗尼迦前书", "帖撒羅尼迦前書", "帖前"]),
    ("2Thessalonians", &["帖撒罗尼迦后书", "帖撒羅尼迦後書", "帖后", "帖後"]),
    ("1Timothy", &["提摩太前书", "提摩太前書", "提前"]),
    ("2Timothy", &["提摩太后书", "提摩太後書", "提后", "提後"]),
    ("Titus", &["提多书", "提多書", "多"]),
    ("Philemon", &["腓利门书", "腓利門書", "门", "門"]),
    ("Hebrews", &["希伯来书", "希伯來書", "来", "來"]),
    ("James", &["雅各书", "雅各書", "雅"]),
    ("1Peter", &["彼得前书", "彼得前書", "彼前"]),
    ("2Peter", &["彼得后书", "彼得後書", "彼后", "彼後"]),
    ("1John", &["约翰一书", "約翰一書", "约一", "約一", "约壹", "約壹"]),
    ("2John", &["约翰二书", "約翰二書", "约二", "約二", "约贰", "約貳"]),
    ("3John", &["约翰三书", "約翰三書", "约三", "約三", "约叁", "約參"]),
    ("Jude", &["犹大书", "猶大書", "犹", "猶"]),
    ("Revelation", &["启示录", "啟示錄", "启", "啟"]),
];

/// Books with exactly one chapter, where "Book N" means verse N.
const SINGLE_CHAPTER_BOOKS: &[&str] = &["Obadiah", "Philemon", "2John", "3John", "Jude"];

static BY_NAME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    BOOKS
        .iter()
        .flat_map(|&(id, names)| names.iter().map(move |&name| (name, id)))
        .collect()
});

static SINGLE_CHAPTER_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    BOOKS
        .iter()
        .filter(|(id, _)| SINGLE_CHAPTER_BOOKS.contains(id))
        .flat_map(|(_, names)| names.iter().copied())
        .collect()
});

// ─────────────────────────────────────────────────────────────────────────────
// Lookups
// ─────────────────────────────────────────────────────────────────────────────

/// Canonical English identifier for a Chinese book spelling.
pub fn lookup_book(name: &str) -> Option<&'static str> {
    BY_NAME.get(name).copied()
}

/// Whether `name` spells a one-chapter book.
pub fn is_single_chapter(name: &str) -> bool {
    SINGLE_CHAPTER_NAMES.contains(name)
}

/// Longest trailing substring of `candidate` that is a known book spelling.
///
/// Returns `(prefix, book)` where `prefix` is the untouched leading text.
/// The full string is tried first, then progressively shorter suffixes, so
/// `"参考申命记"` yields `("参考", "申命记")` rather than matching `"记"`.
pub fn split_book_suffix(candidate: &str) -> Option<(&str, &str)> {
    candidate
        .char_indices()
        .map(|(i, _)| candidate.split_at(i))
        .find(|(_, suffix)| BY_NAME.contains_key(suffix))
}

/// All canonical identifiers in canonical order.
pub fn canonical_ids() -> impl Iterator<Item = &'static str> {
    BOOKS.iter().map(|(id, _)| *id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_six_books() {
        assert_eq!(canonical_ids().count(), 66);
    }

    #[test]
    fn test_spellings_are_unique() {
        let mut seen = HashSet::new();
        for (_, names) in BOOKS {
            for name in *names {
                assert!(seen.insert(*name), "duplicate spelling {}", name);
            }
        }
    }

    #[test]
    fn test_lookup_simplified_and_traditional() {
        assert_eq!(lookup_book("约翰福音"), Some("John"));
        assert_eq!(lookup_book("約翰福音"), Some("John"));
        assert_eq!(lookup_book("诗篇"), Some("Psalm"));
        assert_eq!(lookup_book("林後"), Some("2Corinthians"));
    }

    #[test]
    fn test_lookup_unknown() {
        assert_eq!(lookup_book("John"), None);
        assert_eq!(lookup_book(""), None);
        assert_eq!(lookup_book("约翰福音 "), None);
    }

    #[test]
    fn test_single_chapter() {
        assert!(is_single_chapter("犹大书"));
        assert!(is_single_chapter("猶"));
        assert!(is_single_chapter("腓利门书"));
        assert!(is_single_chapter("约贰"));
        assert!(!is_single_chapter("约翰福音"));
        assert!(!is_single_chapter("不是书"));
    }

    #[test]
    fn test_split_prefers_longest_suffix() {
        assert_eq!(split_book_suffix("参考申命记"), Some(("参考", "申命记")));
        assert_eq!(split_book_suffix("约翰福音"), Some(("", "约翰福音")));
        // "约翰一书" must not collapse to the one-character "书" (Joshua)
        assert_eq!(split_book_suffix("读约翰一书"), Some(("读", "约翰一书")));
        assert_eq!(split_book_suffix("今天"), None);
    }
}
