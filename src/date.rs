//! Calendar date rewriting and extraction.
//!
//! Rewrites the date shapes found in devotional texts into the Chinese
//! reading form `2025年11月14日` (no leading zeros), applying one rule after
//! another over the progressively rewritten text:
//!
//! 1. `YYYY-M-D` / `YYYY-MM-DD`
//! 2. `M/D/YYYY`
//! 3. `M/D`, year taken from the normaliser's reference year
//! 4. `YYYYMMDD`
//! 5. `MMDDYYYY`
//!
//! Every candidate is validated with [`chrono::NaiveDate`]; spans that are not
//! real calendar dates (`20251332`, `2/30`) are left as they are.
//!
//! The digit look-arounds need `fancy_regex`.  Its matcher can fail at run
//! time (backtrack limit); a rule that fails is skipped with a warning and
//! the text goes on to the next rule unchanged.

use chrono::{Datelike, Local, NaiveDate};
use fancy_regex::{Captures, Regex};
use once_cell::sync::Lazy;
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

static RE_ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<![0-9])([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})(?![0-9])").unwrap());
static RE_US_FULL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?<![0-9/])([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})(?![0-9/])").unwrap()
});
static RE_US_SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<![0-9/])([0-9]{1,2})/([0-9]{1,2})(?![0-9/])").unwrap());
static RE_COMPACT_YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<![0-9])([0-9]{4})([0-9]{2})([0-9]{2})(?![0-9])").unwrap());
static RE_COMPACT_MDY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<![0-9])([0-9]{2})([0-9]{2})([0-9]{4})(?![0-9])").unwrap());
static RE_CHINESE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?<![0-9])([0-9]{4})年([0-9]{1,2})月([0-9]{1,2})日").unwrap()
});

/// Which capture group holds which field.
#[derive(Debug, Clone, Copy)]
enum Order {
    Ymd,
    Mdy,
}

fn date_from(caps: &Captures, order: Order) -> Option<NaiveDate> {
    let field = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };
    let (year, month, day) = match order {
        Order::Ymd => (field(1)?, field(2)?, field(3)?),
        Order::Mdy => (field(3)?, field(1)?, field(2)?),
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn chinese(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

fn replace_dates<F>(text: &str, re: &Regex, rep: F) -> String
where
    F: FnMut(&Captures) -> String,
{
    match re.try_replacen(text, 0, rep) {
        Ok(out) => out.into_owned(),
        Err(err) => {
            warn!(pattern = re.as_str(), %err, "date rule skipped");
            text.to_string()
        }
    }
}

fn rewrite(text: &str, re: &Regex, order: Order) -> String {
    replace_dates(text, re, |caps: &Captures| match date_from(caps, order) {
        Some(date) => chinese(date),
        None => caps[0].to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// DateNormalizer
// ─────────────────────────────────────────────────────────────────────────────

/// Date rewriter with an explicit year for the year-less `M/D` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    pub reference_year: i32,
}

impl Default for DateNormalizer {
    /// Uses the current local year.
    fn default() -> Self {
        Self::new(Local::now().year())
    }
}

impl DateNormalizer {
    pub fn new(reference_year: i32) -> Self {
        Self { reference_year }
    }

    /// Rewrite every recognised date in `text`; see the module docs.
    pub fn convert(&self, text: &str) -> String {
        let text = rewrite(text, &RE_ISO, Order::Ymd);
        let text = rewrite(&text, &RE_US_FULL, Order::Mdy);
        let text = replace_dates(&text, &RE_US_SHORT, |caps: &Captures| {
            let field = |i: usize| -> Option<u32> { caps.get(i)?.as_str().parse().ok() };
            let date = field(1)
                .zip(field(2))
                .and_then(|(m, d)| NaiveDate::from_ymd_opt(self.reference_year, m, d));
            match date {
                Some(date) => chinese(date),
                None => caps[0].to_string(),
            }
        });
        let text = rewrite(&text, &RE_COMPACT_YMD, Order::Ymd);
        rewrite(&text, &RE_COMPACT_MDY, Order::Mdy)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Rewrite dates in `text`, resolving `M/D` against the current year.
pub fn convert_dates_in_text(text: &str) -> String {
    DateNormalizer::default().convert(text)
}

/// First real calendar date in `text`, formatted `YYYY-MM-DD`.
///
/// Shapes are tried in priority order (`YYYY-M-D`, `YYYY年M月D日`,
/// `M/D/YYYY`, `YYYYMMDD`, `MMDDYYYY`); within a shape the earliest valid
/// match wins.  Year-less `M/D` is deliberately not extracted.
pub fn extract_date_from_text(text: &str) -> Option<String> {
    let shapes: [(&Regex, Order); 5] = [
        (&*RE_ISO, Order::Ymd),
        (&*RE_CHINESE, Order::Ymd),
        (&*RE_US_FULL, Order::Mdy),
        (&*RE_COMPACT_YMD, Order::Ymd),
        (&*RE_COMPACT_MDY, Order::Mdy),
    ];
    shapes
        .iter()
        .find_map(|(re, order)| {
            re.captures_iter(text)
                .map_while(|caps| {
                    caps.map_err(|err| warn!(pattern = re.as_str(), %err, "date rule skipped"))
                        .ok()
                })
                .find_map(|caps| date_from(&caps, *order))
        })
        .map(|date| date.format("%Y-%m-%d").to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(text: &str) -> String {
        DateNormalizer::new(2025).convert(text)
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(convert("2025-11-14"), "2025年11月14日");
        assert_eq!(convert("日期：2025-1-5。"), "日期：2025年1月5日。");
    }

    #[test]
    fn test_us_dates() {
        assert_eq!(convert("11/14/2025"), "2025年11月14日");
        assert_eq!(convert("1/5/2024 晨祷"), "2024年1月5日 晨祷");
    }

    #[test]
    fn test_month_day_uses_reference_year() {
        assert_eq!(convert("11/14 灵修"), "2025年11月14日 灵修");
        assert_eq!(DateNormalizer::new(2019).convert("3/1"), "2019年3月1日");
    }

    #[test]
    fn test_month_day_leap_day_depends_on_year() {
        assert_eq!(DateNormalizer::new(2024).convert("2/29"), "2024年2月29日");
        assert_eq!(DateNormalizer::new(2025).convert("2/29"), "2/29");
    }

    #[test]
    fn test_compact_ymd() {
        assert_eq!(convert("20251114"), "2025年11月14日");
        assert_eq!(convert("20250105"), "2025年1月5日");
    }

    #[test]
    fn test_compact_invalid_left_alone() {
        assert_eq!(convert("20251332"), "20251332");
        assert_eq!(convert("订单号 12345678"), "订单号 12345678");
        assert_eq!(convert("20250230"), "20250230");
    }

    #[test]
    fn test_compact_mdy() {
        assert_eq!(convert("11142025"), "2025年11月14日");
        assert_eq!(convert("01052025"), "2025年1月5日");
    }

    #[test]
    fn test_invalid_separated_dates_left_alone() {
        assert_eq!(convert("2025-13-01"), "2025-13-01");
        assert_eq!(convert("13/45/2025"), "13/45/2025");
    }

    #[test]
    fn test_longer_digit_runs_untouched() {
        assert_eq!(convert("202511140"), "202511140");
    }

    #[test]
    fn test_very_long_digit_runs() {
        let digits = "1".repeat(5_000);
        assert_eq!(convert(&digits), digits);
        assert_eq!(extract_date_from_text(&digits), None);

        let text = format!("{}-{}/{} 2025-11-14", digits, digits, digits);
        assert!(convert(&text).ends_with(" 2025年11月14日"), "got: {}", convert(&text));
        assert_eq!(extract_date_from_text(&text), Some("2025-11-14".to_string()));
    }

    #[test]
    fn test_idempotent() {
        let samples = ["2025-11-14 与 11/15", "20251116 和 11172025", "1/2/3 不是日期"];
        for text in samples {
            let once = convert(text);
            assert_eq!(convert(&once), once, "not idempotent for {:?}", text);
        }
    }

    #[test]
    fn test_every_valid_day_of_a_year() {
        let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        while day.year() == 2024 {
            let compact = day.format("%Y%m%d").to_string();
            let expected = format!("{}年{}月{}日", day.year(), day.month(), day.day());
            assert_eq!(convert(&compact), expected);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_extract_iso_and_us() {
        assert_eq!(extract_date_from_text("灵修 2025-1-5"), Some("2025-01-05".to_string()));
        assert_eq!(extract_date_from_text("11/14/2025 早晨"), Some("2025-11-14".to_string()));
    }

    #[test]
    fn test_extract_rewritten_and_compact() {
        assert_eq!(extract_date_from_text("2025年11月14日 周五"), Some("2025-11-14".to_string()));
        assert_eq!(extract_date_from_text("VOTD 20251114"), Some("2025-11-14".to_string()));
        assert_eq!(extract_date_from_text("11142025"), Some("2025-11-14".to_string()));
    }

    #[test]
    fn test_extract_skips_invalid() {
        assert_eq!(extract_date_from_text("2025-13-40 然后 2025-02-03"), Some("2025-02-03".to_string()));
        assert_eq!(extract_date_from_text("没有日期 11/14"), None);
        assert_eq!(extract_date_from_text(""), None);
    }
}
