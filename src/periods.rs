//! Chronological ordering of free-form month labels such as `"2025 Ocak"`,
//! `"Şubat 2025"` or `"2025 OCAK"`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::filters::turkish_lowercase;
use crate::schema::OrderRecord;

/// Turkish month names, January first. Matched as substrings in list order.
pub const MONTH_NAMES: [&str; 12] = [
    "ocak", "şubat", "mart", "nisan", "mayıs", "haziran", "temmuz", "ağustos", "eylül", "ekim",
    "kasım", "aralık",
];

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]{4}").unwrap());

/// Month index (0-11) and year recovered from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedPeriod {
    pub month_index: Option<usize>,
    pub year: i32,
}

pub fn parse_period_label(label: &str) -> ParsedPeriod {
    let lowered = turkish_lowercase(label);
    let month_index = MONTH_NAMES.iter().position(|name| lowered.contains(name));

    let year = YEAR_PATTERN
        .find(label)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0);

    ParsedPeriod { month_index, year }
}

/// Orders by (year, month) when both labels name a known month, otherwise
/// falls back to plain lexicographic order of the labels.
///
/// Mixing labels that resolve with labels that don't can break transitivity,
/// so sorts over such sets are stable but not guaranteed to be chronological.
pub fn compare_periods(a: &str, b: &str) -> Ordering {
    let pa = parse_period_label(a);
    let pb = parse_period_label(b);

    match (pa.month_index, pb.month_index) {
        (Some(ma), Some(mb)) => pa.year.cmp(&pb.year).then(ma.cmp(&mb)),
        _ => a.cmp(b),
    }
}

pub fn sort_periods(periods: &mut [String]) {
    periods.sort_by(|a, b| compare_periods(a, b));
}

/// Every non-empty period label present in `records`, chronologically sorted.
pub fn distinct_periods<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let unique: BTreeSet<&str> = records
        .into_iter()
        .map(|r| r.period.as_str())
        .filter(|p| !p.is_empty())
        .collect();

    let mut periods: Vec<String> = unique.into_iter().map(str::to_string).collect();
    sort_periods(&mut periods);
    periods
}

/// Every non-empty platform present in `records`, lexicographically sorted.
pub fn distinct_platforms<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let unique: BTreeSet<&str> = records
        .into_iter()
        .map(|r| r.platform.as_str())
        .filter(|p| !p.is_empty())
        .collect();

    unique.into_iter().map(str::to_string).collect()
}

/// The pair of months preselected on the comparison screen: the two most
/// recent periods (older first), or the only period twice.
pub fn default_comparison_pair(sorted_periods: &[String]) -> Option<(String, String)> {
    match sorted_periods {
        [] => None,
        [only] => Some((only.clone(), only.clone())),
        [.., previous, latest] => Some((previous.clone(), latest.clone())),
    }
}
