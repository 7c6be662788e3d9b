//! Date and date-range recognition.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{EndDate, PartialDate};

const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";
const YEAR: &str = r"(?:19|20)\d{2}";
const CURRENT: &str = r"present|current|now|ongoing|till date|to date";

fn date_pattern(name: &str) -> String {
    format!(
        r"(?P<{n}>{m}\s*,?\s*{y}|(?:0?[1-9]|1[0-2])/{y}|{y})",
        n = name,
        m = MONTH,
        y = YEAR
    )
}

static RANGE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)\b{start}\s*(?:(?:-|–|—|to|until)\s*(?:{end}|(?P<current>{cur}))|(?P<open>till date|to date))\b",
        start = date_pattern("start"),
        end = date_pattern("end"),
        cur = CURRENT
    );
    Regex::new(&pattern).unwrap()
});

static SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{}\b", date_pattern("date"))).unwrap());

static YEARS: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"\b({})\b", YEAR)).unwrap());

static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)^(?P<m>{})\s*,?\s*(?P<y>{})$", MONTH, YEAR)).unwrap()
});

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(?P<m>\d{{1,2}})/(?P<y>{})$", YEAR)).unwrap());

/// A date or date range found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSpan {
    pub start: PartialDate,
    pub end: Option<EndDate>,
    /// Byte range of the match in the searched text
    pub range: Range<usize>,
}

/// Find the first date range, or failing that the first single date.
pub fn find_span(text: &str) -> Option<DateSpan> {
    if let Some(caps) = RANGE.captures(text) {
        if let Some(span) = span_from_range(&caps) {
            return Some(span);
        }
    }
    let caps = SINGLE.captures(text)?;
    let m = caps.name("date")?;
    Some(DateSpan {
        start: parse_date(m.as_str())?,
        end: None,
        range: m.range(),
    })
}

fn span_from_range(caps: &Captures<'_>) -> Option<DateSpan> {
    let whole = caps.get(0)?;
    let start = parse_date(caps.name("start")?.as_str())?;
    let end = if caps.name("current").is_some() || caps.name("open").is_some() {
        EndDate::Current
    } else {
        EndDate::Date(parse_date(caps.name("end")?.as_str())?)
    };
    Some(DateSpan {
        start,
        end: Some(end),
        range: whole.range(),
    })
}

/// Whether the text contains any recognizable date.
pub fn contains_date(text: &str) -> bool {
    SINGLE.is_match(text)
}

/// Remove date ranges and dates, then tidy separators left dangling.
pub fn strip_dates(text: &str) -> String {
    let without = RANGE.replace_all(text, " ");
    let without = SINGLE.replace_all(&without, " ");
    let collapsed = without.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace("()", "")
        .trim_matches(|c: char| c.is_whitespace() || ",|•·–—-:()".contains(c))
        .to_string()
}

/// All four-digit years in the text.
pub fn years(text: &str) -> Vec<i32> {
    YEARS
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse().ok())
        .collect()
}

/// Parse `Month YYYY`, `MM/YYYY` or `YYYY`.
pub fn parse_date(text: &str) -> Option<PartialDate> {
    let text = text.trim();
    if let Some(caps) = MONTH_YEAR.captures(text) {
        let year = caps.name("y")?.as_str().parse().ok()?;
        let month = month_number(caps.name("m")?.as_str())?;
        return Some(PartialDate::month(year, month));
    }
    if let Some(caps) = NUMERIC.captures(text) {
        let year = caps.name("y")?.as_str().parse().ok()?;
        let month: u32 = caps.name("m")?.as_str().parse().ok()?;
        return (1..=12)
            .contains(&month)
            .then(|| PartialDate::month(year, month));
    }
    text.parse().ok().map(PartialDate::year)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
