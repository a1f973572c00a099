use chrono::{
    DateTime, Datelike, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone,
};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};

static MERIDIEM_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:[:.](\d{2}))?\s*(am|pm)\b").expect("valid time regex"));
static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid clock regex"));

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// `content` of the first element in the document matching `selector`.
pub fn document_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(clean_text)
        .filter(|value| !value.is_empty())
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href);
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(&href).ok().map(|u| u.to_string())
}

/// Stable identifier for an event: survives refetches as long as the source
/// keeps the same title and start.
pub fn entity_id(
    source: &str,
    group_id: &str,
    title: &str,
    start: Option<&DateTime<FixedOffset>>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(group_id.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    if let Some(start) = start {
        hasher.update(start.to_rfc3339().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Parses a listing line such as `Thursday 22 October 2026, 6:30pm` in `tz`.
/// Falls back to `default_time` when the line carries no time.
pub fn parse_datetime(text: &str, default_time: NaiveTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return None;
    }
    let date_part = cleaned.split([',', '@']).next().unwrap_or(&cleaned).trim();
    let date = parse_naive_date(date_part).or_else(|| parse_naive_date(&cleaned))?;
    let time = parse_naive_time(&cleaned).unwrap_or(default_time);
    to_timezone_datetime(date, time, tz)
}

pub fn parse_naive_time(text: &str) -> Option<NaiveTime> {
    if let Some(caps) = MERIDIEM_TIME_RE.captures(text) {
        let hour = caps.get(1)?.as_str().parse::<u32>().ok()?;
        let minute = caps
            .get(2)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0);
        let pm = caps.get(3)?.as_str().eq_ignore_ascii_case("pm");
        let hour = match (hour % 12, pm) {
            (h, true) => h + 12,
            (h, false) => h,
        };
        return NaiveTime::from_hms_opt(hour, minute, 0);
    }
    let caps = CLOCK_TIME_RE.captures(text)?;
    let hour = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let minute = caps.get(2)?.as_str().parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn parse_naive_date(input: &str) -> Option<NaiveDate> {
    let formats = [
        ("%A %d %B %Y", true),
        ("%a %d %b %Y", true),
        ("%d %B %Y", true),
        ("%d %b %Y", true),
        ("%B %d %Y", true),
        ("%d/%m/%Y", true),
        ("%Y-%m-%d", true),
        ("%A %d %B", false),
        ("%a %d %b", false),
        ("%d %B", false),
        ("%d %b", false),
    ];

    for (fmt, has_year) in formats.iter() {
        if *has_year {
            if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
                return Some(date);
            }
            continue;
        }
        // chrono refuses dates without a year, so borrow the current one and
        // roll forward when the listing is already behind us.
        let current_year = Local::now().year();
        let with_year = format!("{input} {current_year}");
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, &format!("{fmt} %Y")) {
            let today = Local::now().date_naive();
            if date < today {
                return date.with_year(current_year + 1);
            }
            return Some(date);
        }
    }

    None
}

fn to_timezone_datetime(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::new(date, time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.fixed_offset()),
        LocalResult::Ambiguous(dt, _) => Some(dt.fixed_offset()),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const LONDON: Tz = chrono_tz::Europe::London;

    fn evening() -> NaiveTime {
        NaiveTime::from_hms_opt(18, 0, 0).expect("valid time")
    }

    #[test]
    fn parses_listing_lines() {
        let start = parse_datetime("Thursday 22 October 2026, 6:30pm", evening(), LONDON)
            .expect("parse listing");
        assert_eq!(start.to_rfc3339(), "2026-10-22T18:30:00+01:00");

        let start = parse_datetime("Thu 5 Nov 2026 @ 19:00", evening(), LONDON)
            .expect("parse short listing");
        assert_eq!(start.to_rfc3339(), "2026-11-05T19:00:00+00:00");
    }

    #[test]
    fn missing_time_uses_default() {
        let start = parse_datetime("22/10/2026", evening(), LONDON).expect("parse date");
        assert_eq!(start.hour(), 18);
        assert_eq!(start.minute(), 0);
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert!(parse_datetime("", evening(), LONDON).is_none());
        assert!(parse_datetime("sometime soon", evening(), LONDON).is_none());
    }

    #[test]
    fn meridiem_and_clock_times() {
        assert_eq!(parse_naive_time("Doors 7pm"), NaiveTime::from_hms_opt(19, 0, 0));
        assert_eq!(parse_naive_time("12:15 AM"), NaiveTime::from_hms_opt(0, 15, 0));
        assert_eq!(parse_naive_time("from 18:45"), NaiveTime::from_hms_opt(18, 45, 0));
        assert_eq!(parse_naive_time("no time here"), None);
    }

    #[test]
    fn absolute_urls() {
        assert_eq!(
            absolute_url("https://ti.to/nottsjs", Some("/nottsjs/october".into())).as_deref(),
            Some("https://ti.to/nottsjs/october")
        );
        assert_eq!(
            absolute_url("https://ti.to/", Some("https://example.com/x".into())).as_deref(),
            Some("https://example.com/x")
        );
        assert_eq!(absolute_url("https://ti.to/", None), None);
    }

    #[test]
    fn entity_ids_are_stable() {
        let start = DateTime::parse_from_rfc3339("2026-10-22T18:30:00+01:00").ok();
        let a = entity_id("meetups", "php-minds", "Demo Day", start.as_ref());
        let b = entity_id("meetups", "php-minds", "Demo Day", start.as_ref());
        let c = entity_id("meetups", "php-minds", "Demo Day", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
