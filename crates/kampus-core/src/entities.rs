//! Request input and the entities extracted from it.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Timelike, Utc, Weekday};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Opaque identity of the student sending a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub i64);

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One incoming chat message. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub text: String,
    pub requester: RequesterId,
    /// Name used by templates with a name slot; supplied by the session.
    pub display_name: Option<String>,
}

impl RawMessage {
    pub fn new(text: impl Into<String>, requester: RequesterId) -> Self {
        Self {
            text: text.into(),
            requester,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Half-open window `[start, end)` in campus-local time.
///
/// Ranges built from relative phrases ("besok", "minggu ini") imply the
/// weekdays they cover; ranges built from bare clock expressions do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    implies_days: bool,
}

impl TimeRange {
    /// A clock-anchored window that implies no weekday.
    pub fn clock(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self::build(start, end, false)
    }

    /// A window named by a relative phrase; its days count as mentioned.
    pub fn relative(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self::build(start, end, true)
    }

    fn build(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>, implies_days: bool) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self {
            start,
            end,
            implies_days,
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn implies_days(&self) -> bool {
        self.implies_days
    }

    /// Minutes since local midnight of the start instant.
    pub fn start_minute_of_day(&self) -> u32 {
        self.start.time().num_seconds_from_midnight() / 60
    }

    /// Minutes from the start day's local midnight to the end, capped at 1440.
    pub fn end_minute_of_day(&self) -> u32 {
        let midnight = self.start.date_naive().and_time(NaiveTime::MIN);
        let minutes = (self.end.naive_local() - midnight).num_minutes();
        minutes.clamp(0, 24 * 60) as u32
    }

    /// Whether the instant falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.with_timezone(&Utc) <= instant && instant < self.end.with_timezone(&Utc)
    }

    /// Weekdays covered by a relative window, in calendar order from the start.
    pub fn implied_days(&self) -> Vec<Weekday> {
        if !self.implies_days {
            return Vec::new();
        }
        let first = self.start.date_naive();
        let last = if self.end > self.start {
            (self.end - Duration::nanoseconds(1)).date_naive()
        } else {
            first
        };

        let mut days = Vec::new();
        let mut date = first;
        while date <= last && days.len() < 7 {
            days.push(date.weekday());
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        days
    }
}

/// Lowercased course names the requester is enrolled in or assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseCatalogue {
    names: Vec<String>,
}

impl CourseCatalogue {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let lower = name.as_ref().trim().to_lowercase();
            if !lower.is_empty() && !out.contains(&lower) {
                out.push(lower);
            }
        }
        Self { names: out }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether any course name contains the (lowercase) fragment.
    pub fn contains_fragment(&self, fragment: &str) -> bool {
        self.names.iter().any(|name| name.contains(fragment))
    }
}

/// Course-name restriction compiled from extracted fragments.
///
/// Only constructible from at least one non-empty fragment; absence of a
/// filter means "no course restriction".
#[derive(Debug, Clone)]
pub struct CourseFilter {
    pattern: String,
    regex: Regex,
}

impl CourseFilter {
    /// Join fragments into a case-insensitive alternation.
    ///
    /// Fragments are regex-escaped so course names such as "C++" match literally.
    pub fn from_fragments<S: AsRef<str>>(fragments: &[S]) -> Option<Self> {
        let parts: Vec<String> = fragments
            .iter()
            .map(|f| f.as_ref().trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .map(|f| regex::escape(&f))
            .collect();
        if parts.is_empty() {
            return None;
        }
        let pattern = parts.join("|");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .ok()?;
        Some(Self { pattern, regex })
    }

    /// The alternation pattern, e.g. `matematika|fisika`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, course_name: &str) -> bool {
        self.regex.is_match(course_name)
    }
}

impl PartialEq for CourseFilter {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Entities pulled out of one message. Lives for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntities {
    /// Explicit days in order of mention, then days implied by `time_range`.
    /// May contain repeats.
    pub days: Vec<Weekday>,
    pub time_range: Option<TimeRange>,
    /// Lowercase course-name substrings, in order found.
    pub course_fragments: Vec<String>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.time_range.is_none() && self.course_fragments.is_empty()
    }

    /// Days with repeats removed, first mention kept.
    pub fn distinct_days(&self) -> Vec<Weekday> {
        let mut out = Vec::with_capacity(self.days.len());
        for day in &self.days {
            if !out.contains(day) {
                out.push(*day);
            }
        }
        out
    }

    /// Distinct days named in the text, without those implied by `time_range`.
    pub fn explicit_days(&self) -> Vec<Weekday> {
        let implied = self.time_range.as_ref().map_or(0, |r| r.implied_days().len());
        let named = &self.days[..self.days.len().saturating_sub(implied)];
        let mut out = Vec::with_capacity(named.len());
        for day in named {
            if !out.contains(day) {
                out.push(*day);
            }
        }
        out
    }

    pub fn course_filter(&self) -> Option<CourseFilter> {
        CourseFilter::from_fragments(&self.course_fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        wib().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn minute_of_day_accessors() {
        let range = TimeRange::clock(at(2024, 3, 4, 8, 0), at(2024, 3, 4, 10, 30));
        assert_eq!(range.start_minute_of_day(), 480);
        assert_eq!(range.end_minute_of_day(), 630);
    }

    #[test]
    fn whole_day_ends_at_1440() {
        let range = TimeRange::relative(at(2024, 3, 4, 0, 0), at(2024, 3, 5, 0, 0));
        assert_eq!(range.start_minute_of_day(), 0);
        assert_eq!(range.end_minute_of_day(), 1440);
        assert_eq!(range.implied_days(), vec![Weekday::Mon]);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let range = TimeRange::clock(at(2024, 3, 4, 10, 0), at(2024, 3, 4, 8, 0));
        assert_eq!(range.start(), at(2024, 3, 4, 8, 0));
    }

    #[test]
    fn clock_range_implies_no_day() {
        let range = TimeRange::clock(at(2024, 3, 4, 8, 0), at(2024, 3, 4, 9, 0));
        assert!(range.implied_days().is_empty());
    }

    #[test]
    fn week_implies_seven_days() {
        let range = TimeRange::relative(at(2024, 3, 4, 0, 0), at(2024, 3, 11, 0, 0));
        let days = range.implied_days();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], Weekday::Mon);
        assert_eq!(days[6], Weekday::Sun);
    }

    #[test]
    fn contains_is_half_open_across_offsets() {
        let range = TimeRange::relative(at(2024, 3, 4, 0, 0), at(2024, 3, 5, 0, 0));
        // 2024-03-03 17:00 UTC is local midnight in UTC+7.
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 3, 17, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 3, 4, 17, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 3, 3, 16, 59, 0).unwrap()));
    }

    #[test]
    fn explicit_days_drop_implied_tail() {
        let week = TimeRange::relative(at(2024, 3, 4, 0, 0), at(2024, 3, 11, 0, 0));
        let mut days = vec![Weekday::Fri];
        days.extend(week.implied_days());
        let entities = ExtractedEntities {
            days,
            time_range: Some(week),
            course_fragments: Vec::new(),
        };
        assert_eq!(entities.explicit_days(), vec![Weekday::Fri]);
        assert_eq!(entities.distinct_days().len(), 7);

        let clock = ExtractedEntities {
            days: vec![Weekday::Mon, Weekday::Mon],
            time_range: Some(TimeRange::clock(at(2024, 3, 4, 8, 0), at(2024, 3, 4, 9, 0))),
            course_fragments: Vec::new(),
        };
        assert_eq!(clock.explicit_days(), vec![Weekday::Mon]);
    }

    #[test]
    fn course_filter_requires_fragments() {
        let empty: [&str; 0] = [];
        assert!(CourseFilter::from_fragments(&empty).is_none());
        assert!(CourseFilter::from_fragments(&["  "]).is_none());
    }

    #[test]
    fn course_filter_alternation() {
        let filter = CourseFilter::from_fragments(&["matematika", "fisika"]).unwrap();
        assert_eq!(filter.pattern(), "matematika|fisika");
        assert!(filter.matches("Matematika Dasar"));
        assert!(filter.matches("FISIKA II"));
        assert!(!filter.matches("Kimia"));
    }

    #[test]
    fn course_filter_escapes_metacharacters() {
        let filter = CourseFilter::from_fragments(&["c++"]).unwrap();
        assert!(filter.matches("Pemrograman C++"));
        assert!(!filter.matches("Pemrograman C"));
    }

    #[test]
    fn catalogue_lowercases_and_dedups() {
        let catalogue = CourseCatalogue::from_names(["Matematika Dasar", "matematika dasar", "Fisika"]);
        assert_eq!(catalogue.names().len(), 2);
        assert!(catalogue.contains_fragment("matem"));
        assert!(!catalogue.contains_fragment("kimia"));
    }

    #[test]
    fn distinct_days_keeps_first_mention() {
        let entities = ExtractedEntities {
            days: vec![Weekday::Wed, Weekday::Mon, Weekday::Wed],
            ..Default::default()
        };
        assert_eq!(entities.distinct_days(), vec![Weekday::Wed, Weekday::Mon]);
    }
}
