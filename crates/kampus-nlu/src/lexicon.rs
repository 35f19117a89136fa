//! Static vocabularies: day names, time phrases, clock patterns, intent
//! keywords and stopwords.
//!
//! Matching works on normalized tokens (see [`tokenize`]). Multi-word
//! entries are matched longest-first at a token position by [`PhraseTable`].
//! There is no fuzzy matching: text that is not in a table yields nothing.

use std::collections::HashSet;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Weekday,
};
use kampus_core::{Intent, TimeRange};
use regex::{Captures, Regex};

const CLOCK_PATTERN: &str = r"^(\d{1,2})(?:[:.](\d{2}))?$";
const CLOCK_SPAN_PATTERN: &str = r"^(\d{1,2})(?:[:.](\d{2}))?-(\d{1,2})(?:[:.](\d{2}))?$";

const CLOCK_PREFIXES: &[&str] = &["jam", "pukul", "pkl", "at"];
const CLOCK_JOINERS: &[&str] = &["-", "sampai", "sampe", "hingga", "s/d", "sd", "to", "until"];

/// Localized day names, Monday first.
const DAY_LABELS: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];

pub(crate) const DAY_NAMES: &[(&str, Weekday)] = &[
    ("senin", Weekday::Mon),
    ("monday", Weekday::Mon),
    ("mon", Weekday::Mon),
    ("selasa", Weekday::Tue),
    ("tuesday", Weekday::Tue),
    ("tue", Weekday::Tue),
    ("tues", Weekday::Tue),
    ("rabu", Weekday::Wed),
    ("wednesday", Weekday::Wed),
    ("wed", Weekday::Wed),
    ("kamis", Weekday::Thu),
    ("thursday", Weekday::Thu),
    ("thu", Weekday::Thu),
    ("thur", Weekday::Thu),
    ("thurs", Weekday::Thu),
    ("jumat", Weekday::Fri),
    ("friday", Weekday::Fri),
    ("fri", Weekday::Fri),
    ("sabtu", Weekday::Sat),
    ("saturday", Weekday::Sat),
    ("sat", Weekday::Sat),
    ("minggu", Weekday::Sun),
    ("ahad", Weekday::Sun),
    ("sunday", Weekday::Sun),
    ("sun", Weekday::Sun),
];

pub(crate) const RELATIVE_DAYS: &[(&str, i64)] = &[
    ("hari ini", 0),
    ("today", 0),
    ("besok", 1),
    ("esok", 1),
    ("tomorrow", 1),
    ("lusa", 2),
    ("kemarin", -1),
    ("yesterday", -1),
];

const PARTS_OF_DAY: &[(&str, DayPart)] = &[
    ("pagi", DayPart::Morning),
    ("morning", DayPart::Morning),
    ("siang", DayPart::Afternoon),
    ("afternoon", DayPart::Afternoon),
    ("sore", DayPart::Evening),
    ("evening", DayPart::Evening),
    ("malam", DayPart::Night),
    ("night", DayPart::Night),
];

/// Parts of day pinned to a specific day: (phrase, day offset, part).
const ANCHORED_PARTS: &[(&str, i64, DayPart)] = &[
    ("pagi ini", 0, DayPart::Morning),
    ("tadi pagi", 0, DayPart::Morning),
    ("this morning", 0, DayPart::Morning),
    ("siang ini", 0, DayPart::Afternoon),
    ("tadi siang", 0, DayPart::Afternoon),
    ("nanti siang", 0, DayPart::Afternoon),
    ("this afternoon", 0, DayPart::Afternoon),
    ("sore ini", 0, DayPart::Evening),
    ("tadi sore", 0, DayPart::Evening),
    ("nanti sore", 0, DayPart::Evening),
    ("this evening", 0, DayPart::Evening),
    ("malam ini", 0, DayPart::Night),
    ("nanti malam", 0, DayPart::Night),
    ("tonight", 0, DayPart::Night),
    ("tadi malam", -1, DayPart::Night),
    ("semalam", -1, DayPart::Night),
    ("last night", -1, DayPart::Night),
];

const WEEKS: &[(&str, i64)] = &[
    ("minggu ini", 0),
    ("pekan ini", 0),
    ("this week", 0),
    ("minggu depan", 1),
    ("pekan depan", 1),
    ("next week", 1),
    ("minggu lalu", -1),
    ("minggu kemarin", -1),
    ("pekan lalu", -1),
    ("last week", -1),
];

const MONTHS: &[(&str, i32)] = &[
    ("bulan ini", 0),
    ("this month", 0),
    ("bulan depan", 1),
    ("next month", 1),
    ("bulan lalu", -1),
    ("last month", -1),
];

const NOW: &[&str] = &["sekarang", "saat ini", "now", "right now"];

/// Intent keyword rules in evaluation order. Small talk comes before the
/// domain lookups, and among lookups the more specific nouns come first
/// ("nilai tugas" is a grade question, "jadwal asisten" an assistant one).
/// Small-talk phrases must not occur inside a lookup question ("asisten saya
/// siapa" asks for an assistant).
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::AboutCreator,
        &[
            "pembuat",
            "pembuatmu",
            "pencipta",
            "penciptamu",
            "yang buat",
            "yang bikin",
            "yang membuat",
            "dibuat oleh",
            "dibikin siapa",
            "creator",
            "developer",
            "who made you",
            "who created you",
        ],
    ),
    (
        Intent::AboutBot,
        &[
            "siapa kamu",
            "kamu siapa",
            "kamu itu apa",
            "kamu apa",
            "nama kamu",
            "namamu",
            "tentang kamu",
            "kenalan dong",
            "who are you",
            "what are you",
        ],
    ),
    (
        Intent::AboutStudent,
        &[
            "siapa saya",
            "siapa aku",
            "siapa sih saya",
            "siapa sih aku",
            "saya ini siapa",
            "aku ini siapa",
            "nama saya",
            "namaku",
            "tentang saya",
            "tentang aku",
            "kenal aku",
            "kenal saya",
            "who am i",
        ],
    ),
    (
        Intent::Kidding,
        &[
            "wkwk",
            "wkwkwk",
            "wkwkwkwk",
            "haha",
            "hahaha",
            "hehe",
            "hehehe",
            "hihi",
            "lol",
            "canda",
            "bercanda",
            "becanda",
            "lucu",
            "just kidding",
        ],
    ),
    (
        Intent::Greeting,
        &[
            "halo",
            "hallo",
            "hello",
            "helo",
            "hai",
            "hei",
            "hey",
            "hi",
            "permisi",
            "apa kabar",
            "apa kabarnya",
            "gimana kabar",
            "gimana kabarnya",
            "bagaimana kabar",
            "assalamualaikum",
            "selamat pagi",
            "selamat siang",
            "selamat sore",
            "selamat malam",
            "good morning",
            "good afternoon",
            "good evening",
        ],
    ),
    (
        Intent::AssistantLookup,
        &[
            "asisten",
            "asistennya",
            "asdos",
            "aslab",
            "assistant",
            "assistants",
        ],
    ),
    (
        Intent::GradeLookup,
        &[
            "nilai",
            "nilaiku",
            "nilainya",
            "skor",
            "score",
            "grade",
            "grades",
        ],
    ),
    (
        Intent::AssignmentLookup,
        &[
            "tugas",
            "tugasku",
            "tugasnya",
            "pr",
            "deadline",
            "assignment",
            "assignments",
            "homework",
        ],
    ),
    (
        Intent::CourseInformation,
        &[
            "info",
            "informasi",
            "pengumuman",
            "berita",
            "kabar",
            "announcement",
            "announcements",
            "information",
        ],
    ),
    (
        Intent::ScheduleLookup,
        &[
            "jadwal",
            "jadwalku",
            "jadwalnya",
            "kuliah",
            "schedule",
            "timetable",
            "class",
            "classes",
        ],
    ),
];

const STOPWORDS: &[&str] = &[
    "a", "about", "ada", "aja", "aku", "an", "and", "apa", "apakah", "are", "atau", "bang",
    "belum", "berapa", "bisa", "bro", "by", "cari", "cek", "dan", "dari", "deh", "dengan", "di",
    "dong", "for", "gimana", "gua", "gue", "hari", "in", "ingin", "is", "itu", "jam", "kak",
    "kapan", "kasih", "kelas", "ke", "ku", "lagi", "liat", "lihat", "mana", "mata", "matkul",
    "mau", "me", "minta", "mohon", "mu", "my", "nya", "of", "on", "pada", "pengen", "please",
    "pukul", "punya", "saja", "sama", "saya", "semua", "show", "sih", "siapa", "sudah", "tahu",
    "tau", "tell", "tentang", "the", "this", "to", "tolong", "udah", "untuk", "what", "when",
    "where", "with", "yang",
];

/// Split text into lowercase tokens.
///
/// Apostrophes are dropped (`jum'at` → `jumat`); `:`, `.` and `-` survive
/// inside tokens so clock expressions stay whole; `/` only survives in
/// `s/d`. Trailing punctuation is trimmed and a lone `-` is kept as a joiner.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}' | '`'))
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ':' | '.' | '-' | '/') {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens = Vec::new();
    for raw in cleaned.split_whitespace() {
        if raw == "-" || raw == "s/d" {
            tokens.push(raw.to_string());
            continue;
        }
        for piece in raw.split('/') {
            let piece = piece.trim_matches(|c| matches!(c, ':' | '.' | '-'));
            if !piece.is_empty() {
                tokens.push(piece.to_string());
            }
        }
    }
    tokens
}

/// Longest-match lookup of (possibly multi-word) phrases over a token stream.
#[derive(Debug, Clone)]
pub struct PhraseTable<T> {
    entries: Vec<(Vec<String>, T)>,
}

impl<T> Default for PhraseTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> PhraseTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phrase. Phrases that normalize to no tokens are ignored.
    pub fn insert(&mut self, phrase: &str, value: T) {
        let words = tokenize(phrase);
        if !words.is_empty() {
            self.entries.push((words, value));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The longest entry starting at `at`, with its length in tokens.
    pub fn match_at<S: AsRef<str>>(&self, tokens: &[S], at: usize) -> Option<(usize, &T)> {
        let mut best: Option<(usize, &T)> = None;
        for (words, value) in &self.entries {
            let len = words.len();
            if at + len > tokens.len() || best.is_some_and(|(l, _)| l >= len) {
                continue;
            }
            if words
                .iter()
                .zip(&tokens[at..at + len])
                .all(|(w, t)| w == t.as_ref())
            {
                best = Some((len, value));
            }
        }
        best
    }

    /// Whether any entry occurs anywhere in the token stream.
    pub fn occurs_in<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        (0..tokens.len()).any(|at| self.match_at(tokens, at).is_some())
    }

    /// Every word used by any entry.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(words, _)| words.iter().map(String::as_str))
    }
}

impl<'a, T> FromIterator<(&'a str, T)> for PhraseTable<T> {
    fn from_iter<I: IntoIterator<Item = (&'a str, T)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (phrase, value) in iter {
            table.insert(phrase, value);
        }
        table
    }
}

/// A day mention: a named weekday or a day relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTerm {
    Named(Weekday),
    Relative(i64),
}

impl DayTerm {
    pub fn resolve(&self, today: NaiveDate) -> Option<Weekday> {
        match *self {
            Self::Named(day) => Some(day),
            Self::Relative(offset) => shift(today, offset).map(|d| d.weekday()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPart {
    /// `[start, end)` in minutes since midnight.
    pub fn bounds(&self) -> (u32, u32) {
        match self {
            Self::Morning => (5 * 60, 11 * 60),
            Self::Afternoon => (11 * 60, 15 * 60),
            Self::Evening => (15 * 60, 18 * 60),
            Self::Night => (18 * 60, 24 * 60),
        }
    }
}

/// A relative time phrase, resolved against the evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTerm {
    /// From now until the end of today.
    Now,
    /// A whole day, offset from today.
    Day(i64),
    /// Part of a day. Bare "pagi" names a time of day only; "pagi ini" or
    /// "besok pagi" also name the day.
    PartOfDay {
        offset: i64,
        part: DayPart,
        names_day: bool,
    },
    /// A Monday-based calendar week, offset from this week.
    Week(i64),
    /// A calendar month, offset from this month.
    Month(i32),
}

impl TimeTerm {
    pub fn resolve(&self, now: DateTime<FixedOffset>) -> Option<TimeRange> {
        let tz = *now.offset();
        let today = now.date_naive();
        match *self {
            Self::Now => {
                let end = local_at(today.succ_opt()?, 0, tz)?;
                Some(TimeRange::relative(now, end))
            }
            Self::Day(offset) => {
                let date = shift(today, offset)?;
                Some(TimeRange::relative(
                    local_at(date, 0, tz)?,
                    local_at(date.succ_opt()?, 0, tz)?,
                ))
            }
            Self::PartOfDay {
                offset,
                part,
                names_day,
            } => {
                let date = shift(today, offset)?;
                let (from, to) = part.bounds();
                let start = local_at(date, from, tz)?;
                let end = local_at(date, to, tz)?;
                Some(if names_day {
                    TimeRange::relative(start, end)
                } else {
                    TimeRange::clock(start, end)
                })
            }
            Self::Week(offset) => {
                let back = i64::from(today.weekday().num_days_from_monday());
                let monday = shift(today, offset * 7 - back)?;
                Some(TimeRange::relative(
                    local_at(monday, 0, tz)?,
                    local_at(shift(monday, 7)?, 0, tz)?,
                ))
            }
            Self::Month(offset) => {
                let first = today.with_day(1)?;
                let start = if offset >= 0 {
                    first.checked_add_months(Months::new(offset.unsigned_abs()))?
                } else {
                    first.checked_sub_months(Months::new(offset.unsigned_abs()))?
                };
                let end = start.checked_add_months(Months::new(1))?;
                Some(TimeRange::relative(
                    local_at(start, 0, tz)?,
                    local_at(end, 0, tz)?,
                ))
            }
        }
    }

    /// Week and month phrases contain words that double as day names
    /// ("minggu" is also Sunday); those words must not count as days.
    pub fn masks_day_names(&self) -> bool {
        matches!(self, Self::Week(_) | Self::Month(_))
    }
}

/// A recognized time phrase or clock expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    /// Tokens consumed.
    pub len: usize,
    pub range: TimeRange,
    pub masks_day_names: bool,
}

/// The lookup tables used for extraction and routing.
#[derive(Debug, Clone)]
pub struct Lexicon {
    days: PhraseTable<DayTerm>,
    times: PhraseTable<TimeTerm>,
    intents: Vec<(Intent, PhraseTable<()>)>,
    keyword_tokens: HashSet<String>,
    stopwords: HashSet<String>,
    clock: Regex,
    clock_span: Regex,
}

impl Lexicon {
    /// The Indonesian campus vocabulary, with common English equivalents.
    pub fn indonesian() -> Self {
        let mut days = PhraseTable::new();
        for &(name, day) in DAY_NAMES {
            days.insert(name, DayTerm::Named(day));
        }
        for &(phrase, offset) in RELATIVE_DAYS {
            days.insert(phrase, DayTerm::Relative(offset));
        }

        let mut times = PhraseTable::new();
        for &phrase in NOW {
            times.insert(phrase, TimeTerm::Now);
        }
        for &(phrase, offset) in RELATIVE_DAYS {
            times.insert(phrase, TimeTerm::Day(offset));
        }
        for &(phrase, part) in PARTS_OF_DAY {
            times.insert(
                phrase,
                TimeTerm::PartOfDay {
                    offset: 0,
                    part,
                    names_day: false,
                },
            );
        }
        for &(phrase, offset, part) in ANCHORED_PARTS {
            times.insert(
                phrase,
                TimeTerm::PartOfDay {
                    offset,
                    part,
                    names_day: true,
                },
            );
        }
        for &(phrase, offset) in WEEKS {
            times.insert(phrase, TimeTerm::Week(offset));
        }
        for &(phrase, offset) in MONTHS {
            times.insert(phrase, TimeTerm::Month(offset));
        }

        let rules = INTENT_KEYWORDS
            .iter()
            .map(|(intent, words)| (*intent, words.iter().map(|w| (*w, ())).collect()))
            .collect();

        Self::from_parts(days, times, rules, STOPWORDS.iter().copied())
    }

    /// Assemble a lexicon from explicit tables.
    pub fn from_parts<'a>(
        days: PhraseTable<DayTerm>,
        times: PhraseTable<TimeTerm>,
        intents: Vec<(Intent, PhraseTable<()>)>,
        stopwords: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let keyword_tokens = intents
            .iter()
            .flat_map(|(_, table)| table.words().map(str::to_string))
            .collect();
        Self {
            days,
            times,
            intents,
            keyword_tokens,
            stopwords: stopwords.into_iter().map(str::to_string).collect(),
            clock: Regex::new(CLOCK_PATTERN).expect("clock pattern is valid"),
            clock_span: Regex::new(CLOCK_SPAN_PATTERN).expect("clock span pattern is valid"),
        }
    }

    /// Localized name of a weekday, e.g. "Senin".
    pub fn day_label(day: Weekday) -> &'static str {
        DAY_LABELS[day.num_days_from_monday() as usize]
    }

    /// Intent rules in evaluation order.
    pub fn intent_rules(&self) -> &[(Intent, PhraseTable<()>)] {
        &self.intents
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Whether the token belongs to some intent keyword.
    pub fn is_keyword(&self, token: &str) -> bool {
        self.keyword_tokens.contains(token)
    }

    pub fn day_at<S: AsRef<str>>(&self, tokens: &[S], at: usize) -> Option<(usize, DayTerm)> {
        self.days.match_at(tokens, at).map(|(len, term)| (len, *term))
    }

    /// Recognize a time phrase or clock expression starting at `at`.
    ///
    /// A relative day followed by a part of day or a clock expression
    /// narrows to that part of that day ("besok pagi", "besok jam 8").
    pub fn time_at<S: AsRef<str>>(
        &self,
        tokens: &[S],
        at: usize,
        now: DateTime<FixedOffset>,
    ) -> Option<TimeMatch> {
        if let Some((len, term)) = self.times.match_at(tokens, at) {
            if let TimeTerm::Day(offset) = *term
                && let Some(narrowed) = self.narrow_day(tokens, at + len, offset, now)
            {
                return Some(TimeMatch {
                    len: len + narrowed.len,
                    ..narrowed
                });
            }
            let range = term.resolve(now)?;
            return Some(TimeMatch {
                len,
                range,
                masks_day_names: term.masks_day_names(),
            });
        }

        let (len, start, end) = self.clock_at(tokens, at)?;
        let today = now.date_naive();
        let tz = *now.offset();
        Some(TimeMatch {
            len,
            range: TimeRange::clock(local_at(today, start, tz)?, local_at(today, end, tz)?),
            masks_day_names: false,
        })
    }

    fn narrow_day<S: AsRef<str>>(
        &self,
        tokens: &[S],
        at: usize,
        offset: i64,
        now: DateTime<FixedOffset>,
    ) -> Option<TimeMatch> {
        if let Some((len, TimeTerm::PartOfDay { part, .. })) = self.times.match_at(tokens, at) {
            let term = TimeTerm::PartOfDay {
                offset,
                part: *part,
                names_day: true,
            };
            return Some(TimeMatch {
                len,
                range: term.resolve(now)?,
                masks_day_names: false,
            });
        }

        let (len, start, end) = self.clock_at(tokens, at)?;
        let date = shift(now.date_naive(), offset)?;
        let tz = *now.offset();
        Some(TimeMatch {
            len,
            range: TimeRange::relative(local_at(date, start, tz)?, local_at(date, end, tz)?),
            masks_day_names: false,
        })
    }

    /// Parse a clock expression at `at`: `(tokens consumed, start, end)` in
    /// minutes since midnight.
    ///
    /// Bare hours need a prefix ("jam 8"); `H:MM` and `H.MM` stand alone.
    /// A single time covers the hour that starts there.
    fn clock_at<S: AsRef<str>>(&self, tokens: &[S], at: usize) -> Option<(usize, u32, u32)> {
        let is_prefix = |i: usize| {
            tokens
                .get(i)
                .is_some_and(|t| CLOCK_PREFIXES.contains(&t.as_ref()))
        };

        let mut i = at;
        let prefixed = is_prefix(i);
        if prefixed {
            i += 1;
        }
        let token = tokens.get(i)?.as_ref();

        if let Some(caps) = self.clock_span.captures(token) {
            let start = clock_minutes(&caps, 1, 2)?;
            let end = clock_minutes(&caps, 3, 4)?;
            let explicit = caps.get(2).is_some() && caps.get(4).is_some();
            if !(prefixed || explicit) || end <= start {
                return None;
            }
            return Some((i + 1 - at, start, end));
        }

        let caps = self.clock.captures(token)?;
        if !prefixed && caps.get(2).is_none() {
            return None;
        }
        let start = clock_minutes(&caps, 1, 2)?;
        i += 1;

        if tokens
            .get(i)
            .is_some_and(|t| CLOCK_JOINERS.contains(&t.as_ref()))
        {
            let mut j = i + 1;
            if is_prefix(j) {
                j += 1;
            }
            let end = tokens
                .get(j)
                .and_then(|t| self.clock.captures(t.as_ref()))
                .and_then(|c| clock_minutes(&c, 1, 2));
            if let Some(end) = end
                && end > start
            {
                return Some((j + 1 - at, start, end));
            }
        }

        Some((i - at, start, (start + 60).min(24 * 60)))
    }
}

fn clock_minutes(caps: &Captures<'_>, hour_group: usize, minute_group: usize) -> Option<u32> {
    let hour: u32 = caps.get(hour_group)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(minute_group) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    (hour < 24 && minute < 60).then_some(hour * 60 + minute)
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

/// Local instant `minute` minutes after midnight of `date`.
fn local_at(date: NaiveDate, minute: u32, tz: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = date.and_time(NaiveTime::MIN) + Duration::minutes(i64::from(minute));
    naive.and_local_timezone(tz).single()
}
