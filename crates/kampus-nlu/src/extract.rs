//! Entity extraction: days, a time range and course-name fragments.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use kampus_core::{CourseCatalogue, ExtractedEntities};
use tracing::debug;

use crate::lexicon::{Lexicon, tokenize};

const MIN_FRAGMENT_CHARS: usize = 3;

/// Pulls entities out of message text using a shared [`Lexicon`].
#[derive(Debug, Clone)]
pub struct Extractor {
    lexicon: Arc<Lexicon>,
}

impl Extractor {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Extract entities from `text`, resolving relative terms against `now`.
    ///
    /// Three passes over the token stream:
    /// 1. time phrases and clock expressions (the first one sets the range),
    /// 2. day terms, skipping tokens that belong to week or month phrases,
    /// 3. course fragments from whatever is left.
    ///
    /// Days implied by the range are appended after the explicit days.
    pub fn extract(
        &self,
        text: &str,
        catalogue: &CourseCatalogue,
        now: DateTime<FixedOffset>,
    ) -> ExtractedEntities {
        let tokens = tokenize(text);
        let mut consumed = vec![false; tokens.len()];
        let mut masked = vec![false; tokens.len()];
        let mut entities = ExtractedEntities::default();

        let mut i = 0;
        while i < tokens.len() {
            let Some(found) = self.lexicon.time_at(&tokens, i, now) else {
                i += 1;
                continue;
            };
            let span = i..i + found.len;
            consumed[span.clone()].fill(true);
            if found.masks_day_names {
                masked[span].fill(true);
            }
            if entities.time_range.is_none() {
                entities.time_range = Some(found.range);
            }
            i += found.len.max(1);
        }

        let today = now.date_naive();
        let mut i = 0;
        while i < tokens.len() {
            match self.lexicon.day_at(&tokens, i) {
                Some((len, term)) if !masked[i..i + len].contains(&true) => {
                    consumed[i..i + len].fill(true);
                    if let Some(day) = term.resolve(today)
                        && !entities.days.contains(&day)
                    {
                        entities.days.push(day);
                    }
                    i += len;
                }
                _ => i += 1,
            }
        }
        if let Some(range) = &entities.time_range {
            entities.days.extend(range.implied_days());
        }

        for (token, used) in tokens.iter().zip(&consumed) {
            if *used || !self.is_fragment_candidate(token) {
                continue;
            }
            if catalogue.contains_fragment(token) && !entities.course_fragments.contains(token) {
                entities.course_fragments.push(token.clone());
            }
        }

        debug!(
            days = entities.days.len(),
            has_range = entities.time_range.is_some(),
            fragments = entities.course_fragments.len(),
            "extracted entities"
        );
        entities
    }

    fn is_fragment_candidate(&self, token: &str) -> bool {
        token.chars().count() >= MIN_FRAGMENT_CHARS
            && token.chars().any(char::is_alphabetic)
            && !self.lexicon.is_stopword(token)
            && !self.lexicon.is_keyword(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Weekday};

    /// Wednesday 2024-03-06 09:30 WIB.
    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 6, 9, 30, 0)
            .unwrap()
    }

    fn extractor() -> Extractor {
        Extractor::new(Arc::new(Lexicon::indonesian()))
    }

    fn catalogue() -> CourseCatalogue {
        CourseCatalogue::from_names(["Matematika Dasar", "Fisika", "Pemrograman C++"])
    }

    #[test]
    fn blank_text_yields_nothing() {
        let ex = extractor();
        assert!(ex.extract("", &catalogue(), now()).is_empty());
        assert!(ex.extract("   \n\t ", &catalogue(), now()).is_empty());
        assert!(ex.extract("asdfgh qwerty", &catalogue(), now()).is_empty());
    }

    #[test]
    fn day_and_course() {
        let e = extractor().extract("jadwal hari senin matematika", &catalogue(), now());
        assert_eq!(e.days, vec![Weekday::Mon]);
        assert_eq!(e.time_range, None);
        assert_eq!(e.course_fragments, vec!["matematika"]);
    }

    fn alternating_case(word: &str) -> String {
        word.chars()
            .enumerate()
            .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
            .collect()
    }

    #[test]
    fn every_day_name_in_any_casing() {
        use crate::lexicon::DAY_NAMES;

        let ex = extractor();
        for &(name, day) in DAY_NAMES {
            for word in [name.to_string(), name.to_uppercase(), alternating_case(name)] {
                let e = ex.extract(&format!("jadwal {word} {word}"), &catalogue(), now());
                assert_eq!(e.days, vec![day], "{word}");
                assert!(e.time_range.is_none(), "{word}");
            }
        }
        let e = ex.extract("jadwal JUM'AT", &catalogue(), now());
        assert_eq!(e.days, vec![Weekday::Fri]);
    }

    #[test]
    fn relative_days_in_any_casing() {
        use crate::lexicon::RELATIVE_DAYS;

        let ex = extractor();
        let today = now().date_naive();
        for &(phrase, offset) in RELATIVE_DAYS {
            let expected = (today + chrono::Duration::days(offset)).weekday();
            for word in [phrase.to_uppercase(), alternating_case(phrase)] {
                let e = ex.extract(&format!("jadwal {word}"), &catalogue(), now());
                assert_eq!(e.distinct_days(), vec![expected], "{word}");
                assert!(e.time_range.is_some(), "{word}");
            }
        }
    }

    #[test]
    fn several_days_in_mention_order() {
        let e = extractor().extract("asisten kamis dan senin", &catalogue(), now());
        assert_eq!(e.days, vec![Weekday::Thu, Weekday::Mon]);
    }

    #[test]
    fn relative_day_adds_implied_day() {
        let e = extractor().extract("jadwal hari ini", &catalogue(), now());
        // Explicit "hari ini" plus the day implied by its range.
        assert_eq!(e.days, vec![Weekday::Wed, Weekday::Wed]);
        assert_eq!(e.distinct_days(), vec![Weekday::Wed]);
        assert!(e.time_range.is_some());
    }

    #[test]
    fn week_phrase_is_not_sunday() {
        let e = extractor().extract("tugas minggu depan fisika", &catalogue(), now());
        assert_eq!(e.days.len(), 7);
        assert_eq!(e.days[0], Weekday::Mon);
        assert_eq!(e.course_fragments, vec!["fisika"]);
    }

    #[test]
    fn clock_range_implies_no_day() {
        let e = extractor().extract("jadwal jam 8 sampai jam 10", &catalogue(), now());
        assert!(e.days.is_empty());
        let range = e.time_range.unwrap();
        assert_eq!(range.start_minute_of_day(), 480);
        assert_eq!(range.end_minute_of_day(), 600);
    }

    #[test]
    fn first_time_phrase_wins() {
        let e = extractor().extract("tugas besok atau lusa", &catalogue(), now());
        let range = e.time_range.unwrap();
        assert_eq!(range.implied_days(), vec![Weekday::Thu]);
        // Both relative days are still read as days.
        assert_eq!(e.days, vec![Weekday::Thu, Weekday::Fri, Weekday::Thu]);
        assert!(e.course_fragments.is_empty());
    }

    #[test]
    fn fragments_need_a_catalogue_match() {
        let e = extractor().extract("nilai kimia fisika fisika", &catalogue(), now());
        assert_eq!(e.course_fragments, vec!["fisika"]);
    }

    #[test]
    fn keywords_and_short_tokens_are_not_fragments() {
        let catalogue = CourseCatalogue::from_names(["Jadwal Kuliah", "Basis Data"]);
        let e = extractor().extract("jadwal da basis", &catalogue, now());
        assert_eq!(e.course_fragments, vec!["basis"]);
    }

    #[test]
    fn empty_catalogue_yields_no_fragments() {
        let e = extractor().extract("jadwal matematika", &CourseCatalogue::default(), now());
        assert!(e.course_fragments.is_empty());
    }

    #[test]
    fn fragments_compile_to_filter() {
        let e = extractor().extract("tugas matematika dan fisika", &catalogue(), now());
        let filter = e.course_filter().unwrap();
        assert_eq!(filter.pattern(), "matematika|fisika");
    }
}
