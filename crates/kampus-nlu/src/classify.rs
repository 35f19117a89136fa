//! Keyword routing from message text to [`Intent`].

use std::sync::Arc;

use kampus_core::Intent;
use tracing::debug;

use crate::lexicon::{Lexicon, tokenize};

/// Ordered keyword rules. The first rule with a keyword anywhere in the
/// message decides the intent.
#[derive(Debug, Clone)]
pub struct Router {
    lexicon: Arc<Lexicon>,
}

impl Router {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Rule order as evaluated.
    pub fn order(&self) -> Vec<Intent> {
        self.lexicon
            .intent_rules()
            .iter()
            .map(|(intent, _)| *intent)
            .collect()
    }

    pub fn classify(&self, text: &str) -> Intent {
        let tokens = tokenize(text);
        let intent = self
            .lexicon
            .intent_rules()
            .iter()
            .find(|(_, keywords)| keywords.occurs_in(&tokens))
            .map_or(Intent::Unknown, |(intent, _)| *intent);
        debug!(%intent, tokens = tokens.len(), "classified message");
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::PhraseTable;

    fn router() -> Router {
        Router::new(Arc::new(Lexicon::indonesian()))
    }

    #[test]
    fn deployed_rule_order() {
        assert_eq!(
            router().order(),
            vec![
                Intent::AboutCreator,
                Intent::AboutBot,
                Intent::AboutStudent,
                Intent::Kidding,
                Intent::Greeting,
                Intent::AssistantLookup,
                Intent::GradeLookup,
                Intent::AssignmentLookup,
                Intent::CourseInformation,
                Intent::ScheduleLookup,
            ]
        );
    }

    #[test]
    fn halo_is_greeting() {
        assert_eq!(router().classify("halo"), Intent::Greeting);
        assert_eq!(router().classify("Halo!"), Intent::Greeting);
        assert_eq!(router().classify("selamat pagi kak"), Intent::Greeting);
    }

    #[test]
    fn how_are_you_is_greeting() {
        let r = router();
        assert_eq!(r.classify("apa kabar?"), Intent::Greeting);
        assert_eq!(r.classify("Apa kabarnya kak"), Intent::Greeting);
        assert_eq!(r.classify("gimana kabar hari ini"), Intent::Greeting);
        assert_eq!(r.classify("kabar terbaru kelas fisika"), Intent::CourseInformation);
    }

    #[test]
    fn lookups() {
        let r = router();
        assert_eq!(r.classify("jadwal hari senin matematika"), Intent::ScheduleLookup);
        assert_eq!(r.classify("siapa asisten fisika?"), Intent::AssistantLookup);
        assert_eq!(r.classify("ada tugas besok?"), Intent::AssignmentLookup);
        assert_eq!(r.classify("nilai matematika dong"), Intent::GradeLookup);
        assert_eq!(r.classify("pengumuman minggu ini"), Intent::CourseInformation);
    }

    #[test]
    fn specific_nouns_win() {
        let r = router();
        assert_eq!(r.classify("nilai tugas fisika"), Intent::GradeLookup);
        assert_eq!(r.classify("jadwal asisten fisika"), Intent::AssistantLookup);
        assert_eq!(r.classify("info jadwal kuliah"), Intent::CourseInformation);
        assert_eq!(r.classify("asisten saya siapa?"), Intent::AssistantLookup);
        assert_eq!(r.classify("jadwal aku siapa yang ngajar"), Intent::ScheduleLookup);
    }

    #[test]
    fn small_talk_before_lookups() {
        let r = router();
        assert_eq!(r.classify("kamu siapa?"), Intent::AboutBot);
        assert_eq!(r.classify("siapa pembuatmu"), Intent::AboutCreator);
        assert_eq!(r.classify("aku ini siapa"), Intent::AboutStudent);
        assert_eq!(r.classify("siapa sih saya?"), Intent::AboutStudent);
        assert_eq!(r.classify("wkwkwk jadwal"), Intent::Kidding);
        assert_eq!(r.classify("halo, jadwal dong"), Intent::Greeting);
    }

    #[test]
    fn unmatched_is_unknown() {
        let r = router();
        assert_eq!(r.classify(""), Intent::Unknown);
        assert_eq!(r.classify("   "), Intent::Unknown);
        assert_eq!(r.classify("cuaca cerah"), Intent::Unknown);
    }

    #[test]
    fn custom_rule_order_is_respected() {
        let schedule: PhraseTable<()> = [("jadwal", ())].into_iter().collect();
        let grade: PhraseTable<()> = [("nilai", ())].into_iter().collect();
        let lexicon = Lexicon::from_parts(
            PhraseTable::new(),
            PhraseTable::new(),
            vec![(Intent::ScheduleLookup, schedule), (Intent::GradeLookup, grade)],
            std::iter::empty::<&str>(),
        );
        let r = Router::new(Arc::new(lexicon));
        assert_eq!(r.classify("nilai jadwal"), Intent::ScheduleLookup);
    }
}
