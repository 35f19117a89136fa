//! Reply phrasing: bounded phrase pools and uniform random selection.

use std::collections::HashMap;

use kampus_core::{ConfidenceBucket, Intent};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::warn;

const NAME_SLOT: &str = "{name}";

/// Which pool a reply is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKey {
    Intent(Intent),
    /// Lookups whose phrasing depends on how well the results fit the request.
    Graded(Intent, ConfidenceBucket),
}

impl PoolKey {
    /// The pool for a reply. A graded intent without a confidence score is
    /// treated as not sure.
    pub fn for_reply(intent: Intent, confidence: Option<f64>) -> Self {
        if intent.is_graded() {
            let bucket = confidence.map_or(ConfidenceBucket::NotSure, ConfidenceBucket::from_score);
            Self::Graded(intent, bucket)
        } else {
            Self::Intent(intent)
        }
    }

    /// Every pool a complete phrase book must provide.
    pub fn required() -> Vec<Self> {
        let mut keys = Vec::new();
        for intent in Intent::ALL {
            if intent.is_graded() {
                keys.extend(ConfidenceBucket::ALL.map(|b| Self::Graded(intent, b)));
            } else {
                keys.push(Self::Intent(intent));
            }
        }
        keys
    }
}

impl std::fmt::Display for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intent(intent) => write!(f, "{intent}"),
            Self::Graded(intent, bucket) => write!(f, "{intent}/{}", bucket.as_str()),
        }
    }
}

/// One reply template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub text: String,
    /// Whether the first `{name}` in `text` is replaced by the display name.
    pub with_name: bool,
}

impl Phrase {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            with_name: false,
        }
    }

    pub fn named(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            with_name: true,
        }
    }

    fn render(&self, name: &str) -> String {
        if self.with_name {
            self.text.replacen(NAME_SLOT, name, 1)
        } else {
            self.text.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum PhraseBookError {
    #[error("phrase pool {0} is missing or empty")]
    MissingPool(PoolKey),
}

/// Fixed reply pools, built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct PhraseBook {
    pools: HashMap<PoolKey, Vec<Phrase>>,
}

impl PhraseBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PoolKey, phrase: Phrase) {
        self.pools.entry(key).or_default().push(phrase);
    }

    pub fn pool(&self, key: PoolKey) -> &[Phrase] {
        self.pools.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check that every required pool has at least one phrase.
    pub fn validate(&self) -> Result<(), PhraseBookError> {
        match PoolKey::required()
            .into_iter()
            .find(|key| self.pool(*key).is_empty())
        {
            Some(key) => Err(PhraseBookError::MissingPool(key)),
            None => Ok(()),
        }
    }

    /// Pick a reply uniformly from the pool for `intent` and `confidence`,
    /// filling named templates with `name`.
    ///
    /// An empty pool falls back to the unknown-intent pool; an empty book
    /// yields an empty string.
    pub fn select<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        intent: Intent,
        confidence: Option<f64>,
        name: &str,
    ) -> String {
        let key = PoolKey::for_reply(intent, confidence);
        let phrase = self.pool(key).choose(rng).or_else(|| {
            warn!(pool = %key, "empty phrase pool, using fallback");
            self.pool(PoolKey::Intent(Intent::Unknown)).choose(rng)
        });
        phrase.map(|p| p.render(name)).unwrap_or_default()
    }

    /// The built-in casual Indonesian replies.
    pub fn indonesian() -> Self {
        use ConfidenceBucket::{Confident, Doubt, NotSure};

        let mut book = Self::new();
        let mut add = |key: PoolKey, phrases: &[&str]| {
            for text in phrases {
                let phrase = if text.contains(NAME_SLOT) {
                    Phrase::named(*text)
                } else {
                    Phrase::plain(*text)
                };
                book.insert(key, phrase);
            }
        };

        add(
            PoolKey::Graded(Intent::AssistantLookup, Confident),
            &[
                "Ini bro jawabannya.",
                "Ini asisten yang kamu cari.",
                "Ketemu! Ini daftar asistennya.",
                "Berikut asisten yang sesuai permintaanmu.",
            ],
        );
        add(
            PoolKey::Graded(Intent::AssistantLookup, Doubt),
            &[
                "Kayaknya sih ini asistennya.",
                "Mereun ya ini ge.",
                "Aku nemu beberapa asisten, tapi mungkin belum semuanya pas.",
                "Ini asisten yang paling mendekati, coba dicek lagi ya.",
            ],
        );
        add(
            PoolKey::Graded(Intent::AssistantLookup, NotSure),
            &[
                "Sorry nih bro, gua ga tau.",
                "Gatau, coba tanya ke temen kamu!",
                "Hmm, aku kurang yakin. Ini asisten yang bisa aku temukan.",
                "Aku belum nemu asisten yang cocok, coba sebut mata kuliah atau harinya.",
            ],
        );
        add(
            PoolKey::Graded(Intent::ScheduleLookup, Confident),
            &[
                "Ini bro jawabannya.",
                "Ini jadwal kuliahmu.",
                "Siap! Berikut jadwalnya.",
                "Ini jadwal yang kamu minta.",
            ],
        );
        add(
            PoolKey::Graded(Intent::ScheduleLookup, Doubt),
            &[
                "Kayaknya sih ini jadwalnya.",
                "Mereun ya ini ge.",
                "Ini jadwal yang aku temukan, tapi mungkin belum lengkap.",
                "Sebagian jadwal yang kamu minta ada di sini.",
            ],
        );
        add(
            PoolKey::Graded(Intent::ScheduleLookup, NotSure),
            &[
                "Sorry nih bro, gua ga tau.",
                "Kasih tau ga ya?",
                "Hmm, aku nggak nemu jadwal yang pas.",
                "Aku kurang yakin jadwal mana yang kamu maksud, coba sebut hari atau mata kuliahnya.",
            ],
        );
        add(
            PoolKey::Intent(Intent::CourseInformation),
            &[
                "Ini informasi terbaru dari kelasmu.",
                "Berikut pengumuman yang aku temukan.",
            ],
        );
        add(
            PoolKey::Intent(Intent::AssignmentLookup),
            &[
                "Ini daftar tugasmu.",
                "Berikut tugas yang perlu kamu kerjakan.",
                "Jangan lupa dikerjakan ya, ini tugasnya.",
            ],
        );
        add(
            PoolKey::Intent(Intent::GradeLookup),
            &["Ini nilai-nilaimu.", "Berikut nilai yang sudah keluar."],
        );
        add(
            PoolKey::Intent(Intent::Greeting),
            &[
                "Halo {name}! Ada yang bisa aku bantu?",
                "Hai {name}, mau cek jadwal atau tugas?",
                "Halo juga! Ada yang bisa dibantu?",
            ],
        );
        add(
            PoolKey::Intent(Intent::AboutBot),
            &[
                "Aku asisten kampus virtual. Aku bisa bantu cek jadwal, tugas, nilai, dan asisten.",
                "Aku bot kampus, tanya aja soal jadwal atau tugasmu.",
            ],
        );
        add(
            PoolKey::Intent(Intent::AboutStudent),
            &[
                "Kamu {name}, mahasiswa favoritku!",
                "Kamu itu {name}, masa lupa?",
            ],
        );
        add(
            PoolKey::Intent(Intent::AboutCreator),
            &[
                "Aku dibuat oleh tim pengembang kampus.",
                "Yang bikin aku tim pengembang kampus, mereka keren kan?",
            ],
        );
        add(
            PoolKey::Intent(Intent::Kidding),
            &["Hehe, bisa aja kamu.", "Wkwk, serius dong.", "Haha, lucu juga."],
        );
        add(
            PoolKey::Intent(Intent::Unknown),
            &[
                "Maaf, aku belum ngerti maksudmu.",
                "Hmm, bisa diulang dengan kata lain?",
                "Aku belum bisa jawab itu. Coba tanya soal jadwal, tugas, atau nilai.",
            ],
        );
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn indonesian_book_is_complete() {
        PhraseBook::indonesian().validate().unwrap();
    }

    #[test]
    fn validate_reports_missing_pool() {
        let mut book = PhraseBook::new();
        book.insert(PoolKey::Intent(Intent::Greeting), Phrase::plain("halo"));
        assert!(matches!(book.validate(), Err(PhraseBookError::MissingPool(_))));
    }

    #[test]
    fn required_pools_cover_buckets_for_graded_intents() {
        let keys = PoolKey::required();
        // Nine plain intents plus three buckets for each graded one.
        assert_eq!(keys.len(), 9 + 2 * 3);
        assert!(keys.contains(&PoolKey::Graded(Intent::ScheduleLookup, ConfidenceBucket::Doubt)));
        assert!(!keys.contains(&PoolKey::Intent(Intent::ScheduleLookup)));
    }

    #[test]
    fn pool_key_for_reply() {
        assert_eq!(
            PoolKey::for_reply(Intent::ScheduleLookup, Some(100.0)),
            PoolKey::Graded(Intent::ScheduleLookup, ConfidenceBucket::Confident)
        );
        assert_eq!(
            PoolKey::for_reply(Intent::AssistantLookup, None),
            PoolKey::Graded(Intent::AssistantLookup, ConfidenceBucket::NotSure)
        );
        assert_eq!(
            PoolKey::for_reply(Intent::GradeLookup, Some(10.0)),
            PoolKey::Intent(Intent::GradeLookup)
        );
    }

    #[test]
    fn repeated_selection_stays_in_pool() {
        let book = PhraseBook::indonesian();
        let mut rng = StdRng::seed_from_u64(7);
        let pool: Vec<&str> = book
            .pool(PoolKey::Graded(Intent::ScheduleLookup, ConfidenceBucket::Doubt))
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        for _ in 0..200 {
            let reply = book.select(&mut rng, Intent::ScheduleLookup, Some(45.0), "Budi");
            assert!(pool.contains(&reply.as_str()), "{reply}");
        }
    }

    #[test]
    fn name_slot_is_filled() {
        let mut book = PhraseBook::new();
        book.insert(PoolKey::Intent(Intent::Greeting), Phrase::named("Halo {name}, {name}!"));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            book.select(&mut rng, Intent::Greeting, None, "Budi"),
            "Halo Budi, {name}!"
        );
    }

    #[test]
    fn graded_pools_keep_the_casual_replies() {
        let book = PhraseBook::indonesian();
        let texts = |intent, bucket| -> Vec<String> {
            book.pool(PoolKey::Graded(intent, bucket))
                .iter()
                .map(|p| p.text.clone())
                .collect()
        };
        for intent in [Intent::AssistantLookup, Intent::ScheduleLookup] {
            let confident = texts(intent, ConfidenceBucket::Confident);
            assert!(confident.contains(&"Ini bro jawabannya.".to_string()));
            let doubt = texts(intent, ConfidenceBucket::Doubt);
            assert!(doubt.contains(&"Mereun ya ini ge.".to_string()));
            let not_sure = texts(intent, ConfidenceBucket::NotSure);
            assert!(not_sure.contains(&"Sorry nih bro, gua ga tau.".to_string()));
        }
    }

    #[test]
    fn plain_phrase_keeps_braces() {
        let mut book = PhraseBook::new();
        book.insert(PoolKey::Intent(Intent::Kidding), Phrase::plain("{name}"));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(book.select(&mut rng, Intent::Kidding, None, "Budi"), "{name}");
    }

    #[test]
    fn empty_pool_falls_back_to_unknown() {
        let mut book = PhraseBook::new();
        book.insert(PoolKey::Intent(Intent::Unknown), Phrase::plain("maaf"));
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(book.select(&mut rng, Intent::Greeting, None, "Budi"), "maaf");
        assert_eq!(PhraseBook::new().select(&mut rng, Intent::Greeting, None, "Budi"), "");
    }
}
