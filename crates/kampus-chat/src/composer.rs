use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use kampus_core::{Intent, PayloadItem, RawMessage};
use kampus_nlu::{Extractor, Lexicon, PhraseBook, Router};
use kampus_store::DomainQuery;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::handlers::{self, Request};
use crate::{ChatError, ChatSettings};

/// Western Indonesia Time, the default campus clock.
const DEFAULT_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Reply to one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub intent: Intent,
    pub items: Vec<PayloadItem>,
    pub phrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Routes messages, runs handlers and phrases replies.
///
/// Holds only shared immutable tables and the collaborator, so one composer
/// can serve concurrent requests.
pub struct Composer<Q> {
    query: Q,
    router: Router,
    extractor: Extractor,
    phrases: Arc<PhraseBook>,
    settings: ChatSettings,
    utc_offset: FixedOffset,
}

impl<Q: DomainQuery> Composer<Q> {
    /// A composer with the built-in Indonesian lexicon and phrase book.
    pub fn new(query: Q, settings: ChatSettings) -> Result<Self, ChatError> {
        Self::with_parts(
            query,
            Arc::new(Lexicon::indonesian()),
            Arc::new(PhraseBook::indonesian()),
            settings,
        )
    }

    /// A composer over custom tables. The phrase book must cover every pool.
    pub fn with_parts(
        query: Q,
        lexicon: Arc<Lexicon>,
        phrases: Arc<PhraseBook>,
        settings: ChatSettings,
    ) -> Result<Self, ChatError> {
        phrases.validate()?;
        let utc_offset = FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or(Utc.fix());
        Ok(Self {
            query,
            router: Router::new(Arc::clone(&lexicon)),
            extractor: Extractor::new(lexicon),
            phrases,
            settings,
            utc_offset,
        })
    }

    /// Evaluate relative times ("besok", "jam 8") in this offset.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Current campus-local time.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }

    /// Reply to `message` at the current time with a freshly seeded generator.
    pub fn respond(&self, message: &RawMessage) -> Result<Reply, ChatError> {
        let mut rng = StdRng::from_entropy();
        self.respond_at(message, self.now(), &mut rng)
    }

    /// Reply to `message` as of `now`, drawing the phrase from `rng`.
    pub fn respond_at<R: Rng + ?Sized>(
        &self,
        message: &RawMessage,
        now: DateTime<FixedOffset>,
        rng: &mut R,
    ) -> Result<Reply, ChatError> {
        let intent = self.router.classify(&message.text);
        let request = Request {
            query: &self.query,
            extractor: &self.extractor,
            links: &self.settings.links,
            requester: message.requester,
            text: &message.text,
            now,
        };
        let output = handlers::handle(intent, &request)?;

        let name = message
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.settings.fallback_name.as_str());
        let phrase = self.phrases.select(rng, intent, output.confidence, name);

        debug!(
            %intent,
            requester = %message.requester,
            items = output.items.len(),
            confidence = output.confidence,
            "composed reply"
        );
        Ok(Reply {
            intent,
            items: output.items,
            phrase,
            confidence: output.confidence,
        })
    }
}
