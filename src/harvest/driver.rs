//! Per-entity pagination state machine
//!
//! ```text
//! FETCHING -> EXTRACTING -> FILTERING -> ADVANCING -> { FETCHING | DONE | ABORTED }
//! ```
//!
//! Each page step resolves to a [`PageOutcome`]. Two independent exits end
//! the loop: a page with no candidates (or no next cursor) is a clean
//! `Done`; reaching the consecutive-failure ceiling is `Aborted`. A next
//! cursor that was already harvested also ends the walk as `Done`, and an
//! error that cannot succeed on retry aborts at once. Either way the records
//! gathered so far are returned, never discarded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::Config;
use crate::crawler::delay::DelayWindow;
use crate::crawler::source::SourceClient;
use crate::error::{HarvestErrorTrait, Result};
use crate::filter::{QualityFilter, Rejection};
use crate::models::{AcceptedRecord, PageCursor, ParentEntity, ParentResult};
use crate::parser::{ExtractedPage, RecordExtractor};
use crate::utils::error::PageError;

/// Result of processing one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Fetch this cursor next (the same cursor after a tolerated failure)
    Continue(PageCursor),
    /// Pagination ended normally
    Done,
    /// Consecutive-failure ceiling reached
    Aborted,
}

/// How an entity's page walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Done,
    Aborted {
        consecutive_errors: u32,
        last_error: String,
    },
}

impl Termination {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Counters for one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStats {
    /// Pages fetched and extracted successfully
    pub pages: u32,
    /// Failed page attempts (transport or parse)
    pub failed_attempts: u32,
    pub candidates: usize,
    pub accepted: usize,
    pub rejected: HashMap<Rejection, usize>,
}

impl EntityStats {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Everything the driver hands back for one entity
#[derive(Debug, Clone)]
pub struct EntityHarvest {
    pub result: ParentResult,
    pub termination: Termination,
    pub stats: EntityStats,
}

/// Driver tuning
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub max_consecutive_errors: u32,
    /// Safety limit on successful pages per entity
    pub max_pages: Option<u32>,
    pub page_delay: DelayWindow,
}

impl DriverSettings {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an invalid page delay window
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            max_consecutive_errors: config.harvest.max_consecutive_errors.max(1),
            max_pages: config.max_pages(),
            page_delay: DelayWindow::from_secs(
                config.delays.page_min_secs,
                config.delays.page_max_secs,
            )?,
        })
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 3,
            max_pages: None,
            page_delay: DelayWindow::none(),
        }
    }
}

/// Mutable state of one walk
#[derive(Default)]
struct WalkState {
    parent_name: Option<String>,
    records: Vec<AcceptedRecord>,
    stats: EntityStats,
    consecutive_errors: u32,
    last_error: Option<String>,
    /// Cursors already fetched and extracted
    visited: HashSet<PageCursor>,
}

/// Walks one parent entity's full page sequence
pub struct PaginationDriver {
    client: Arc<dyn SourceClient>,
    extractor: Arc<dyn RecordExtractor>,
    filter: QualityFilter,
    settings: DriverSettings,
}

impl PaginationDriver {
    pub fn new(
        client: Arc<dyn SourceClient>,
        extractor: Arc<dyn RecordExtractor>,
        filter: QualityFilter,
        settings: DriverSettings,
    ) -> Self {
        Self {
            client,
            extractor,
            filter,
            settings,
        }
    }

    pub fn client(&self) -> &dyn SourceClient {
        self.client.as_ref()
    }

    /// Harvest every page of `entity`
    ///
    /// Never fails: page-level errors become an `Aborted` termination that
    /// still carries the records collected before the failures.
    pub async fn run(&self, entity: &ParentEntity) -> EntityHarvest {
        let mut state = WalkState::default();
        let mut cursor = self.client.first_cursor(entity);

        let termination = loop {
            match self.step(entity, &cursor, &mut state).await {
                PageOutcome::Continue(next) => {
                    self.settings.page_delay.wait().await;
                    cursor = next;
                }
                PageOutcome::Done => break Termination::Done,
                PageOutcome::Aborted => {
                    break Termination::Aborted {
                        consecutive_errors: state.consecutive_errors,
                        last_error: state.last_error.take().unwrap_or_default(),
                    }
                }
            }
        };

        let parent_name = state
            .parent_name
            .unwrap_or_else(|| entity.display_name.clone());

        EntityHarvest {
            result: ParentResult {
                parent_name,
                records: state.records,
            },
            termination,
            stats: state.stats,
        }
    }

    /// Fetch, extract, filter and advance for a single cursor
    async fn step(
        &self,
        entity: &ParentEntity,
        cursor: &PageCursor,
        state: &mut WalkState,
    ) -> PageOutcome {
        if let Some(max_pages) = self.settings.max_pages {
            if state.stats.pages >= max_pages {
                tracing::info!(entity = %entity.id, max_pages, "Page limit reached");
                return PageOutcome::Done;
            }
        }

        let page = match self.fetch_and_extract(entity, cursor).await {
            Ok(page) => page,
            Err(err) => return self.record_failure(entity, cursor, state, err),
        };

        state.consecutive_errors = 0;
        state.stats.pages += 1;
        state.visited.insert(cursor.clone());

        if state.stats.pages == 1 {
            state.parent_name = page.parent_name;
        }

        if page.candidates.is_empty() {
            tracing::debug!(entity = %entity.id, cursor = %cursor, "Page has no records, pagination complete");
            return PageOutcome::Done;
        }

        let before = state.records.len();
        state.stats.candidates += page.candidates.len();

        for candidate in page.candidates {
            match self.filter.evaluate(&candidate) {
                Ok(()) => {
                    if let Some(record) = AcceptedRecord::from_candidate(candidate) {
                        state.records.push(record);
                    }
                }
                Err(reason) => {
                    tracing::trace!(entity = %entity.id, %reason, "Candidate rejected");
                    *state.stats.rejected.entry(reason).or_default() += 1;
                }
            }
        }

        let accepted = state.records.len() - before;
        state.stats.accepted += accepted;

        tracing::info!(
            entity = %entity.id,
            page = state.stats.pages,
            accepted,
            total = state.records.len(),
            has_next = page.next_cursor.is_some(),
            "Processed page"
        );

        match page.next_cursor {
            Some(next) if state.visited.contains(&next) => {
                tracing::warn!(
                    entity = %entity.id,
                    cursor = %next,
                    "Next page already harvested, stopping"
                );
                PageOutcome::Done
            }
            Some(next) => PageOutcome::Continue(next),
            None => PageOutcome::Done,
        }
    }

    async fn fetch_and_extract(
        &self,
        entity: &ParentEntity,
        cursor: &PageCursor,
    ) -> std::result::Result<ExtractedPage, PageError> {
        let raw = self.client.fetch_page(entity, cursor).await?;
        let page = self.extractor.extract(&raw)?;
        Ok(page)
    }

    fn record_failure(
        &self,
        entity: &ParentEntity,
        cursor: &PageCursor,
        state: &mut WalkState,
        err: PageError,
    ) -> PageOutcome {
        state.consecutive_errors += 1;
        state.stats.failed_attempts += 1;
        state.last_error = Some(err.describe());

        tracing::warn!(
            entity = %entity.id,
            cursor = %cursor,
            category = err.category().as_str(),
            attempt = state.consecutive_errors,
            max = self.settings.max_consecutive_errors,
            error = %err,
            "Page attempt failed"
        );

        if !err.is_recoverable()
            || state.consecutive_errors >= self.settings.max_consecutive_errors
        {
            PageOutcome::Aborted
        } else {
            PageOutcome::Continue(cursor.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{LanguageDetector, RatingPolicy};
    use crate::models::{CandidateRecord, Rating, SourceKind};
    use crate::parser::RawPage;
    use crate::utils::error::{ParseError, TransportError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted responses; `None` simulates a transport failure
    struct ScriptedClient {
        pages: Mutex<VecDeque<Option<String>>>,
        calls: Mutex<Vec<PageCursor>>,
    }

    impl ScriptedClient {
        fn new(pages: Vec<Option<&str>>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().map(|p| p.map(str::to_string)).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<PageCursor> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SourceClient for ScriptedClient {
        fn kind(&self) -> SourceKind {
            SourceKind::Api
        }

        fn first_cursor(&self, _entity: &ParentEntity) -> PageCursor {
            PageCursor::Page(1)
        }

        async fn fetch_page(
            &self,
            _entity: &ParentEntity,
            cursor: &PageCursor,
        ) -> std::result::Result<RawPage, TransportError> {
            self.calls.lock().unwrap().push(cursor.clone());
            match self.pages.lock().unwrap().pop_front().flatten() {
                Some(body) if body == "@bad-url" => Err(TransportError::InvalidUrl(body)),
                Some(body) => Ok(RawPage::new(cursor.clone(), "test://page", body)),
                None => Err(TransportError::Status(503)),
            }
        }
    }

    /// Body format: "name|rating:text;rating:text>next" ; "!" is unparseable
    struct LineExtractor;

    impl RecordExtractor for LineExtractor {
        fn extract(&self, page: &RawPage) -> std::result::Result<ExtractedPage, ParseError> {
            if page.body == "!" {
                return Err(ParseError::Xml("scripted".into()));
            }
            let (name, rest) = page.body.split_once('|').unwrap_or(("", page.body.as_str()));
            let (rest, jump) = match rest.split_once('>') {
                Some((entries, target)) => (entries, target.parse::<u32>().ok()),
                None => (rest, None),
            };
            let candidates: Vec<CandidateRecord> = rest
                .split(';')
                .filter(|s| !s.is_empty())
                .map(|entry| {
                    let (rating, text) = entry.split_once(':').unwrap_or((entry, ""));
                    CandidateRecord::new(Rating::parse(rating), None, Some(text))
                })
                .collect();
            let next_cursor = match (&page.cursor, candidates.is_empty(), jump) {
                (_, false, Some(target)) => Some(PageCursor::Page(target)),
                (PageCursor::Page(n), false, None) => Some(PageCursor::Page(n + 1)),
                _ => None,
            };
            Ok(ExtractedPage {
                parent_name: (!name.is_empty()).then(|| name.to_string()),
                candidates,
                next_cursor,
            })
        }
    }

    /// Treats text starting with "fr " as French, everything else English
    struct PrefixDetector;

    impl LanguageDetector for PrefixDetector {
        fn detect(&self, text: &str) -> Option<String> {
            if text.starts_with("fr ") {
                Some("fr".into())
            } else {
                Some("en".into())
            }
        }
    }

    fn driver(client: Arc<ScriptedClient>) -> PaginationDriver {
        let filter = QualityFilter::new(
            Arc::new(PrefixDetector),
            "en",
            RatingPolicy::Range { min: 1.0, max: 10.0 },
        );
        PaginationDriver::new(client, Arc::new(LineExtractor), filter, DriverSettings::default())
    }

    fn entity() -> ParentEntity {
        ParentEntity::new("13", "Catan (seed)", "13", 10)
    }

    #[tokio::test]
    async fn test_walks_until_empty_page() {
        let client = Arc::new(ScriptedClient::new(vec![
            Some("CATAN|7:good;11:too high"),
            Some("Ignored Name|8:great;9:fr tres bien"),
            Some(""),
        ]));
        let harvest = driver(client.clone()).run(&entity()).await;

        assert_eq!(harvest.termination, Termination::Done);
        assert_eq!(harvest.result.parent_name, "CATAN");
        assert_eq!(harvest.result.len(), 2);
        assert_eq!(harvest.stats.pages, 3);
        assert_eq!(harvest.stats.candidates, 4);
        assert_eq!(harvest.stats.rejected[&Rejection::RatingOutOfRange], 1);
        assert_eq!(harvest.stats.rejected[&Rejection::Language], 1);
        assert_eq!(
            client.calls(),
            vec![PageCursor::Page(1), PageCursor::Page(2), PageCursor::Page(3)]
        );
    }

    #[tokio::test]
    async fn test_all_failures_abort_at_ceiling() {
        let client = Arc::new(ScriptedClient::new(vec![None, None, None, None, None]));
        let harvest = driver(client.clone()).run(&entity()).await;

        assert!(harvest.termination.is_aborted());
        assert_eq!(client.calls().len(), 3);
        assert!(harvest.result.is_empty());
        assert_eq!(harvest.result.parent_name, "Catan (seed)");
    }

    #[tokio::test]
    async fn test_abort_keeps_partial_records() {
        let client = Arc::new(ScriptedClient::new(vec![
            Some("CATAN|7:good;6:fine"),
            None,
            Some("!"),
            None,
        ]));
        let harvest = driver(client.clone()).run(&entity()).await;

        match &harvest.termination {
            Termination::Aborted {
                consecutive_errors,
                last_error,
            } => {
                assert_eq!(*consecutive_errors, 3);
                assert!(last_error.contains("503"));
            }
            other => panic!("expected abort, got {other:?}"),
        }
        assert_eq!(harvest.result.len(), 2);
        assert_eq!(harvest.stats.failed_attempts, 3);
        // Failed attempts retry the same cursor
        assert_eq!(
            client.calls(),
            vec![
                PageCursor::Page(1),
                PageCursor::Page(2),
                PageCursor::Page(2),
                PageCursor::Page(2)
            ]
        );
    }

    #[tokio::test]
    async fn test_success_resets_error_counter() {
        let client = Arc::new(ScriptedClient::new(vec![
            None,
            None,
            Some("CATAN|7:good"),
            None,
            None,
            Some(""),
        ]));
        let harvest = driver(client).run(&entity()).await;

        assert_eq!(harvest.termination, Termination::Done);
        assert_eq!(harvest.stats.failed_attempts, 4);
        assert_eq!(harvest.result.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_tail_keeps_accumulated_records() {
        let client = Arc::new(ScriptedClient::new(vec![Some("CATAN|5:ok;4:meh"), Some("")]));
        let harvest = driver(client).run(&entity()).await;

        assert_eq!(harvest.termination, Termination::Done);
        let ratings: Vec<_> = harvest.result.records.iter().map(|r| r.rating.clone()).collect();
        assert_eq!(ratings, vec![Rating::Numeric(5.0), Rating::Numeric(4.0)]);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let client = Arc::new(ScriptedClient::new(vec![
            Some("CATAN|7:a"),
            Some("|7:b"),
            Some("|7:c"),
        ]));
        let mut d = driver(client.clone());
        d.settings.max_pages = Some(2);
        let harvest = d.run(&entity()).await;

        assert_eq!(harvest.termination, Termination::Done);
        assert_eq!(harvest.result.len(), 2);
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cursor_cycle_ends_walk() {
        let client = Arc::new(ScriptedClient::new(vec![
            Some("CATAN|7:a"),
            Some("|7:b>1"),
            Some("|7:c"),
        ]));
        let harvest = driver(client.clone()).run(&entity()).await;

        assert_eq!(harvest.termination, Termination::Done);
        assert_eq!(harvest.result.len(), 2);
        assert_eq!(client.calls(), vec![PageCursor::Page(1), PageCursor::Page(2)]);
    }

    #[tokio::test]
    async fn test_unrecoverable_error_aborts_immediately() {
        let client = Arc::new(ScriptedClient::new(vec![
            Some("CATAN|7:a"),
            Some("@bad-url"),
            Some("|7:b"),
        ]));
        let harvest = driver(client.clone()).run(&entity()).await;

        match &harvest.termination {
            Termination::Aborted {
                consecutive_errors,
                last_error,
            } => {
                assert_eq!(*consecutive_errors, 1);
                assert!(last_error.contains("Invalid URL"));
            }
            other => panic!("expected abort, got {other:?}"),
        }
        assert_eq!(harvest.result.len(), 1);
        assert_eq!(client.calls().len(), 2);
    }
}
