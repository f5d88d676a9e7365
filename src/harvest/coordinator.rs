//! Run-level orchestration
//!
//! Walks the ordered entity list one entity at a time, appending non-empty
//! results to the run buffer and rewriting the checkpoint file whenever
//! enough new records have accumulated. The buffer is owned here and nowhere
//! else.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use crate::crawler::delay::DelayWindow;
use crate::harvest::driver::{PaginationDriver, Termination};
use crate::models::{HarvestBuffer, ParentEntity};
use crate::storage::CheckpointStore;
use crate::utils::truncate_text;

/// Which entities of an ordered list to process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumePlan {
    /// Entities before this index are skipped...
    pub start_index: usize,
    /// ...unless their id is listed here
    pub include_ids: HashSet<String>,
}

impl ResumePlan {
    /// Process everything
    pub fn full() -> Self {
        Self::default()
    }

    pub fn from_index(start_index: usize) -> Self {
        Self {
            start_index,
            include_ids: HashSet::new(),
        }
    }

    #[must_use]
    pub fn include<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn should_process(&self, index: usize, entity: &ParentEntity) -> bool {
        index >= self.start_index || self.include_ids.contains(&entity.id)
    }
}

/// Mutable run state handed to the coordinator
#[derive(Debug)]
pub struct HarvestContext {
    pub buffer: HarvestBuffer,
    pub store: CheckpointStore,
    pub entity_delay: DelayWindow,
    /// Flush after this many newly accepted records
    pub checkpoint_every: usize,
}

impl HarvestContext {
    pub fn new(store: CheckpointStore, entity_delay: DelayWindow, checkpoint_every: usize) -> Self {
        Self {
            buffer: HarvestBuffer::new(),
            store,
            entity_delay,
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    /// Start from previously saved results so flushes keep them
    #[must_use]
    pub fn with_buffer(mut self, buffer: HarvestBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    fn flush(&self) -> Result<PathBuf> {
        self.store.save(self.buffer.results())
    }
}

/// Per-run outcome counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Finished normally with at least one record
    pub completed: usize,
    /// Finished normally with no accepted records
    pub empty: usize,
    /// Hit the consecutive-failure ceiling (partial records kept)
    pub aborted: usize,
    /// Excluded by the resume plan
    pub skipped: usize,
    /// Records accepted during this run
    pub records: usize,
    pub pages: u64,
    /// Successful checkpoint writes, the final one included
    pub flushes: usize,
    pub failed_flushes: usize,
    pub output: Option<PathBuf>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.completed + self.empty + self.aborted
    }
}

/// Drives every entity through the pagination driver
pub struct HarvestCoordinator {
    driver: PaginationDriver,
    context: HarvestContext,
}

impl HarvestCoordinator {
    pub fn new(driver: PaginationDriver, context: HarvestContext) -> Self {
        Self { driver, context }
    }

    pub fn context(&self) -> &HarvestContext {
        &self.context
    }

    pub fn into_context(self) -> HarvestContext {
        self.context
    }

    /// Harvest `entities` in the given order
    ///
    /// A periodic flush is attempted once an entity brings the count of
    /// unflushed records to `checkpoint_every`. Periodic flush failures are
    /// logged and the run continues; only a failure of the final flush is
    /// returned. The entity delay follows every processed entity except the
    /// last one, whatever its outcome.
    pub async fn run(&mut self, entities: &[ParentEntity], plan: &ResumePlan) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let mut since_flush = 0usize;

        let last_processed = entities
            .iter()
            .enumerate()
            .rev()
            .find(|(i, e)| plan.should_process(*i, e))
            .map(|(i, _)| i);

        tracing::info!(
            source = self.driver.client().kind().as_str(),
            entities = entities.len(),
            start_index = plan.start_index,
            included = plan.include_ids.len(),
            "Starting harvest"
        );

        for (index, entity) in entities.iter().enumerate() {
            if !plan.should_process(index, entity) {
                tracing::debug!(index, entity = %entity.id, "Skipping entity");
                summary.skipped += 1;
                continue;
            }

            tracing::info!(
                index,
                total = entities.len(),
                entity = %entity.id,
                name = %entity.display_name,
                rank = entity.ordering_rank,
                "Harvesting entity"
            );

            let harvest = self.driver.run(entity).await;
            let records = harvest.result.len();
            summary.pages += u64::from(harvest.stats.pages);
            summary.records += records;

            match &harvest.termination {
                Termination::Aborted {
                    consecutive_errors,
                    last_error,
                } => {
                    summary.aborted += 1;
                    tracing::warn!(
                        entity = %entity.id,
                        consecutive_errors,
                        last_error = %truncate_text(last_error, 200),
                        kept = records,
                        "Entity aborted"
                    );
                }
                Termination::Done if records == 0 => {
                    summary.empty += 1;
                    tracing::info!(entity = %entity.id, pages = harvest.stats.pages, "No records accepted");
                }
                Termination::Done => {
                    summary.completed += 1;
                    tracing::info!(
                        entity = %entity.id,
                        parent = %harvest.result.parent_name,
                        pages = harvest.stats.pages,
                        records,
                        rejected = harvest.stats.rejected_total(),
                        "Entity complete"
                    );
                }
            }

            let pushed = self.context.buffer.push(harvest.result);
            if pushed {
                since_flush += records;
            }

            if pushed && since_flush >= self.context.checkpoint_every {
                match self.context.flush() {
                    Ok(path) => {
                        tracing::info!(
                            path = %path.display(),
                            records = self.context.buffer.record_count(),
                            "Checkpoint written"
                        );
                        summary.output = Some(path);
                        summary.flushes += 1;
                        since_flush = 0;
                    }
                    Err(e) => {
                        summary.failed_flushes += 1;
                        tracing::error!(error = %e, "Checkpoint flush failed, continuing");
                    }
                }
            }

            if Some(index) != last_processed {
                self.context.entity_delay.wait().await;
            }
        }

        let path = self.context.flush().with_context(|| {
            format!(
                "Final checkpoint flush failed after {} failed periodic flushes",
                summary.failed_flushes
            )
        })?;
        summary.output = Some(path);
        summary.flushes += 1;

        tracing::info!(
            completed = summary.completed,
            empty = summary.empty,
            aborted = summary.aborted,
            skipped = summary.skipped,
            records = summary.records,
            buffered = self.context.buffer.record_count(),
            elapsed_secs = started.elapsed().as_secs(),
            "Harvest finished"
        );

        Ok(summary)
    }
}
