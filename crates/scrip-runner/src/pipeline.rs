//! One synchronization run.
//!
//! ```text
//! validate → backup → login → gated deletes
//!   → for each segment (config order): fetch all pages
//!        ok   → spawn [transform + load] into the task group
//!        err  → segment marked failed, next segment
//!   → join all → enrichment → RunSummary
//! ```
//!
//! Only a bad config or a failed login ends the run early. Everything past
//! that is isolated per segment and reported in the summary.
//!
//! The shutdown signal is cooperative; [`Pipeline::run_within`] adds the hard
//! limit for work that never reaches a check (a statement the sink never
//! answers, a stuck login).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, error, info, info_span, warn};

use scrip_core::config::AppConfig;
use scrip_core::{Segment, SyncError, SyncResult, time_util};
use scrip_feed::Upstream;
use scrip_feed::fetcher::{RawBatch, SegmentFetcher};
use scrip_feed::stock_master::StockMasterSource;
use scrip_store::{
    BackupCoordinator, ConnectionManager, Connector, DeleteKind, EnrichmentJobs, EnrichmentReport,
    LoadReport, StorageLoader,
};
use scrip_transform::{InstrumentTransformer, Rules, TransformStats};

/// What happened to one segment.
#[derive(Debug)]
pub enum SegmentOutcome {
    Loaded { transform: TransformStats, load: LoadReport },
    /// `--dry-run`: fetched and transformed, nothing written.
    Transformed { transform: TransformStats },
    FetchFailed(SyncError),
    LoadFailed(SyncError),
    /// The segment task panicked or was aborted; carries [`SyncError::Task`].
    TaskFailed(SyncError),
    Cancelled,
}

impl SegmentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Loaded { .. } | Self::Transformed { .. })
    }
}

#[derive(Debug)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub outcome: SegmentOutcome,
}

/// Result of a run that got past login.
#[derive(Debug)]
pub struct RunSummary {
    pub backed_up: bool,
    /// In config order.
    pub segments: Vec<SegmentSummary>,
    /// `None` when enrichment did not run (dry run, cancelled, nothing loaded).
    pub enrichment: Option<EnrichmentReport>,
}

impl RunSummary {
    pub fn succeeded_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.outcome.is_success()).count()
    }

    /// Login succeeded (implied by having a summary) and at least one
    /// segment made it through.
    pub fn is_success(&self) -> bool {
        self.succeeded_segments() > 0
    }
}

pub struct Pipeline<U> {
    config: Arc<AppConfig>,
    upstream: Arc<U>,
    connector: Arc<dyn Connector>,
    dry_run: bool,
    reconnect_backoff: Option<Duration>,
}

impl<U: Upstream + 'static> Pipeline<U> {
    pub fn new(config: Arc<AppConfig>, upstream: Arc<U>, connector: Arc<dyn Connector>) -> Self {
        Self { config, upstream, connector, dry_run: false, reconnect_backoff: None }
    }

    /// Fetch and transform only; no sink access at all.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[cfg(test)]
    pub fn reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = Some(backoff);
        self
    }

    /// [`run`](Self::run) under a hard limit. A run still going at `limit`
    /// is dropped, which aborts every in-flight segment task.
    pub async fn run_within(
        &self,
        shutdown: watch::Receiver<bool>,
        limit: Duration,
    ) -> SyncResult<RunSummary> {
        match tokio::time::timeout(limit, self.run(shutdown)).await {
            Ok(result) => result,
            Err(_) => {
                error!(limit_secs = limit.as_secs(), "[pipeline] run did not wind down, abandoned");
                Err(SyncError::Timeout { secs: limit.as_secs() })
            }
        }
    }

    /// Execute the run. `Err` only for a fatal error (config, login).
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> SyncResult<RunSummary> {
        self.config.validate()?;
        let app = &self.config.app;
        let statements = Arc::new(self.config.statements.clone());

        let mut manager = ConnectionManager::new(self.connector.clone(), app.reconnect_attempts);
        if let Some(backoff) = self.reconnect_backoff {
            manager = manager.with_backoff(backoff);
        }
        let manager = Arc::new(manager);
        let backup = BackupCoordinator::new(manager.clone(), statements.clone());

        let backed_up = if self.dry_run { false } else { backup.backup().await };

        let token = self
            .upstream
            .authenticate()
            .await
            .inspect_err(|e| error!("[pipeline] login failed: {e}"))?;

        if !self.dry_run {
            for kind in DeleteKind::ALL {
                if let Err(e) = backup.delete(kind).await {
                    error!(?kind, "[pipeline] delete failed: {e}");
                }
            }
        }

        let transformer = Arc::new(InstrumentTransformer::new(Rules::from_settings(app)));
        let loader = Arc::new(StorageLoader::new(manager.clone(), statements.clone()));
        let segments = app.segments();
        let fetcher = SegmentFetcher::new(&*self.upstream, &token);

        let mut outcomes: Vec<Option<SegmentOutcome>> =
            segments.iter().map(|_| None).collect();
        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::new();

        for (idx, segment) in segments.iter().enumerate() {
            if *shutdown.borrow() {
                outcomes[idx] = Some(SegmentOutcome::Cancelled);
                continue;
            }
            let batches = match fetcher.fetch_segment(segment, &shutdown).await {
                Ok(batches) => batches,
                Err(SyncError::Cancelled) => {
                    outcomes[idx] = Some(SegmentOutcome::Cancelled);
                    continue;
                }
                Err(e) => {
                    error!(segment = %segment, "[pipeline] fetch failed, segment skipped: {e}");
                    outcomes[idx] = Some(SegmentOutcome::FetchFailed(e));
                    continue;
                }
            };

            let task = process_segment(
                segment.clone(),
                batches,
                transformer.clone(),
                loader.clone(),
                shutdown.clone(),
                self.dry_run,
            );
            let handle = tasks.spawn(task.instrument(info_span!("segment", segment = %segment)));
            task_index.insert(handle.id(), idx);
        }

        // barrier
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some(&idx) = task_index.get(&id) {
                        outcomes[idx] = Some(outcome);
                    }
                }
                Err(e) => {
                    if let Some(&idx) = task_index.get(&e.id()) {
                        error!(segment = %segments[idx], "[pipeline] segment task failed: {e}");
                        outcomes[idx] = Some(task_failure(&e));
                    }
                }
            }
        }

        let segments: Vec<SegmentSummary> = segments
            .into_iter()
            .zip(outcomes)
            .map(|(segment, outcome)| SegmentSummary {
                segment,
                outcome: outcome.unwrap_or(SegmentOutcome::Cancelled),
            })
            .collect();

        let loaded =
            segments.iter().any(|s| matches!(s.outcome, SegmentOutcome::Loaded { .. }));
        let enrichment = if self.dry_run || *shutdown.borrow() || !loaded {
            info!("[pipeline] enrichment skipped");
            None
        } else {
            let source: Arc<dyn StockMasterSource> = self.upstream.clone();
            Some(EnrichmentJobs::new(manager, statements, source).run_all(&shutdown).await)
        };

        let summary = RunSummary { backed_up, segments, enrichment };
        info!(
            segments = summary.segments.len(),
            succeeded = summary.succeeded_segments(),
            backed_up = summary.backed_up,
            "[pipeline] run finished"
        );
        Ok(summary)
    }
}

fn task_failure(e: &JoinError) -> SegmentOutcome {
    SegmentOutcome::TaskFailed(SyncError::Task(e.to_string()))
}

/// Transform then load one fetched segment.
async fn process_segment(
    segment: Segment,
    batches: Vec<RawBatch>,
    transformer: Arc<InstrumentTransformer>,
    loader: Arc<StorageLoader>,
    shutdown: watch::Receiver<bool>,
    dry_run: bool,
) -> SegmentOutcome {
    let (rows, transform) =
        transformer.transform_batches(&segment, &batches, time_util::now_epoch_secs());
    drop(batches);

    if dry_run {
        return SegmentOutcome::Transformed { transform };
    }
    match loader.load(&segment, &rows, &shutdown).await {
        Ok(load) => SegmentOutcome::Loaded { transform, load },
        Err(SyncError::Cancelled) => SegmentOutcome::Cancelled,
        Err(e) => {
            warn!(segment = %segment, "[pipeline] load failed: {e}");
            SegmentOutcome::LoadFailed(e)
        }
    }
}
