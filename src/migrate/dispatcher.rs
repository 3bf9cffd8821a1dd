//! Discovery and dispatch
//!
//! The coordinating thread walks the discovered references, skips objects the
//! storage root already holds and pushes the rest onto a bounded queue. A
//! fixed pool of workers pulls from that queue; each worker runs one export
//! at a time, so at most `workers` exports are in flight. When the queue is
//! full the coordinator blocks, which keeps discovery from running far ahead
//! of completed work. Outcomes flow to a separate collector thread that does
//! the logging and counting.

use crate::config::clamp_workers;
use crate::core::error::{OcflError, Result};
use crate::core::types::ObjectId;
use crate::migrate::exporter::ObjectExporter;
use crate::migrate::stats::{RunStats, RunSummary};
use crate::storage::root::StorageRoot;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Queue slots per worker
const QUEUE_SLOTS_PER_WORKER: usize = 2;

/// Completion notice for one submitted export
#[derive(Debug)]
pub struct ExportOutcome {
    pub id: ObjectId,
    pub result: Result<ObjectId>,
    pub elapsed: Duration,
}

/// Bounded-concurrency driver for a whole run
pub struct Dispatcher {
    exporter: Arc<ObjectExporter>,
    storage: Arc<StorageRoot>,
    workers: usize,
    stats: Arc<RunStats>,
    progress: ProgressBar,
}

impl Dispatcher {
    /// `workers` is clamped into the supported range
    pub fn new(exporter: Arc<ObjectExporter>, storage: Arc<StorageRoot>, workers: usize) -> Self {
        Self {
            exporter,
            storage,
            workers: clamp_workers(workers),
            stats: Arc::new(RunStats::new()),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report progress on `progress` while running
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Dispatch every reference and wait for all submitted exports to
    /// finish. A discovery error stops submission and is returned once the
    /// exports already queued have drained.
    pub fn run<I>(&self, references: I) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let started = Instant::now();
        let (job_tx, job_rx) = bounded::<ObjectId>(self.workers * QUEUE_SLOTS_PER_WORKER);
        let (done_tx, done_rx) = unbounded::<ExportOutcome>();

        let collector = {
            let stats = Arc::clone(&self.stats);
            let progress = self.progress.clone();
            thread::Builder::new()
                .name("export-collector".to_string())
                .spawn(move || collect(done_rx, &stats, &progress))?
        };

        let mut handles = Vec::with_capacity(self.workers);
        for index in 0..self.workers {
            handles.push(spawn_worker(
                index,
                Arc::clone(&self.exporter),
                job_rx.clone(),
                done_tx.clone(),
            )?);
        }
        drop(job_rx);
        drop(done_tx);

        let discovery = self.discover(references, &job_tx);
        drop(job_tx);

        let mut worker_panicked = false;
        for handle in handles {
            worker_panicked |= handle.join().is_err();
        }
        collector
            .join()
            .map_err(|_| OcflError::internal("export collector thread panicked"))?;

        discovery?;
        if worker_panicked {
            return Err(OcflError::internal("an export worker thread panicked"));
        }

        let summary = self.stats.summary(started.elapsed());
        info!(
            discovered = summary.discovered,
            skipped = summary.skipped,
            committed = summary.committed,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "run complete"
        );
        Ok(summary)
    }

    fn discover<I>(&self, references: I, jobs: &Sender<ObjectId>) -> Result<()>
    where
        I: IntoIterator<Item = Result<String>>,
    {
        let mut seen = HashSet::new();

        for reference in references {
            let reference = reference.map_err(|e| match e {
                OcflError::Discovery { .. } => e,
                other => OcflError::discovery(other.to_string()),
            })?;
            RunStats::bump(&self.stats.discovered);

            let id = match ObjectId::parse(&reference) {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        reference = %reference,
                        error = %e,
                        "skipping reference that is not an object identifier"
                    );
                    RunStats::bump(&self.stats.failed);
                    continue;
                }
            };

            if !seen.insert(id) {
                debug!(id = %id, "reference returned twice by discovery");
                continue;
            }

            if self.storage.exists(&id) {
                info!(id = %id, "object already exists in the storage root, skipping");
                RunStats::bump(&self.stats.skipped);
                self.progress.set_message(self.stats.progress_message());
                continue;
            }

            jobs.send(id).map_err(|_| {
                OcflError::internal("export workers stopped before discovery finished")
            })?;
            RunStats::bump(&self.stats.submitted);
            info!(id = %id, "export submitted");
        }

        Ok(())
    }
}

fn spawn_worker(
    index: usize,
    exporter: Arc<ObjectExporter>,
    jobs: Receiver<ObjectId>,
    done: Sender<ExportOutcome>,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("export-worker-{}", index))
        .spawn(move || {
            for id in jobs.iter() {
                let started = Instant::now();
                let result = exporter.export(&id);
                let outcome = ExportOutcome {
                    id,
                    result,
                    elapsed: started.elapsed(),
                };
                if done.send(outcome).is_err() {
                    break;
                }
            }
        })?;
    Ok(handle)
}

fn collect(outcomes: Receiver<ExportOutcome>, stats: &RunStats, progress: &ProgressBar) {
    for outcome in outcomes.iter() {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        match outcome.result {
            Ok(id) => {
                RunStats::bump(&stats.committed);
                info!(id = %id, elapsed_ms, "object committed");
            }
            Err(e) if e.is_format_error() => {
                RunStats::bump(&stats.failed);
                RunStats::bump(&stats.format_failures);
                error!(
                    id = %outcome.id,
                    elapsed_ms,
                    error = %e,
                    "export package is not shaped as expected"
                );
            }
            Err(e) => {
                RunStats::bump(&stats.failed);
                warn!(id = %outcome.id, elapsed_ms, error = %e, "export failed");
            }
        }
        progress.set_message(stats.progress_message());
    }
}
