//! Coordinator: spawns the worker pool, merges what it reports and writes
//! the summary.

use std::io::Write;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, error, info};

use crate::config::SolverConfig;
use crate::cursor::SharedCursor;
use crate::error::{Result, SolveError};
use crate::input::InputFile;
use crate::record::RecordTable;
use crate::worker::{Worker, WorkerReport};

/// Message a worker thread sends exactly once before exiting.
enum WorkerEvent {
    Done(WorkerReport),
    Failed { worker: usize, error: SolveError },
}

/// What one worker did during a successful run.
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub worker: usize,
    pub chunks: Vec<Range<u64>>,
    pub keys: usize,
}

/// Diagnostics of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub file_size: u64,
    /// Ordered by the time each worker reported.
    pub workers: Vec<WorkerSummary>,
    pub keys: usize,
    /// Records parsed across all workers.
    pub measurements: u64,
}

impl RunReport {
    /// Every consumed byte range across all workers, sorted by start offset.
    pub fn consumed_ranges(&self) -> Vec<Range<u64>> {
        let mut ranges: Vec<_> = self
            .workers
            .iter()
            .flat_map(|w| w.chunks.iter().cloned())
            .collect();
        ranges.sort_by_key(|r| r.start);
        ranges
    }
}

/// Runs one aggregation over one input file.
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Aggregate the input and write the summary line to `output`.
    ///
    /// Nothing is written unless every worker succeeded. On the first worker
    /// failure the remaining workers are told to stop and the failure is
    /// returned as is, without waiting for them.
    pub fn run<W: Write>(&self, output: &mut W) -> Result<RunReport> {
        self.run_with(output, Arc::new(AtomicBool::new(false)))
    }

    /// Like `run`, with the stop flag shared by every worker supplied by the caller.
    fn run_with<W: Write>(&self, output: &mut W, cancelled: Arc<AtomicBool>) -> Result<RunReport> {
        self.config.validate()?;

        // Surface access problems before any worker is spawned.
        let file_size = InputFile::open(&self.config.input_path)?.size();

        info!(
            input = %self.config.input_path.display(),
            file_size,
            workers = self.config.worker_count,
            chunk_size = self.config.chunk_size,
            "starting run"
        );

        let cursor = SharedCursor::new();
        let (events, handles) = match self.spawn_workers(&cursor, &cancelled) {
            Ok(pool) => pool,
            Err(e) => {
                cancelled.store(true, Ordering::Release);
                return Err(e);
            }
        };

        let mut merged = RecordTable::new();
        let mut workers = Vec::with_capacity(handles.len());

        while workers.len() < handles.len() {
            match events.recv() {
                Ok(WorkerEvent::Done(report)) => {
                    debug!(
                        worker = report.worker,
                        chunks = report.chunks.len(),
                        keys = report.table.len(),
                        "worker reported"
                    );
                    workers.push(WorkerSummary {
                        worker: report.worker,
                        chunks: report.chunks,
                        keys: report.table.len(),
                    });
                    merged.merge_table(report.table);
                }
                Ok(WorkerEvent::Failed { worker, error: e }) => {
                    error!(worker, error = %e, "worker failed, cancelling the rest");
                    abandon(&cancelled, handles);
                    return Err(e);
                }
                Err(_) => {
                    // Every sender is gone, so some worker died without reporting.
                    let worker = (0..handles.len())
                        .find(|id| !workers.iter().any(|w| w.worker == *id))
                        .unwrap_or_default();
                    error!(worker, "worker stopped without reporting");
                    abandon(&cancelled, handles);
                    return Err(SolveError::WorkerPanicked { worker });
                }
            }
        }

        for handle in handles {
            let _ = handle.join();
        }
        debug!(cursor = cursor.read(), file_size, "input exhausted");

        let keys = merged.len();
        let measurements = merged.measurements();
        let summary = merged.render();
        output.write_all(&summary)?;
        output.flush()?;

        info!(keys, measurements, "run complete");

        Ok(RunReport {
            file_size,
            workers,
            keys,
            measurements,
        })
    }

    fn spawn_workers(
        &self,
        cursor: &SharedCursor,
        cancelled: &Arc<AtomicBool>,
    ) -> Result<(Receiver<WorkerEvent>, Vec<JoinHandle<()>>)> {
        let (tx, rx) = unbounded();
        let mut handles = Vec::with_capacity(self.config.worker_count);

        for id in 0..self.config.worker_count {
            let worker = Worker::new(
                id,
                self.config.input_path.clone(),
                cursor.to_shareable(),
                self.config.chunk_size,
                Arc::clone(cancelled),
            );
            let tx = tx.clone();
            let handle = thread::Builder::new()
                .name(format!("worker-{id:02}"))
                .spawn(move || {
                    let event = match worker.run() {
                        Ok(report) => WorkerEvent::Done(report),
                        Err(error) => WorkerEvent::Failed { worker: id, error },
                    };
                    // The coordinator may already have given up on us.
                    let _ = tx.send(event);
                })?;
            handles.push(handle);
        }

        Ok((rx, handles))
    }
}

/// Ask every worker to stop and detach from them without waiting.
fn abandon(cancelled: &AtomicBool, handles: Vec<JoinHandle<()>>) {
    cancelled.store(true, Ordering::Release);
    drop(handles);
}

/// Aggregate `config.input_path` and write the summary to `output`.
pub fn solve<W: Write>(config: SolverConfig, output: &mut W) -> Result<()> {
    Solver::new(config).run(output).map(|_| ())
}
