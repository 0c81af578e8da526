// crates/orchestrator/src/orchestrator.rs
//! Orchestrator - job scheduling and worker coordination

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument};

use httpscan_common::{ScanJob, ScanReport, Target};
use httpscan_telemetry::Reporter;

use crate::pipeline::TargetPipeline;
use crate::progress::ProgressTracker;
use crate::rate_limiter::RateLimiter;

/// Sender side flips to `true` to stop a running job.
pub fn cancel_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolves once cancellation is requested. Never resolves if the sender
/// is gone without having cancelled.
async fn cancelled(signal: &mut watch::Receiver<bool>) {
    loop {
        if *signal.borrow() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Orchestrator coordinates scan jobs, workers, rate limiting and collects results.
pub struct Orchestrator {
    job_queue: Arc<Mutex<VecDeque<ScanJob>>>,
    rate_limiter: Option<Arc<RateLimiter>>,
    progress: Arc<ProgressTracker>,
    pipeline: Arc<TargetPipeline>,
    reporter: Arc<dyn Reporter>,
    concurrency: usize,
    results: Arc<Mutex<Vec<ScanReport>>>,
}

impl Orchestrator {
    /// Create a new orchestrator with a concurrency limit and an optional
    /// rate limit (requests/sec).
    pub fn new(
        pipeline: Arc<TargetPipeline>,
        reporter: Arc<dyn Reporter>,
        concurrency: usize,
        rate_limit: Option<u64>,
    ) -> Self {
        Self {
            job_queue: Arc::new(Mutex::new(VecDeque::new())),
            rate_limiter: rate_limit.map(|r| Arc::new(RateLimiter::new(r))),
            progress: Arc::new(ProgressTracker::new()),
            pipeline,
            reporter,
            concurrency: concurrency.max(1),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Submit a scan job to the queue.
    pub async fn submit_job(&self, job: ScanJob) -> Result<()> {
        self.job_queue.lock().await.push_back(job);
        Ok(())
    }

    /// Run the next queued job to completion or until `cancel` fires.
    #[instrument(skip(self, cancel))]
    pub async fn run(&self, cancel: watch::Receiver<bool>) -> Result<()> {
        let job = match self.job_queue.lock().await.pop_front() {
            Some(j) => j,
            None => return Ok(()),
        };

        info!("Starting job {} targets={}", job.id, job.target_count());
        self.progress.set_total(job.target_count()).await;
        self.reporter.begin(&job);
        let start = Instant::now();

        let queue = Arc::new(Mutex::new(job.targets.iter().cloned().collect::<VecDeque<Target>>()));

        let mut workers = Vec::new();
        for _ in 0..self.concurrency.min(job.target_count()) {
            let queue = queue.clone();
            let rate_limiter = self.rate_limiter.clone();
            let pipeline = self.pipeline.clone();
            let reporter = self.reporter.clone();
            let progress = self.progress.clone();
            let results = self.results.clone();
            let mut cancel = cancel.clone();

            let worker = tokio::spawn(async move {
                loop {
                    if *cancel.borrow() {
                        break;
                    }

                    let maybe_target = {
                        let mut q = queue.lock().await;
                        q.pop_front()
                    };
                    let target = match maybe_target {
                        Some(t) => t,
                        None => break,
                    };

                    if let Some(limiter) = &rate_limiter {
                        tokio::select! {
                            _ = limiter.acquire() => {}
                            _ = cancelled(&mut cancel) => break,
                        }
                    }

                    tokio::select! {
                        biased;
                        _ = cancelled(&mut cancel) => break,
                        outcome = pipeline.process(&target) => match outcome {
                            Ok(report) => {
                                reporter.report(&report);
                                progress.record(&report).await;
                                results.lock().await.push(report);
                            }
                            Err(e) => {
                                debug!("{} request error: {:#}", target.url(), e);
                                progress.record_failure().await;
                            }
                        },
                    }
                }
            });
            workers.push(worker);
        }

        for w in workers {
            if let Err(e) = w.await {
                error!("Worker for job {} stopped abnormally: {}", job.id, e);
            }
        }

        if *cancel.borrow() {
            info!("Job {} cancelled", job.id);
        } else {
            // only reachable when a worker died with targets still queued
            let stranded: Vec<Target> = queue.lock().await.drain(..).collect();
            for target in stranded {
                debug!("{} never fingerprinted", target.url());
                self.progress.record_failure().await;
            }
        }

        let stats = self.progress.finish(start.elapsed()).await;
        self.reporter.finish(&stats);
        Ok(())
    }

    /// Results collected so far, ordered by target.
    pub async fn get_results(&self) -> Vec<ScanReport> {
        let mut results = self.results.lock().await.clone();
        results.sort_by(|a, b| a.target.cmp(&b.target));
        results
    }

    pub async fn stats(&self) -> httpscan_common::ScanStats {
        self.progress.snapshot().await
    }
}
