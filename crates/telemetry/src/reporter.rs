//! Result reporting
//!
//! A `Reporter` is built by the caller and handed to the orchestrator,
//! which calls `begin` before the first target, `report` once per
//! fingerprinted target and `finish` after the last.

use metrics::counter;
use tracing::info;

use httpscan_common::{ScanJob, ScanReport, ScanStats};

pub trait Reporter: Send + Sync {
    fn begin(&self, job: &ScanJob);

    fn report(&self, report: &ScanReport);

    fn finish(&self, stats: &ScanStats);
}

/// Emits `host|identity_name|identity_meta` at info level and counts outcomes.
#[derive(Debug, Default)]
pub struct LogReporter;

impl LogReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for LogReporter {
    fn begin(&self, job: &ScanJob) {
        counter!("httpscan_jobs_total").increment(1);
        info!("Fingerprinting {} target(s), job {}", job.target_count(), job.id);
    }

    fn report(&self, report: &ScanReport) {
        counter!("httpscan_targets_reported_total").increment(1);
        if report.identity.is_matched() {
            counter!("httpscan_identified_total").increment(1);
        } else {
            counter!("httpscan_unidentified_total").increment(1);
        }
        info!("{}", report.log_line());
    }

    fn finish(&self, stats: &ScanStats) {
        counter!("httpscan_probe_failures_total").increment(stats.failed as u64);
        info!("Scan Summary:");
        info!("  Total targets: {}", stats.total_targets);
        info!("  Identified: {}", stats.identified);
        info!("  Unidentified: {}", stats.unidentified);
        info!("  Failed: {}", stats.failed);
        info!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    }
}
