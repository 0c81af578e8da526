//! Progress tracking

use std::time::Duration;
use tokio::sync::Mutex;

use httpscan_common::{ScanReport, ScanStats};

#[derive(Default)]
pub struct ProgressTracker {
    stats: Mutex<ScanStats>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting a new job.
    pub async fn set_total(&self, total: usize) {
        *self.stats.lock().await = ScanStats::new(total);
    }

    pub async fn record(&self, report: &ScanReport) {
        self.stats.lock().await.update(report);
    }

    pub async fn record_failure(&self) {
        self.stats.lock().await.record_failure();
    }

    pub async fn snapshot(&self) -> ScanStats {
        self.stats.lock().await.clone()
    }

    /// Stamp the elapsed time and return the final counters.
    pub async fn finish(&self, elapsed: Duration) -> ScanStats {
        let mut stats = self.stats.lock().await;
        stats.elapsed = elapsed;
        stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpscan_common::{Identity, Target};
    use std::net::{IpAddr, Ipv4Addr};

    #[tokio::test]
    async fn counts_outcomes() {
        let progress = ProgressTracker::new();
        progress.set_total(3).await;

        let target = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80);
        progress
            .record(&ScanReport::new(target, 200, Identity::unmatched("x")))
            .await;
        progress.record_failure().await;

        let snapshot = progress.snapshot().await;
        assert_eq!(snapshot.total_targets, 3);
        assert_eq!(snapshot.unidentified, 1);
        assert_eq!(snapshot.failed, 1);

        let done = progress.finish(Duration::from_secs(2)).await;
        assert_eq!(done.elapsed, Duration::from_secs(2));
    }
}
