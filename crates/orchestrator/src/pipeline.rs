//! Per-target pipeline: probe, resolve, run plugins

use anyhow::Result;
use std::sync::Arc;
use tracing::instrument;

use httpscan_common::{HttpProbe, ScanReport, Target};
use httpscan_fingerprint::IdentityResolver;
use httpscan_plugin_host::PluginChain;

pub struct TargetPipeline {
    probe: Arc<dyn HttpProbe>,
    resolver: Arc<IdentityResolver>,
    chain: Arc<PluginChain>,
}

impl TargetPipeline {
    pub fn new(
        probe: Arc<dyn HttpProbe>,
        resolver: Arc<IdentityResolver>,
        chain: Arc<PluginChain>,
    ) -> Self {
        Self {
            probe,
            resolver,
            chain,
        }
    }

    /// Fingerprint one target. Only the primary probe can fail; plugin
    /// failures are absorbed by the chain.
    #[instrument(skip(self))]
    pub async fn process(&self, target: &Target) -> Result<ScanReport> {
        let response = self.probe.get(&target.url(), None).await?;
        let identity = self.resolver.resolve(&response);
        let identity = self.chain.run(target, identity, &response).await;
        Ok(ScanReport::new(target.clone(), response.status, identity))
    }
}
