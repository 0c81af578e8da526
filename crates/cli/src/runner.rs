// runner.rs
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::args::Cli;
use crate::output::print_results;
use httpscan_common::{Discovery, HttpProbe, ScanJob, ScanOptions};
use httpscan_fingerprint::{to_json_pretty, DefinitionStore, DefinitionSynthesizer, IdentityResolver};
use httpscan_orchestrator::{cancel_channel, Orchestrator, TargetPipeline};
use httpscan_plugin_host::{PluginChain, PluginRegistry};
use httpscan_scanner::{ReqwestProbe, TcpDiscovery};
use httpscan_telemetry::LogReporter;

/// Map command-line flags onto scan options.
pub fn build_options(cli: &Cli) -> ScanOptions {
    let preset = if cli.fast {
        ScanOptions::fast()
    } else {
        ScanOptions::default()
    };

    let mut options = preset
        .with_port(cli.port)
        .with_verify_tls(!cli.insecure)
        .with_concurrency(cli.concurrency)
        .with_rate_limit(cli.rate_limit);
    if let Some(ms) = cli.timeout {
        options = options.with_timeout(Duration::from_millis(ms.max(1)));
    }
    options
}

pub async fn run_scan(cli: &Cli) -> Result<()> {
    let options = build_options(cli);
    info!("Starting scan...");
    info!("Targets: {}", cli.hosts);
    info!("Port: {}", options.port);
    info!("Concurrency: {}", options.concurrency);
    if let Some(rate) = options.rate_limit {
        info!("Rate limit: {}/s", rate);
    }

    // A missing definitions directory is fatal before anything is probed.
    let store = DefinitionStore::load(&cli.definitions)?;

    let probe: Arc<dyn HttpProbe> = Arc::new(ReqwestProbe::from_options(&options)?);
    let resolver = Arc::new(IdentityResolver::new(Arc::new(store)));
    let registry = Arc::new(PluginRegistry::with_builtins(probe.clone()));
    let chain = Arc::new(PluginChain::new(registry));
    let pipeline = Arc::new(TargetPipeline::new(probe, resolver, chain));

    let discovery = TcpDiscovery::from_options(&options);
    let targets = discovery
        .discover(&cli.hosts, options.port, cli.fast)
        .await
        .with_context(|| format!("Failed to expand targets {}", cli.hosts))?;

    if targets.is_empty() {
        info!("No hosts found with port {} open.", options.port);
        return Ok(());
    }

    let orchestrator = Orchestrator::new(
        pipeline,
        Arc::new(LogReporter::new()),
        options.concurrency,
        options.rate_limit,
    );
    orchestrator.submit_job(ScanJob::new(targets)).await?;

    let (cancel_tx, cancel_rx) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping scan");
            let _ = cancel_tx.send(true);
        }
    });

    let scan_start = Instant::now();
    orchestrator.run(cancel_rx).await?;
    let scan_duration = scan_start.elapsed();

    let results = orchestrator.get_results().await;
    print_results(&results, &cli.output_format, scan_duration)?;
    Ok(())
}

/// Write one definition per comma-separated host.
pub async fn run_create(cli: &Cli) -> Result<()> {
    let options = build_options(cli);
    let probe: Arc<dyn HttpProbe> = Arc::new(ReqwestProbe::from_options(&options)?);
    let synthesizer = DefinitionSynthesizer::new(cli.definitions.clone(), probe);

    let mut failed = 0;
    for host in cli.hosts.split(',').map(str::trim).filter(|h| !h.is_empty()) {
        match synthesizer.create(host).await {
            Ok(definition) => println!("{}", to_json_pretty(&definition)?.trim_end()),
            Err(e) => {
                error!("{}: {}", host, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} definition(s) not created", failed);
    }
    Ok(())
}
