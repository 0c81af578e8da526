use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "httpscan")]
#[command(version)]
#[command(about = "Definition-driven HTTP server fingerprinting", long_about = None)]
pub struct Cli {
    /// Hosts to fingerprint. Examples: 10.0.0.1, 10.0.0.0/24, 10.0.0.1-50, example.com
    #[arg(required = true)]
    pub hosts: String,

    /// Aggressive timing: shorter connect and request timeouts
    #[arg(long)]
    pub fast: bool,

    /// Probe the hosts and write a new definition for each instead of scanning
    #[arg(long)]
    pub definitions_create: bool,

    /// Directory holding the definition files
    #[arg(long, default_value = "definitions")]
    pub definitions: PathBuf,

    /// Port probed on every host
    #[arg(short, long, default_value = "80")]
    pub port: u16,

    /// HTTP timeout in milliseconds (overrides the preset)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Targets fingerprinted in parallel
    #[arg(short, long, default_value = "16")]
    pub concurrency: usize,

    /// Rate limit (requests per second), unlimited when absent
    #[arg(short = 'r', long)]
    pub rate_limit: Option<u64>,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Output format: log, json, csv, text
    #[arg(short, long, default_value = "log", value_parser = ["log", "json", "csv", "text"])]
    pub output_format: String,

    /// Log file path
    #[arg(long, default_value = httpscan_telemetry::DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Only log to the console
    #[arg(long)]
    pub no_log_file: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
