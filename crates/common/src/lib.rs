//! httpscan common - Shared types and traits
//!
//! This crate provides the data model, collaborator traits and error
//! taxonomy used across the httpscan workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{HttpScanError, HttpScanResult};
pub use traits::{Discovery, HttpProbe, Plugin};
pub use types::{
    Credentials, Definition, HeaderRules, HttpResponse, Identity, Meta, MetaValue, Rules,
    ScanJob, ScanOptions, ScanReport, ScanStats, Target,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
