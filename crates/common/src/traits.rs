//! Seams between the fingerprinting engine and its collaborators
//!
//! Discovery and the HTTP transport are black boxes to the engine; plugins
//! are looked up by name and chained.

use crate::types::{Credentials, HttpResponse, Identity, Target};
use anyhow::Result;
use async_trait::async_trait;

/// Finds hosts that answer on a port.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Expand `target_spec` and return every `(host, port)` that is open.
    async fn discover(&self, target_spec: &str, port: u16, fast: bool) -> Result<Vec<Target>>;
}

/// Performs a single HTTP GET.
///
/// Timeout and TLS verification are fixed when the probe is built.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn get(&self, url: &str, auth: Option<&Credentials>) -> Result<HttpResponse>;
}

/// A named, chainable enrichment step run after an identity is resolved.
///
/// Plugins receive their own copy of the identity; returning an error
/// leaves the caller's identity untouched.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name used in definition files.
    fn name(&self) -> &str;

    async fn run(
        &self,
        target: &Target,
        identity: Identity,
        response: &HttpResponse,
    ) -> Result<Identity>;
}
