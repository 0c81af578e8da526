//! Version extraction from the `Server` header

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use httpscan_common::{HttpResponse, Identity, Plugin, Target};

/// `name/version` in the first header token, e.g. `Microsoft-IIS/7.5`.
static SLASH_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.*/(.+)$").expect("slash version regex"));

/// Token after `nginx/`, e.g. `nginx/1.4.6 (Ubuntu)`.
static NGINX_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^nginx/(\S+)").expect("nginx version regex"));

/// Meta key the extracted version is stored under.
pub const VERSION_KEY: &str = "version";

/// Sets `meta.version` from the `Server` header. A header without a
/// version token leaves the identity as it is.
pub struct HeaderVersionPlugin {
    name: &'static str,
    pattern: &'static Lazy<Regex>,
    first_token_only: bool,
}

impl HeaderVersionPlugin {
    pub fn slash_version() -> Self {
        Self {
            name: "server-header-slash-version",
            pattern: &SLASH_VERSION_RE,
            first_token_only: true,
        }
    }

    pub fn nginx_version() -> Self {
        Self {
            name: "nginx-version",
            pattern: &NGINX_VERSION_RE,
            first_token_only: false,
        }
    }

    pub fn extract(&self, server: &str) -> Option<String> {
        let subject = if self.first_token_only {
            server.split_whitespace().next()?
        } else {
            server
        };
        self.pattern
            .captures(subject)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl Plugin for HeaderVersionPlugin {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(
        &self,
        _target: &Target,
        mut identity: Identity,
        response: &HttpResponse,
    ) -> Result<Identity> {
        if let Some(version) = self.extract(response.server()) {
            identity.meta.insert(VERSION_KEY.to_string(), version.into());
        }
        Ok(identity)
    }
}
