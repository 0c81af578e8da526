//! HTTP probe backed by reqwest

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use httpscan_common::{Credentials, HttpProbe, HttpResponse, ScanOptions};

const USER_AGENT: &str = concat!("httpscan/", env!("CARGO_PKG_VERSION"));

pub struct ReqwestProbe {
    client: Client,
    timeout: Duration,
    verify_tls: bool,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self> {
        if !verify_tls {
            warn!("TLS certificate verification is disabled for HTTP probes");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            timeout,
            verify_tls,
        })
    }

    pub fn from_options(options: &ScanOptions) -> Result<Self> {
        Self::new(options.timeout, options.verify_tls)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    #[instrument(skip(self, auth))]
    async fn get(&self, url: &str, auth: Option<&Credentials>) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        if let Some(credentials) = auth {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("{} request error", url))?;

        let mut response = HttpResponse::new(resp.status().as_u16());
        for (name, value) in resp.headers() {
            // first occurrence wins for repeated headers
            if response.header(name.as_str()).is_some() {
                continue;
            }
            response.insert_header(name.as_str(), header_text(value));
        }

        response.body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("{} body read error: {}", url, e);
                String::new()
            }
        };

        debug!("{} -> {} ({} bytes)", url, response.status, response.body.len());
        Ok(response)
    }
}

/// Header value as text. Bytes that are not UTF-8 are replaced, not dropped.
fn header_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}
