//! Default credentials probe over HTTP Basic authentication
//!
//! Fires when the first response was a 401 and the definition carries
//! `default_username` / `default_password` in its meta. Retries the request
//! with those credentials; a 2xx answer is logged as a warning and recorded
//! as `username` / `password`. The default seeds are removed afterwards
//! whether or not the login worked.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use httpscan_common::{Credentials, HttpProbe, HttpResponse, Identity, Meta, Plugin, Target};

pub const PLUGIN_NAME: &str = "basic-auth-defaults";
pub const DEFAULT_USERNAME_KEY: &str = "default_username";
pub const DEFAULT_PASSWORD_KEY: &str = "default_password";
pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

pub struct BasicAuthDefaultsPlugin {
    probe: Arc<dyn HttpProbe>,
}

impl BasicAuthDefaultsPlugin {
    pub fn new(probe: Arc<dyn HttpProbe>) -> Self {
        Self { probe }
    }
}

fn seed(meta: &Meta, key: &str) -> Option<String> {
    meta.get(key)
        .map(|v| v.to_string())
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl Plugin for BasicAuthDefaultsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    async fn run(
        &self,
        target: &Target,
        mut identity: Identity,
        response: &HttpResponse,
    ) -> Result<Identity> {
        if response.status != 401 {
            return Ok(identity);
        }

        let username = seed(&identity.meta, DEFAULT_USERNAME_KEY);
        let password = seed(&identity.meta, DEFAULT_PASSWORD_KEY);
        if username.is_none() && password.is_none() {
            return Ok(identity);
        }

        let credentials = Credentials::new(username.unwrap_or_default(), password.unwrap_or_default());
        let url = target.url();
        let authenticated = self
            .probe
            .get(&url, Some(&credentials))
            .await
            .with_context(|| format!("authenticated request to {} failed", url))?;

        if authenticated.is_success() {
            warn!(
                "{} {} | {}: default credentials ({}:{})",
                url, identity.name, PLUGIN_NAME, credentials.username, credentials.password
            );
            identity
                .meta
                .insert(USERNAME_KEY.to_string(), credentials.username.into());
            identity
                .meta
                .insert(PASSWORD_KEY.to_string(), credentials.password.into());
        } else {
            debug!(
                "{} {} | {}: default credentials rejected ({})",
                url, identity.name, PLUGIN_NAME, authenticated.status
            );
        }

        identity.meta.remove(DEFAULT_USERNAME_KEY);
        identity.meta.remove(DEFAULT_PASSWORD_KEY);
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpscan_common::{Definition, MetaValue};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Mutex;

    /// Answers `status` and remembers what it was asked.
    struct RecordingProbe {
        status: Option<u16>,
        calls: Mutex<Vec<(String, Option<Credentials>)>>,
    }

    impl RecordingProbe {
        fn new(status: Option<u16>) -> Arc<Self> {
            Arc::new(Self {
                status,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Option<Credentials>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpProbe for RecordingProbe {
        async fn get(&self, url: &str, auth: Option<&Credentials>) -> Result<HttpResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), auth.cloned()));
            match self.status {
                Some(status) => Ok(HttpResponse::new(status)),
                None => anyhow::bail!("connection reset"),
            }
        }
    }

    fn target() -> Target {
        Target::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, 10)), 8080)
    }

    fn camera() -> Identity {
        let definition = Definition::new("ipcam")
            .with_server_pattern("Boa")
            .with_plugin(PLUGIN_NAME)
            .with_meta("vendor", "Acme")
            .with_meta(DEFAULT_USERNAME_KEY, "admin")
            .with_meta(DEFAULT_PASSWORD_KEY, "1234");
        Identity::from_definition("ipcam", &definition)
    }

    #[tokio::test]
    async fn successful_login_records_credentials() {
        let probe = RecordingProbe::new(Some(200));
        let plugin = BasicAuthDefaultsPlugin::new(probe.clone());

        let out = plugin
            .run(&target(), camera(), &HttpResponse::new(401))
            .await
            .unwrap();

        assert_eq!(out.meta.get(USERNAME_KEY), Some(&MetaValue::from("admin")));
        assert_eq!(out.meta.get(PASSWORD_KEY), Some(&MetaValue::from("1234")));
        assert!(!out.meta.contains_key(DEFAULT_USERNAME_KEY));
        assert!(!out.meta.contains_key(DEFAULT_PASSWORD_KEY));
        assert!(out.meta.contains_key("vendor"));

        let calls = probe.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "http://192.168.0.10:8080/");
        assert_eq!(calls[0].1, Some(Credentials::new("admin", "1234")));
    }

    #[tokio::test]
    async fn rejected_login_still_drops_seeds() {
        let probe = RecordingProbe::new(Some(401));
        let plugin = BasicAuthDefaultsPlugin::new(probe);

        let out = plugin
            .run(&target(), camera(), &HttpResponse::new(401))
            .await
            .unwrap();

        assert!(!out.meta.contains_key(USERNAME_KEY));
        assert!(!out.meta.contains_key(PASSWORD_KEY));
        assert!(!out.meta.contains_key(DEFAULT_USERNAME_KEY));
        assert!(!out.meta.contains_key(DEFAULT_PASSWORD_KEY));
    }

    #[tokio::test]
    async fn only_fires_on_401() {
        let probe = RecordingProbe::new(Some(200));
        let plugin = BasicAuthDefaultsPlugin::new(probe.clone());

        let out = plugin
            .run(&target(), camera(), &HttpResponse::new(200))
            .await
            .unwrap();

        assert_eq!(out, camera());
        assert!(probe.calls().is_empty());
    }

    #[tokio::test]
    async fn no_seeds_no_request() {
        let probe = RecordingProbe::new(Some(200));
        let plugin = BasicAuthDefaultsPlugin::new(probe.clone());
        let identity = Identity::from_definition("plain", &Definition::new("plain"));

        let out = plugin
            .run(&target(), identity.clone(), &HttpResponse::new(401))
            .await
            .unwrap();

        assert_eq!(out, identity);
        assert!(probe.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_reported() {
        let probe = RecordingProbe::new(None);
        let plugin = BasicAuthDefaultsPlugin::new(probe);

        let result = plugin.run(&target(), camera(), &HttpResponse::new(401)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn username_seed_alone_is_enough() {
        let probe = RecordingProbe::new(Some(200));
        let plugin = BasicAuthDefaultsPlugin::new(probe.clone());
        let definition = Definition::new("router").with_meta(DEFAULT_USERNAME_KEY, "admin");
        let identity = Identity::from_definition("router", &definition);

        let out = plugin
            .run(&target(), identity, &HttpResponse::new(401))
            .await
            .unwrap();

        let calls = probe.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Some(Credentials::new("admin", "")));
        assert_eq!(out.meta.get(USERNAME_KEY), Some(&MetaValue::from("admin")));
        assert_eq!(out.meta.get(PASSWORD_KEY), Some(&MetaValue::from("")));
        assert!(!out.meta.contains_key(DEFAULT_USERNAME_KEY));
    }
}
