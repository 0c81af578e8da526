//! Plugin host - post-identification enrichment
//!
//! Plugins are registered once at start-up and looked up by the names a
//! definition lists. `PluginChain` runs them in order for one target.

pub mod builtin;
mod chain;
mod registry;

pub use chain::PluginChain;
pub use registry::PluginRegistry;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use httpscan_common::{Credentials, Definition, HttpProbe, HttpResponse, Identity, MetaValue, Target};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    /// 200 for any authenticated request, 401 otherwise.
    struct AcceptAnyCredentials;

    #[async_trait]
    impl HttpProbe for AcceptAnyCredentials {
        async fn get(&self, _url: &str, auth: Option<&Credentials>) -> Result<HttpResponse> {
            Ok(HttpResponse::new(if auth.is_some() { 200 } else { 401 }))
        }
    }

    #[tokio::test]
    async fn builtin_chain_enriches_identity() {
        let registry = PluginRegistry::with_builtins(Arc::new(AcceptAnyCredentials));
        let chain = PluginChain::new(Arc::new(registry));

        let definition = Definition::new("nginx")
            .with_server_pattern("nginx")
            .with_plugin("nginx-version")
            .with_plugin("basic-auth-defaults")
            .with_meta(builtin::DEFAULT_USERNAME_KEY, "admin")
            .with_meta(builtin::DEFAULT_PASSWORD_KEY, "admin");
        let identity = Identity::from_definition("nginx", &definition);
        let response = HttpResponse::new(401).with_header("Server", "nginx/1.18.0");
        let target = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80);

        let out = chain.run(&target, identity, &response).await;
        assert_eq!(out.meta.get(builtin::VERSION_KEY), Some(&MetaValue::from("1.18.0")));
        assert_eq!(out.meta.get(builtin::USERNAME_KEY), Some(&MetaValue::from("admin")));
        assert!(!out.meta.contains_key(builtin::DEFAULT_USERNAME_KEY));
        assert!(!out.meta.contains_key(builtin::DEFAULT_PASSWORD_KEY));
        assert_eq!(definition.meta.len(), 2);
    }
}
