//! Definition synthesizer - derives a new definition file from one host

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use httpscan_common::{Definition, HttpProbe, HttpScanError, HttpScanResult};

use crate::store::{DEFINITION_EXTENSION, TEMPLATE_NAME};

pub struct DefinitionSynthesizer {
    dir: PathBuf,
    probe: Arc<dyn HttpProbe>,
}

impl DefinitionSynthesizer {
    pub fn new<P: Into<PathBuf>>(dir: P, probe: Arc<dyn HttpProbe>) -> Self {
        Self {
            dir: dir.into(),
            probe,
        }
    }

    /// Lower-cased `Server` header with everything but ASCII letters and digits removed.
    pub fn derive_name(server: &str) -> Option<String> {
        let name: String = server
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect();
        (!name.is_empty()).then_some(name)
    }

    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name, DEFINITION_EXTENSION))
    }

    pub fn template_path(&self) -> PathBuf {
        self.definition_path(TEMPLATE_NAME)
    }

    pub async fn load_template(&self) -> HttpScanResult<Definition> {
        let path = self.template_path();
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            HttpScanError::Config(format!("template {} unreadable: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| HttpScanError::Definition {
            name: TEMPLATE_NAME.to_string(),
            reason: e.to_string(),
        })
    }

    /// Probe `host` and persist a definition matching its `Server` header.
    ///
    /// Never overwrites an existing file; nothing is written on failure.
    pub async fn create(&self, host: &str) -> HttpScanResult<Definition> {
        let url = format!("http://{}/", host);
        let response = self.probe.get(&url, None).await.map_err(|e| {
            debug!("{} request error: {:#}", url, e);
            HttpScanError::Network(format!("{}: {:#}", url, e))
        })?;

        let server = response.server();
        let name = Self::derive_name(server).ok_or_else(|| {
            debug!("Unable to find proper information to create a definition of {}", url);
            HttpScanError::Unidentifiable(url.clone())
        })?;

        let path = self.definition_path(&name);
        if path.exists() {
            warn!("Definition {} already exists", name);
            return Err(HttpScanError::AlreadyExists(name));
        }

        let mut definition = self.load_template().await?;
        definition.name = name.clone();
        definition.rules.headers.server = vec![server.to_string()];

        let json = to_json_pretty(&definition)?;
        write_new(&path, &name, json.as_bytes()).await?;

        info!("Definition {} written to {}", name, path.display());
        Ok(definition)
    }
}

/// Pretty JSON with 4-space indentation and a trailing newline.
pub fn to_json_pretty<T: Serialize>(value: &T) -> HttpScanResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    String::from_utf8(buf).map_err(|e| HttpScanError::Parse(e.to_string()))
}

async fn write_new(path: &Path, name: &str, contents: &[u8]) -> HttpScanResult<()> {
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            warn!("Definition {} already exists", name);
            return Err(HttpScanError::AlreadyExists(name.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let written = async {
        file.write_all(contents).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DefinitionStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use httpscan_common::{Credentials, HttpResponse};
    use tempfile::TempDir;

    struct FixedProbe {
        server: Option<&'static str>,
    }

    #[async_trait]
    impl HttpProbe for FixedProbe {
        async fn get(&self, _url: &str, _auth: Option<&Credentials>) -> Result<HttpResponse> {
            let mut response = HttpResponse::new(200);
            if let Some(server) = self.server {
                response.insert_header("Server", server);
            }
            Ok(response)
        }
    }

    struct DownProbe;

    #[async_trait]
    impl HttpProbe for DownProbe {
        async fn get(&self, url: &str, _auth: Option<&Credentials>) -> Result<HttpResponse> {
            anyhow::bail!("connection refused: {}", url)
        }
    }

    fn definitions_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("template.json"),
            r#"{"name": "", "rules": {"headers": {"server": []}}, "meta": {"source": "synthesized"}}"#,
        )
        .unwrap();
        dir
    }

    fn synthesizer(dir: &TempDir, server: Option<&'static str>) -> DefinitionSynthesizer {
        DefinitionSynthesizer::new(dir.path(), Arc::new(FixedProbe { server }))
    }

    #[test]
    fn derive_name_keeps_letters_and_digits() {
        assert_eq!(
            DefinitionSynthesizer::derive_name("Apache/2.4.41 (Ubuntu)").as_deref(),
            Some("apache2441ubuntu")
        );
        assert_eq!(
            DefinitionSynthesizer::derive_name("mini_httpd/1.19 19dec2003").as_deref(),
            Some("minihttpd11919dec2003")
        );
        assert_eq!(DefinitionSynthesizer::derive_name("/-_ ()"), None);
        assert_eq!(DefinitionSynthesizer::derive_name(""), None);
    }

    #[tokio::test]
    async fn create_writes_definition_from_template() {
        let dir = definitions_dir();
        let s = synthesizer(&dir, Some("Boa/0.94.14rc21"));

        let definition = s.create("10.0.0.1").await.unwrap();
        assert_eq!(definition.name, "boa09414rc21");
        assert_eq!(definition.rules.headers.server, vec!["Boa/0.94.14rc21"]);
        assert!(definition.meta.contains_key("source"));

        let path = dir.path().join("boa09414rc21.json");
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n    \"name\": \"boa09414rc21\""));

        let store = DefinitionStore::load(dir.path()).unwrap();
        assert_eq!(store.get("boa09414rc21"), Some(&definition));
    }

    #[tokio::test]
    async fn second_create_reports_conflict_and_keeps_first_file() {
        let dir = definitions_dir();
        synthesizer(&dir, Some("Acme Web 1.0")).create("10.0.0.1").await.unwrap();
        let path = dir.path().join("acmeweb10.json");
        let first = std::fs::read_to_string(&path).unwrap();

        // different raw header, same derived name
        let err = synthesizer(&dir, Some("ACME-web/1.0"))
            .create("10.0.0.2")
            .await
            .unwrap_err();
        assert!(matches!(err, HttpScanError::AlreadyExists(ref n) if n == "acmeweb10"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[tokio::test]
    async fn missing_server_header_is_unidentifiable() {
        let dir = definitions_dir();
        let err = synthesizer(&dir, None).create("10.0.0.1").await.unwrap_err();
        assert!(matches!(err, HttpScanError::Unidentifiable(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn probe_failure_writes_nothing() {
        let dir = definitions_dir();
        let s = DefinitionSynthesizer::new(dir.path(), Arc::new(DownProbe));
        let err = s.create("10.0.0.1").await.unwrap_err();
        assert!(matches!(err, HttpScanError::Network(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_template_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let err = synthesizer(&dir, Some("nginx")).create("10.0.0.1").await.unwrap_err();
        assert!(matches!(err, HttpScanError::Config(_)));
        assert!(!dir.path().join("nginx.json").exists());
    }
}
