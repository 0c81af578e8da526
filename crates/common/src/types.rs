//! Core data types for httpscan
//!
//! - `Definition`: the declarative rule file, read-only for a scan run
//! - `Identity`: the per-host result threaded through resolution and plugins
//! - `HttpResponse`: what the HTTP probe collaborator hands back
//! - `ScanReport` / `ScanStats`: what gets emitted once a target is done
//!
//! `Identity` owns its metadata outright. Building one from a `Definition`
//! always deep-copies, so plugin mutations never reach the loaded store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// One `(host, port)` pair that answered on the target port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub ip: IpAddr,
    pub port: u16,
}

impl Target {
    #[inline]
    #[must_use]
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// `https` for the usual TLS ports, `http` otherwise.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self.port {
            443 | 8443 => "https",
            _ => "http",
        }
    }

    /// Root URL of the target, e.g. `http://10.0.0.1:80/`.
    #[must_use]
    pub fn url(&self) -> String {
        match self.ip {
            IpAddr::V4(ip) => format!("{}://{}:{}/", self.scheme(), ip, self.port),
            IpAddr::V6(ip) => format!("{}://[{}]:{}/", self.scheme(), ip, self.port),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Basic-auth credentials for a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Status, headers and body of one HTTP GET.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    #[inline]
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_header<N: AsRef<str>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.insert_header(name, value);
        self
    }

    #[must_use]
    pub fn with_body<B: Into<String>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn insert_header<N: AsRef<str>, V: Into<String>>(&mut self, name: N, value: V) {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Value of the `Server` header, empty when absent.
    #[inline]
    #[must_use]
    pub fn server(&self) -> &str {
        self.header("server").unwrap_or("")
    }

    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Scalar metadata value. Every observed `meta` entry is one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl MetaValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Integer(i) => write!(f, "{}", i),
            MetaValue::Float(x) => write!(f, "{}", x),
            MetaValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

/// Free-form identity metadata, ordered by key for stable output.
pub type Meta = BTreeMap<String, MetaValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderRules {
    pub server: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub headers: HeaderRules,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<String>,
}

/// Declarative rule set identifying one piece of server software.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub rules: Rules,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub meta: Meta,
}

impl Definition {
    #[must_use]
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_server_pattern<P: Into<String>>(mut self, pattern: P) -> Self {
        self.rules.headers.server.push(pattern.into());
        self
    }

    #[must_use]
    pub fn with_body_pattern<P: Into<String>>(mut self, pattern: P) -> Self {
        self.rules.body.push(pattern.into());
        self
    }

    #[must_use]
    pub fn with_plugin<P: Into<String>>(mut self, plugin: P) -> Self {
        self.plugins.push(plugin.into());
        self
    }

    #[must_use]
    pub fn with_meta<K: Into<String>, V: Into<MetaValue>>(mut self, key: K, value: V) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// What a target turned out to be running.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Definition name, or the raw `Server` header when nothing matched.
    pub name: String,
    /// Store key of the matched definition; `None` for a fallback identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,
    #[serde(default)]
    pub meta: Meta,
}

impl Identity {
    /// Fresh identity carrying its own copy of the definition's plugins and meta.
    #[must_use]
    pub fn from_definition(key: &str, definition: &Definition) -> Self {
        Self {
            name: definition.name.clone(),
            definition: Some(key.to_string()),
            plugins: definition.plugins.clone(),
            meta: definition.meta.clone(),
        }
    }

    /// Fallback identity named after the raw `Server` header.
    #[must_use]
    pub fn unmatched<S: Into<String>>(server: S) -> Self {
        Self {
            name: server.into(),
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.definition.is_some()
    }

    /// Compact JSON rendering of `meta`, `{}` when empty.
    #[must_use]
    pub fn meta_display(&self) -> String {
        serde_json::to_string(&self.meta).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Outcome of fingerprinting one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: Target,
    pub status: u16,
    pub identity: Identity,
    pub timestamp: DateTime<Utc>,
}

impl ScanReport {
    #[must_use]
    pub fn new(target: Target, status: u16, identity: Identity) -> Self {
        Self {
            target,
            status,
            identity,
            timestamp: Utc::now(),
        }
    }

    /// `host|identity_name|identity_meta`
    #[must_use]
    pub fn log_line(&self) -> String {
        format!(
            "{}|{}|{}",
            self.target.ip,
            self.identity.name,
            self.identity.meta_display()
        )
    }
}

/// A batch of discovered targets to fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: Uuid,
    pub targets: Vec<Target>,
    pub created_at: SystemTime,
}

impl ScanJob {
    #[inline]
    #[must_use]
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            id: Uuid::new_v4(),
            targets,
            created_at: SystemTime::now(),
        }
    }

    #[inline]
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

/// Scan behaviour tuning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Port probed on every discovered host.
    pub port: u16,
    /// Timeout for each HTTP request, including plugin-issued ones.
    pub timeout: Duration,
    /// Timeout for the discovery TCP connect.
    pub connect_timeout: Duration,
    pub verify_tls: bool,
    /// Targets fingerprinted in parallel.
    pub concurrency: usize,
    /// Connect checks in flight during discovery.
    pub discovery_concurrency: usize,
    pub rate_limit: Option<u64>, // requests per second
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            port: 80,
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_millis(800),
            verify_tls: true,
            concurrency: 16,
            discovery_concurrency: 256,
            rate_limit: None,
        }
    }
}

impl ScanOptions {
    /// Aggressive timing: short timeouts, wider discovery fan-out.
    #[inline]
    #[must_use]
    pub fn fast() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_millis(300),
            discovery_concurrency: 1024,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: Option<u64>) -> Self {
        self.rate_limit = rate_limit.filter(|r| *r > 0);
        self
    }
}

/// Run-level counters collected incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_targets: usize,
    pub scanned: usize,
    pub identified: usize,
    pub unidentified: usize,
    /// Targets whose primary probe failed.
    pub failed: usize,
    pub elapsed: Duration,
}

impl ScanStats {
    #[inline]
    #[must_use]
    pub fn new(total_targets: usize) -> Self {
        Self {
            total_targets,
            ..Default::default()
        }
    }

    /// Progress percentage in [0.0, 100.0].
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total_targets == 0 {
            0.0
        } else {
            ((self.scanned + self.failed) as f32 / self.total_targets as f32) * 100.0
        }
    }

    pub fn update(&mut self, report: &ScanReport) {
        self.scanned = self.scanned.saturating_add(1);
        if report.identity.is_matched() {
            self.identified = self.identified.saturating_add(1);
        } else {
            self.unidentified = self.unidentified.saturating_add(1);
        }
    }

    pub fn record_failure(&mut self) {
        self.failed = self.failed.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn target_urls() {
        let t = Target::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)), 80);
        assert_eq!(t.url(), "http://192.168.1.1:80/");
        assert_eq!(t.to_string(), "192.168.1.1:80");

        let t = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 443);
        assert_eq!(t.url(), "https://127.0.0.1:443/");

        let t = Target::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 8080);
        assert_eq!(t.url(), "http://[::1]:8080/");
    }

    #[test]
    fn response_headers_are_case_insensitive() {
        let r = HttpResponse::new(200).with_header("Server", "nginx/1.18.0");
        assert_eq!(r.header("server"), Some("nginx/1.18.0"));
        assert_eq!(r.header("SERVER"), Some("nginx/1.18.0"));
        assert_eq!(r.server(), "nginx/1.18.0");
        assert!(r.is_success());

        let r = HttpResponse::new(401);
        assert_eq!(r.server(), "");
        assert!(!r.is_success());
    }

    #[test]
    fn definition_parses_minimal_file() {
        let json = r#"{"name": "nginx", "rules": {"headers": {"server": ["nginx"]}}}"#;
        let d: Definition = serde_json::from_str(json).unwrap();
        assert_eq!(d.name, "nginx");
        assert_eq!(d.rules.headers.server, vec!["nginx"]);
        assert!(d.rules.body.is_empty());
        assert!(d.plugins.is_empty());
        assert!(d.meta.is_empty());
    }

    #[test]
    fn definition_requires_server_rules() {
        let json = r#"{"name": "broken", "rules": {"body": ["x"]}}"#;
        assert!(serde_json::from_str::<Definition>(json).is_err());
    }

    #[test]
    fn meta_values_keep_their_kind() {
        let json = r#"{"name": "n", "rules": {"headers": {"server": []}},
            "meta": {"version": "1.0", "port": 8080, "ratio": 0.5, "admin": true}}"#;
        let d: Definition = serde_json::from_str(json).unwrap();
        assert_eq!(d.meta["version"], MetaValue::String("1.0".to_string()));
        assert_eq!(d.meta["port"], MetaValue::Integer(8080));
        assert_eq!(d.meta["ratio"], MetaValue::Float(0.5));
        assert_eq!(d.meta["admin"], MetaValue::Bool(true));
    }

    #[test]
    fn identity_is_a_deep_copy() {
        let d = Definition::new("nginx")
            .with_server_pattern("nginx")
            .with_meta("vendor", "F5");
        let mut identity = Identity::from_definition("nginx", &d);
        identity.meta.insert("version".to_string(), "1.18.0".into());
        identity.meta.remove("vendor");

        assert_eq!(d.meta.len(), 1);
        assert!(d.meta.contains_key("vendor"));
        assert!(identity.is_matched());
    }

    #[test]
    fn report_log_line() {
        let t = Target::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 80);
        let mut identity = Identity::unmatched("lighttpd");
        let report = ScanReport::new(t.clone(), 200, identity.clone());
        assert_eq!(report.log_line(), "10.0.0.5|lighttpd|{}");

        identity.meta.insert("version".to_string(), "1.4".into());
        let report = ScanReport::new(t, 200, identity);
        assert_eq!(report.log_line(), r#"10.0.0.5|lighttpd|{"version":"1.4"}"#);
    }

    #[test]
    fn scan_options_presets() {
        let fast = ScanOptions::fast();
        assert!(fast.connect_timeout < ScanOptions::default().connect_timeout);
        assert!(fast.verify_tls);

        let opts = ScanOptions::default().with_concurrency(0).with_rate_limit(Some(0));
        assert_eq!(opts.concurrency, 1);
        assert!(opts.rate_limit.is_none());
    }

    #[test]
    fn scan_stats_updates() {
        let mut stats = ScanStats::new(3);
        let t = Target::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80);
        let d = Definition::new("nginx");

        stats.update(&ScanReport::new(t.clone(), 200, Identity::from_definition("nginx", &d)));
        stats.update(&ScanReport::new(t, 200, Identity::unmatched("")));
        stats.record_failure();

        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.identified, 1);
        assert_eq!(stats.unidentified, 1);
        assert_eq!(stats.failed, 1);
        assert!((stats.progress() - 100.0).abs() < f32::EPSILON);
    }
}
