// src/ingest/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/dashboard.toml";

const ENV_PRIMARY_BASE: &str = "PRIMARY_BASE_URL";
const ENV_ARCHIVE_BASE: &str = "ARCHIVE_BASE_URL";
const ENV_REFRESH_SECS: &str = "REFRESH_INTERVAL_SECS";

fn default_primary_base() -> String {
    "http://127.0.0.1:5000/api".to_string()
}

fn default_archive_base() -> String {
    "https://raw.githubusercontent.com/newswatch/dashboard-data/refs/heads/data".to_string()
}

fn default_refresh_secs() -> u64 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

/// Runtime configuration for the refresh pipeline and its two data tiers.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_primary_base")]
    pub primary_base_url: String,
    #[serde(default = "default_archive_base")]
    pub archive_base_url: String,
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            primary_base_url: default_primary_base(),
            archive_base_url: default_archive_base(),
            refresh_interval_secs: default_refresh_secs(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl DashboardConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let cfg: DashboardConfig = toml::from_str(&content)
            .with_context(|| format!("parsing dashboard config {}", path.display()))?;
        Ok(cfg)
    }

    /// Load config using env vars + fallbacks:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist when set)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults
    /// Individual base URLs and the refresh interval can then be overridden
    /// per-field via PRIMARY_BASE_URL / ARCHIVE_BASE_URL / REFRESH_INTERVAL_SECS.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };

        if let Ok(v) = std::env::var(ENV_PRIMARY_BASE) {
            if !v.trim().is_empty() {
                cfg.primary_base_url = v;
            }
        }
        if let Ok(v) = std::env::var(ENV_ARCHIVE_BASE) {
            if !v.trim().is_empty() {
                cfg.archive_base_url = v;
            }
        }
        if let Ok(v) = std::env::var(ENV_REFRESH_SECS) {
            if let Ok(secs) = v.parse::<u64>() {
                cfg.refresh_interval_secs = secs.max(1);
            }
        }
        Ok(cfg)
    }
}

/// Local vs. deployed classification. Local environments try the primary
/// (local service) tier first; deployed ones go straight to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Deployed,
}

impl Environment {
    /// DASHBOARD_ENV wins; otherwise the Shuttle environment name; otherwise
    /// debug builds count as local.
    pub fn detect() -> Self {
        if let Ok(v) = std::env::var("DASHBOARD_ENV") {
            return match v.to_ascii_lowercase().as_str() {
                "local" | "dev" | "development" => Environment::Local,
                _ => Environment::Deployed,
            };
        }
        let shuttle_local = matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );
        if shuttle_local || cfg!(debug_assertions) {
            Environment::Local
        } else {
            Environment::Deployed
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }
}

/// Where the rendering surface is being served from, as reported by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub protocol: String,
    pub hostname: String,
    pub port: Option<u16>,
    pub path: String,
}

const LOCAL_SERVICE_PORT: u16 = 5000;
const LOCAL_DEFAULT_BASE: &str = "http://localhost:5000/api";
const DEPLOY_SUBPATH: &str = "/dashboard";

/// Primary base-URL resolution policy:
/// - file origin -> fixed local default
/// - loopback host -> local default, unless already served from the expected
///   port (then same-origin relative base)
/// - anything else -> current origin, keeping the deployment sub-path when
///   the serving path carries it
pub fn resolve_primary_base(origin: &Origin) -> String {
    if origin.protocol == "file" {
        return LOCAL_DEFAULT_BASE.to_string();
    }
    let loopback = matches!(origin.hostname.as_str(), "localhost" | "127.0.0.1" | "::1");
    if loopback {
        return if origin.port == Some(LOCAL_SERVICE_PORT) {
            "/api".to_string()
        } else {
            format!("http://{}:{}/api", origin.hostname, LOCAL_SERVICE_PORT)
        };
    }
    let mut base = format!("{}://{}", origin.protocol, origin.hostname);
    if let Some(p) = origin.port {
        base.push_str(&format!(":{p}"));
    }
    if origin.path.starts_with(DEPLOY_SUBPATH) {
        base.push_str(DEPLOY_SUBPATH);
    }
    base.push_str("/api");
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn origin(protocol: &str, hostname: &str, port: Option<u16>, path: &str) -> Origin {
        Origin {
            protocol: protocol.into(),
            hostname: hostname.into(),
            port,
            path: path.into(),
        }
    }

    #[test]
    fn file_origin_uses_local_default() {
        let o = origin("file", "", None, "/home/user/index.html");
        assert_eq!(resolve_primary_base(&o), "http://localhost:5000/api");
    }

    #[test]
    fn loopback_redirects_to_service_port_unless_already_there() {
        let served_elsewhere = origin("http", "localhost", Some(8080), "/");
        assert_eq!(
            resolve_primary_base(&served_elsewhere),
            "http://localhost:5000/api"
        );
        let on_port = origin("http", "127.0.0.1", Some(5000), "/");
        assert_eq!(resolve_primary_base(&on_port), "/api");
    }

    #[test]
    fn deployed_origin_keeps_subpath() {
        let plain = origin("https", "status.example.com", None, "/");
        assert_eq!(
            resolve_primary_base(&plain),
            "https://status.example.com/api"
        );
        let nested = origin("https", "example.com", Some(443), "/dashboard/index.html");
        assert_eq!(
            resolve_primary_base(&nested),
            "https://example.com:443/dashboard/api"
        );
    }

    #[serial_test::serial]
    #[test]
    fn load_prefers_env_overrides() {
        env::remove_var(ENV_CONFIG_PATH);
        env::set_var(ENV_PRIMARY_BASE, "http://10.0.0.2:5000/api");
        env::set_var(ENV_REFRESH_SECS, "30");

        let cfg = DashboardConfig::load().unwrap();
        assert_eq!(cfg.primary_base_url, "http://10.0.0.2:5000/api");
        assert_eq!(cfg.refresh_interval_secs, 30);

        env::remove_var(ENV_PRIMARY_BASE);
        env::remove_var(ENV_REFRESH_SECS);
    }

    #[serial_test::serial]
    #[test]
    fn refresh_interval_never_drops_to_zero() {
        env::set_var(ENV_REFRESH_SECS, "0");
        let cfg = DashboardConfig::load().unwrap();
        assert_eq!(cfg.refresh_interval_secs, 1);
        env::remove_var(ENV_REFRESH_SECS);
    }
}
