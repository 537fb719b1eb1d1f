//! Server configuration loading.
//!
//! Configs are TOML. A bare context name resolves to
//! `/etc/centro/<name>.toml`; anything containing `/` or `.` is treated
//! as a direct path.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Server-side configuration, written by `centro context create`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub root: RootConfig,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub outbound: OutboundConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RootConfig {
    /// Argon2id hash of the root password.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutboundConfig {
    /// HTTP mail relay the notify module posts email through. Email
    /// deliveries fail (and say so) when this is unset.
    pub email_api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Low stock scan interval (seconds).
    #[serde(default = "default_scan_secs")]
    pub stock_scan_secs: u64,
    /// Membership expiry scan interval (seconds).
    #[serde(default = "default_scan_secs")]
    pub expiry_scan_secs: u64,
    /// Memberships ending within this many days count as expiring.
    #[serde(default = "default_expiry_lead_days")]
    pub expiry_lead_days: i64,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            stock_scan_secs: default_scan_secs(),
            expiry_scan_secs: default_scan_secs(),
            expiry_lead_days: default_expiry_lead_days(),
        }
    }
}

fn default_expire_secs() -> u64 {
    86400
}

fn default_scan_secs() -> u64 {
    3600
}

fn default_expiry_lead_days() -> i64 {
    7
}

impl ServerConfig {
    /// Turn a context name or path into a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from("/etc/centro").join(format!("{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/centro/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("/opt/centro.toml"),
            PathBuf::from("/opt/centro.toml")
        );
    }

    #[test]
    fn test_load_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(
            &path,
            r#"[root]
password_hash = "$argon2id$test"

[storage]
data_dir = "/var/lib/centro/test"

[jwt]
secret = "abc123"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.root.password_hash, "$argon2id$test");
        assert_eq!(config.storage.data_dir, "/var/lib/centro/test");
        assert_eq!(config.jwt.secret, "abc123");
        // Omitted sections fall back to defaults.
        assert_eq!(config.jwt.expire_secs, 86400);
        assert!(config.outbound.email_api_url.is_none());
        assert_eq!(config.workers.stock_scan_secs, 3600);
        assert_eq!(config.workers.expiry_lead_days, 7);
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.toml");
        std::fs::write(
            &path,
            r#"[root]
password_hash = "$argon2id$test"

[storage]
data_dir = "/var/lib/centro/test"

[jwt]
secret = "abc123"
expire_secs = 3600

[outbound]
email_api_url = "https://mail.example.com/send"

[workers]
stock_scan_secs = 600
expiry_scan_secs = 900
expiry_lead_days = 3
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.jwt.expire_secs, 3600);
        assert_eq!(
            config.outbound.email_api_url.as_deref(),
            Some("https://mail.example.com/send")
        );
        assert_eq!(config.workers.stock_scan_secs, 600);
        assert_eq!(config.workers.expiry_scan_secs, 900);
        assert_eq!(config.workers.expiry_lead_days, 3);
    }
}
