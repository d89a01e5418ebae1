use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Admin password used when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// JWT secrets that must never sign real tokens.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub admin: AdminCredential,
    /// `None` means a random secret is generated per process.
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCredential {
    Password(String),
    /// Argon2 PHC string, e.g. produced by a previous deployment.
    Hash(String),
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = var("PINBOARD_PORT", "3000")
            .parse()
            .context("PINBOARD_PORT must be a port number")?;
        let token_ttl_hours: i64 = var("PINBOARD_TOKEN_TTL_HOURS", "24")
            .parse()
            .context("PINBOARD_TOKEN_TTL_HOURS must be an integer")?;
        if token_ttl_hours <= 0 {
            bail!("PINBOARD_TOKEN_TTL_HOURS must be positive");
        }

        let jwt_secret = get("PINBOARD_JWT_SECRET").filter(|s| !s.is_empty());
        if let Some(secret) = &jwt_secret {
            if PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
                bail!("PINBOARD_JWT_SECRET is still a placeholder value");
            }
        }

        let admin = match get("PINBOARD_ADMIN_PASSWORD_HASH").filter(|s| !s.is_empty()) {
            Some(hash) => AdminCredential::Hash(hash),
            None => AdminCredential::Password(var("PINBOARD_ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD)),
        };

        Ok(Self {
            host: var("PINBOARD_HOST", "0.0.0.0"),
            port,
            db_path: var("PINBOARD_DB_PATH", "pinboard.db").into(),
            upload_dir: var("PINBOARD_UPLOAD_DIR", "./uploads").into(),
            static_dir: var("PINBOARD_STATIC_DIR", "./public").into(),
            admin,
            jwt_secret,
            token_ttl_hours,
        })
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin == AdminCredential::Password(DEFAULT_ADMIN_PASSWORD.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("pinboard.db"));
        assert_eq!(config.token_ttl_hours, 24);
        assert!(config.jwt_secret.is_none());
        assert!(config.uses_default_password());
    }

    #[test]
    fn hash_takes_priority_over_password() {
        let config = config(&[
            ("PINBOARD_ADMIN_PASSWORD", "pw"),
            ("PINBOARD_ADMIN_PASSWORD_HASH", "$argon2id$v=19$..."),
        ])
        .unwrap();
        assert_eq!(config.admin, AdminCredential::Hash("$argon2id$v=19$...".into()));
        assert!(!config.uses_default_password());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("PINBOARD_PORT", "http")]).is_err());
        assert!(config(&[("PINBOARD_TOKEN_TTL_HOURS", "0")]).is_err());
        assert!(config(&[("PINBOARD_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }
}
