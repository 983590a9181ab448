use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Cookie signing needs real key material; shorter secrets are refused.
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub session_secret: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("NOISEGATE_DB_PATH").unwrap_or_default();
        if db_path.is_empty() {
            bail!("NOISEGATE_DB_PATH is not set");
        }

        let session_secret = lookup("NOISEGATE_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() {
            bail!("NOISEGATE_SESSION_SECRET is not set");
        }
        if session_secret.len() < MIN_SECRET_LEN {
            bail!(
                "NOISEGATE_SESSION_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            );
        }

        let host = lookup("NOISEGATE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("NOISEGATE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("NOISEGATE_PORT is not a valid port")?;

        Ok(Self {
            db_path: db_path.into(),
            session_secret,
            host,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<_, _> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn minimal_valid_config() {
        let config = config_from(&[
            ("NOISEGATE_DB_PATH", "users.db"),
            ("NOISEGATE_SESSION_SECRET", SECRET),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("users.db"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn missing_db_path_is_fatal() {
        assert!(config_from(&[("NOISEGATE_SESSION_SECRET", SECRET)]).is_err());
        assert!(config_from(&[
            ("NOISEGATE_DB_PATH", ""),
            ("NOISEGATE_SESSION_SECRET", SECRET),
        ])
        .is_err());
    }

    #[test]
    fn missing_or_short_secret_is_fatal() {
        assert!(config_from(&[("NOISEGATE_DB_PATH", "users.db")]).is_err());
        assert!(config_from(&[
            ("NOISEGATE_DB_PATH", "users.db"),
            ("NOISEGATE_SESSION_SECRET", "too-short"),
        ])
        .is_err());
    }

    #[test]
    fn host_and_port_overrides() {
        let config = config_from(&[
            ("NOISEGATE_DB_PATH", "users.db"),
            ("NOISEGATE_SESSION_SECRET", SECRET),
            ("NOISEGATE_HOST", "127.0.0.1"),
            ("NOISEGATE_PORT", "8080"),
        ])
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }
}
