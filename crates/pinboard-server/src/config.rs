use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

/// Upper bound for `PINBOARD_TOKEN_TTL_DAYS`.
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub db_open_retries: u32,
    pub token_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("PINBOARD_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PINBOARD_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = get("PINBOARD_DB_PATH").unwrap_or_else(|| "pinboard.db".into()).into();
        let host = get("PINBOARD_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse(&get, "PINBOARD_PORT", 3000)?;
        let db_open_retries = parse(&get, "PINBOARD_DB_OPEN_RETRIES", 5)?;
        let token_ttl_days = parse(&get, "PINBOARD_TOKEN_TTL_DAYS", 30)?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            bail!("PINBOARD_TOKEN_TTL_DAYS must be between 1 and {}", MAX_TOKEN_TTL_DAYS);
        }

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            db_open_retries,
            token_ttl_days,
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("PINBOARD_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.db_path, PathBuf::from("pinboard.db"));
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db_open_retries, 5);
        assert_eq!(cfg.token_ttl_days, 30);
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(config(&[]).is_err());
        assert!(config(&[("PINBOARD_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = config(&[("PINBOARD_JWT_SECRET", "s3cret"), ("PINBOARD_PORT", "http")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("PINBOARD_PORT"));
    }

    #[test]
    fn token_ttl_is_bounded() {
        let secret = ("PINBOARD_JWT_SECRET", "s3cret");
        assert!(config(&[secret, ("PINBOARD_TOKEN_TTL_DAYS", "0")]).is_err());
        assert!(config(&[secret, ("PINBOARD_TOKEN_TTL_DAYS", "3651")]).is_err());
        assert!(config(&[secret, ("PINBOARD_TOKEN_TTL_DAYS", "9223372036854775807")]).is_err());

        let cfg = config(&[secret, ("PINBOARD_TOKEN_TTL_DAYS", "3650")]).unwrap();
        assert_eq!(cfg.token_ttl_days, 3650);
    }
}
