use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Upper bound for `SESSION_TTL_MINUTES`: one year.
pub const MAX_SESSION_TTL_MINUTES: u64 = 366 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub session_ttl_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_lifetime_minutes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `None` runs the user store in memory.
    pub database: Option<DbConfig>,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret = get("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() {
            bail!("JWT_SECRET must be set and non-empty");
        }
        let session_ttl_minutes = parse_or(&get, "SESSION_TTL_MINUTES", 60 * 24)?;
        if session_ttl_minutes == 0 || session_ttl_minutes > MAX_SESSION_TTL_MINUTES {
            bail!(
                "SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}, got {session_ttl_minutes}"
            );
        }
        let jwt = JwtConfig {
            secret,
            session_ttl_minutes,
        };

        let database = match get("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => Some(DbConfig {
                url,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
                max_lifetime_minutes: parse_opt(&get, "DB_CONNECTION_MAX_LIFETIME_MINUTES")?
                    .map(|m: u64| {
                        m.checked_mul(60).map(|_| m).with_context(|| {
                            format!("DB_CONNECTION_MAX_LIFETIME_MINUTES is out of range: {m}")
                        })
                    })
                    .transpose()?,
            }),
            None => None,
        };

        Ok(Self {
            database,
            jwt,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "APP_PORT", 8080)?,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt.session_ttl_minutes.saturating_mul(60))
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    get(key)
        .map(|v| v.parse::<T>().with_context(|| format!("{key} must be a valid integer, got {v:?}")))
        .transpose()
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(cfg.jwt.secret, "s3cret");
        assert_eq!(cfg.session_ttl(), Duration::from_secs(24 * 60 * 60));
        assert!(cfg.database.is_none());
        assert_eq!(cfg.addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn missing_or_empty_secret_is_fatal() {
        assert!(load(&[]).is_err());
        assert!(load(&[("JWT_SECRET", "")]).is_err());
    }

    #[test]
    fn database_settings_are_read() {
        let cfg = load(&[
            ("JWT_SECRET", "s"),
            ("DATABASE_URL", "postgres://u:p@localhost/gtd"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_CONNECTION_MAX_LIFETIME_MINUTES", "30"),
            ("SESSION_TTL_MINUTES", "15"),
            ("APP_PORT", "9000"),
        ])
        .unwrap();
        let db = cfg.database.as_ref().unwrap();
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.max_lifetime_minutes, Some(30));
        assert_eq!(cfg.session_ttl(), Duration::from_secs(15 * 60));
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = load(&[("JWT_SECRET", "s"), ("SESSION_TTL_MINUTES", "soon")]).unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_MINUTES"));
    }

    #[test]
    fn session_ttl_must_stay_in_range() {
        let huge = u64::MAX.to_string();
        let err = load(&[("JWT_SECRET", "s"), ("SESSION_TTL_MINUTES", &huge)]).unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_MINUTES"));

        assert!(load(&[("JWT_SECRET", "s"), ("SESSION_TTL_MINUTES", "0")]).is_err());

        let max = MAX_SESSION_TTL_MINUTES.to_string();
        let cfg = load(&[("JWT_SECRET", "s"), ("SESSION_TTL_MINUTES", &max)]).unwrap();
        assert_eq!(cfg.session_ttl(), Duration::from_secs(366 * 24 * 60 * 60));
    }

    #[test]
    fn pool_lifetime_must_fit_in_seconds() {
        let huge = u64::MAX.to_string();
        let err = load(&[
            ("JWT_SECRET", "s"),
            ("DATABASE_URL", "postgres://localhost/gtd"),
            ("DB_CONNECTION_MAX_LIFETIME_MINUTES", &huge),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DB_CONNECTION_MAX_LIFETIME_MINUTES"));
    }
}
