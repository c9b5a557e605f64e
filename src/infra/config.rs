//! Centralized configuration (environment variables + defaults).

use anyhow::{anyhow, bail, Context};
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Memory,
    Postgres,
}

impl FromStr for LedgerBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(LedgerBackend::Memory),
            "postgres" | "postgresql" => Ok(LedgerBackend::Postgres),
            other => bail!("unknown ledger backend '{}' (expected memory or postgres)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format '{}' (expected text or json)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub ledger_backend: LedgerBackend,
    /// Required when the backend is PostgreSQL.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub history_offset: FixedOffset,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads the configuration from the process environment. Call
    /// `dotenv::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let ledger_backend: LedgerBackend = var("LEDGER_BACKEND", "memory")
            .parse()
            .context("LEDGER_BACKEND")?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if ledger_backend == LedgerBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when LEDGER_BACKEND=postgres");
        }

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?
            .max(1);

        Ok(Self {
            bind_addr: var("LEDGER_BIND_ADDR", "0.0.0.0:3000"),
            ledger_backend,
            database_url,
            database_max_connections,
            history_offset: parse_utc_offset(&var("HISTORY_UTC_OFFSET", "+00:00"))
                .context("HISTORY_UTC_OFFSET")?,
            log_level: var("LOG_LEVEL", "info"),
            log_format: var("LOG_FORMAT", "text").parse().context("LOG_FORMAT")?,
        })
    }
}

/// Parses `+HH:MM`, `-HH:MM` or `Z` into a fixed offset.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| anyhow!("invalid offset"));
    }

    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        bail!("offset '{}' must start with + or -", raw);
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| anyhow!("offset '{}' must look like +HH:MM", raw))?;
    let hours: i32 = hours.parse().with_context(|| format!("bad hours in '{}'", raw))?;
    let minutes: i32 = minutes.parse().with_context(|| format!("bad minutes in '{}'", raw))?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        bail!("offset '{}' is out of range", raw);
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow!("offset '{}' is out of range", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3000");
        assert_eq!(cfg.ledger_backend, LedgerBackend::Memory);
        assert_eq!(cfg.database_max_connections, 5);
        assert_eq!(cfg.history_offset.local_minus_utc(), 0);
        assert_eq!(cfg.log_format, LogFormat::Text);
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(config(&[("LEDGER_BACKEND", "postgres")]).is_err());
        let cfg = config(&[
            ("LEDGER_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/ledger"),
        ])
        .unwrap();
        assert_eq!(cfg.ledger_backend, LedgerBackend::Postgres);
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(config(&[("LEDGER_BACKEND", "couchdb")]).is_err());
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(config(&[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
    }

    #[test]
    fn utc_offsets() {
        assert_eq!(parse_utc_offset("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(parse_utc_offset("-05:30").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("08:00").is_err());
        assert!(parse_utc_offset("+24:00").is_err());
        assert!(parse_utc_offset("+08").is_err());
    }
}
