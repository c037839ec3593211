use anyhow::Context;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_FETCH_RETRIES: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub fetch_retries: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            tracing::debug!(%err, "no .env file loaded");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .context("DATABASE_URL must be set to the attendance Postgres instance")?;

        Ok(Self {
            database_url,
            max_connections: parse_or(&lookup, "ATTENDANCE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            fetch_retries: parse_or(&lookup, "ATTENDANCE_FETCH_RETRIES", DEFAULT_FETCH_RETRIES)?,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u32) -> anyhow::Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
        None => Ok(default),
    }
}
