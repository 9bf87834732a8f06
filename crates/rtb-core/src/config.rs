use std::{env, time::Duration};

use crate::{errors::Error, Result};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_TELEGRAM_SAFE_LIMIT: usize = 4000;

/// Typed, immutable configuration for the bot.
///
/// Built once at startup and shared as `Arc<Config>`.
#[derive(Clone)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub allowed_user_ids: Vec<i64>,
    pub telegram_safe_limit: usize,

    // Redmine
    pub redmine_url: String,
    pub redmine_api_token: String,
    pub request_timeout: Duration,
}

// Keep secrets out of `{:?}` output (logs, panics).
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("allowed_user_ids", &self.allowed_user_ids)
            .field("telegram_safe_limit", &self.telegram_safe_limit)
            .field("redmine_url", &self.redmine_url)
            .field("redmine_api_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    ///
    /// Variables already set in the environment win over `.env` entries.
    pub fn load() -> Result<Self> {
        check_dotenv(dotenvy::dotenv().map(|_| ()))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = required(&lookup, "TELEGRAM_BOT_TOKEN")?;
        let redmine_url = required(&lookup, "REDMINE_URL")?;
        let redmine_api_token = required(&lookup, "REDMINE_API_TOKEN")?;

        let allowed_user_ids = parse_csv_i64(lookup("ALLOWED_USER_IDS"));
        if allowed_user_ids.is_empty() {
            return Err(Error::Config(
                "ALLOWED_USER_IDS must list at least one numeric Telegram user id".to_string(),
            ));
        }

        let request_timeout = Duration::from_millis(
            parse_u64(lookup("REDMINE_TIMEOUT_MS")).unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );
        let telegram_safe_limit = parse_usize(lookup("TELEGRAM_SAFE_LIMIT"))
            .unwrap_or(DEFAULT_TELEGRAM_SAFE_LIMIT)
            .max(200);

        Ok(Self {
            telegram_bot_token,
            allowed_user_ids,
            telegram_safe_limit,
            redmine_url: redmine_url.trim().trim_end_matches('/').to_string(),
            redmine_api_token,
            request_timeout,
        })
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn check_dotenv(loaded: dotenvy::Result<()>) -> Result<()> {
    match loaded {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!("failed to load .env: {e}"))),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_usize(v: Option<String>) -> Option<usize> {
    v.and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("REDMINE_URL", "https://redmine.example.com/"),
            ("REDMINE_API_TOKEN", "secret"),
            ("ALLOWED_USER_IDS", "42, 7"),
        ]
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = Config::from_lookup(lookup_from(&base())).unwrap();
        assert_eq!(cfg.allowed_user_ids, vec![42, 7]);
        assert_eq!(cfg.redmine_url, "https://redmine.example.com");
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.telegram_safe_limit, 4000);
    }

    #[test]
    fn missing_required_variable_is_fatal() {
        for key in ["TELEGRAM_BOT_TOKEN", "REDMINE_URL", "REDMINE_API_TOKEN"] {
            let pairs: Vec<_> = base().into_iter().filter(|(k, _)| *k != key).collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(matches!(err, Error::Config(ref m) if m.contains(key)));
        }
    }

    #[test]
    fn blank_required_variable_is_fatal() {
        let mut pairs = base();
        pairs[0] = ("TELEGRAM_BOT_TOKEN", "   ");
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn non_numeric_user_ids_are_dropped() {
        let mut pairs = base();
        pairs[3] = ("ALLOWED_USER_IDS", " 1, abc, ,2 ");
        let cfg = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.allowed_user_ids, vec![1, 2]);
    }

    #[test]
    fn empty_allow_list_is_fatal() {
        let mut pairs = base();
        pairs[3] = ("ALLOWED_USER_IDS", "abc, ,");
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn timeout_can_be_overridden() {
        let mut pairs = base();
        pairs.push(("REDMINE_TIMEOUT_MS", "2500"));
        let cfg = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn missing_dotenv_is_ignored_but_malformed_is_fatal() {
        let missing = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(check_dotenv(Err(missing)).is_ok());
        assert!(check_dotenv(Ok(())).is_ok());

        let malformed = dotenvy::Error::LineParse("KEY=\"unterminated".into(), 4);
        let err = check_dotenv(Err(malformed)).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains(".env")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = Config::from_lookup(lookup_from(&base())).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("123:abc"));
        assert!(!dbg.contains("secret"));
    }
}
