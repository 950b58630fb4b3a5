use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, feed::ItemErrorPolicy, Result};

/// Typed configuration for the bot.
///
/// Read-only after startup; shared behind an `Arc`.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub authorized_chat_ids: Vec<i64>,
    pub owner_id: Option<i64>,

    // Jackett
    pub jackett_url: String,
    pub jackett_api_key: String,
    pub max_results: usize,
    pub item_error_policy: ItemErrorPolicy,

    // Telegraph
    pub telegraph_api_url: String,
    pub telegraph_short_name: String,

    // Timeouts
    pub http_timeout: Duration,

    // Liveness check
    pub liveness_url: String,
    pub liveness_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new("config.env"));
        load_dotenv_if_present(Path::new(".env"));

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup (process env, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .and_then(non_empty)
                .map(|s| s.trim().to_string())
                .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
        };

        let telegram_token = required("TELEGRAM_TOKEN")?;
        let jackett_url = required("JACKETT_URL")?.trim_end_matches('/').to_string();
        let jackett_api_key = required("JACKETT_API_KEY")?;

        let authorized_chat_ids = parse_csv_i64(lookup("AUTHORIZED_CHAT_IDS"));
        // OWNER_ID=0 means "no owner".
        let owner_id = parse_num::<i64>(lookup("OWNER_ID")).filter(|id| *id != 0);

        let max_results = parse_num::<usize>(lookup("MAX_RESULTS")).unwrap_or(10);
        let item_error_policy = match lookup("ITEM_ERROR_POLICY") {
            Some(raw) => raw.parse::<ItemErrorPolicy>()?,
            None => ItemErrorPolicy::default(),
        };

        let telegraph_api_url = lookup("TELEGRAPH_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://api.telegra.ph".to_string())
            .trim_end_matches('/')
            .to_string();
        let telegraph_short_name = lookup("TELEGRAPH_SHORT_NAME")
            .and_then(non_empty)
            .unwrap_or_else(|| "JackettSearchBot".to_string());

        let http_timeout =
            Duration::from_secs(parse_num::<u64>(lookup("HTTP_TIMEOUT_SECS")).unwrap_or(30));

        let liveness_url = lookup("LIVENESS_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://passthepopcorn.me".to_string());
        let liveness_timeout =
            Duration::from_secs(parse_num::<u64>(lookup("LIVENESS_TIMEOUT_SECS")).unwrap_or(5));

        Ok(Self {
            telegram_token,
            authorized_chat_ids,
            owner_id,
            jackett_url,
            jackett_api_key,
            max_results,
            item_error_policy,
            telegraph_api_url,
            telegraph_short_name,
            http_timeout,
            liveness_url,
            liveness_timeout,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_num<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
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
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("TELEGRAM_TOKEN", "123:abc"),
        ("JACKETT_URL", "http://jackett:9117"),
        ("JACKETT_API_KEY", "key"),
    ];

    fn with_required(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = from_pairs(&REQUIRED).unwrap();
        assert_eq!(cfg.telegram_token, "123:abc");
        assert_eq!(cfg.max_results, 10);
        assert_eq!(cfg.owner_id, None);
        assert!(cfg.authorized_chat_ids.is_empty());
        assert_eq!(cfg.item_error_policy, ItemErrorPolicy::Abort);
        assert_eq!(cfg.telegraph_api_url, "https://api.telegra.ph");
        assert_eq!(cfg.telegraph_short_name, "JackettSearchBot");
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.liveness_url, "https://passthepopcorn.me");
        assert_eq!(cfg.liveness_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_required_var_is_a_config_error() {
        for missing in ["TELEGRAM_TOKEN", "JACKETT_URL", "JACKETT_API_KEY"] {
            let pairs: Vec<_> = REQUIRED
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = from_pairs(&pairs).unwrap_err();
            let Error::Config(msg) = &err else {
                panic!("unexpected error: {err:?}");
            };
            assert!(msg.contains(missing), "{msg}");
        }

        let err = from_pairs(&with_required(&[("JACKETT_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unparsable_max_results_falls_back_to_ten() {
        let cfg = from_pairs(&with_required(&[("MAX_RESULTS", "abc")])).unwrap();
        assert_eq!(cfg.max_results, 10);

        let cfg = from_pairs(&with_required(&[("MAX_RESULTS", " 3 ")])).unwrap();
        assert_eq!(cfg.max_results, 3);
    }

    #[test]
    fn owner_zero_means_no_owner() {
        let cfg = from_pairs(&with_required(&[("OWNER_ID", "0")])).unwrap();
        assert_eq!(cfg.owner_id, None);

        let cfg = from_pairs(&with_required(&[("OWNER_ID", "42")])).unwrap();
        assert_eq!(cfg.owner_id, Some(42));
    }

    #[test]
    fn invalid_item_error_policy_is_rejected() {
        let err = from_pairs(&with_required(&[("ITEM_ERROR_POLICY", "ignore")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let cfg = from_pairs(&with_required(&[("ITEM_ERROR_POLICY", "skip")])).unwrap();
        assert_eq!(cfg.item_error_policy, ItemErrorPolicy::Skip);
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_urls() {
        let cfg = from_pairs(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("JACKETT_URL", "http://jackett:9117/"),
            ("JACKETT_API_KEY", "key"),
            ("TELEGRAPH_API_URL", "http://telegraph.local/"),
            ("AUTHORIZED_CHAT_IDS", "-100, 7"),
        ])
        .unwrap();
        assert_eq!(cfg.jackett_url, "http://jackett:9117");
        assert_eq!(cfg.telegraph_api_url, "http://telegraph.local");
        assert_eq!(cfg.authorized_chat_ids, vec![-100, 7]);
    }

    #[test]
    fn parses_dotenv_lines() {
        let parsed = parse_dotenv(
            "# comment\n\nTELEGRAM_TOKEN = \"abc:def\"\nMAX_RESULTS=5\nnot a pair\n=orphan\nOWNER_ID='42'\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TELEGRAM_TOKEN".to_string(), "abc:def".to_string()),
                ("MAX_RESULTS".to_string(), "5".to_string()),
                ("OWNER_ID".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn csv_ids_skip_blanks_and_garbage() {
        assert_eq!(
            parse_csv_i64(Some("-1001, 42,,abc, 7".to_string())),
            vec![-1001, 42, 7]
        );
        assert!(parse_csv_i64(None).is_empty());
    }

    #[test]
    fn non_empty_rejects_whitespace() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty("x".to_string()), Some("x".to_string()));
    }
}
