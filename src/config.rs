// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "BOT_CONFIG_PATH";
pub const ENV_STATE_PATH: &str = "BOT_STATE_PATH";
pub const ENV_WEBHOOK_URL: &str = "BOT_WEBHOOK_URL";
pub const ENV_METADATA_ENDPOINT: &str = "BOT_METADATA_ENDPOINT";

fn default_state_path() -> PathBuf {
    PathBuf::from("state/processed.json")
}
fn default_feed_path() -> PathBuf {
    PathBuf::from("data/threads.json")
}
fn default_user_agent() -> String {
    concat!("movie-score-bot/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_stale_lock_secs() -> u64 {
    6 * 3600
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Disables certificate verification. Only honoured by callers that pass
    /// `TlsPolicy::AllowInsecure` (tests); the binary refuses to start with it.
    #[serde(default)]
    pub insecure_tls_for_tests: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            insecure_tls_for_tests: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BotConfig {
    /// Processed-thread state file.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,
    /// Candidate threads (JSON array of `{id, title, body}`).
    #[serde(default = "default_feed_path")]
    pub feed_path: PathBuf,
    /// Captured score pages answering the per-source lookups.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Review-metadata title search; the catalog answers when unset.
    #[serde(default)]
    pub metadata_endpoint: Option<String>,
    /// Reply relay; replies are only logged when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Prometheus textfile written at the end of a run.
    #[serde(default)]
    pub metrics_textfile: Option<PathBuf>,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            stale_lock_secs: default_stale_lock_secs(),
            feed_path: default_feed_path(),
            catalog_path: None,
            metadata_endpoint: None,
            webhook_url: None,
            metrics_textfile: None,
            http: HttpConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load from an explicit path. TOML or JSON, by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading bot config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => serde_json::from_str(&content).context("parsing bot config json"),
            _ => toml::from_str(&content).context("parsing bot config toml"),
        }
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $BOT_CONFIG_PATH
    /// 2) config/bot.toml
    /// 3) config/bot.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else if Path::new("config/bot.toml").exists() {
            Self::load_from(Path::new("config/bot.toml"))?
        } else if Path::new("config/bot.json").exists() {
            Self::load_from(Path::new("config/bot.json"))?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env(ENV_STATE_PATH) {
            self.state_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty_env(ENV_WEBHOOK_URL) {
            self.webhook_url = Some(v);
        }
        if let Some(v) = non_empty_env(ENV_METADATA_ENDPOINT) {
            self.metadata_endpoint = Some(v);
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn toml_with_partial_fields_uses_defaults() {
        let cfg: BotConfig = toml::from_str(
            r#"
            feed_path = "feeds/week.json"
            [http]
            timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.feed_path, PathBuf::from("feeds/week.json"));
        assert_eq!(cfg.state_path, default_state_path());
        assert_eq!(cfg.http.timeout_secs, 3);
        assert!(!cfg.http.insecure_tls_for_tests);
        assert!(cfg.http.user_agent.starts_with("movie-score-bot/"));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so the repo's own config/ does not leak in
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_STATE_PATH);
        env::remove_var(ENV_WEBHOOK_URL);
        env::remove_var(ENV_METADATA_ENDPOINT);

        let v = BotConfig::load_default().unwrap();
        assert_eq!(v, BotConfig::default());

        let p_json = tmp.path().join("bot.json");
        fs::write(&p_json, r#"{"webhook_url": "https://relay.example/reply"}"#).unwrap();
        env::set_var(ENV_CONFIG_PATH, p_json.display().to_string());
        env::set_var(ENV_STATE_PATH, "elsewhere/state.json");
        let v2 = BotConfig::load_default().unwrap();
        assert_eq!(v2.webhook_url.as_deref(), Some("https://relay.example/reply"));
        assert_eq!(v2.state_path, PathBuf::from("elsewhere/state.json"));

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(BotConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_STATE_PATH);
        env::set_current_dir(&old).unwrap();
    }
}
