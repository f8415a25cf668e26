use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "COLONAiVE";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "colonaive=info,colonaive_lib=info,tower_http=warn"
}

/// Directory holding `config.json` (`~/.config/colonaive` on Linux).
/// Falls back to the working directory when the platform has no config dir.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("colonaive")
}

/// Default location of the optional configuration file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.json")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

// ═══════════════════════════════════════════════════════════
// Chat pacing
// ═══════════════════════════════════════════════════════════

/// Delays that pace the chatbot dialog. All values are in milliseconds on
/// the session's virtual clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatTimings {
    /// Gap between a triage response and the doctor-availability prompt.
    pub doctor_prompt_delay_ms: u64,
    /// Patience nudge while a doctor-availability answer is outstanding.
    pub doctor_watchdog_ms: u64,
    /// Gap between a reply and the "anything else?" offer.
    pub follow_up_delay_ms: u64,
    /// User messages required before the follow-up offer is made.
    pub follow_up_threshold: u32,
    pub check_in_after_ms: u64,
    pub session_end_after_ms: u64,
}

impl Default for ChatTimings {
    fn default() -> Self {
        Self {
            doctor_prompt_delay_ms: 2_000,
            doctor_watchdog_ms: 45_000,
            follow_up_delay_ms: 3_000,
            follow_up_threshold: 4,
            check_in_after_ms: 3 * 60 * 1000,
            session_end_after_ms: 6 * 60 * 1000,
        }
    }
}

impl ChatTimings {
    pub fn doctor_prompt_delay(&self) -> Duration {
        Duration::from_millis(self.doctor_prompt_delay_ms)
    }

    pub fn doctor_watchdog(&self) -> Duration {
        Duration::from_millis(self.doctor_watchdog_ms)
    }

    pub fn follow_up_delay(&self) -> Duration {
        Duration::from_millis(self.follow_up_delay_ms)
    }

    pub fn check_in_after(&self) -> Duration {
        Duration::from_millis(self.check_in_after_ms)
    }

    pub fn session_end_after(&self) -> Duration {
        Duration::from_millis(self.session_end_after_ms)
    }
}

// ═══════════════════════════════════════════════════════════
// Service sections
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Force canned replies even when a key is configured.
    pub use_mock: bool,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            api_key: None,
            use_mock: false,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub endpoint: String,
    pub from: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.resend.com/emails".into(),
            from: "COLONAiVE <noreply@colonaive.ai>".into(),
            api_key: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub requests_per_minute: u32,
    pub requests_per_hour: u32,
    /// How long an ended or abandoned chat session is kept before pruning.
    pub session_retention_secs: u64,
    /// Upper bound on live chat sessions.
    pub max_sessions: usize,
    /// Key rate limits on `X-Forwarded-For`. Only safe behind a proxy that
    /// overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".into(),
            allowed_origins: Vec::new(),
            requests_per_minute: 60,
            requests_per_hour: 600,
            session_retention_secs: 30 * 60,
            max_sessions: 10_000,
            trust_forwarded_for: false,
        }
    }
}

/// Full runtime configuration, resolved once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chat: ChatTimings,
    pub completion: CompletionConfig,
    pub email: EmailConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from the default config file (if any), then apply environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file_or_default(&config_file())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse `path` when it exists, otherwise return defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("COLONAIVE_BIND") {
            self.server.bind = bind;
        }
        if let Some(origins) = lookup("COLONAIVE_ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(flag) = lookup("COLONAIVE_TRUST_FORWARDED_FOR") {
            self.server.trust_forwarded_for =
                parse_flag("COLONAIVE_TRUST_FORWARDED_FOR", &flag)?;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.completion.api_key = Some(key);
        }
        if let Some(model) = lookup("COLONAIVE_COMPLETION_MODEL") {
            self.completion.model = model;
        }
        if let Some(flag) = lookup("COLONAIVE_MOCK_COMPLETION") {
            self.completion.use_mock = parse_flag("COLONAIVE_MOCK_COMPLETION", &flag)?;
        }
        if let Some(key) = lookup("EMAIL_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.email.api_key = Some(key);
        }
        if let Some(from) = lookup("EMAIL_FROM") {
            self.email.from = from;
        }
        Ok(())
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_dir_ends_with_app_folder() {
        assert!(config_dir().ends_with("colonaive"));
        assert!(config_file().ends_with("config.json"));
    }

    #[test]
    fn app_name_is_colonaive() {
        assert_eq!(APP_NAME, "COLONAiVE");
    }

    #[test]
    fn default_timings_match_dialog_pacing() {
        let t = ChatTimings::default();
        assert_eq!(t.doctor_watchdog(), Duration::from_secs(45));
        assert_eq!(t.check_in_after(), Duration::from_secs(180));
        assert_eq!(t.session_end_after(), Duration::from_secs(360));
        assert_eq!(t.follow_up_threshold, 4);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::from_file_or_default(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(config.chat, ChatTimings::default());
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"chat": {"doctor_watchdog_ms": 1000}, "server": {"bind": "0.0.0.0:9000"}}"#,
        )
        .unwrap();

        let config = AppConfig::from_file_or_default(&path).unwrap();
        assert_eq!(config.chat.doctor_watchdog_ms, 1000);
        assert_eq!(config.chat.check_in_after_ms, 180_000);
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.requests_per_minute, 60);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = AppConfig::from_file_or_default(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("COLONAIVE_BIND", "0.0.0.0:80"),
                ("OPENAI_API_KEY", "sk-test"),
                ("COLONAIVE_MOCK_COMPLETION", "yes"),
                ("COLONAIVE_ALLOWED_ORIGINS", "https://colonaive.ai, https://www.colonaive.ai"),
                ("COLONAIVE_TRUST_FORWARDED_FOR", "true"),
            ]))
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:80");
        assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
        assert!(config.completion.use_mock);
        assert_eq!(config.server.allowed_origins.len(), 2);
        assert!(config.server.trust_forwarded_for);
    }

    #[test]
    fn forwarded_for_untrusted_by_default() {
        let config = ServerConfig::default();
        assert!(!config.trust_forwarded_for);
        assert_eq!(config.max_sessions, 10_000);
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("COLONAIVE_MOCK_COMPLETION", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn api_key_is_not_serialized() {
        let mut config = AppConfig::default();
        config.completion.api_key = Some("sk-secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
