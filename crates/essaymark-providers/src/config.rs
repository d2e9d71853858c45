//! Configuration loading and provider factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use essaymark_core::engine::DEFAULT_MAX_WORDS;
use essaymark_core::error::EvaluationError;
use essaymark_core::traits::ScoringProvider;

use crate::agent::{AgentCredentials, AgentsProProvider};

/// Known AgentsPro deployments.
pub const PLATFORMS: [(&str, &str); 3] = [
    ("uat", "https://uat.agentspro.cn"),
    ("test", "https://test.agentspro.cn"),
    ("lingda", "https://lingda.agentspro.cn"),
];

/// Scoring agent settings.
///
/// Note: Custom Debug impl masks the key and secret to keep them out of logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub auth_key: String,
    #[serde(default)]
    pub auth_secret: String,
    /// One of the names in [`PLATFORMS`]. Ignored when `base_url` is set.
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Deadline for a single agent call.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("agent_id", &self.agent_id)
            .field("auth_key", &"***")
            .field("auth_secret", &"***")
            .field("platform", &self.platform)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_id: String::new(),
            auth_key: String::new(),
            auth_secret: String::new(),
            platform: default_platform(),
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl AgentConfig {
    /// Fail fast when a credential is missing, before any call is attempted.
    pub fn validate(&self) -> Result<(), EvaluationError> {
        let missing: Vec<&str> = [
            ("agent_id", &self.agent_id),
            ("auth_key", &self.auth_key),
            ("auth_secret", &self.auth_secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if !missing.is_empty() {
            return Err(EvaluationError::Configuration(format!(
                "missing agent settings: {}",
                missing.join(", ")
            )));
        }
        if self.timeout_secs == 0 {
            return Err(EvaluationError::Configuration(
                "timeout_secs must be at least 1".into(),
            ));
        }
        self.resolve_base_url().map(|_| ())
    }

    /// Explicit `base_url`, else the platform's host.
    pub fn resolve_base_url(&self) -> Result<String, EvaluationError> {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.to_string());
        }
        PLATFORMS
            .iter()
            .find(|(name, _)| *name == self.platform)
            .map(|(_, url)| url.to_string())
            .ok_or_else(|| {
                EvaluationError::Configuration(format!("unsupported platform: {}", self.platform))
            })
    }
}

fn default_platform() -> String {
    "uat".to_string()
}
fn default_timeout() -> u64 {
    30
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Longest accepted essay, in words.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_words: default_max_words(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS
}

/// Review persistence settings. No path means no persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Top-level essaymark configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EssaymarkConfig {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_agent_config(agent: &mut AgentConfig) {
    agent.agent_id = resolve_env_vars(&agent.agent_id);
    agent.auth_key = resolve_env_vars(&agent.auth_key);
    agent.auth_secret = resolve_env_vars(&agent.auth_secret);
    agent.platform = resolve_env_vars(&agent.platform);
    agent.base_url = agent.base_url.as_deref().map(resolve_env_vars);
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `essaymark.toml` in the current directory
/// 2. `~/.config/essaymark/config.toml`
///
/// Environment variable overrides: `ESSAYMARK_AGENT_ID`, `ESSAYMARK_AUTH_KEY`,
/// `ESSAYMARK_AUTH_SECRET`, `ESSAYMARK_PLATFORM`. Overrides are applied after
/// `${VAR}` resolution and taken literally.
pub fn load_config() -> Result<EssaymarkConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EssaymarkConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("essaymark.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => EssaymarkConfig::default(),
    };

    resolve_agent_config(&mut config.agent);
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Parse a TOML config string without touching the environment.
pub fn parse_config(content: &str) -> Result<EssaymarkConfig> {
    Ok(toml::from_str::<EssaymarkConfig>(content)?)
}

fn apply_env_overrides(config: &mut EssaymarkConfig) {
    let overrides: [(&str, &mut String); 4] = [
        ("ESSAYMARK_AGENT_ID", &mut config.agent.agent_id),
        ("ESSAYMARK_AUTH_KEY", &mut config.agent.auth_key),
        ("ESSAYMARK_AUTH_SECRET", &mut config.agent.auth_secret),
        ("ESSAYMARK_PLATFORM", &mut config.agent.platform),
    ];
    for (var, field) in overrides {
        if let Ok(value) = std::env::var(var) {
            *field = value;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("essaymark"))
}

/// Create the scoring provider described by `config`.
pub fn create_provider(config: &AgentConfig) -> Result<Box<dyn ScoringProvider>, EvaluationError> {
    config.validate()?;
    let base_url = config.resolve_base_url()?;

    let credentials = AgentCredentials {
        agent_id: config.agent_id.clone(),
        auth_key: config.auth_key.clone(),
        auth_secret: config.auth_secret.clone(),
    };

    let provider = AgentsProProvider::new(credentials, base_url, config.timeout_secs)?;
    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_agent() -> AgentConfig {
        AgentConfig {
            agent_id: "agent".into(),
            auth_key: "k".into(),
            auth_secret: "s".into(),
            ..Default::default()
        }
    }

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_ESSAYMARK_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_ESSAYMARK_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_ESSAYMARK_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_ESSAYMARK_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = EssaymarkConfig::default();
        assert_eq!(config.agent.platform, "uat");
        assert_eq!(config.agent.timeout_secs, 30);
        assert_eq!(config.server.max_words, 500);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[agent]
agent_id = "abc"
auth_key = "key"
auth_secret = "secret"
platform = "lingda"
timeout_secs = 10

[server]
bind = "0.0.0.0:8080"

[store]
path = "reviews.db"
"#;
        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.agent.agent_id, "abc");
        assert_eq!(config.agent.timeout_secs, 10);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.max_words, 500);
        assert_eq!(config.store.path, Some(PathBuf::from("reviews.db")));
        assert_eq!(
            config.agent.resolve_base_url().unwrap(),
            "https://lingda.agentspro.cn"
        );
    }

    #[test]
    fn load_from_explicit_path_resolves_references() {
        std::env::set_var("_ESSAYMARK_TEST_SECRET", "from-env");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essaymark.toml");
        std::fs::write(
            &path,
            "[agent]\nagent_id = \"a\"\nauth_key = \"k\"\nauth_secret = \"${_ESSAYMARK_TEST_SECRET}\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.agent.auth_secret, "from-env");
        std::env::remove_var("_ESSAYMARK_TEST_SECRET");
    }

    #[test]
    fn resolve_env_vars_does_not_rescan_values() {
        std::env::set_var("_ESSAYMARK_TEST_SELF", "${_ESSAYMARK_TEST_SELF}");
        assert_eq!(
            resolve_env_vars("x${_ESSAYMARK_TEST_SELF}y"),
            "x${_ESSAYMARK_TEST_SELF}y"
        );
        assert_eq!(resolve_env_vars("open ${never closed"), "open ${never closed");
        std::env::remove_var("_ESSAYMARK_TEST_SELF");
    }

    #[test]
    fn env_override_is_taken_literally() {
        std::env::set_var("ESSAYMARK_AUTH_KEY", "pa${ss}word");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("essaymark.toml");
        std::fs::write(&path, "[agent]\nagent_id = \"a\"\nauth_key = \"from-file\"\n").unwrap();

        let config = load_config_from(Some(&path));
        std::env::remove_var("ESSAYMARK_AUTH_KEY");
        assert_eq!(config.unwrap().agent.auth_key, "pa${ss}word");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/essaymark.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn missing_credentials_are_a_configuration_error() {
        let err = AgentConfig::default().validate().unwrap_err();
        assert!(matches!(err, EvaluationError::Configuration(_)));
        let message = err.to_string();
        assert!(message.contains("agent_id"));
        assert!(message.contains("auth_key"));
        assert!(message.contains("auth_secret"));

        assert!(create_provider(&AgentConfig::default()).is_err());
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let agent = AgentConfig {
            platform: "prod".into(),
            ..complete_agent()
        };
        let err = agent.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported platform: prod"));
    }

    #[test]
    fn base_url_overrides_platform() {
        let agent = AgentConfig {
            platform: "whatever".into(),
            base_url: Some("http://localhost:9999".into()),
            ..complete_agent()
        };
        assert!(agent.validate().is_ok());
        assert_eq!(agent.resolve_base_url().unwrap(), "http://localhost:9999");
    }

    #[test]
    fn create_provider_with_complete_config() {
        let provider = create_provider(&complete_agent()).unwrap();
        assert_eq!(provider.name(), "agentspro");
    }

    #[test]
    fn debug_masks_secrets() {
        let debug = format!("{:?}", complete_agent());
        assert!(debug.contains("***"));
        assert!(!debug.contains("auth_key: \"k\""));
    }
}
