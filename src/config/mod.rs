//! Application configuration and control-plane credentials

use crate::cluster::Backend;
use crate::error::{Result, SupportError};
use crate::limiter::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the platform API key
pub const API_KEY_ENV: &str = "CF_API_KEY";
/// Environment variable holding the platform URL
pub const BASE_URL_ENV: &str = "CF_BASE_URL";

/// Application configuration stored in ~/.cf-support/config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Concurrent per-item operations per resource kind
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Source of describe output and logs
    #[serde(default)]
    pub backend: Backend,

    /// Directory receiving the staging tree and the archive
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_concurrency() -> usize {
    DEFAULT_CAPACITY
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            backend: Backend::default(),
            output_dir: default_output_dir(),
        }
    }
}

/// Get the config directory (~/.cf-support)
pub fn config_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".cf-support"))
        .ok_or_else(|| SupportError::Config("Could not determine home directory".to_string()))
}

/// Parse application config from TOML text
pub fn parse_config(content: &str) -> Result<AppConfig> {
    toml::from_str(content).map_err(|e| SupportError::Config(e.to_string()))
}

/// Load application config from ~/.cf-support/config.toml, defaults when absent
pub fn load_config() -> Result<AppConfig> {
    let path = config_dir()?.join("config.toml");
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        parse_config(&content)
    } else {
        Ok(AppConfig::default())
    }
}

/// Authorization for the platform API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Value of the `Authorization` header
    pub auth_header: String,
    /// API root, ending in `/api`
    pub base_url: String,
}

/// `~/.cfconfig` as written by the platform CLI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub contexts: HashMap<String, CliContext>,
    #[serde(rename = "current-context", default)]
    pub current_context: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliContext {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl CliConfig {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn current(&self) -> Option<&CliContext> {
        self.contexts.get(self.current_context.as_deref()?)
    }

    pub fn token(&self) -> Option<&str> {
        self.current()?.token.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.current()?.url.as_deref()
    }
}

/// Path of the platform CLI config (~/.cfconfig)
pub fn cli_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".cfconfig"))
}

fn read_cli_config(path: &Path) -> Option<CliConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match CliConfig::parse(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unreadable platform CLI config");
            None
        }
    }
}

/// Resolve credentials; each value prefers the environment over the CLI config
pub fn resolve_credentials(
    env_key: Option<String>,
    env_url: Option<String>,
    cli_config: Option<&CliConfig>,
) -> Result<Credentials> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let token = non_empty(env_key).or_else(|| cli_config.and_then(CliConfig::token).map(String::from));
    let url = non_empty(env_url).or_else(|| cli_config.and_then(CliConfig::url).map(String::from));

    match (token, url) {
        (Some(token), Some(url)) => Ok(Credentials {
            auth_header: token,
            base_url: format!("{}/api", url.trim_end_matches('/')),
        }),
        _ => Err(SupportError::CredentialsNotFound(format!(
            "set {API_KEY_ENV} and {BASE_URL_ENV}, or configure a current context in ~/.cfconfig"
        ))),
    }
}

/// Load credentials from the environment and ~/.cfconfig
pub fn load_credentials() -> Result<Credentials> {
    let cli_config = cli_config_path().and_then(|p| read_cli_config(&p));
    resolve_credentials(
        std::env::var(API_KEY_ENV).ok(),
        std::env::var(BASE_URL_ENV).ok(),
        cli_config.as_ref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CFCONFIG: &str = r#"
contexts:
  default:
    type: APIKey
    name: default
    url: https://g.codefresh.io
    token: saas-token
  onprem:
    url: https://cf.example.com/
    token: onprem-token
current-context: onprem
"#;

    #[test]
    fn test_config_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.backend, Backend::Api);
    }

    #[test]
    fn test_config_overrides() {
        let config = parse_config("concurrency = 2\nbackend = \"kubectl\"\noutput_dir = \"/tmp/out\"").unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.backend, Backend::Kubectl);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_config_rejects_bad_backend() {
        assert!(matches!(parse_config("backend = \"ssh\""), Err(SupportError::Config(_))));
    }

    #[test]
    fn test_credentials_from_cli_config() {
        let cli = CliConfig::parse(CFCONFIG).unwrap();
        let creds = resolve_credentials(None, None, Some(&cli)).unwrap();
        assert_eq!(creds.auth_header, "onprem-token");
        assert_eq!(creds.base_url, "https://cf.example.com/api");
    }

    #[test]
    fn test_environment_wins() {
        let cli = CliConfig::parse(CFCONFIG).unwrap();
        let creds = resolve_credentials(
            Some("env-token".to_string()),
            Some("https://g.codefresh.io".to_string()),
            Some(&cli),
        )
        .unwrap();
        assert_eq!(creds.auth_header, "env-token");
        assert_eq!(creds.base_url, "https://g.codefresh.io/api");
    }

    #[test]
    fn test_missing_credentials() {
        assert!(matches!(
            resolve_credentials(None, None, None),
            Err(SupportError::CredentialsNotFound(_))
        ));

        let dangling = CliConfig::parse("contexts: {}\ncurrent-context: gone\n").unwrap();
        assert!(matches!(
            resolve_credentials(Some("key".to_string()), None, Some(&dangling)),
            Err(SupportError::CredentialsNotFound(_))
        ));
    }
}
