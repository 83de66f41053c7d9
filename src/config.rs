//! TOML configuration for the server and the summarization model.
//!
//! Every field has a default, so running without a config file is valid.
//! The summarization pipeline itself reads no configuration; these settings
//! only choose the model and shape the HTTP boundary.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Upper bound on request bodies, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Bound on one `/summarize` call, model inference included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name; the local provider falls back to `bart-large-cnn`.
    #[serde(default)]
    pub model: Option<String>,
    /// Ollama base URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Where local model files are cached.
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            model_dir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }
    if config.server.request_timeout_secs == 0 {
        anyhow::bail!("server.request_timeout_secs must be > 0");
    }

    match config.summarizer.provider.as_str() {
        "disabled" | "local" => {}
        "ollama" => {
            if config.summarizer.model.is_none() {
                anyhow::bail!("summarizer.model must be specified when provider is 'ollama'");
            }
        }
        other => anyhow::bail!(
            "Unknown summarizer provider: '{}'. Must be disabled, local, or ollama.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
        assert_eq!(config.summarizer.provider, "local");
        assert!(config.summarizer.model.is_none());
    }

    #[test]
    fn parses_ollama_section() {
        let config = parse_config(
            r#"
[server]
bind = "127.0.0.1:9000"
request_timeout_secs = 60

[summarizer]
provider = "ollama"
model = "llama3.2"
url = "http://gpu-box:11434"
"#,
        )
        .unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.summarizer.provider, "ollama");
        assert_eq!(config.summarizer.url.as_deref(), Some("http://gpu-box:11434"));
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = parse_config("[summarizer]\nprovider = \"cloud\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown summarizer provider"));
    }

    #[test]
    fn ollama_requires_model() {
        let err = parse_config("[summarizer]\nprovider = \"ollama\"\n").unwrap_err();
        assert!(err.to_string().contains("summarizer.model"));
    }

    #[test]
    fn rejects_zero_limits() {
        assert!(parse_config("[server]\nmax_upload_bytes = 0\n").is_err());
        assert!(parse_config("[server]\nrequest_timeout_secs = 0\n").is_err());
        assert!(parse_config("[server]\nbind = \" \"\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
