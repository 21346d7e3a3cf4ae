//! Configuration loading from wizard.toml.

use std::collections::HashMap;
use std::path::Path;

use runtime::providers::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use runtime::{DEFAULT_MAX_ITERATIONS, OpenAiBackend, OpenAiBackendBuilder, ToolCallPolicy};
use serde::Deserialize;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "wizard.toml";

const SYSTEM_PROMPT: &str = "You are Math Wizard, a helpful assistant. \
    Use the available tools for arithmetic instead of computing in your head, \
    and answer concisely.";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: ModelConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
}

/// Model endpoint settings.
///
/// The API key is never read from here, only from the environment.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl ModelConfig {
    /// Apply these settings to a builder holding the credential.
    pub fn backend(&self, builder: OpenAiBackendBuilder) -> OpenAiBackend {
        let mut builder = builder.model(&self.name).base_url(&self.base_url);
        if let Some(max_tokens) = self.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.temperature(temperature);
        }
        builder.build()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub system_prompt: String,
    pub max_iterations: usize,
    pub tool_calls: ToolCallPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_calls: ToolCallPolicy::default(),
        }
    }
}

/// Where the agent's tools come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSource {
    /// Built-in tools, run in-process.
    #[default]
    Local,
    /// Tools discovered from an MCP server subprocess.
    Remote,
    /// No tools at all.
    None,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub source: ToolSource,
    pub remote: RemoteConfig,
}

/// MCP server launched for `source = "remote"`.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            name: "math".to_string(),
            command: "math-mcp".to_string(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

impl RemoteConfig {
    pub fn server_config(&self) -> mcp::ServerConfig {
        mcp::ServerConfig {
            name: self.name.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else
    /// defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model.name, DEFAULT_MODEL);
        assert_eq!(config.model.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.agent.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.agent.tool_calls, ToolCallPolicy::Sequential);
        assert_eq!(config.tools.source, ToolSource::Local);
        assert_eq!(config.tools.remote.command, "math-mcp");
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [model]
            name = "gpt-4o"
            base_url = "http://localhost:8080/v1"
            max_tokens = 512

            [agent]
            system_prompt = "Be brief."
            max_iterations = 4
            tool_calls = "first_only"

            [tools]
            source = "remote"

            [tools.remote]
            command = "python"
            args = ["-m", "math_server"]
            env = { PYTHONUNBUFFERED = "1" }
            "#,
        )
        .unwrap();

        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.model.max_tokens, Some(512));
        assert_eq!(config.agent.system_prompt, "Be brief.");
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.agent.tool_calls, ToolCallPolicy::FirstOnly);
        assert_eq!(config.tools.source, ToolSource::Remote);

        let server = config.tools.remote.server_config();
        assert_eq!(server.name, "math");
        assert_eq!(server.command, "python");
        assert_eq!(server.args, ["-m", "math_server"]);
        assert_eq!(server.env["PYTHONUNBUFFERED"], "1");
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(matches!(
            Config::parse("[tools]\nsource = \"carrier-pigeon\""),
            Err(ConfigError::Parse(_))
        ));
        // Keys never belong in the file
        assert!(matches!(
            Config::parse("[model]\napi_key = \"sk-...\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tools]\nsource = \"none\"").unwrap();

        let config = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(config.tools.source, ToolSource::None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::resolve(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn backend_uses_model_settings() {
        let config = Config::parse("[model]\nname = \"gpt-4o\"").unwrap();
        let backend = config.model.backend(OpenAiBackend::builder("sk-test"));
        assert_eq!(backend.to_string(), "openai(gpt-4o)");
    }
}
