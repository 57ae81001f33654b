use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration loaded from `~/.dockshell/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub shell: ShellConfig,
}

impl Config {
    /// Load config from `~/.dockshell/config.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Semantic validation for settings that are not fully expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.docker.validate()?;
        self.shell.validate()?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dockshell")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// Docker
// ---------------------------------------------------------------------------

/// Container runtime settings.
///
/// `container_prefix` is also the prefix of every shell prompt sentinel, so it
/// must stay a legal container name fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    #[serde(default = "default_docker_executable")]
    pub executable: String,
    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,
    /// Host directory used to stage binary transfers. Defaults to the OS
    /// temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            executable: default_docker_executable(),
            container_prefix: default_container_prefix(),
            temp_dir: None,
        }
    }
}

impl DockerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executable.trim().is_empty() {
            return Err(ConfigError::Validation(
                "docker.executable must not be empty".to_string(),
            ));
        }
        let prefix = &self.container_prefix;
        let legal = prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        let starts_alnum = prefix
            .chars()
            .next()
            .is_none_or(|c| c.is_ascii_alphanumeric());
        if !legal || !starts_alnum {
            return Err(ConfigError::Validation(format!(
                "docker.container_prefix '{prefix}' may only contain [A-Za-z0-9_.-] and must start with an alphanumeric"
            )));
        }
        Ok(())
    }

    /// Staging directory for binary transfers.
    pub fn staging_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_docker_executable() -> String {
    "docker".into()
}
fn default_container_prefix() -> String {
    "dockshell-".into()
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// Interactive shell protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Shell executed inside the container.
    #[serde(default = "default_shell_program")]
    pub program: String,
    /// `TERM` exported to the shell. A dumb terminal keeps readline from
    /// decorating the output with escape sequences.
    #[serde(default = "default_term")]
    pub term: String,
    /// Timeout applied to every individual pattern wait.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// The shell's secondary prompt (`PS2`).
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// Regex matching the shell's stock prompt before bootstrap.
    #[serde(default = "default_ready_pattern")]
    pub ready_pattern: String,
    /// Lines sent during bootstrap to stop startup tooling from rewriting `PS1`.
    #[serde(default = "default_neutralize_hooks")]
    pub neutralize_hooks: Vec<String>,
    /// Upper bound on concurrently open shells in one PTY pool.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_shell_program(),
            term: default_term(),
            timeout_secs: default_timeout_secs(),
            continuation_prompt: default_continuation_prompt(),
            ready_pattern: default_ready_pattern(),
            neutralize_hooks: default_neutralize_hooks(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl ShellConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "shell.program must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "shell.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.continuation_prompt.is_empty() {
            return Err(ConfigError::Validation(
                "shell.continuation_prompt must not be empty".to_string(),
            ));
        }
        if self.max_sessions == 0 {
            return Err(ConfigError::Validation(
                "shell.max_sessions must be greater than zero".to_string(),
            ));
        }
        regex::Regex::new(&self.ready_pattern).map_err(|e| {
            ConfigError::Validation(format!(
                "shell.ready_pattern '{}' is not a valid regex: {e}",
                self.ready_pattern
            ))
        })?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_shell_program() -> String {
    "/bin/bash".into()
}
fn default_term() -> String {
    "dumb".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_continuation_prompt() -> String {
    "> ".into()
}
fn default_ready_pattern() -> String {
    r"[#$] ".into()
}
fn default_neutralize_hooks() -> Vec<String> {
    vec![
        "conda config --set changeps1 False 2>/dev/null".into(),
        "unset PROMPT_COMMAND".into(),
        "bind 'set enable-bracketed-paste off' 2>/dev/null".into(),
    ]
}
fn default_max_sessions() -> usize {
    16
}
