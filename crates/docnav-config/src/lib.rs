use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the docs root, checked after the command line.
pub const PROJECT_PATH_VAR: &str = "PROJECT_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub docs_root: PathBuf,
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
    #[serde(default)]
    pub include_hidden: bool,
    /// Markdown file names left out of the index.
    #[serde(default = "default_skip_files")]
    pub skip_files: Vec<String>,
}

fn default_max_include_depth() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_skip_files() -> Vec<String> {
    vec!["README.md".to_string(), "CLAUDE.md".to_string()]
}

impl Config {
    pub fn new(docs_root: impl Into<PathBuf>) -> Self {
        Self {
            docs_root: docs_root.into(),
            max_include_depth: default_max_include_depth(),
            respect_gitignore: true,
            include_hidden: false,
            skip_files: default_skip_files(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded docs root
        config.docs_root = Self::expand_path(&config.docs_root).unwrap_or(config.docs_root);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/docnav");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Pick the docs root: command line, then `PROJECT_PATH`, then the config
/// file, then the current directory.
pub fn resolve_docs_root(cli: Option<PathBuf>, config: Option<&Config>) -> anyhow::Result<PathBuf> {
    let from_env = env::var_os(PROJECT_PATH_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    match choose_docs_root(cli, from_env, config) {
        Some(root) => Ok(root),
        None => Ok(env::current_dir()?),
    }
}

fn choose_docs_root(cli: Option<PathBuf>, from_env: Option<PathBuf>, config: Option<&Config>) -> Option<PathBuf> {
    cli.or(from_env)
        .map(|path| Config::expand_path(&path).unwrap_or(path))
        .or_else(|| config.map(|c| c.docs_root.clone()))
}
