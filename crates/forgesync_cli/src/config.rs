//! Configuration file support for forgesync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `FORGESYNC_`, nested keys joined
//!    with `__`, e.g. `FORGESYNC_TOKENS__TARGET`)
//! 3. Config file (./forgesync.toml, then ~/.config/forgesync/config.toml)
//! 4. Built-in defaults
//!
//! Tokens additionally fall back to the plain `SOURCE_TOKEN`, `TARGET_TOKEN`
//! and `MIRROR_TOKEN` environment variables.
//!
//! Example config file:
//! ```toml
//! source = "https://git.example.com"
//! target = "github"
//! description_template = "{description} (Mirror of {url})"
//! remirror = "never"
//! mirror_interval = "8h0m0s"
//! immediate = true
//! sync_on_push = false
//! include = ["app-.*"]
//! exclude = ["app-secret"]
//! features = ["issues", "wiki"]
//! rate_limit = true
//!
//! [tokens]
//! source = "..."  # or SOURCE_TOKEN
//! target = "..."  # or TARGET_TOKEN
//! mirror = "..."  # or MIRROR_TOKEN
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source Forgejo instance URL.
    pub source: Option<String>,
    /// Destination, `platform[=instance]`.
    pub target: Option<String>,
    pub description_template: Option<String>,
    /// Remirror rule: never, always, purge or a time rule.
    pub remirror: Option<String>,
    pub mirror_interval: Option<String>,
    /// Trigger a mirror sync right after creating a mirror.
    pub immediate: Option<bool>,
    pub sync_on_push: Option<bool>,
    /// Repository name patterns to include.
    pub include: Vec<String>,
    /// Repository name patterns to exclude.
    pub exclude: Vec<String>,
    /// Repository features to enable on the destination.
    pub features: Vec<String>,
    /// Whether to pace API requests proactively.
    pub rate_limit: bool,
    pub tokens: TokensConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            target: None,
            description_template: None,
            remirror: None,
            mirror_interval: None,
            immediate: None,
            sync_on_push: None,
            include: Vec::new(),
            exclude: Vec::new(),
            features: Vec::new(),
            rate_limit: true,
            tokens: TokensConfig::default(),
        }
    }
}

/// API and mirror credentials.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokensConfig {
    /// Token for the source Forgejo API.
    pub source: Option<String>,
    /// Token for the destination API.
    pub target: Option<String>,
    /// Password the source forge pushes to the destination with.
    pub mirror: Option<String>,
}

/// Resolved credentials, all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub source: String,
    pub target: String,
    pub mirror: String,
}

/// A required token is set nowhere.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Missing token: set {env} or tokens.{key} in the config file")]
pub struct MissingToken {
    pub key: &'static str,
    pub env: &'static str,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/forgesync/config.toml)
    /// 3. Local config file (./forgesync.toml)
    /// 4. Environment variables with FORGESYNC_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("forgesync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./forgesync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g. FORGESYNC_MIRROR_INTERVAL -> mirror_interval,
        // FORGESYNC_TOKENS__TARGET -> tokens.target
        builder = builder.add_source(
            Environment::with_prefix("FORGESYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("include")
                .with_list_parse_key("exclude")
                .with_list_parse_key("features"),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "forgesync").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve all tokens from the process environment.
    pub fn tokens(&self) -> Result<Tokens, MissingToken> {
        self.tokens_with(|name| std::env::var(name).ok())
    }

    /// Resolve all tokens, falling back to `env` for unset ones.
    pub fn tokens_with<F>(&self, env: F) -> Result<Tokens, MissingToken>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |configured: &Option<String>, key: &'static str, var: &'static str| {
            configured
                .clone()
                .or_else(|| env(var))
                .filter(|token| !token.is_empty())
                .ok_or(MissingToken { key, env: var })
        };

        Ok(Tokens {
            source: resolve(&self.tokens.source, "source", "SOURCE_TOKEN")?,
            target: resolve(&self.tokens.target, "target", "TARGET_TOKEN")?,
            mirror: resolve(&self.tokens.mirror, "mirror", "MIRROR_TOKEN")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_toml(content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.source.is_none());
        assert!(config.target.is_none());
        assert!(config.remirror.is_none());
        assert!(config.include.is_empty());
        assert!(config.rate_limit);
        assert!(config.tokens.mirror.is_none());
    }

    #[test]
    fn test_config_builder_with_defaults() {
        let settings = ConfigBuilder::builder().build().unwrap();
        let config: Config = settings.try_deserialize().unwrap_or_default();
        assert!(config.rate_limit);
        assert!(config.features.is_empty());
    }

    #[test]
    fn test_full_config_parsing() {
        let config = from_toml(
            r#"
            source = "https://git.example.com"
            target = "forgejo=https://backup.example.com"
            description_template = "{description}"
            remirror = "* * * * * 00"
            mirror_interval = "1h0m0s"
            immediate = false
            sync_on_push = true
            include = ["app-.*"]
            exclude = ["app-secret"]
            features = ["issues", "wiki"]
            rate_limit = false

            [tokens]
            source = "src"
            target = "dst"
            mirror = "mir"
            "#,
        );

        assert_eq!(config.source.as_deref(), Some("https://git.example.com"));
        assert_eq!(
            config.target.as_deref(),
            Some("forgejo=https://backup.example.com")
        );
        assert_eq!(config.remirror.as_deref(), Some("* * * * * 00"));
        assert_eq!(config.mirror_interval.as_deref(), Some("1h0m0s"));
        assert_eq!(config.immediate, Some(false));
        assert_eq!(config.sync_on_push, Some(true));
        assert_eq!(config.include, vec!["app-.*"]);
        assert_eq!(config.exclude, vec!["app-secret"]);
        assert_eq!(config.features, vec!["issues", "wiki"]);
        assert!(!config.rate_limit);
        assert_eq!(config.tokens.target.as_deref(), Some("dst"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = from_toml(r#"target = "codeberg""#);
        assert_eq!(config.target.as_deref(), Some("codeberg"));
        assert!(config.rate_limit);
        assert!(config.tokens.source.is_none());
    }

    #[test]
    fn test_tokens_fall_back_to_environment() {
        let config = from_toml(
            r#"
            [tokens]
            target = "from-file"
            "#,
        );
        let env: HashMap<&str, &str> = [
            ("SOURCE_TOKEN", "from-env"),
            ("TARGET_TOKEN", "ignored"),
            ("MIRROR_TOKEN", "mirror-env"),
        ]
        .into_iter()
        .collect();

        let tokens = config
            .tokens_with(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(
            tokens,
            Tokens {
                source: "from-env".to_string(),
                target: "from-file".to_string(),
                mirror: "mirror-env".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_token_names_the_variable() {
        let config = Config::default();
        let err = config
            .tokens_with(|name| (name != "MIRROR_TOKEN").then(|| "x".to_string()))
            .unwrap_err();

        assert_eq!(err.env, "MIRROR_TOKEN");
        assert!(err.to_string().contains("tokens.mirror"));
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let config = Config::default();
        let err = config.tokens_with(|_| Some(String::new())).unwrap_err();
        assert_eq!(err.env, "SOURCE_TOKEN");
    }

    #[test]
    fn test_default_config_path_is_named_after_the_binary() {
        if let Some(path) = Config::default_config_path() {
            assert!(path.ends_with("config.toml"));
            assert!(path.to_string_lossy().contains("forgesync"));
        }
    }
}
