//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are attached, and `FANCY_`-prefixed
//! environment variables are applied last so they always win. Nested keys use
//! `__` as separator, e.g. `FANCY_SERVER__PORT=8080` or
//! `FANCY_EXTRACTOR__ALLOWED_HOST=blog.naver.com`.
//!
//! Every field carries a default, so an empty document (or no file at all)
//! yields a usable configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FancyConfig {
    pub version: Option<String>,
    pub server: ServerConfig,
    pub extractor: ExtractorConfig,
    pub bulk: BulkConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// Where the blog text lives and how to reach it.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub allowed_host: String,
    pub frame_id: String,
    /// Space separated class list of the content container.
    pub container_classes: String,
    pub container_lang: String,
    pub text_tag: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            allowed_host: "naver.com".into(),
            frame_id: "mainFrame".into(),
            container_classes: "se-viewer se-theme-default".into(),
            container_lang: "ko-KR".into(),
            text_tag: "span".into(),
            timeout_secs: 15,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionMode {
    #[default]
    Disambiguate,
    Overwrite,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    pub fallback_label: String,
    pub collision: CollisionMode,
    pub archive_name: String,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            fallback_label: "extracted_text".into(),
            collision: CollisionMode::default(),
            archive_name: "extracted_texts.zip".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    pub default_order: String,
    pub max_pages: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://section.blog.naver.com/Search/Post.naver".into(),
            default_order: "sim".into(),
            max_pages: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `text` or `json`.
    pub format: String,
    pub dir: Option<String>,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
            dir: None,
            stderr: true,
            filter: "info".into(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FancyConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FancyConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FancyConfigLoader {
    /// Start from built-in defaults; `FANCY_` env overrides are applied on [`load`](Self::load).
    ///
    /// ```
    /// use fancy_config::FancyConfigLoader;
    ///
    /// let config = FancyConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.extractor.frame_id, "mainFrame");
    /// assert_eq!(config.server.port, 5000);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when missing, so headless
    /// deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use fancy_config::{CollisionMode, FancyConfigLoader};
    ///
    /// let cfg = FancyConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// extractor:
    ///   allowed_host: "blog.naver.com"
    ///   timeout_secs: 5
    /// bulk:
    ///   collision: overwrite
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.extractor.allowed_host, "blog.naver.com");
    /// assert_eq!(cfg.extractor.timeout_secs, 5);
    /// assert_eq!(cfg.extractor.container_lang, "ko-KR");
    /// assert_eq!(cfg.bulk.collision, CollisionMode::Overwrite);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders inside string values are expanded (recursively,
    /// with a depth cap) before the typed structs are materialised.
    pub fn load(self) -> Result<FancyConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("FANCY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FancyConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
