//! Configuration management for Healthdesk.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.healthdesk/config.yaml` or `HEALTHDESK_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Provider settings (embedding and answer generation) can be re-read at any
//! time with [`AppConfig::refreshed`], which the knowledge reload path relies on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Environment variable consulted when no `llm` section is configured.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .healthdesk/ and the KB directories)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Knowledge directories, loaded in order (later documents win on id clashes)
    pub kb_dirs: Vec<PathBuf>,

    /// Number of documents retrieved per query
    pub top_k: usize,

    /// Maximum accepted query length in characters
    pub max_query_chars: usize,

    /// HTTP service settings
    pub server: ServerConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Emit JSON log lines
    pub log_json: bool,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM and embedding provider configuration
    pub llm: Option<LlmConfig>,
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,

    /// Allowed CORS origin; any origin when unset
    #[serde(rename = "corsOrigin")]
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors_origin: None,
        }
    }
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used for answer generation; no generator when unset
    #[serde(rename = "activeProvider", default)]
    pub active_provider: Option<String>,

    /// Provider used for dense embeddings; lexical retrieval only when unset
    #[serde(rename = "activeEmbeddingProvider", default)]
    pub active_embedding_provider: Option<String>,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl LlmConfig {
    /// Configuration equivalent to "an OpenAI key is present in the environment".
    pub fn openai_from_env() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig::OpenAI {
                api_key_env: OPENAI_API_KEY_ENV.to_string(),
                model: DEFAULT_OPENAI_CHAT_MODEL.to_string(),
                embedding_model: Some(DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()),
                endpoint: None,
            },
        );

        Self {
            active_provider: Some("openai".to_string()),
            active_embedding_provider: Some("openai".to_string()),
            providers,
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
    },
    /// Offline embedding provider, useful for demos and tests
    Mock {
        dimensions: usize,
        #[serde(rename = "failOn")]
        fail_on: Option<String>,
    },
}

/// Resolved embedding provider settings.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingSettings {
    OpenAI {
        endpoint: String,
        model: String,
        api_key: String,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
    Mock {
        dimensions: usize,
        fail_on: Option<String>,
    },
}

/// Resolved answer-generator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Provider name understood by the LLM client factory
    pub provider: String,
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    knowledge: Option<KnowledgeConfig>,
    server: Option<ServerFileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KnowledgeConfig {
    dirs: Option<Vec<String>>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "maxQueryChars")]
    max_query_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerFileConfig {
    bind: Option<String>,
    #[serde(rename = "corsOrigin")]
    cors_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            kb_dirs: vec![PathBuf::from("kb"), PathBuf::from("data/kb")],
            top_k: 3,
            max_query_chars: 1000,
            server: ServerConfig::default(),
            log_level: None,
            log_json: false,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, the config file and defaults.
    ///
    /// Environment variables:
    /// - `HEALTHDESK_WORKSPACE`: Override workspace path
    /// - `HEALTHDESK_CONFIG`: Path to config file
    /// - `HEALTHDESK_LOG_JSON`: Emit JSON log lines
    /// - `PORT`: Override the port of `server.bind`
    /// - `CORS_ORIGIN`: Restrict CORS to one origin
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use healthdesk_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with a workspace and config file chosen on
    /// the command line.
    ///
    /// Both must be known before the YAML merge, so they are taken here
    /// rather than in [`AppConfig::with_overrides`]. They win over
    /// `HEALTHDESK_WORKSPACE`, `HEALTHDESK_CONFIG` and `workspace.path`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("HEALTHDESK_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(ref workspace) = workspace {
            config.workspace = workspace.clone();
        }

        if let Ok(config_file) = std::env::var("HEALTHDESK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if config_file.is_some() {
            config.config_file = config_file;
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
            if let Some(workspace) = workspace {
                config.workspace = workspace;
            }
        }

        // Environment variables override YAML config
        if let Ok(port) = std::env::var("PORT") {
            config.server.bind = with_port(&config.server.bind, &port)?;
        }

        if let Ok(origin) = std::env::var("CORS_ORIGIN") {
            config.server.cors_origin = Some(origin);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("HEALTHDESK_LOG_JSON").is_ok() {
            config.log_json = true;
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Path of the YAML config file this configuration reads.
    pub fn config_path(&self) -> PathBuf {
        match self.config_file {
            Some(ref cf) => cf.clone(),
            None => self.healthdesk_dir().join("config.yaml"),
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let config_file = read_config_file(path)?;
        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(knowledge) = config_file.knowledge {
            if let Some(dirs) = knowledge.dirs {
                result.kb_dirs = dirs.into_iter().map(PathBuf::from).collect();
            }
            if let Some(top_k) = knowledge.top_k {
                result.top_k = top_k;
            }
            if let Some(max) = knowledge.max_query_chars {
                result.max_query_chars = max;
            }
        }

        if let Some(server) = config_file.server {
            if let Some(bind) = server.bind {
                result.server.bind = bind;
            }
            if server.cors_origin.is_some() {
                result.server.cors_origin = server.cors_origin;
            }
        }

        result.llm = config_file.llm;

        Ok(result)
    }

    /// Re-read provider configuration from disk, keeping every other setting.
    ///
    /// Used by the reload path so that a changed `llm` section (or a newly
    /// exported API key) takes effect without restarting the process.
    pub fn refreshed(&self) -> AppResult<Self> {
        let mut fresh = self.clone();
        let path = self.config_path();
        fresh.llm = if path.exists() {
            read_config_file(&path)?.llm
        } else {
            None
        };
        Ok(fresh)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    /// A `workspace` or `config_file` given here only changes where later
    /// reloads look; use [`AppConfig::load_from`] to have the file merged.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        bind: Option<String>,
        top_k: Option<usize>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(bind) = bind {
            self.server.bind = bind;
        }

        if let Some(top_k) = top_k {
            self.top_k = top_k;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .healthdesk directory.
    pub fn healthdesk_dir(&self) -> PathBuf {
        self.workspace.join(".healthdesk")
    }

    /// Knowledge directories resolved against the workspace.
    pub fn resolved_kb_dirs(&self) -> Vec<PathBuf> {
        self.kb_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    self.workspace.join(dir)
                }
            })
            .collect()
    }

    /// The LLM section in effect, including the implicit OpenAI setup.
    pub fn effective_llm(&self) -> Option<LlmConfig> {
        match self.llm {
            Some(ref llm) => Some(llm.clone()),
            None if std::env::var(OPENAI_API_KEY_ENV).is_ok() => Some(LlmConfig::openai_from_env()),
            None => None,
        }
    }

    /// Resolve the embedding provider, if one is configured and usable.
    ///
    /// Returns `Ok(None)` when no provider is active or its API key is missing.
    pub fn embedding_settings(&self) -> AppResult<Option<EmbeddingSettings>> {
        let Some(llm) = self.effective_llm() else {
            return Ok(None);
        };
        let Some(name) = llm.active_embedding_provider else {
            return Ok(None);
        };
        let provider = llm.providers.get(&name).ok_or_else(|| {
            AppError::Config(format!("Unknown embedding provider: {}", name))
        })?;

        let settings = match provider {
            ProviderConfig::OpenAI {
                api_key_env,
                embedding_model,
                endpoint,
                ..
            } => {
                let Ok(api_key) = std::env::var(api_key_env) else {
                    tracing::debug!("Embedding API key not set in {}", api_key_env);
                    return Ok(None);
                };
                EmbeddingSettings::OpenAI {
                    endpoint: endpoint
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string()),
                    model: embedding_model
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string()),
                    api_key,
                }
            }
            ProviderConfig::Ollama {
                endpoint,
                embedding_model,
                ..
            } => EmbeddingSettings::Ollama {
                endpoint: endpoint.clone(),
                model: embedding_model
                    .clone()
                    .unwrap_or_else(|| "nomic-embed-text".to_string()),
            },
            ProviderConfig::Mock {
                dimensions,
                fail_on,
            } => EmbeddingSettings::Mock {
                dimensions: *dimensions,
                fail_on: fail_on.clone(),
            },
        };

        Ok(Some(settings))
    }

    /// Resolve the answer generator, if one is configured and usable.
    pub fn generator_settings(&self) -> AppResult<Option<GeneratorSettings>> {
        let Some(llm) = self.effective_llm() else {
            return Ok(None);
        };
        let Some(name) = llm.active_provider else {
            return Ok(None);
        };
        let provider = llm
            .providers
            .get(&name)
            .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", name)))?;

        let settings = match provider {
            ProviderConfig::OpenAI {
                api_key_env,
                model,
                endpoint,
                ..
            } => {
                let Ok(api_key) = std::env::var(api_key_env) else {
                    tracing::debug!("Generator API key not set in {}", api_key_env);
                    return Ok(None);
                };
                GeneratorSettings {
                    provider: "openai".to_string(),
                    endpoint: endpoint.clone(),
                    model: model.clone(),
                    api_key: Some(api_key),
                }
            }
            ProviderConfig::Ollama {
                endpoint, model, ..
            } => GeneratorSettings {
                provider: "ollama".to_string(),
                endpoint: Some(endpoint.clone()),
                model: model.clone(),
                api_key: None,
            },
            ProviderConfig::Mock { .. } => {
                return Err(AppError::Config(format!(
                    "Provider '{}' can only be used for embeddings",
                    name
                )))
            }
        };

        Ok(Some(settings))
    }
}

fn read_config_file(path: &Path) -> AppResult<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
}

/// Replace the port of a `host:port` bind address.
fn with_port(bind: &str, port: &str) -> AppResult<String> {
    let port: u16 = port
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid PORT value: {}", port)))?;
    let host = bind.rsplit_once(':').map(|(h, _)| h).unwrap_or(bind);
    Ok(format!("{}:{}", host, port))
}
