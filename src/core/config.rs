//! Paths and settings.
//!
//! `AppPaths` discovers where the service keeps its data; `Settings` is the
//! typed configuration loaded from `qabase.yml` with environment overrides
//! for the provider endpoint and credential.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

const CONFIG_FILE: &str = "qabase.yml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        let log_dir = user_data_dir.join("logs");
        let db_path = user_data_dir.join("qabase.db");

        for dir in [&user_data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            db_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("QABASE_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join(CONFIG_FILE).exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("QABASE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("Qabase");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("Qabase");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("qabase")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Typed service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub rag: RagSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embedding_deployment: String,
    pub embedding_dimensions: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2024-10-21".to_string(),
            chat_deployment: "gpt-4o-mini".to_string(),
            embedding_deployment: "text-embedding-3-large".to_string(),
            embedding_dimensions: 3072,
        }
    }
}

/// Retrieval tunables. The threshold and result cap are operating points,
/// not derived quantities; adjust them per corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub similarity_threshold: f32,
    pub top_k: usize,
    pub chat_temperature: f64,
    pub extraction_temperature: f64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            top_k: 5,
            chat_temperature: 0.5,
            extraction_temperature: 0.3,
        }
    }
}

impl Settings {
    /// Load settings from `qabase.yml` in the project root, falling back to
    /// defaults when the file is absent. `AZURE_OPENAI_ENDPOINT` and
    /// `AZURE_OPENAI_API_KEY` override the file-provided values.
    pub fn load(paths: &AppPaths) -> Result<Self, ApiError> {
        let config_path = paths.project_root.join(CONFIG_FILE);

        let mut settings = if config_path.exists() {
            let raw = fs::read_to_string(&config_path).map_err(|e| {
                ApiError::Config(format!("failed to read {}: {}", config_path.display(), e))
            })?;
            serde_yaml::from_str::<Settings>(&raw).map_err(|e| {
                ApiError::Config(format!("failed to parse {}: {}", config_path.display(), e))
            })?
        } else {
            Settings::default()
        };

        if let Ok(endpoint) = env::var("AZURE_OPENAI_ENDPOINT") {
            settings.provider.endpoint = endpoint;
        }
        if let Ok(api_key) = env::var("AZURE_OPENAI_API_KEY") {
            settings.provider.api_key = api_key;
        }

        Ok(settings)
    }

    /// Reject settings that cannot reach the provider.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.provider.endpoint.trim().is_empty() {
            return Err(ApiError::Config(
                "provider endpoint is not configured (set AZURE_OPENAI_ENDPOINT)".to_string(),
            ));
        }
        if self.provider.api_key.trim().is_empty() {
            return Err(ApiError::Config(
                "provider api key is not configured (set AZURE_OPENAI_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }
}
