//! Configuration service implementation.
//!
//! Loads `formchat.toml` (by default `~/.config/formchat/formchat.toml`),
//! applies environment overrides and builds the validated form catalog.

use std::path::{Path, PathBuf};

use formchat_core::config::ConfigRoot;
use formchat_core::error::{FormChatError, Result};
use formchat_core::form::FormCatalog;
use tracing::{debug, info};

use crate::paths::FormChatPaths;

/// Environment variable overriding `[llm].model`.
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL_NAME";

/// A parsed and validated configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Where the configuration was read from
    pub path: PathBuf,
    pub root: ConfigRoot,
    pub catalog: FormCatalog,
}

impl LoadedConfig {
    /// Resolved storage locations, honoring `[storage].data_dir`.
    pub fn paths(&self) -> Result<FormChatPaths> {
        let data_dir = self.root.storage.data_dir.as_deref().map(Path::new);
        Ok(FormChatPaths::resolve(data_dir)?)
    }
}

/// Reads configuration files.
#[derive(Debug, Clone, Default)]
pub struct ConfigService;

impl ConfigService {
    pub fn new() -> Self {
        Self
    }

    /// Loads the file at `path`, or the default location when `None`.
    pub fn load(&self, path: Option<&Path>) -> Result<LoadedConfig> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => FormChatPaths::config_file()?,
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            FormChatError::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut loaded = self.parse(&content)?;
        loaded.path = path;
        info!(
            path = %loaded.path.display(),
            forms = loaded.catalog.forms().len(),
            "Loaded configuration"
        );
        Ok(loaded)
    }

    /// Parses TOML text and validates the form catalog.
    pub fn parse(&self, content: &str) -> Result<LoadedConfig> {
        let mut root: ConfigRoot = toml::from_str(content)?;
        apply_env_overrides(&mut root, |name| std::env::var(name).ok());

        if root.forms.is_empty() {
            return Err(FormChatError::config("no [[form]] tables configured"));
        }

        let catalog = FormCatalog::from_config(&root)?;
        Ok(LoadedConfig {
            path: PathBuf::new(),
            root,
            catalog,
        })
    }
}

/// Applies environment overrides using the given lookup.
pub fn apply_env_overrides<F>(root: &mut ConfigRoot, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(model) = lookup(MODEL_ENV_VAR).filter(|m| !m.trim().is_empty()) {
        debug!(model = %model, "Model overridden from environment");
        root.llm.model = model;
    }
}
