//! Unified path management for formchat files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/formchat/          # Config directory
//! └── formchat.toml            # Forms and server configuration
//!
//! ~/.local/share/formchat/     # Data directory (or [storage].data_dir)
//! ├── records/                 # Saved form records
//! │   └── registration/
//! │       └── 555-55-5555.json
//! └── logs/                    # Application logs
//!     └── formchat-web.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "formchat";

/// Errors that can occur during path resolution.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for formchat_core::FormChatError {
    fn from(err: PathError) -> Self {
        formchat_core::FormChatError::config(err.to_string())
    }
}

/// Resolved locations for one running instance.
///
/// The platform defaults come from `dirs`. A configured data directory
/// replaces the platform data directory entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormChatPaths {
    data_dir: PathBuf,
}

impl FormChatPaths {
    /// Uses `data_dir` when given, the platform data directory otherwise.
    pub fn resolve(data_dir: Option<&Path>) -> Result<Self, PathError> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::default_data_dir()?,
        };
        Ok(Self { data_dir })
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the formchat configuration directory (e.g. `~/.config/formchat/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the default path of `formchat.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("formchat.toml"))
    }

    /// Returns the platform data directory (e.g. `~/.local/share/formchat/`).
    pub fn default_data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Root of the saved form records.
    pub fn records_dir(&self) -> PathBuf {
        self.data_dir.join("records")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_wins() {
        let paths = FormChatPaths::resolve(Some(Path::new("/srv/formchat"))).unwrap();
        assert_eq!(paths.records_dir(), PathBuf::from("/srv/formchat/records"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/srv/formchat/logs"));
    }

    #[test]
    fn test_config_file_name() {
        if let Ok(path) = FormChatPaths::config_file() {
            assert!(path.ends_with("formchat/formchat.toml"));
        }
    }
}
