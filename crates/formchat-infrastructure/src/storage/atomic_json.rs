//! Atomic JSON file operations.
//!
//! Writes go to a hidden temp file in the target directory, are fsynced and
//! then renamed over the target, all while an exclusive advisory lock is held
//! on a sibling `.lock` file.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write as IoWrite};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use formchat_core::FormChatError;

/// Errors that can occur during atomic JSON operations.
#[derive(Debug, thiserror::Error)]
pub enum AtomicJsonError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Lock error on {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<AtomicJsonError> for FormChatError {
    fn from(err: AtomicJsonError) -> Self {
        FormChatError::persistence(err.to_string())
    }
}

/// A handle to a JSON file that is only ever replaced whole.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| AtomicJsonError::Json {
                path: self.path.clone(),
                source,
            })
    }

    /// Replaces the file with `data`, pretty-printed.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let _lock = FileLock::acquire(&self.path)?;

        let mut json = serde_json::to_string_pretty(data).map_err(|source| {
            AtomicJsonError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        json.push('\n');

        let tmp_path = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(json.as_bytes())?;
            tmp_file.sync_all()?;
            drop(tmp_file);
            fs::rename(&tmp_path, &self.path)
        };

        write().map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            self.io_error(source)
        })
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{file_name}.tmp"))
    }

    fn io_error(&self, source: std::io::Error) -> AtomicJsonError {
        AtomicJsonError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Exclusive advisory lock, released when dropped.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicJsonError> {
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| AtomicJsonError::Lock {
                path: lock_path.clone(),
                source,
            })?;

        fs2::FileExt::lock_exclusive(&file).map_err(|source| AtomicJsonError::Lock {
            path: lock_path,
            source,
        })?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The lock file stays on disk.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    type Record = BTreeMap<String, String>;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<Record>::new(temp_dir.path().join("a/b/record.json"));

        let data = record(&[("Zip", "12345"), ("Address", "1 Elm St")]);
        file.save(&data).unwrap();

        assert_eq!(file.load().unwrap(), Some(data));
    }

    #[test]
    fn test_output_is_pretty_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");
        let file = AtomicJsonFile::<Record>::new(path.clone());

        file.save(&record(&[("b", "2"), ("a", "1")])).unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content, "{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}\n");
    }

    #[test]
    fn test_load_missing_or_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        let file = AtomicJsonFile::<Record>::new(path.clone());
        assert!(file.load().unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = AtomicJsonFile::<Record>::new(path).load().unwrap_err();
        assert!(matches!(err, AtomicJsonError::Json { .. }));
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");
        let file = AtomicJsonFile::<Record>::new(path.clone());

        file.save(&record(&[("a", "1")])).unwrap();
        file.save(&record(&[("a", "2")])).unwrap();

        assert!(!temp_dir.path().join(".record.json.tmp").exists());
        assert_eq!(file.load().unwrap(), Some(record(&[("a", "2")])));
    }

    #[test]
    fn test_lock_is_released_after_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");
        let file = AtomicJsonFile::<Record>::new(path.clone());

        file.save(&record(&[("a", "1")])).unwrap();

        let lock_file = File::open(path.with_extension("lock")).unwrap();
        fs2::FileExt::try_lock_exclusive(&lock_file).unwrap();
        fs2::FileExt::unlock(&lock_file).unwrap();

        file.save(&record(&[("a", "2")])).unwrap();
        assert_eq!(file.load().unwrap(), Some(record(&[("a", "2")])));
    }
}
