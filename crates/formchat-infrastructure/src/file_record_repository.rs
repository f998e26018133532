//! File-backed implementation of `FormRecordRepository`.
//!
//! Layout: `{records_dir}/{encoded form name}/{key file stem}.json`. Each
//! record is a flat, pretty-printed JSON object.

use std::path::PathBuf;

use async_trait::async_trait;
use formchat_core::error::{FormChatError, Result};
use formchat_core::form::PrimaryKeyValue;
use formchat_core::record::{FieldValues, FormRecordRepository};
use tracing::debug;

use crate::storage::AtomicJsonFile;

/// Stores one JSON file per (form, primary key value).
#[derive(Debug, Clone)]
pub struct FileRecordRepository {
    root: PathBuf,
}

impl FileRecordRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deterministic location of a record.
    pub fn record_path(&self, form: &str, key: &PrimaryKeyValue) -> PathBuf {
        self.root
            .join(urlencoding::encode(form).as_ref())
            .join(format!("{}.json", key.file_stem()))
    }
}

#[async_trait]
impl FormRecordRepository for FileRecordRepository {
    async fn save(&self, form: &str, key: &PrimaryKeyValue, record: &FieldValues) -> Result<()> {
        let path = self.record_path(form, key);
        let record = record.clone();

        debug!(form = %form, path = %path.display(), "Saving form record");

        tokio::task::spawn_blocking(move || AtomicJsonFile::<FieldValues>::new(path).save(&record))
            .await
            .map_err(|e| FormChatError::internal(format!("record writer panicked: {e}")))??;

        Ok(())
    }

    async fn load(&self, form: &str, key: &PrimaryKeyValue) -> Result<Option<FieldValues>> {
        let path = self.record_path(form, key);

        let loaded =
            tokio::task::spawn_blocking(move || AtomicJsonFile::<FieldValues>::new(path).load())
                .await
                .map_err(|e| FormChatError::internal(format!("record reader panicked: {e}")))??;

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(value: &str) -> PrimaryKeyValue {
        PrimaryKeyValue::new(vec![value.to_string()]).unwrap()
    }

    #[test]
    fn test_record_path_layout() {
        let repo = FileRecordRepository::new("/data/records");
        assert_eq!(
            repo.record_path("registration", &key("555-55-5555")),
            PathBuf::from("/data/records/registration/555-55-5555.json")
        );
        assert_eq!(
            repo.record_path("visit", &key("a/b")),
            PathBuf::from("/data/records/visit/a%2Fb.json")
        );
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileRecordRepository::new(temp_dir.path());

        let mut record = FieldValues::new();
        record.insert("FirstName".to_string(), "John".to_string());
        record.insert("License".to_string(), "555-55-5555".to_string());

        repo.save("registration", &key("555-55-5555"), &record)
            .await
            .unwrap();

        let loaded = repo.load("registration", &key("555-55-5555")).await.unwrap();
        assert_eq!(loaded, Some(record));

        let other = repo.load("registration", &key("000-00-0000")).await.unwrap();
        assert!(other.is_none());
    }
}
