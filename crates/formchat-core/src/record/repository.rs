//! Form record repository trait.

use async_trait::async_trait;

use super::FieldValues;
use crate::error::Result;
use crate::form::PrimaryKeyValue;

/// An abstract store for completed form records.
///
/// A record is addressed by form name and primary-key value. Saving replaces
/// whatever was stored under the same address.
#[async_trait]
pub trait FormRecordRepository: Send + Sync {
    /// Writes the complete record, replacing any previous one.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Record stored
    /// - `Err(FormChatError::Persistence)`: The write failed
    async fn save(&self, form: &str, key: &PrimaryKeyValue, record: &FieldValues) -> Result<()>;

    /// Loads a record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: Record found
    /// - `Ok(None)`: Nothing stored under this address
    /// - `Err(_)`: The record exists but could not be read
    async fn load(&self, form: &str, key: &PrimaryKeyValue) -> Result<Option<FieldValues>>;
}
