//! Persisted form records.

mod repository;

use std::collections::BTreeMap;

pub use repository::FormRecordRepository;

/// Field name to value. Also the shape of a persisted record.
pub type FieldValues = BTreeMap<String, String>;
