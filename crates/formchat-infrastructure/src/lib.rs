pub mod config_service;
pub mod file_record_repository;
pub mod paths;
pub mod storage;

pub use crate::config_service::{ConfigService, LoadedConfig};
pub use crate::file_record_repository::FileRecordRepository;
pub use crate::paths::FormChatPaths;
