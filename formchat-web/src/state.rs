//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use formchat_application::{FormChatService, ServiceSettings};
use formchat_core::agent::CompletionAgent;
use formchat_core::error::Result;
use formchat_core::record::FormRecordRepository;
use formchat_infrastructure::{FileRecordRepository, LoadedConfig};

use crate::pages::Pages;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FormChatService>,
    pub pages: Arc<Pages>,
}

impl AppState {
    pub fn new(service: Arc<FormChatService>) -> Result<Self> {
        Ok(Self {
            service,
            pages: Arc::new(Pages::new()?),
        })
    }

    /// Wires the service from a loaded configuration and an agent.
    ///
    /// Records are stored under the configured data directory.
    pub fn from_config(config: &LoadedConfig, agent: Arc<dyn CompletionAgent>) -> Result<Self> {
        let paths = config.paths()?;
        let records: Arc<dyn FormRecordRepository> =
            Arc::new(FileRecordRepository::new(paths.records_dir()));

        let settings = ServiceSettings {
            llm_timeout: Duration::from_secs(config.root.llm.timeout_secs),
            idle_ttl: Duration::from_secs(config.root.sessions.idle_ttl_secs),
            link_base: config.root.server.public_base_url.clone().unwrap_or_default(),
        };

        let service = FormChatService::new(
            Arc::new(config.catalog.clone()),
            records,
            agent,
            settings,
        );
        Self::new(Arc::new(service))
    }
}
