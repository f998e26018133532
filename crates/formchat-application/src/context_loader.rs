//! Cross-form context loading.
//!
//! A form may name a context form. When the visitor carries a linking token
//! for that form's primary key, the record saved under it pre-fills the new
//! session and is shown to the model as JSON. Every failure on this path is
//! logged and treated as "no context".

use std::sync::Arc;

use formchat_core::form::{FormCatalog, FormSchema, PrimaryKeyValue};
use formchat_core::linking::LinkingTokens;
use formchat_core::record::{FieldValues, FormRecordRepository};
use tracing::{debug, warn};

/// Data loaded from a related form's saved record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedContext {
    /// Form the record belongs to
    pub source_form: Option<String>,
    pub key: Option<PrimaryKeyValue>,
    pub values: FieldValues,
}

impl LoadedContext {
    /// Pretty JSON for the system prompt, empty when nothing was loaded.
    pub fn json(&self) -> String {
        if self.values.is_empty() {
            return String::new();
        }
        serde_json::to_string_pretty(&self.values).unwrap_or_default()
    }
}

pub struct ContextLoader {
    catalog: Arc<FormCatalog>,
    records: Arc<dyn FormRecordRepository>,
}

impl ContextLoader {
    pub fn new(catalog: Arc<FormCatalog>, records: Arc<dyn FormRecordRepository>) -> Self {
        Self { catalog, records }
    }

    /// Loads the context record for `form`, if the visitor can address one.
    pub async fn load(&self, form: &FormSchema, tokens: &dyn LinkingTokens) -> LoadedContext {
        let Some(context_name) = form.context_form() else {
            return LoadedContext::default();
        };

        let Some(context_form) = self.catalog.find(context_name) else {
            warn!(form = %form.name(), context_form = %context_name, "Context form is not configured");
            return LoadedContext::default();
        };

        let primary_key = context_form.primary_key();
        if primary_key.is_empty() {
            return LoadedContext::default();
        }

        let token_name = primary_key.token_name();
        let Some(token) = tokens.get(&token_name) else {
            debug!(form = %form.name(), token = %token_name, "No linking token present");
            return LoadedContext::default();
        };

        let Some(key) = primary_key.parse_token(&token) else {
            warn!(form = %form.name(), token = %token_name, "Ignoring malformed linking token");
            return LoadedContext::default();
        };

        match self.records.load(context_name, &key).await {
            Ok(Some(values)) => {
                debug!(
                    form = %form.name(),
                    context_form = %context_name,
                    fields = values.len(),
                    "Loaded context record"
                );
                LoadedContext {
                    source_form: Some(context_name.to_string()),
                    key: Some(key),
                    values,
                }
            }
            Ok(None) => {
                debug!(form = %form.name(), context_form = %context_name, key = %key, "No context record");
                LoadedContext::default()
            }
            Err(e) => {
                warn!(
                    form = %form.name(),
                    context_form = %context_name,
                    error = %e,
                    "Failed to load context record"
                );
                LoadedContext::default()
            }
        }
    }
}
