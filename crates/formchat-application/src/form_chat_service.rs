//! Form chat use case.
//!
//! Coordinates the session cache, context loading, the completion agent and
//! record storage for one chat turn.

use std::sync::Arc;
use std::time::Duration;

use formchat_core::agent::CompletionAgent;
use formchat_core::error::{FormChatError, Result};
use formchat_core::form::{FieldSpec, FormCatalog, FormSchema, PrimaryKeyValue};
use formchat_core::linking::LinkingTokens;
use formchat_core::protocol::{TurnOutcome, interpret};
use formchat_core::record::{FieldValues, FormRecordRepository};
use formchat_core::session::{ChatSession, MessageRole};
use serde::Serialize;
use tracing::{debug, info};

use crate::context_loader::ContextLoader;
use crate::prompt::render_system_prompt;
use crate::session::{SessionCache, SessionKey, SharedSession};

/// Tunables for [`FormChatService`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Upper bound for one completion call
    pub llm_timeout: Duration,
    /// Sessions unused for this long are evicted
    pub idle_ttl: Duration,
    /// Prefix for links to dependent forms, e.g. `https://clinic.example`
    pub link_base: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(60),
            idle_ttl: Duration::from_secs(30 * 60),
            link_base: String::new(),
        }
    }
}

/// A linking token to hand to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkingToken {
    pub name: String,
    pub value: String,
}

/// A form that can now be opened with the saved record as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextForm {
    pub name: String,
    pub title: String,
    pub url: String,
}

/// Result of one successful turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    /// First `SAY` of the reply, empty if there was none
    pub display_message: String,
    pub messages: Vec<String>,
    pub field_updates: FieldValues,
    pub saved: bool,
    pub linking_token: Option<LinkingToken>,
    pub next_forms: Vec<NextForm>,
}

/// One rendered line of an existing conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub role: MessageRole,
    pub text: String,
}

/// Everything the form page shows before the first turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub name: String,
    pub title: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
    /// Values known so far, from the live session or the context record
    pub prefill: FieldValues,
    pub context_form: Option<String>,
    pub transcript: Vec<TranscriptEntry>,
}

pub struct FormChatService {
    catalog: Arc<FormCatalog>,
    records: Arc<dyn FormRecordRepository>,
    agent: Arc<dyn CompletionAgent>,
    sessions: SessionCache,
    context_loader: ContextLoader,
    settings: ServiceSettings,
}

impl FormChatService {
    pub fn new(
        catalog: Arc<FormCatalog>,
        records: Arc<dyn FormRecordRepository>,
        agent: Arc<dyn CompletionAgent>,
        settings: ServiceSettings,
    ) -> Self {
        let context_loader = ContextLoader::new(catalog.clone(), records.clone());
        Self {
            catalog,
            records,
            agent,
            sessions: SessionCache::new(),
            context_loader,
            settings,
        }
    }

    pub fn catalog(&self) -> &FormCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Prepares the form page for a visitor.
    ///
    /// An existing session supplies its values and transcript. Otherwise the
    /// context record, if the visitor carries a token for it, supplies the
    /// pre-fill values.
    pub async fn open_form(&self, key: &SessionKey, tokens: &dyn LinkingTokens) -> Result<FormView> {
        let form = self.catalog.get(&key.form)?;

        let (prefill, transcript) = match self.sessions.get(key).await {
            Some(shared) => {
                let session = shared.lock().await;
                (session.field_values.clone(), transcript_of(&session))
            }
            None => {
                let context = self.context_loader.load(form, tokens).await;
                (context.values, Vec::new())
            }
        };

        Ok(FormView {
            name: form.name().to_string(),
            title: form.title().to_string(),
            description: form.description().to_string(),
            fields: form.fields().to_vec(),
            prefill,
            context_form: form.context_form().map(str::to_string),
            transcript,
        })
    }

    /// Runs one chat turn.
    ///
    /// On any failure the user message stays in the history and nothing else
    /// changes. A successful save on a form with a primary key sets the
    /// linking token on `tokens`.
    pub async fn handle_turn(
        &self,
        key: &SessionKey,
        user_text: &str,
        tokens: &mut dyn LinkingTokens,
    ) -> Result<TurnReply> {
        let form = self.catalog.get(&key.form)?;
        let shared = self.session_for(key, form, &*tokens).await?;
        let mut session = shared.lock().await;

        session.record_user(user_text);
        let history = session.messages.clone();

        let assistant_text = tokio::time::timeout(self.settings.llm_timeout, self.agent.complete(&history))
            .await
            .map_err(|_| FormChatError::Collaborator {
                status_code: None,
                message: format!(
                    "{} did not answer within {}s",
                    self.agent.name(),
                    self.settings.llm_timeout.as_secs()
                ),
                is_retryable: true,
            })??;

        let plan = session.plan_turn(form, &assistant_text)?;

        for save in &plan.saves {
            self.records
                .save(form.name(), &save.key, &save.record)
                .await?;
        }

        session.commit(&plan);
        drop(session);

        let saved = plan.saved();
        let mut linking_token = None;
        let mut next_forms = Vec::new();

        if let Some(last) = plan.saves.last()
            && !form.primary_key().is_empty()
        {
            let token = LinkingToken {
                name: form.primary_key().token_name(),
                value: last.key.encode(),
            };
            tokens.set(&token.name, &token.value);
            next_forms = self.next_forms(form, &last.key);
            linking_token = Some(token);
        }

        info!(
            form = %key.form,
            visitor = %key.visitor,
            updates = plan.outcome.field_updates.len(),
            saved,
            "Chat turn completed"
        );

        let TurnOutcome {
            messages,
            field_updates,
            ..
        } = plan.outcome;

        Ok(TurnReply {
            display_message: messages.first().cloned().unwrap_or_default(),
            messages,
            field_updates,
            saved,
            linking_token,
            next_forms,
        })
    }

    /// Evicts idle sessions, returning how many were removed.
    pub async fn evict_idle_sessions(&self) -> usize {
        let evicted = self.sessions.evict_idle(self.settings.idle_ttl).await;
        if evicted > 0 {
            debug!(evicted, "Evicted idle chat sessions");
        }
        evicted
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }

    async fn session_for(
        &self,
        key: &SessionKey,
        form: &FormSchema,
        tokens: &dyn LinkingTokens,
    ) -> Result<SharedSession> {
        if let Some(shared) = self.sessions.get(key).await {
            return Ok(shared);
        }

        let context = self.context_loader.load(form, tokens).await;
        let system_prompt =
            render_system_prompt(self.catalog.global_system_prompt(), form, &context.json())?;
        let session = ChatSession::start(form, system_prompt, context.values);

        let (shared, created) = self.sessions.insert_if_absent(key.clone(), session).await;
        if created {
            info!(
                form = %key.form,
                visitor = %key.visitor,
                context_form = ?context.source_form,
                "Started chat session"
            );
        }
        Ok(shared)
    }

    fn next_forms(&self, form: &FormSchema, key: &PrimaryKeyValue) -> Vec<NextForm> {
        let token = urlencoding::encode(&key.encode()).into_owned();
        let base = self.settings.link_base.trim_end_matches('/');

        self.catalog
            .dependents_of(form.name())
            .into_iter()
            .map(|next| NextForm {
                name: next.name().to_string(),
                title: next.title().to_string(),
                url: format!("{}/forms/{}?key={}", base, next.name(), token),
            })
            .collect()
    }
}

fn transcript_of(session: &ChatSession) -> Vec<TranscriptEntry> {
    session
        .messages
        .iter()
        .filter_map(|message| match message.role {
            MessageRole::System => None,
            MessageRole::User => Some(TranscriptEntry {
                role: MessageRole::User,
                text: message.content.clone(),
            }),
            MessageRole::Assistant => {
                let outcome = TurnOutcome::from_directives(&interpret(&message.content));
                if outcome.messages.is_empty() {
                    return None;
                }
                Some(TranscriptEntry {
                    role: MessageRole::Assistant,
                    text: outcome.messages.join("\n"),
                })
            }
        })
        .collect()
}
