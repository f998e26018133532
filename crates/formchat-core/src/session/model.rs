//! Chat session domain model.
//!
//! A session exists once the first chat request for a (form, visitor) pair
//! arrives; before that there is nothing to hold. Turns are split in two
//! phases. [`ChatSession::plan_turn`] interprets an assistant reply against a
//! copy of the field values without touching the session, and
//! [`ChatSession::commit`] applies the plan once every requested save has
//! been written. A failed turn therefore leaves only the user message behind.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::message::ChatMessage;
use crate::error::{FormChatError, Result};
use crate::form::{FormSchema, PrimaryKeyValue};
use crate::protocol::{Directive, TurnOutcome, interpret};
use crate::record::FieldValues;

/// Conversation history plus the field values collected so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Name of the form being filled
    pub form: String,
    /// Replayed to the model in full each turn, system message first
    pub messages: Vec<ChatMessage>,
    /// Field name to value, last write wins
    pub field_values: FieldValues,
    /// Address used for saves when the form has no primary key
    pub record_id: String,
    /// Timestamp when the session was created (RFC 3339)
    pub created_at: String,
}

/// A record write requested by a `SAVE` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub key: PrimaryKeyValue,
    /// Complete field values as of the `SAVE` line.
    pub record: FieldValues,
}

/// Result of interpreting one assistant reply, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnPlan {
    pub assistant_text: String,
    /// Messages and accepted field updates.
    pub outcome: TurnOutcome,
    /// Field values after every accepted `SET`.
    pub field_values: FieldValues,
    pub saves: Vec<PendingSave>,
}

impl TurnPlan {
    pub fn saved(&self) -> bool {
        !self.saves.is_empty()
    }
}

impl ChatSession {
    /// Starts a session with its synthesized system message and any values
    /// loaded from a related form.
    pub fn start(form: &FormSchema, system_prompt: String, context: FieldValues) -> Self {
        let now = chrono::Utc::now();
        Self {
            form: form.name().to_string(),
            messages: vec![ChatMessage::system(system_prompt)],
            field_values: context,
            record_id: uuid::Uuid::new_v4().to_string(),
            created_at: now.to_rfc3339(),
        }
    }

    pub fn record_user(&mut self, text: &str) {
        self.messages.push(ChatMessage::user(text));
    }

    /// Interprets `assistant_text` without mutating the session.
    ///
    /// `SET`s naming neither a schema field nor a value already held (for
    /// example one loaded from context) are dropped. Each `SAVE` snapshots the
    /// values accumulated up to that line. Repeated `SAVE`s under the same key
    /// collapse into one write of the latest snapshot.
    pub fn plan_turn(&self, form: &FormSchema, assistant_text: &str) -> Result<TurnPlan> {
        let mut field_values = self.field_values.clone();
        let mut outcome = TurnOutcome::default();
        let mut saves = Vec::new();

        for directive in interpret(assistant_text) {
            match directive {
                Directive::Say(text) => outcome.messages.push(text),
                Directive::Set { field, value } => {
                    if !form.has_field(&field) && !field_values.contains_key(&field) {
                        warn!(form = %form.name(), field = %field, "Dropping SET for unknown field");
                        continue;
                    }
                    field_values.insert(field.clone(), value.clone());
                    outcome.field_updates.insert(field, value);
                }
                Directive::Save => {
                    outcome.save_requested = true;
                    let key = self.save_key(form, &field_values)?;
                    // One write per key, holding its latest snapshot.
                    saves.retain(|save: &PendingSave| save.key != key);
                    saves.push(PendingSave {
                        key,
                        record: field_values.clone(),
                    });
                }
            }
        }

        Ok(TurnPlan {
            assistant_text: assistant_text.to_string(),
            outcome,
            field_values,
            saves,
        })
    }

    /// Applies a plan whose saves have all succeeded.
    pub fn commit(&mut self, plan: &TurnPlan) {
        self.field_values = plan.field_values.clone();
        self.messages.push(ChatMessage::assistant(plan.assistant_text.clone()));
    }

    fn save_key(&self, form: &FormSchema, values: &FieldValues) -> Result<PrimaryKeyValue> {
        if form.primary_key().is_empty() {
            // record_id is a uuid, never blank
            return PrimaryKeyValue::new(vec![self.record_id.clone()])
                .ok_or_else(|| FormChatError::internal("session record id is empty"));
        }
        form.primary_key().value_from(form.name(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;
    use crate::session::MessageRole;

    fn registration() -> FormSchema {
        FormSchema::from_config(&FormConfig {
            name: "registration".to_string(),
            fields: "First Name: {{.FirstName}}\nLicense: {{.License}}".to_string(),
            primary_key: vec!["License".to_string()],
            ..Default::default()
        })
        .unwrap()
    }

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_start_seeds_system_message_and_context() {
        let form = registration();
        let session = ChatSession::start(
            &form,
            "You are helpful.".to_string(),
            values(&[("License", "555-55-5555")]),
        );

        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, MessageRole::System);
        assert_eq!(
            session.field_values.get("License").map(String::as_str),
            Some("555-55-5555")
        );
    }

    #[test]
    fn test_plan_does_not_mutate_until_commit() {
        let form = registration();
        let mut session = ChatSession::start(&form, "sys".to_string(), FieldValues::new());
        session.record_user("I'm John");

        let plan = session
            .plan_turn(&form, "SET FirstName John\nSAY Thanks John")
            .unwrap();
        assert!(session.field_values.is_empty());
        assert_eq!(session.messages.len(), 2);

        session.commit(&plan);
        assert_eq!(session.field_values.get("FirstName").unwrap(), "John");
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[2].role, MessageRole::Assistant);
        assert!(!plan.saved());
    }

    #[test]
    fn test_save_snapshots_values_at_save_line() {
        let form = registration();
        let session = ChatSession::start(&form, "sys".to_string(), FieldValues::new());

        let plan = session
            .plan_turn(
                &form,
                "SET FirstName John\nSET License 555-55-5555\nSAVE\nSET FirstName Jane",
            )
            .unwrap();

        assert_eq!(plan.saves.len(), 1);
        assert_eq!(plan.saves[0].key.encode(), "555-55-5555");
        assert_eq!(plan.saves[0].record.get("FirstName").unwrap(), "John");
        assert_eq!(plan.field_values.get("FirstName").unwrap(), "Jane");
    }

    #[test]
    fn test_save_without_key_is_an_error() {
        let form = registration();
        let session = ChatSession::start(&form, "sys".to_string(), FieldValues::new());

        let err = session
            .plan_turn(&form, "SET FirstName John\nSAVE")
            .unwrap_err();
        assert!(err.is_missing_primary_key());
    }

    #[test]
    fn test_unknown_fields_dropped_unless_held() {
        let form = registration();
        let session = ChatSession::start(
            &form,
            "sys".to_string(),
            values(&[("InsuranceName", "Acme")]),
        );

        let plan = session
            .plan_turn(&form, "SET Shoe 42\nSET InsuranceName Blue Cross")
            .unwrap();
        assert!(!plan.outcome.field_updates.contains_key("Shoe"));
        assert_eq!(plan.field_values.get("InsuranceName").unwrap(), "Blue Cross");
    }

    #[test]
    fn test_form_without_primary_key_saves_under_record_id() {
        let form = FormSchema::from_config(&FormConfig {
            name: "feedback".to_string(),
            fields: "Comment: {{.Comment}}".to_string(),
            ..Default::default()
        })
        .unwrap();
        let session = ChatSession::start(&form, "sys".to_string(), FieldValues::new());

        let plan = session.plan_turn(&form, "SET Comment Great\nSAVE").unwrap();
        assert_eq!(plan.saves[0].key.encode(), session.record_id);

        let other = ChatSession::start(&form, "sys".to_string(), FieldValues::new());
        assert_ne!(other.record_id, session.record_id);
    }

    #[test]
    fn test_repeated_saves_under_one_key_write_once() {
        let form = registration();
        let session = ChatSession::start(&form, "sys".to_string(), FieldValues::new());

        let plan = session
            .plan_turn(
                &form,
                "SET License 1\nSAVE\nSET FirstName Jane\nSAVE",
            )
            .unwrap();
        assert_eq!(plan.saves.len(), 1);
        assert_eq!(plan.saves[0].record.get("FirstName").unwrap(), "Jane");

        let plan = session
            .plan_turn(
                &form,
                "SET License 1\nSAVE\nSET License 2\nSAVE\nSET License 1\nSAVE",
            )
            .unwrap();
        let keys: Vec<String> = plan.saves.iter().map(|s| s.key.encode()).collect();
        assert_eq!(keys, vec!["2", "1"]);
    }
}
