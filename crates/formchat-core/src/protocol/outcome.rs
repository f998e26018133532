use serde::{Deserialize, Serialize};

use super::directive::Directive;
use crate::record::FieldValues;

/// Caller-facing summary of one assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Every `SAY` text, in order.
    pub messages: Vec<String>,
    /// Every `SET`, last write wins.
    pub field_updates: FieldValues,
    /// Whether any `SAVE` appeared.
    pub save_requested: bool,
}

impl TurnOutcome {
    pub fn from_directives(directives: &[Directive]) -> Self {
        let mut outcome = Self::default();
        for directive in directives {
            match directive {
                Directive::Say(text) => outcome.messages.push(text.clone()),
                Directive::Set { field, value } => {
                    outcome.field_updates.insert(field.clone(), value.clone());
                }
                Directive::Save => outcome.save_requested = true,
            }
        }
        outcome
    }

    /// The primary reply: the first `SAY`, or empty.
    pub fn display_message(&self) -> &str {
        self.messages.first().map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::interpret;

    #[test]
    fn test_last_set_wins() {
        let outcome = TurnOutcome::from_directives(&interpret(
            "SET FirstName John\nSET FirstName Jane\nSAY Hi Jane\nSAY Anything else?",
        ));
        assert_eq!(outcome.field_updates.get("FirstName").unwrap(), "Jane");
        assert_eq!(outcome.display_message(), "Hi Jane");
        assert_eq!(outcome.messages.len(), 2);
        assert!(!outcome.save_requested);
    }

    #[test]
    fn test_no_say_yields_empty_display() {
        let outcome =
            TurnOutcome::from_directives(&interpret("SET License 555-55-5555\nSAVE"));
        assert_eq!(outcome.display_message(), "");
        assert_eq!(outcome.field_updates.len(), 1);
        assert!(outcome.save_requested);
    }
}
