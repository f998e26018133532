use crate::config::FormConfig;
use crate::error::{FormChatError, Result};

use super::field::{FieldSpec, parse_fields, render_fields};
use super::primary_key::PrimaryKey;

/// Immutable definition of one form.
#[derive(Debug, Clone)]
pub struct FormSchema {
    name: String,
    title: String,
    description: String,
    button_text: String,
    fields: Vec<FieldSpec>,
    primary_key: PrimaryKey,
    context_form: Option<String>,
    system_prompt_template: Option<String>,
}

impl FormSchema {
    /// Builds a schema from its config table.
    ///
    /// The field block is parsed leniently, but a form without any field, a
    /// malformed name or a primary key naming an unknown field is rejected.
    pub fn from_config(config: &FormConfig) -> Result<Self> {
        let name = config.name.trim();
        if !is_valid_form_name(name) {
            return Err(FormChatError::config(format!(
                "invalid form name '{}': use letters, digits, '-' or '_'",
                config.name
            )));
        }

        let fields = parse_fields(&config.fields);
        if fields.is_empty() {
            return Err(FormChatError::config(format!(
                "form '{name}' declares no fields"
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FormChatError::config(format!(
                    "form '{name}' declares field '{}' twice",
                    field.name
                )));
            }
        }

        for key_field in &config.primary_key {
            if !fields.iter().any(|f| &f.name == key_field) {
                return Err(FormChatError::config(format!(
                    "form '{name}': primary key field '{key_field}' is not in the field list"
                )));
            }
        }

        let context_form = Some(config.context_form.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            title: non_empty_or(&config.title, name),
            description: config.description.trim().to_string(),
            button_text: non_empty_or(&config.button_text, name),
            fields,
            primary_key: PrimaryKey::new(config.primary_key.clone()),
            context_form,
            system_prompt_template: config.system_prompt_template.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn button_text(&self) -> &str {
        &self.button_text
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    /// The form whose saved record pre-fills this one, if any.
    pub fn context_form(&self) -> Option<&str> {
        self.context_form.as_deref()
    }

    pub fn system_prompt_template(&self) -> Option<&str> {
        self.system_prompt_template.as_deref()
    }

    /// Field list as presented in the system prompt.
    pub fn rendered_fields(&self) -> String {
        render_fields(&self.fields)
    }
}

fn is_valid_form_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
