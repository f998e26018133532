//! System prompt rendering.
//!
//! Templates are minijinja templates with these variables: `global_prompt`,
//! `form_name`, `form_title`, `fields`, `primary_key` and `context`.

use formchat_core::error::{FormChatError, Result};
use formchat_core::form::{FormCatalog, FormSchema};
use minijinja::{Environment, context};

/// Used for forms without their own `system_prompt_template`.
pub const DEFAULT_SYSTEM_PROMPT_TEMPLATE: &str = r#"{% if global_prompt %}{{ global_prompt }}

{% endif %}You are helping a person fill out the "{{ form_title }}" form by chatting with them.

Fields to collect:
{{ fields }}
{% if primary_key %}
The form is identified by {{ primary_key }}. Those fields must be set before you save.
{% endif %}{% if context %}
Information already on file (JSON). Do not ask for it again:
{{ context }}
{% endif %}
Answer ONLY with command lines, one command per line:
SAY <text>            a message shown to the person
SET <field> <value>   records a value, using the field names listed above
SAVE                  stores the form once every field is collected and confirmed

Ask one question at a time. Adapt to the person's language but keep field values in English."#;

/// Renders the system message for a new session of `form`.
pub fn render_system_prompt(global_prompt: &str, form: &FormSchema, context_json: &str) -> Result<String> {
    let template = form
        .system_prompt_template()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT_TEMPLATE);

    let env = Environment::new();
    env.render_str(
        template,
        context! {
            global_prompt => global_prompt.trim(),
            form_name => form.name(),
            form_title => form.title(),
            fields => form.rendered_fields(),
            primary_key => form.primary_key().fields().join(", "),
            context => context_json,
        },
    )
    .map_err(|e| {
        FormChatError::config(format!(
            "system prompt template for form '{}' failed to render: {}",
            form.name(),
            e
        ))
    })
}

/// Renders every form's template once so broken templates fail at startup.
pub fn validate_templates(catalog: &FormCatalog) -> Result<()> {
    for form in catalog.forms() {
        render_system_prompt(catalog.global_system_prompt(), form, "")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use formchat_core::config::FormConfig;

    fn form(template: Option<&str>) -> FormSchema {
        FormSchema::from_config(&FormConfig {
            name: "registration".to_string(),
            title: "New Patient Registration".to_string(),
            fields: "Full Name: {{.FirstName}} (John)\nLicense: {{.License}}".to_string(),
            primary_key: vec!["License".to_string()],
            system_prompt_template: template.map(str::to_string),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_template_includes_fields_and_protocol() {
        let prompt = render_system_prompt("Be kind.", &form(None), "").unwrap();

        assert!(prompt.starts_with("Be kind."));
        assert!(prompt.contains("\"New Patient Registration\""));
        assert!(prompt.contains("- Full Name (field: FirstName, e.g. John)"));
        assert!(prompt.contains("identified by License"));
        assert!(prompt.contains("SET <field> <value>"));
        assert!(!prompt.contains("already on file"));
    }

    #[test]
    fn test_context_json_is_embedded() {
        let prompt = render_system_prompt(
            "",
            &form(None),
            "{\n  \"License\": \"555-55-5555\"\n}",
        )
        .unwrap();
        assert!(prompt.contains("already on file"));
        assert!(prompt.contains("555-55-5555"));
    }

    #[test]
    fn test_custom_template() {
        let prompt =
            render_system_prompt("", &form(Some("Form {{ form_name }}: {{ primary_key }}")), "")
                .unwrap();
        assert_eq!(prompt, "Form registration: License");
    }

    #[test]
    fn test_broken_template_is_config_error() {
        let err = render_system_prompt("", &form(Some("{% if %}")), "").unwrap_err();
        assert!(err.is_config());
    }
}
