use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Root of `formchat.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ConfigRoot {
    /// Prepended to every form's system prompt.
    #[serde(default)]
    pub global_system_prompt: String,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(rename = "form", default)]
    pub forms: Vec<FormConfig>,
}

/// A `[[form]]` table.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct FormConfig {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub button_text: String,
    /// Field block, see [`crate::form::parse_fields`].
    pub fields: String,
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Name of the form whose saved record seeds this one. Empty means none.
    #[serde(default)]
    pub context_form: String,
    /// Per-form override of the built-in system prompt template.
    #[serde(default)]
    pub system_prompt_template: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_llm_timeout(),
            max_tokens: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Absolute base used when building links to dependent forms.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_base_url: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionsConfig {
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    #[serde(default)]
    pub data_dir: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_idle_ttl() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let root: ConfigRoot = toml::from_str(
            r#"
[[form]]
name = "visit"
fields = "Reason: {{.Reason}}"
"#,
        )
        .unwrap();

        assert_eq!(root.global_system_prompt, "");
        assert_eq!(root.llm, LlmConfig::default());
        assert_eq!(root.server.bind, DEFAULT_BIND);
        assert_eq!(root.sessions.idle_ttl_secs, 1800);
        assert_eq!(root.forms.len(), 1);
        assert!(root.forms[0].primary_key.is_empty());
        assert!(root.forms[0].system_prompt_template.is_none());
    }

    #[test]
    fn test_full_form_table() {
        let root: ConfigRoot = toml::from_str(
            r#"
global_system_prompt = "Be brief."

[llm]
model = "local-model"
base_url = "http://localhost:11434/v1"
timeout_secs = 5

[[form]]
name = "registration"
title = "New Patient Registration"
button_text = "Registration"
fields = """
Full Name: {{.FirstName}}
License: {{.License}}
"""
primary_key = ["License"]
"#,
        )
        .unwrap();

        assert_eq!(root.global_system_prompt, "Be brief.");
        assert_eq!(root.llm.model, "local-model");
        assert_eq!(root.llm.timeout_secs, 5);
        assert_eq!(root.forms[0].primary_key, vec!["License".to_string()]);
        assert_eq!(root.forms[0].title, "New Patient Registration");
    }
}
