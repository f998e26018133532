//! Field schema lines.
//!
//! A form's fields are written as a text block, one field per line:
//!
//! ```text
//! PATIENT REGISTRATION FORM
//! Full Name: {{.FullName}} (John Smith)
//! Insurance Group #: {{.GroupNumber}}
//! ```
//!
//! Headings, separators and anything else without the `Label: {{.Name}}` shape
//! are skipped, so the same block can double as a printable form template.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*\.?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex")
});

static EXAMPLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*)\)\s*$").expect("valid regex"));

/// One field of a form, as declared in its field block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Human-readable label shown to the user.
    pub label: String,
    /// Identifier used in `SET` lines and persisted records.
    pub name: String,
    /// Sample value given to the model as a hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl FieldSpec {
    /// Decodes a single line, returning `None` for anything that is not a field.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (left, right) = line.split_once(':')?;

        let label = left.trim();
        if label.is_empty() {
            return None;
        }

        let placeholder = PLACEHOLDER_RE.captures(right)?;
        let name = placeholder.get(1)?.as_str().to_string();
        let after = &right[placeholder.get(0)?.end()..];

        let example = EXAMPLE_RE
            .captures(after)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());

        Some(Self {
            label: label.to_string(),
            name,
            example,
        })
    }

    /// Prompt line describing this field to the model.
    pub fn to_prompt_line(&self) -> String {
        match &self.example {
            Some(example) => format!("- {} (field: {}, e.g. {})", self.label, self.name, example),
            None => format!("- {} (field: {})", self.label, self.name),
        }
    }
}

/// Parses a field block into its ordered field list.
pub fn parse_fields(text: &str) -> Vec<FieldSpec> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(FieldSpec::parse_line)
        .collect()
}

/// Renders the field list the way the system prompt presents it.
pub fn render_fields(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(FieldSpec::to_prompt_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRATION: &str = r#"
PATIENT REGISTRATION FORM
------------------------
Full Name: {{.FirstName}} (John)
Address: {{.Address}}
Driver License: {{ .License }} (555-55-5555)
Insurance Group #: {{GroupNumber}}
"#;

    #[test]
    fn test_parse_fields_skips_headings() {
        let fields = parse_fields(REGISTRATION);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["FirstName", "Address", "License", "GroupNumber"]);

        assert_eq!(fields[0].label, "Full Name");
        assert_eq!(fields[0].example.as_deref(), Some("John"));
        assert_eq!(fields[1].example, None);
        assert_eq!(fields[3].label, "Insurance Group #");
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert_eq!(FieldSpec::parse_line("No colon {{.Name}}"), None);
        assert_eq!(FieldSpec::parse_line(": {{.Name}}"), None);
        assert_eq!(FieldSpec::parse_line("Label: no placeholder"), None);
        assert_eq!(FieldSpec::parse_line("Label: {{.1bad}}"), None);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse_fields(REGISTRATION);
        let second = parse_fields(REGISTRATION);
        assert_eq!(first, second);
    }

    #[test]
    fn test_label_may_contain_time_colon_on_right() {
        let field = FieldSpec::parse_line("Visit time: {{.Time}} (10:30)").unwrap();
        assert_eq!(field.label, "Visit time");
        assert_eq!(field.example.as_deref(), Some("10:30"));
    }

    #[test]
    fn test_render_fields() {
        let fields = parse_fields("Full Name: {{.FirstName}} (John)\nReason: {{.Reason}}");
        assert_eq!(
            render_fields(&fields),
            "- Full Name (field: FirstName, e.g. John)\n- Reason (field: Reason)"
        );
    }
}
