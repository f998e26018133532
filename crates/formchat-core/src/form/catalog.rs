use crate::config::ConfigRoot;
use crate::error::{FormChatError, Result};

use super::schema::FormSchema;

/// All configured forms, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FormCatalog {
    global_system_prompt: String,
    forms: Vec<FormSchema>,
}

impl FormCatalog {
    /// Builds and cross-validates the catalog.
    pub fn from_config(root: &ConfigRoot) -> Result<Self> {
        let forms = root
            .forms
            .iter()
            .map(FormSchema::from_config)
            .collect::<Result<Vec<_>>>()?;
        Self::new(root.global_system_prompt.clone(), forms)
    }

    pub fn new(global_system_prompt: String, forms: Vec<FormSchema>) -> Result<Self> {
        for (i, form) in forms.iter().enumerate() {
            if forms[..i].iter().any(|f| f.name() == form.name()) {
                return Err(FormChatError::config(format!(
                    "form '{}' is defined more than once",
                    form.name()
                )));
            }
        }

        for form in &forms {
            if let Some(context) = form.context_form()
                && !forms.iter().any(|f| f.name() == context)
            {
                return Err(FormChatError::config(format!(
                    "form '{}' uses unknown context form '{}'",
                    form.name(),
                    context
                )));
            }
        }

        Ok(Self {
            global_system_prompt,
            forms,
        })
    }

    pub fn global_system_prompt(&self) -> &str {
        &self.global_system_prompt
    }

    pub fn forms(&self) -> &[FormSchema] {
        &self.forms
    }

    pub fn find(&self, name: &str) -> Option<&FormSchema> {
        self.forms.iter().find(|f| f.name() == name)
    }

    pub fn get(&self, name: &str) -> Result<&FormSchema> {
        self.find(name)
            .ok_or_else(|| FormChatError::not_found("Form", name))
    }

    /// Forms that load their context from `name`, excluding `name` itself.
    pub fn dependents_of(&self, name: &str) -> Vec<&FormSchema> {
        self.forms
            .iter()
            .filter(|f| f.name() != name && f.context_form() == Some(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormConfig;

    fn form(name: &str, context: &str) -> FormConfig {
        FormConfig {
            name: name.to_string(),
            fields: "License: {{.License}}".to_string(),
            primary_key: vec!["License".to_string()],
            context_form: context.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_and_dependents() {
        let root = ConfigRoot {
            forms: vec![
                form("registration", "registration"),
                form("visit", "registration"),
                form("billing", ""),
            ],
            ..Default::default()
        };
        let catalog = FormCatalog::from_config(&root).unwrap();

        assert_eq!(catalog.forms().len(), 3);
        assert!(catalog.get("visit").is_ok());
        assert!(catalog.get("missing").unwrap_err().is_not_found());

        let dependents: Vec<_> = catalog
            .dependents_of("registration")
            .iter()
            .map(|f| f.name())
            .collect();
        assert_eq!(dependents, vec!["visit"]);
    }

    #[test]
    fn test_unknown_context_form_rejected() {
        let root = ConfigRoot {
            forms: vec![form("visit", "registration")],
            ..Default::default()
        };
        let err = FormCatalog::from_config(&root).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let root = ConfigRoot {
            forms: vec![form("visit", ""), form("visit", "")],
            ..Default::default()
        };
        assert!(FormCatalog::from_config(&root).is_err());
    }
}
