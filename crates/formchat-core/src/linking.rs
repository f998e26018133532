//! Linking tokens carry a saved form's primary key to the forms that depend on it.

use std::collections::HashMap;

/// A name/value token carrier, typically the request's cookies.
pub trait LinkingTokens: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&mut self, name: &str, value: &str);
}

/// Plain map carrier, used where no HTTP request is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    tokens: HashMap<String, String>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl LinkingTokens for TokenMap {
    fn get(&self, name: &str) -> Option<String> {
        self.tokens.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.tokens.insert(name.to_string(), value.to_string());
    }
}
