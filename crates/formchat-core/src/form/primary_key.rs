//! Primary keys and their encoded values.
//!
//! The encoded value is used both as the record's file stem and as the
//! linking token carried in a cookie. Each component is percent-encoded and
//! the components are joined with `+`, which the encoding itself never emits,
//! so distinct values always map to distinct strings.

use std::fmt;

use crate::error::{FormChatError, Result};
use crate::record::FieldValues;

const SEPARATOR: char = '+';

/// The ordered field names that identify a form's records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryKey {
    fields: Vec<String>,
}

impl PrimaryKey {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Name of the linking token carrying this key, e.g. `License` or
    /// `LastName+DateOfBirth`.
    pub fn token_name(&self) -> String {
        self.fields.join("+")
    }

    /// Extracts this key's value from accumulated field values.
    ///
    /// Fails with `MissingPrimaryKey` listing every absent or blank field.
    pub fn value_from(&self, form: &str, values: &FieldValues) -> Result<PrimaryKeyValue> {
        let mut components = Vec::with_capacity(self.fields.len());
        let mut missing = Vec::new();

        for field in &self.fields {
            match values.get(field).map(|v| v.trim()) {
                Some(value) if !value.is_empty() => components.push(value.to_string()),
                _ => missing.push(field.clone()),
            }
        }

        if !missing.is_empty() || components.is_empty() {
            return Err(FormChatError::MissingPrimaryKey {
                form: form.to_string(),
                fields: missing,
            });
        }

        Ok(PrimaryKeyValue { components })
    }

    /// Decodes a linking token for this key. `None` when the token is malformed.
    pub fn parse_token(&self, token: &str) -> Option<PrimaryKeyValue> {
        PrimaryKeyValue::decode(token, self.fields.len())
    }
}

/// The concrete values of a primary key, in key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryKeyValue {
    components: Vec<String>,
}

impl PrimaryKeyValue {
    /// Builds a value from raw components. Returns `None` if any is blank.
    pub fn new(components: Vec<String>) -> Option<Self> {
        if components.is_empty() || components.iter().any(|c| c.trim().is_empty()) {
            return None;
        }
        Some(Self { components })
    }

    /// Percent-encoded components joined with `+`.
    pub fn encode(&self) -> String {
        self.components
            .iter()
            .map(|c| urlencoding::encode(c).into_owned())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Inverse of [`encode`](Self::encode); `expected_len` is the key's arity.
    pub fn decode(encoded: &str, expected_len: usize) -> Option<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return None;
        }

        let components = encoded
            .split(SEPARATOR)
            .map(|part| urlencoding::decode(part).ok().map(|s| s.into_owned()))
            .collect::<Option<Vec<_>>>()?;

        if components.len() != expected_len {
            return None;
        }
        Self::new(components)
    }

    /// File stem of the record addressed by this value.
    pub fn file_stem(&self) -> String {
        self.encode()
    }
}

impl fmt::Display for PrimaryKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
