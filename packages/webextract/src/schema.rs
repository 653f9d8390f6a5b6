//! Extraction schemas: an ordered field-name → type-tag mapping.
//!
//! A schema tells the model which fields to pull out of a page and what
//! shape each value should take. It is a prompt-construction input only:
//! the model's output is not coerced or validated against it afterwards.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// The closed set of declared field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    /// Parse a type tag, rejecting anything outside the closed set.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// The wire-format tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered mapping from field name to declared type.
///
/// Immutable once loaded; validated at load time. Field order is preserved
/// so prompt construction is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: IndexMap<String, FieldType>,
}

impl Schema {
    /// Build a schema from (name, type) pairs. Intended for tests and
    /// programmatic use; file loading goes through [`Schema::load`].
    pub fn from_fields(fields: impl IntoIterator<Item = (String, FieldType)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    /// Load and validate a schema from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a schema from JSON text.
    ///
    /// Fails fast on a non-object top level, an empty field name, or a
    /// type tag outside the closed set.
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;

        let object = match value {
            serde_json::Value::Object(map) => map,
            _ => return Err(SchemaError::NotAnObject),
        };

        let mut fields = IndexMap::with_capacity(object.len());
        for (name, tag) in object {
            if name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            let tag_str = tag.as_str().ok_or_else(|| SchemaError::InvalidType {
                field: name.clone(),
                type_tag: tag.to_string(),
            })?;
            let field_type = FieldType::parse(tag_str).ok_or_else(|| SchemaError::InvalidType {
                field: name.clone(),
                type_tag: tag_str.to_string(),
            })?;
            fields.insert(name, field_type);
        }

        Ok(Self { fields })
    }

    /// Iterate fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
