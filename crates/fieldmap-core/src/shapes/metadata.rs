//! Descriptive data users attach to shapes.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// A user-defined key/value field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub key: String,
    pub value: String,
}

/// A photo attached to a shape, stored as a data URL (`data:image/jpeg;base64,...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub name: String,
    pub data: String,
}

impl Photo {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Build a photo from raw bytes and a MIME type.
    pub fn from_bytes(name: impl Into<String>, mime: &str, bytes: &[u8]) -> Self {
        Self::new(name, format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// MIME type declared by the data URL, if any.
    pub fn mime_type(&self) -> Option<&str> {
        let rest = self.data.strip_prefix("data:")?;
        let end = rest.find([';', ','])?;
        Some(&rest[..end])
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type() {
            Some("image/png") => "png",
            Some("image/webp") => "webp",
            Some("image/gif") => "gif",
            _ => "jpg",
        }
    }

    /// Decode the payload. Bare base64 (without a data URL header) is accepted too.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = match self.data.split_once(";base64,") {
            Some((_, payload)) => payload,
            None => self.data.as_str(),
        };
        STANDARD.decode(payload.trim())
    }
}

/// Metadata record owned by a shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Free-text tags; unique, insertion ordered.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    /// Single-select qualitative category.
    #[serde(default)]
    pub qualitative_type: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Metadata {
    /// Add a tag. Returns false if it was already present or blank.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Insert or replace a custom field, keeping its original position.
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.custom_fields.iter_mut().find(|f| f.key == key) {
            Some(field) => field.value = value,
            None => self.custom_fields.push(CustomField {
                key: key.to_string(),
                value,
            }),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.custom_fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    pub fn remove_field(&mut self, key: &str) -> Option<String> {
        let idx = self.custom_fields.iter().position(|f| f.key == key)?;
        Some(self.custom_fields.remove(idx).value)
    }
}
