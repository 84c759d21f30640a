use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned prompt identifier.
///
/// The API hands ids out as JSON numbers, but nothing on the client does
/// arithmetic with them, so they are kept as opaque text and compared as such.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PromptId(String);

impl PromptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for PromptId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for PromptId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for PromptId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => PromptId::from(n),
            RawId::Text(s) => PromptId(s),
        })
    }
}

impl Serialize for PromptId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A prompt as held in the local collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub id: PromptId,
    pub name: String,
    pub text: String,
}

// ============================================================================
// Wire types
// ============================================================================

/// `{data: ...}` wrapper used by every prompt endpoint in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptAttributes {
    pub name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptRecord {
    pub id: PromptId,
    pub attributes: PromptAttributes,
}

impl From<PromptRecord> for Prompt {
    fn from(record: PromptRecord) -> Self {
        Prompt {
            id: record.id,
            name: record.attributes.name,
            text: record.attributes.prompt,
        }
    }
}

pub type PromptListResponse = DataEnvelope<Vec<PromptRecord>>;
pub type PromptResponse = DataEnvelope<PromptRecord>;
pub type PromptRequest = DataEnvelope<PromptAttributes>;

impl PromptRequest {
    pub fn new(name: &str, text: &str) -> Self {
        DataEnvelope {
            data: PromptAttributes {
                name: name.to_string(),
                prompt: text.to_string(),
            },
        }
    }
}
