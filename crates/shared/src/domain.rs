use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of creations kept in the persisted history.
pub const HISTORY_CAPACITY: usize = 20;

/// Identifier of a history entry: the creation timestamp in Unix milliseconds,
/// rendered as a decimal string. Two items created in the same millisecond
/// share an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryItemId(pub String);

impl HistoryItemId {
    pub fn from_timestamp(timestamp_millis: i64) -> Self {
        Self(timestamp_millis.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HistoryItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Image supplied by the user, held base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserImage {
    #[serde(default)]
    pub file_name: Option<String>,
    pub mime_type: String,
    pub data_base64: String,
}

impl UserImage {
    pub fn from_bytes(
        file_name: Option<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        Self {
            file_name,
            mime_type: mime_type.into(),
            data_base64: STANDARD.encode(bytes),
        }
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data_base64)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// Generated image returned by the image transform call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub mime_type: String,
    pub data_base64: String,
}

impl ImageArtifact {
    pub fn new(mime_type: impl Into<String>, data_base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_base64: data_base64.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data_base64)
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }

    /// File extension matching the artifact's mime type.
    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// A named transform: what to do to the image and what to say about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub id: String,
    pub label: String,
    pub image_prompt: String,
    pub caption_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: HistoryItemId,
    pub user_image: UserImage,
    pub generated_image: ImageArtifact,
    pub generated_caption: String,
    pub style: Style,
    /// Creation time in Unix milliseconds.
    pub timestamp: i64,
}

impl HistoryItem {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Past creations, newest first, never longer than [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HistoryItem>", into = "Vec<HistoryItem>")]
pub struct History(Vec<HistoryItem>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `item` at the front and the tail cut to capacity.
    pub fn prepend_bounded(&self, item: HistoryItem) -> Self {
        let mut items = Vec::with_capacity(HISTORY_CAPACITY);
        items.push(item);
        items.extend(self.0.iter().take(HISTORY_CAPACITY - 1).cloned());
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryItem> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryItem> {
        self.0.get(index)
    }

    /// First item carrying `id`; with colliding ids the newest one wins.
    pub fn find(&self, id: &HistoryItemId) -> Option<&HistoryItem> {
        self.0.iter().find(|item| &item.id == id)
    }
}

impl From<Vec<HistoryItem>> for History {
    /// Keeps the given order and drops whatever lies past capacity.
    fn from(mut items: Vec<HistoryItem>) -> Self {
        items.truncate(HISTORY_CAPACITY);
        Self(items)
    }
}

impl From<History> for Vec<HistoryItem> {
    fn from(history: History) -> Self {
        history.0
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryItem;
    type IntoIter = std::slice::Iter<'a, HistoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
