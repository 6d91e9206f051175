//! Content parts - the ordered pieces of a node's content.

use serde::{Deserialize, Serialize};

/// One piece of a turn's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Canonical narrative or user text.
    Text { text: String },

    /// Internal reasoning. Not part of the story; rendered only on request.
    Thought { text: String },

    /// Reference to an image stored outside the tree.
    ImageRef {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn thought(text: impl Into<String>) -> Self {
        ContentPart::Thought { text: text.into() }
    }

    pub fn image_ref(id: impl Into<String>, caption: Option<String>) -> Self {
        ContentPart::ImageRef {
            id: id.into(),
            caption,
        }
    }

    /// Whether this part belongs to the story itself.
    pub fn is_canonical(&self) -> bool {
        !matches!(self, ContentPart::Thought { .. })
    }

    /// Render the part as plain text for a prompt.
    ///
    /// Thoughts are wrapped so the generator can tell them apart from narrative.
    pub fn render(&self) -> String {
        match self {
            ContentPart::Text { text } => text.clone(),
            ContentPart::Thought { text } => format!("<thought>{}</thought>", text),
            ContentPart::ImageRef { id, caption } => match caption {
                Some(caption) => format!("[image: {}]", caption),
                None => format!("[image {}]", id),
            },
        }
    }
}
