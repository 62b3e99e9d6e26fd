use serde::{Deserialize, Serialize};

/// One form field as scanned from the page. Every text attribute defaults to
/// the empty string so callers can omit what the DOM did not expose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    pub name: String,
    pub placeholder: String,
    /// Element tag: `input`, `select`, `textarea`.
    pub tag: String,
    /// The `type` attribute of an input, e.g. `text`, `email`, `radio`.
    pub html_type: String,
    pub options: Vec<String>,
}

impl FieldDescriptor {
    /// The field's coarse type as seen by the oracle: the input type when
    /// present, otherwise the tag.
    pub fn field_type(&self) -> &str {
        if !self.html_type.trim().is_empty() {
            self.html_type.trim()
        } else if !self.tag.trim().is_empty() {
            self.tag.trim()
        } else {
            "text"
        }
    }

    /// Text fed to the embedding model for semantic classification.
    pub fn embedding_text(&self) -> String {
        let opt_preview = self
            .options
            .iter()
            .take(5)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Label: {}. Name attribute: {}. Placeholder: {}. Tag: {}, type: {}. Options: {}.",
            self.label, self.name, self.placeholder, self.tag, self.html_type, opt_preview
        )
    }
}
