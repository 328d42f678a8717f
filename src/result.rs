//! The provider-agnostic output contract.

use serde::{Deserialize, Serialize};

/// Note attached when no provider produced usable output.
pub const NO_OUTPUT_NOTE: &str = "No usable output was returned by the upstream providers.";

/// Normalized result of one generation request.
///
/// Serializes as `{"text", "imageBase64", "imageUrl", "note"?}`; the three
/// content fields are always present (possibly `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    /// Extracted generated text.
    pub text: Option<String>,
    /// Extracted image as a `data:<mime>;base64,...` URI.
    pub image_base64: Option<String>,
    /// Extracted image URL.
    pub image_url: Option<String>,
    /// Diagnostic note, set when every content field is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NormalizedResult {
    /// Returns true if no content field is populated.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image_base64.is_none() && self.image_url.is_none()
    }

    /// Sets [`NO_OUTPUT_NOTE`] when the result carries no content.
    pub fn with_fallback_note(mut self) -> Self {
        if self.is_empty() && self.note.is_none() {
            self.note = Some(NO_OUTPUT_NOTE.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_nulls_and_omits_absent_note() {
        let result = NormalizedResult {
            text: Some("once upon a time".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["text"], "once upon a time");
        assert!(json["imageBase64"].is_null());
        assert!(json["imageUrl"].is_null());
        assert!(json.get("note").is_none());
        assert!(json.get("image_base64").is_none());
    }

    #[test]
    fn test_round_trip() {
        let result = NormalizedResult {
            text: Some("hello".into()),
            image_base64: Some("data:image/png;base64,iVBORw0KGgo=".into()),
            image_url: None,
            note: Some("partial".into()),
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: NormalizedResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);

        let empty = NormalizedResult::default().with_fallback_note();
        let parsed: NormalizedResult =
            serde_json::from_str(&serde_json::to_string(&empty).unwrap()).unwrap();
        assert_eq!(parsed, empty);
    }

    #[test]
    fn test_fallback_note_only_when_empty() {
        let empty = NormalizedResult::default().with_fallback_note();
        assert_eq!(empty.note.as_deref(), Some(NO_OUTPUT_NOTE));

        let with_url = NormalizedResult {
            image_url: Some("https://example.com/a.png".into()),
            ..Default::default()
        }
        .with_fallback_note();
        assert!(with_url.note.is_none());
    }
}
