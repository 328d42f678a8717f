//! Schema-agnostic extraction of useful fields from provider payloads.
//!
//! Providers bury their output at different depths under different keys, so
//! the extractors make no assumption about key names, nesting or array order.
//! Each one is a pure function over an immutable [`serde_json::Value`]:
//!
//! - [`longest_text`]: the longest string leaf is taken as the generated text.
//! - [`find_base64_image`]: the first string leaf that looks like a base64 image.
//! - [`find_first_url`]: the first string leaf that is an HTTP(S) URL.
//!
//! The base64 test is a heuristic: any long base64-looking token (not just an
//! image) qualifies once it is over [`BASE64_MIN_LEN`] characters.

mod image;
mod walk;

pub use image::{base64_data_uri, decode_data_uri, to_data_uri, with_image_extension, ImageFormat};
pub use walk::{
    string_leaves, string_leaves_with_depth, ExtractionCandidate, StringLeaves, MAX_DEPTH,
};

use serde_json::Value;

/// Leaves longer than this qualify as base64 images without a known prefix.
pub const BASE64_MIN_LEN: usize = 200;

const JPEG_B64_PREFIX: &str = "/9j/";
const PNG_B64_PREFIX: &str = "iVBOR";

/// Returns the longest string leaf by character count.
///
/// Ties keep the first leaf in pre-order. Returns an empty string when the
/// payload has no string leaves.
pub fn longest_text(payload: &Value) -> String {
    string_leaves(payload)
        .fold(None::<(usize, &str)>, |best, candidate| {
            let len = candidate.value.chars().count();
            match best {
                Some((best_len, _)) if best_len >= len => best,
                _ => Some((len, candidate.value)),
            }
        })
        .map(|(_, text)| text.to_string())
        .unwrap_or_default()
}

/// Returns the first string leaf that looks like a base64-encoded image.
///
/// A leaf qualifies when, with whitespace removed, it is made only of
/// `A-Z a-z 0-9 + / =` and either starts with the JPEG (`/9j/`) or PNG
/// (`iVBOR`) prefix or is longer than [`BASE64_MIN_LEN`]. The returned string
/// has whitespace removed. Traversal stops at the first match.
pub fn find_base64_image(payload: &Value) -> Option<String> {
    string_leaves(payload).find_map(|candidate| qualify_base64_image(candidate.value))
}

/// Returns the first string leaf starting with `http://` or `https://`.
pub fn find_first_url(payload: &Value) -> Option<String> {
    string_leaves(payload)
        .find(|candidate| is_http_url(candidate.value))
        .map(|candidate| candidate.value.to_string())
}

fn qualify_base64_image(leaf: &str) -> Option<String> {
    let stripped: String = leaf.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() || !stripped.chars().all(is_base64_char) {
        return None;
    }
    let looks_like_image = stripped.starts_with(JPEG_B64_PREFIX)
        || stripped.starts_with(PNG_B64_PREFIX)
        || stripped.len() > BASE64_MIN_LEN;
    looks_like_image.then_some(stripped)
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

fn is_http_url(leaf: &str) -> bool {
    leaf.starts_with("http://") || leaf.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_longest_text_ignores_nesting_depth() {
        let payload = json!({"a": "hi", "b": {"c": "a much longer generated string here"}});
        assert_eq!(longest_text(&payload), "a much longer generated string here");
    }

    #[test]
    fn test_longest_text_without_string_leaves() {
        let payload = json!({"n": 1, "f": [true, null]});
        assert_eq!(longest_text(&payload), "");
        assert_eq!(longest_text(&Value::Null), "");
    }

    #[test]
    fn test_longest_text_ties_keep_first() {
        let payload = json!(["abc", {"x": "xyz"}, "def"]);
        assert_eq!(longest_text(&payload), "abc");
    }

    #[test]
    fn test_longest_text_counts_characters_not_bytes() {
        // 4 chars / 12 bytes vs 5 chars / 5 bytes
        let payload = json!({"jp": "日本語だ", "en": "hello"});
        assert_eq!(longest_text(&payload), "hello");
    }

    #[test]
    fn test_longest_text_on_provider_shapes() {
        let hugging_face = json!([{"generated_text": "The dragon slept beneath the mountain."}]);
        assert_eq!(
            longest_text(&hugging_face),
            "The dragon slept beneath the mountain."
        );

        let openai = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "A quiet village by the sea, lit by lanterns."}}]
        });
        assert_eq!(
            longest_text(&openai),
            "A quiet village by the sea, lit by lanterns."
        );
    }

    #[test]
    fn test_find_base64_image_prefixes() {
        let payload = json!({"meta": "abc", "img": "/9j/4AAQSkZJRg=="});
        assert_eq!(find_base64_image(&payload).as_deref(), Some("/9j/4AAQSkZJRg=="));

        let payload = json!({"img": "iVBORw0KGgo="});
        assert_eq!(find_base64_image(&payload).as_deref(), Some("iVBORw0KGgo="));
    }

    #[test]
    fn test_find_base64_image_strips_whitespace() {
        let payload = json!({"img": "iVBORw0K\nGgoAAAA NSUhEUg=="});
        assert_eq!(
            find_base64_image(&payload).as_deref(),
            Some("iVBORw0KGgoAAAANSUhEUg==")
        );
    }

    #[test]
    fn test_find_base64_image_length_threshold() {
        let exactly = "A".repeat(BASE64_MIN_LEN);
        assert_eq!(find_base64_image(&json!({ "x": exactly })), None);

        let longer = "A".repeat(BASE64_MIN_LEN + 1);
        assert_eq!(find_base64_image(&json!({ "x": longer.clone() })), Some(longer));
    }

    #[test]
    fn test_find_base64_image_rejects_non_alphabet() {
        let payload = json!({
            "status": "success",
            "url": "https://example.com/iVBOR.png",
            "prose": format!("{} with spaces and punctuation!", "word ".repeat(60)),
        });
        assert_eq!(find_base64_image(&payload), None);
        assert_eq!(find_base64_image(&json!({"blank": "   "})), None);
    }

    #[test]
    fn test_find_base64_image_is_first_match_in_pre_order() {
        let long_candidate = "B".repeat(BASE64_MIN_LEN + 50);
        let payload = json!({
            "first": {"nested": long_candidate.clone()},
            "second": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
        });
        assert_eq!(find_base64_image(&payload), Some(long_candidate));
    }

    #[test]
    fn test_find_first_url() {
        let payload = json!({"x": {"y": "not a url"}, "z": ["https://example.com/img.png"]});
        assert_eq!(
            find_first_url(&payload).as_deref(),
            Some("https://example.com/img.png")
        );

        let payload = json!(["ftp://example.com/a", "http://first.example/a", "https://second.example/b"]);
        assert_eq!(find_first_url(&payload).as_deref(), Some("http://first.example/a"));

        assert_eq!(find_first_url(&json!({"u": " https://leading-space"})), None);
    }

    #[test]
    fn test_extractors_are_idempotent() {
        let payload = json!({
            "a": "short",
            "b": ["https://cdn.example/out.png", "iVBORw0KGgo="],
            "c": {"d": "the longest string in this payload by far"}
        });
        assert_eq!(longest_text(&payload), longest_text(&payload));
        assert_eq!(find_base64_image(&payload), find_base64_image(&payload));
        assert_eq!(find_first_url(&payload), find_first_url(&payload));
    }
}
