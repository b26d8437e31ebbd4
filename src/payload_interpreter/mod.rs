//! PayloadInterpreter - Scanned Payload to Equipment Identifier
//!
//! ## Responsibilities
//!
//! - Turn raw scanned/pasted text into a canonical equipment identifier
//! - Accept link payloads (`.../scan/<id>`, `.../equipment/<id>`), JSON
//!   payloads (`{"equipmentId": ...}` / `{"id": ...}`), and bare tokens
//!
//! Stages run in strict precedence order; each stage swallows its own parse
//! failure and falls through to the next. Bare tokens shorter than
//! `MIN_TOKEN_LEN` are rejected rather than guessed at.

use url::Url;

/// Minimum length for a bare payload to be accepted as an identifier verbatim
pub const MIN_TOKEN_LEN: usize = 6;

/// Interpret a raw scanned or pasted payload as an equipment identifier
///
/// Returns `None` when nothing identifier-shaped can be extracted.
pub fn interpret(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(id) = from_link(value) {
        return Some(id);
    }

    if let Some(id) = from_json(value) {
        return Some(id);
    }

    // Last resort: the payload itself is the identifier (uuid-ish / nanoid-ish)
    if value.chars().count() >= MIN_TOKEN_LEN {
        return Some(value.to_string());
    }

    None
}

/// Stage 2: absolute http(s) URL carrying `/scan/<id>` or `/equipment/<id>`
fn from_link(value: &str) -> Option<String> {
    let parsed = Url::parse(value).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();

    for marker in ["scan", "equipment"] {
        if let Some(idx) = segments.iter().position(|s| *s == marker) {
            if let Some(next) = segments.get(idx + 1) {
                return Some((*next).to_string());
            }
        }
    }

    None
}

/// Stage 3: JSON object with a string-valued `equipmentId` or `id` property
fn from_json(value: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(value).ok()?;
    let obj = parsed.as_object()?;

    for key in ["equipmentId", "id"] {
        if let Some(id) = obj.get(key).and_then(|v| v.as_str()) {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_whitespace_yield_none() {
        assert_eq!(interpret(""), None);
        assert_eq!(interpret("   "), None);
    }

    #[test]
    fn test_scan_link() {
        assert_eq!(
            interpret("https://app.example.com/scan/EQ-42"),
            Some("EQ-42".to_string())
        );
    }

    #[test]
    fn test_equipment_link() {
        assert_eq!(
            interpret("http://console.local/equipment/abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_scan_segment_checked_before_equipment() {
        assert_eq!(
            interpret("https://x.io/equipment/A1B2C3/scan/Z9Y8X7"),
            Some("Z9Y8X7".to_string())
        );
    }

    #[test]
    fn test_link_without_marker_falls_through_to_bare_token() {
        // A parseable URL with no scan/equipment segment is still >= 6 chars,
        // so the whole text is accepted verbatim by the last stage.
        let raw = "https://app.example.com/dashboard";
        assert_eq!(interpret(raw), Some(raw.to_string()));
    }

    #[test]
    fn test_json_equipment_id() {
        assert_eq!(
            interpret(r#"{"equipmentId":"EQ-7"}"#),
            Some("EQ-7".to_string())
        );
    }

    #[test]
    fn test_json_id_fallback() {
        assert_eq!(interpret(r#"{"id":"EQ-8"}"#), Some("EQ-8".to_string()));
    }

    #[test]
    fn test_json_equipment_id_wins_over_id() {
        assert_eq!(
            interpret(r#"{"id":"LOSER","equipmentId":"WINNER"}"#),
            Some("WINNER".to_string())
        );
    }

    #[test]
    fn test_json_empty_string_value_skipped() {
        // {"equipmentId":""} has no usable value; the JSON text itself is the
        // bare-token fallback.
        let raw = r#"{"equipmentId":""}"#;
        assert_eq!(interpret(raw), Some(raw.to_string()));
    }

    #[test]
    fn test_json_non_string_id_falls_through() {
        let raw = r#"{"id":12345678}"#;
        assert_eq!(interpret(raw), Some(raw.to_string()));
    }

    #[test]
    fn test_bare_token_at_threshold() {
        assert_eq!(interpret("ABC123"), Some("ABC123".to_string()));
    }

    #[test]
    fn test_bare_token_below_threshold() {
        assert_eq!(interpret("AB12"), None);
    }

    #[test]
    fn test_bare_token_is_trimmed() {
        assert_eq!(interpret("  EQ-4217  "), Some("EQ-4217".to_string()));
    }
}
