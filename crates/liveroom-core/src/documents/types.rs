//! Document slot metadata and navigation payloads.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A presentable document attached to a room. Owned by the external
/// document service; the core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSlot {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub original_file_name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub is_presentation: bool,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub last_presentation_control_by: Option<String>,
    /// ISO-8601, with or without an offset.
    #[serde(default)]
    pub last_presentation_control_at: Option<String>,
}

fn first_page() -> u32 {
    1
}

impl DocumentSlot {
    /// Parsed control time. Offset-less values are taken as UTC.
    pub fn control_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_presentation_control_at.as_deref()?;
        parse_timestamp(raw)
    }

    /// Whether `page` is a valid page of this slot.
    pub fn accepts_page(&self, page: u32) -> bool {
        page >= 1 && self.total_pages.map_or(true, |total| page <= total)
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub(crate) fn format_millis(ms: u64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64).map(|dt| dt.to_rfc3339())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationAction {
    #[default]
    Navigate,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
}

impl NavigationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationAction::Navigate => "NAVIGATE",
            NavigationAction::NextPage => "NEXT_PAGE",
            NavigationAction::PreviousPage => "PREVIOUS_PAGE",
            NavigationAction::FirstPage => "FIRST_PAGE",
            NavigationAction::LastPage => "LAST_PAGE",
        }
    }
}

/// Body of a `document-navigation` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPayload {
    #[serde(deserialize_with = "id_string")]
    pub document_id: String,
    pub current_page: u32,
    #[serde(default)]
    pub action: NavigationAction,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub controlled_by: Option<String>,
}

/// Body of `document-uploaded` / `document-deleted` envelopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEventPayload {
    #[serde(deserialize_with = "id_string")]
    pub document_id: String,
}

/// Presentation state as reported by the document service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationState {
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub controlled_by: Option<String>,
    #[serde(default)]
    pub last_control_at: Option<String>,
}

/// A file to upload into a room's slot list.
#[derive(Debug, Clone)]
pub struct SlotUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub document_type: String,
    pub is_presentation: bool,
}

// ---------------------------------------------------------------------------
// Id helpers: the backend uses numeric ids, other clients may send strings.
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(d).map(|o| o.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_accepts_numeric_ids_and_local_datetimes() {
        let slot: DocumentSlot = serde_json::from_value(serde_json::json!({
            "id": 12,
            "originalFileName": "lesson.pdf",
            "isPresentation": true,
            "currentPage": 3,
            "totalPages": 10,
            "lastPresentationControlBy": 4,
            "lastPresentationControlAt": "2025-03-01T09:15:00"
        }))
        .unwrap();
        assert_eq!(slot.id, "12");
        assert_eq!(slot.last_presentation_control_by.as_deref(), Some("4"));
        let t = slot.control_time().unwrap();
        assert_eq!(t.to_rfc3339(), "2025-03-01T09:15:00+00:00");
    }

    #[test]
    fn slot_defaults() {
        let slot: DocumentSlot = serde_json::from_value(serde_json::json!({"id": "a"})).unwrap();
        assert_eq!(slot.current_page, 1);
        assert!(!slot.is_presentation);
        assert!(slot.control_time().is_none());
    }

    #[test]
    fn rfc3339_with_offset() {
        let t = parse_timestamp("2025-03-01T10:15:00+01:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2025-03-01T09:15:00+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn page_bounds() {
        let mut slot: DocumentSlot = serde_json::from_value(serde_json::json!({"id": "a"})).unwrap();
        assert!(slot.accepts_page(99));
        assert!(!slot.accepts_page(0));
        slot.total_pages = Some(5);
        assert!(slot.accepts_page(5));
        assert!(!slot.accepts_page(6));
    }

    #[test]
    fn navigation_payload_wire_format() {
        let p = NavigationPayload {
            document_id: "7".into(),
            current_page: 2,
            action: NavigationAction::NextPage,
            controlled_by: Some("t1".into()),
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["documentId"], "7");
        assert_eq!(v["currentPage"], 2);
        assert_eq!(v["action"], "NEXT_PAGE");

        let back: NavigationPayload =
            serde_json::from_value(serde_json::json!({"documentId": 7, "currentPage": 4})).unwrap();
        assert_eq!(back.document_id, "7");
        assert_eq!(back.action, NavigationAction::Navigate);
    }

    #[test]
    fn millis_format_round_trips_through_parse() {
        let s = format_millis(1_700_000_000_000).unwrap();
        assert_eq!(
            parse_timestamp(&s).unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }
}
