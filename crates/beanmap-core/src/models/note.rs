use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text note attached to a shop.
///
/// Field names on disk follow the stored format: `date` for the creation
/// time and `edited` for the last edit. Older data used `editedAt`, and
/// some records carry both; the later of the two is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredNote")]
pub struct Note {
    pub id: i64,
    pub text: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "edited", skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct StoredNote {
    id: i64,
    text: String,
    date: DateTime<Utc>,
    #[serde(default)]
    edited: Option<DateTime<Utc>>,
    #[serde(default, rename = "editedAt")]
    edited_at: Option<DateTime<Utc>>,
}

impl From<StoredNote> for Note {
    fn from(stored: StoredNote) -> Self {
        Self {
            id: stored.id,
            text: stored.text,
            created_at: stored.date,
            // None sorts below any timestamp
            edited_at: stored.edited.max(stored.edited_at),
        }
    }
}

impl Note {
    pub fn new(id: i64, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            text: text.into(),
            created_at,
            edited_at: None,
        }
    }

    /// Replace the text and stamp the edit time.
    pub fn edit(&mut self, text: impl Into<String>, at: DateTime<Utc>) {
        self.text = text.into();
        self.edited_at = Some(at);
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Most recent of creation and edit time.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.edited_at.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_field_names() {
        let created = DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let note = Note::new(1714552200000, "Great espresso", created);
        let json = serde_json::to_value(&note).unwrap();

        assert_eq!(json["id"], 1714552200000i64);
        assert_eq!(json["text"], "Great espresso");
        assert_eq!(json["date"], "2024-05-01T08:30:00Z");
        assert!(json.get("edited").is_none());
    }

    #[test]
    fn test_reads_legacy_edited_at() {
        let json = r#"{"id":7,"text":"ok","date":"2024-05-01T08:30:00.000Z","editedAt":"2024-05-02T09:00:00.000Z"}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert!(note.is_edited());
        assert_eq!(note.updated_at(), note.edited_at.unwrap());
    }

    #[test]
    fn test_reads_both_edit_fields() {
        let json = r#"{"id":7,"text":"ok","date":"2024-05-01T08:30:00.000Z",
            "edited":"2024-05-03T10:00:00.000Z","editedAt":"2024-05-02T09:00:00.000Z"}"#;
        let note: Note = serde_json::from_str(json).unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-05-03T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(note.edited_at, Some(expected));

        let written = serde_json::to_value(&note).unwrap();
        assert!(written.get("editedAt").is_none());
        assert!(written["edited"].is_string());
    }

    #[test]
    fn test_edit_stamps_time() {
        let now = Utc::now();
        let mut note = Note::new(1, "flat white", now);
        assert!(!note.is_edited());
        note.edit("cortado", now);
        assert_eq!(note.text, "cortado");
        assert_eq!(note.edited_at, Some(now));
    }
}
