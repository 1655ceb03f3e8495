use serde::{Deserialize, Serialize};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "New Note";

/// `M/D/YYYY h:mm:ss AM`, the date/time rendering with the comma after the
/// date segment collapsed into a space.
const DISPLAY_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period]"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId(Uuid);

impl NoteId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone)]
pub struct Note {
    id: NoteId,
    pub title: String,
    pub text: String,
    created_at: OffsetDateTime,
    display_date: String,
}

impl Note {
    pub fn new(title: impl Into<String>, created_at: OffsetDateTime, text: impl Into<String>) -> Self {
        Self {
            id: NoteId::generate(),
            title: title.into(),
            text: text.into(),
            created_at,
            display_date: format_display_date(created_at),
        }
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Frozen at construction; edits never refresh it.
    pub fn display_date(&self) -> &str {
        &self.display_date
    }

    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            title: self.title.clone(),
            text: self.text.clone(),
            date: self.display_date.clone(),
            created_at: Some(self.created_at),
        }
    }

    /// Rebuilds a note from its persisted form. Records written without a
    /// timestamp fall back to parsing the stored display date.
    pub fn from_record(record: NoteRecord) -> Option<Self> {
        let created_at = match record.created_at {
            Some(ts) => ts,
            None => parse_display_date(&record.date)?,
        };
        let display_date = if record.date.is_empty() {
            format_display_date(created_at)
        } else {
            record.date
        };
        Some(Self {
            id: NoteId::generate(),
            title: record.title,
            text: record.text,
            created_at,
            display_date,
        })
    }
}

/// Wire shape of one note inside the persisted collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub date: String,
    #[serde(
        rename = "createdAt",
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

pub fn format_display_date(dt: OffsetDateTime) -> String {
    dt.format(DISPLAY_FORMAT)
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn parse_display_date(raw: &str) -> Option<OffsetDateTime> {
    PrimitiveDateTime::parse(raw.trim(), DISPLAY_FORMAT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn display_date_drops_comma_after_date() {
        let note = Note::new(DEFAULT_TITLE, datetime!(2024-01-01 10:00:00 UTC), "");
        assert_eq!(note.display_date(), "1/1/2024 10:00:00 AM");
    }

    #[test]
    fn display_date_uses_twelve_hour_clock() {
        let note = Note::new("x", datetime!(2023-11-25 17:04:09 UTC), "");
        assert_eq!(note.display_date(), "11/25/2023 5:04:09 PM");
    }

    #[test]
    fn display_date_is_not_refreshed_by_edits() {
        let mut note = Note::new("Draft", datetime!(2024-03-05 08:30:00 UTC), "");
        let before = note.display_date().to_string();
        note.title = "Renamed".into();
        note.text = "body".into();
        assert_eq!(note.display_date(), before);
    }

    #[test]
    fn record_round_trip_keeps_frozen_date() {
        let note = Note::new("Groceries", datetime!(2024-01-01 10:00:00 UTC), "milk");
        let json = serde_json::to_string(&note.to_record()).expect("serialize");
        let record: NoteRecord = serde_json::from_str(&json).expect("deserialize");
        let restored = Note::from_record(record).expect("valid record");
        assert_eq!(restored.title, "Groceries");
        assert_eq!(restored.text, "milk");
        assert_eq!(restored.created_at(), note.created_at());
        assert_eq!(restored.display_date(), note.display_date());
        assert_ne!(restored.id(), note.id());
    }

    #[test]
    fn record_without_timestamp_parses_display_date() {
        let record: NoteRecord =
            serde_json::from_str(r#"{"title":"Old","text":"","date":"1/1/2024 10:00:00 AM"}"#)
                .expect("deserialize");
        let note = Note::from_record(record).expect("recoverable record");
        assert_eq!(note.created_at(), datetime!(2024-01-01 10:00:00 UTC));
        assert_eq!(note.display_date(), "1/1/2024 10:00:00 AM");
    }

    #[test]
    fn record_without_any_usable_date_is_rejected() {
        let record: NoteRecord =
            serde_json::from_str(r#"{"title":"Lost","text":"","date":"yesterday"}"#)
                .expect("deserialize");
        assert!(Note::from_record(record).is_none());
    }
}
