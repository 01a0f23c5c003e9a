//! The canonical record shape every backend normalizes into.

use std::{fmt, str::FromStr};

use serde::{
    ser::{SerializeSeq, SerializeStruct},
    Deserialize, Serialize, Serializer,
};

use crate::error::ArchiveError;

/// Position of a record in the archival hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    /// A top-level collection.
    Resource,
    /// Any descendant of a collection (series, file, item, ...).
    ResourceComponent,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::ResourceComponent => "resource_component",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource" => Ok(Self::Resource),
            "resource_component" => Ok(Self::ResourceComponent),
            other => Err(ArchiveError::InvalidInput(format!(
                "Unknown record type: {other}"
            ))),
        }
    }
}

/// A simplified note: its backend type tag and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub note_type: String,
    #[serde(default)]
    pub content: String,
}

impl Note {
    pub fn new(note_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            note_type: note_type.into(),
            content: content.into(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}

/// Drops notes without content; an empty note is never represented.
pub fn retain_content(notes: impl IntoIterator<Item = Note>) -> Vec<Note> {
    notes.into_iter().filter(Note::has_content).collect()
}

/// Materialization state of a record's descendants.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Children {
    /// The record has no children at all.
    #[default]
    None,
    /// Children exist but were not fetched because the depth limit was reached.
    Withheld,
    /// Children were fetched.
    Fetched(Vec<Record>),
}

impl Children {
    pub fn has_children(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_slice(&self) -> &[Record] {
        match self {
            Self::Fetched(records) => records,
            _ => &[],
        }
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_bool(false),
            Self::Withheld => serializer.serialize_seq(Some(0))?.end(),
            Self::Fetched(records) => {
                let mut seq = serializer.serialize_seq(Some(records.len()))?;
                for record in records {
                    seq.serialize_element(record)?;
                }
                seq.end()
            }
        }
    }
}

/// A backend-independent archival description.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Opaque backend reference: a URI fragment, a row id or a slug.
    pub id: String,
    pub record_type: RecordType,
    /// Pre-order position within the walk that produced this record.
    pub sort_position: u32,
    pub identifier: String,
    pub title: String,
    pub display_title: Option<String>,
    pub level_of_description: String,
    pub dates: String,
    pub date_expression: String,
    pub notes: Vec<Note>,
    pub children: Children,
}

impl Record {
    pub fn new(id: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            id: id.into(),
            record_type,
            sort_position: 1,
            identifier: String::new(),
            title: String::new(),
            display_title: None,
            level_of_description: String::new(),
            dates: String::new(),
            date_expression: String::new(),
            notes: Vec::new(),
            children: Children::None,
        }
    }

    pub fn has_children(&self) -> bool {
        self.children.has_children()
    }

    /// Applies a date range to both date views of this record.
    pub fn set_dates(&mut self, range: &DateRange) {
        self.dates = range.dates();
        self.date_expression = range.date_expression();
    }

    /// Iterates over this record and all fetched descendants, depth first.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let record = stack.pop()?;
            stack.extend(record.children.as_slice().iter().rev());
            Some(record)
        })
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.display_title.is_some() { 12 } else { 11 };
        let mut state = serializer.serialize_struct("Record", len)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.record_type)?;
        state.serialize_field("sortPosition", &self.sort_position)?;
        state.serialize_field("identifier", &self.identifier)?;
        state.serialize_field("title", &self.title)?;
        if let Some(display_title) = &self.display_title {
            state.serialize_field("display_title", display_title)?;
        } else {
            state.skip_field("display_title")?;
        }
        state.serialize_field("levelOfDescription", &self.level_of_description)?;
        state.serialize_field("dates", &self.dates)?;
        state.serialize_field("date_expression", &self.date_expression)?;
        state.serialize_field("notes", &self.notes)?;
        state.serialize_field("children", &self.children)?;
        state.serialize_field("has_children", &self.has_children())?;
        state.end()
    }
}

/// The raw date facts of a record: a begin/end pair and an optional human expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub begin: Option<String>,
    pub end: Option<String>,
    pub expression: Option<String>,
}

impl DateRange {
    pub fn new(begin: Option<String>, end: Option<String>, expression: Option<String>) -> Self {
        Self {
            begin: non_empty(begin),
            end: non_empty(end),
            expression: non_empty(expression),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.begin.is_none() && self.end.is_none() && self.expression.is_none()
    }

    /// The machine expression, or an empty string when there is none.
    pub fn date_expression(&self) -> String {
        self.expression.clone().unwrap_or_default()
    }

    /// Display form: the expression when present, else `begin-end` or `begin`.
    pub fn dates(&self) -> String {
        if let Some(expression) = &self.expression {
            return expression.clone();
        }
        match (&self.begin, &self.end) {
            (Some(begin), Some(end)) => format!("{begin}-{end}"),
            (Some(begin), None) => begin.clone(),
            (None, _) => String::new(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn leaf(id: &str, title: &str) -> Record {
        let mut record = Record::new(id, RecordType::ResourceComponent);
        record.title = title.to_string();
        record
    }

    #[test]
    fn test_date_range_prefers_expression() {
        let range = DateRange::new(
            Some("1880".into()),
            Some("1889".into()),
            Some("1880 to 1889".into()),
        );
        assert_eq!(range.dates(), "1880 to 1889");
        assert_eq!(range.date_expression(), "1880 to 1889");
    }

    #[test]
    fn test_date_range_synthesizes_from_begin_end() {
        let range = DateRange::new(Some("1880".into()), Some("1889".into()), None);
        assert_eq!(range.dates(), "1880-1889");
        assert_eq!(range.date_expression(), "");

        let range = DateRange::new(Some("1889".into()), None, Some(String::new()));
        assert_eq!(range.dates(), "1889");
        assert_eq!(range.date_expression(), "");
    }

    #[test]
    fn test_date_range_empty() {
        let range = DateRange::default();
        assert!(range.is_empty());
        assert_eq!(range.dates(), "");
        assert_eq!(range.date_expression(), "");

        let range = DateRange::new(None, Some("1900".into()), None);
        assert_eq!(range.dates(), "");
    }

    #[test]
    fn test_retain_content_drops_empty_notes() {
        let notes = retain_content(vec![
            Note::new("odd", ""),
            Note::new("odd", "kept"),
            Note::new("accessrestrict", ""),
        ]);
        assert_eq!(notes, vec![Note::new("odd", "kept")]);
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!(
            "resource".parse::<RecordType>().unwrap(),
            RecordType::Resource
        );
        assert_eq!(
            "resource_component".parse::<RecordType>().unwrap(),
            RecordType::ResourceComponent
        );
        assert!("digital_object".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_children_serialization() {
        assert_eq!(serde_json::to_value(Children::None).unwrap(), json!(false));
        assert_eq!(serde_json::to_value(Children::Withheld).unwrap(), json!([]));
        assert!(!Children::None.has_children());
        assert!(Children::Withheld.has_children());
    }

    #[test]
    fn test_record_serialization_uses_canonical_names() {
        let mut record = Record::new("/repositories/2/resources/1", RecordType::Resource);
        record.title = "Parent".to_string();
        record.identifier = "PR01".to_string();
        record.notes.push(Note::new("odd", "This is a note"));
        record.children = Children::Fetched(vec![leaf("23", "Child A")]);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "resource");
        assert_eq!(value["sortPosition"], 1);
        assert_eq!(value["levelOfDescription"], "");
        assert_eq!(value["notes"][0]["type"], "odd");
        assert_eq!(value["has_children"], true);
        assert_eq!(value["children"][0]["children"], json!(false));
        assert_eq!(value["children"][0]["has_children"], false);
        assert!(value.get("display_title").is_none());
    }

    #[test]
    fn test_record_iter_is_depth_first() {
        let mut child = leaf("2", "Child");
        child.children = Children::Fetched(vec![leaf("3", "Grandchild")]);
        let mut root = Record::new("1", RecordType::Resource);
        root.children = Children::Fetched(vec![child, leaf("4", "Second child")]);

        let ids: Vec<&str> = root.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }
}
