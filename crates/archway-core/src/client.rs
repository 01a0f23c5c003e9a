//! The operation surface shared by every backend.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{ArchiveError, Result},
    query::{CollectionQuery, PageRequest},
    record::{Note, Record, RecordType},
    walker::TreeOptions,
};

/// The systems of record archway can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    ArchivesSpace,
    Atom,
    Toolkit,
}

impl BackendKind {
    /// Human-readable product name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArchivesSpace => "ArchivesSpace",
            Self::Atom => "AtoM",
            Self::Toolkit => "Archivists' Toolkit",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArchivesSpace => "archivesspace",
            Self::Atom => "atom",
            Self::Toolkit => "toolkit",
        }
    }

    pub fn unsupported(&self, operation: &'static str) -> ArchiveError {
        ArchiveError::unsupported(self.name(), operation)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "archivesspace" | "aspace" => Ok(Self::ArchivesSpace),
            "atom" => Ok(Self::Atom),
            "toolkit" | "archivists_toolkit" | "at" => Ok(Self::Toolkit),
            other => Err(ArchiveError::InvalidInput(format!(
                "Unknown backend kind: {other}"
            ))),
        }
    }
}

/// Field-level changes to an existing record. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordEdit {
    pub id: String,
    pub title: Option<String>,
    pub level: Option<String>,
    /// `Some` replaces every note; an empty list deletes them all.
    pub notes: Option<Vec<Note>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_expression: Option<String>,
}

impl RecordEdit {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Edit that writes a fetched (and possibly modified) record back.
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: Some(record.title.clone()),
            level: Some(record.level_of_description.clone()).filter(|l| !l.is_empty()),
            notes: Some(record.notes.clone()),
            start_date: None,
            end_date: None,
            date_expression: Some(record.date_expression.clone()).filter(|d| !d.is_empty()),
        }
    }

    pub fn has_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some() || self.date_expression.is_some()
    }

    /// Rejects edits without an id or without any field.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(ArchiveError::InvalidInput("No record ID provided".into()));
        }
        if self.title.is_none() && self.level.is_none() && self.notes.is_none() && !self.has_dates()
        {
            return Err(ArchiveError::InvalidInput(
                "No fields to update specified".into(),
            ));
        }
        Ok(())
    }
}

/// Fields for a new child record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewChild {
    pub title: String,
    pub level: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub date_expression: Option<String>,
    /// Notes without content are not posted; an empty type takes the backend default.
    pub notes: Vec<Note>,
}

impl NewChild {
    pub fn new(title: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    pub fn has_dates(&self) -> bool {
        [&self.start_date, &self.end_date, &self.date_expression]
            .iter()
            .any(|d| d.as_deref().is_some_and(|d| !d.is_empty()))
    }

    /// The notes to post, untyped ones tagged with `default_type`.
    pub fn notes(&self, default_type: &str) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|note| note.has_content())
            .map(|note| {
                let note_type = if note.note_type.is_empty() {
                    default_type
                } else {
                    note.note_type.as_str()
                };
                Note::new(note_type, note.content.as_str())
            })
            .collect()
    }
}

/// A reference to a digitized or born-digital file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalObject {
    pub identifier: String,
    pub title: Option<String>,
    pub uri: Option<String>,
    pub location_of_originals: Option<String>,
    pub object_type: Option<String>,
    pub xlink_show: String,
    pub xlink_actuate: String,
    pub restricted: bool,
    pub use_statement: Option<String>,
    pub use_conditions: Option<String>,
    pub access_conditions: Option<String>,
    pub size: Option<u64>,
    pub format_name: Option<String>,
    pub format_version: Option<String>,
    pub format_registry_key: Option<String>,
    pub format_registry_name: Option<String>,
    pub file_uuid: Option<String>,
    pub aip_uuid: Option<String>,
    pub aip_name: Option<String>,
    pub relative_path_within_aip: Option<String>,
    pub usage: Option<String>,
    pub inherit_dates: bool,
    pub inherit_notes: bool,
}

impl Default for DigitalObject {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            title: None,
            uri: None,
            location_of_originals: None,
            object_type: None,
            xlink_show: "embed".into(),
            xlink_actuate: "onLoad".into(),
            restricted: false,
            use_statement: None,
            use_conditions: None,
            access_conditions: None,
            size: None,
            format_name: None,
            format_version: None,
            format_registry_key: None,
            format_registry_name: None,
            file_uuid: None,
            aip_uuid: None,
            aip_name: None,
            relative_path_within_aip: None,
            usage: None,
            inherit_dates: false,
            inherit_notes: false,
        }
    }
}

impl DigitalObject {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn location_of_originals(mut self, location: impl Into<String>) -> Self {
        self.location_of_originals = Some(location.into());
        self
    }

    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    pub fn use_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.use_conditions = Some(conditions.into());
        self
    }

    pub fn access_conditions(mut self, conditions: impl Into<String>) -> Self {
        self.access_conditions = Some(conditions.into());
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn inherit_dates(mut self, inherit: bool) -> Self {
        self.inherit_dates = inherit;
        self
    }

    pub fn inherit_notes(mut self, inherit: bool) -> Self {
        self.inherit_notes = inherit;
        self
    }

    /// Title to use when none was given: the last path segment of the uri.
    pub fn fallback_title(&self) -> Option<String> {
        let uri = self.uri.as_deref()?;
        let name = uri.trim_end_matches('/').rsplit('/').next()?;
        (!name.is_empty()).then(|| name.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigitalObjectComponent {
    pub label: Option<String>,
    pub title: Option<String>,
}

/// A newly created remote object and the document that was posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedObject {
    pub id: String,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindByIdType {
    ArchivalObjects,
    DigitalObjectComponents,
}

impl FindByIdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArchivalObjects => "archival_objects",
            Self::DigitalObjectComponents => "digital_object_components",
        }
    }
}

impl FromStr for FindByIdType {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "archival_objects" => Ok(Self::ArchivalObjects),
            "digital_object_components" => Ok(Self::DigitalObjectComponents),
            other => Err(ArchiveError::InvalidInput(format!(
                "Unsupported find_by_id type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindByIdField {
    RefId,
    ComponentId,
}

impl FindByIdField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RefId => "ref_id",
            Self::ComponentId => "component_id",
        }
    }
}

impl FromStr for FindByIdField {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ref_id" => Ok(Self::RefId),
            "component_id" => Ok(Self::ComponentId),
            other => Err(ArchiveError::InvalidInput(format!(
                "Unsupported find_by_id field: {other}"
            ))),
        }
    }
}

/// A search hit from `find_by_id`, carrying the full native record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
    pub identifier: String,
    pub title: String,
    #[serde(rename = "levelOfDescription")]
    pub level_of_description: String,
    pub full_record: Value,
}

/// The immediate parent of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub id: String,
}

/// Uniform access to an archival description backend.
///
/// Capabilities a backend lacks return [`ArchiveError::Unsupported`].
pub trait ArchiveClient {
    fn backend(&self) -> BackendKind;

    /// The record with its immediate children state resolved but not fetched.
    fn get_record(&mut self, id: &str) -> Result<Record> {
        self.get_resource_component_and_children(id, &TreeOptions::depth(1))
    }

    fn edit_record(&mut self, edit: &RecordEdit) -> Result<()>;

    fn get_resource_component_and_children(
        &mut self,
        id: &str,
        options: &TreeOptions,
    ) -> Result<Record>;

    /// The complete subtree below `id`.
    fn get_resource_component_children(&mut self, id: &str) -> Result<Record> {
        self.get_resource_component_and_children(id, &TreeOptions::unbounded())
    }

    /// Every descendant id, depth first, excluding `id` itself.
    fn collection_list(&mut self, id: &str) -> Result<Vec<String>>;

    fn find_collection_ids(&mut self, query: &CollectionQuery) -> Result<Vec<String>>;

    fn count_collections(&mut self, query: &CollectionQuery) -> Result<u64>;

    fn find_collections(
        &mut self,
        query: &CollectionQuery,
        page: PageRequest,
    ) -> Result<Vec<Record>>;

    fn find_by_id(
        &mut self,
        id_type: FindByIdType,
        field: FindByIdField,
        value: &str,
    ) -> Result<Vec<FoundRecord>>;

    fn find_resource_id_for_component(&mut self, id: &str) -> Result<String>;

    fn find_parent_id_for_component(&mut self, id: &str) -> Result<ParentRef>;

    /// Each id expanded to a tree two levels deep.
    fn augment_resource_ids(&mut self, ids: &[String]) -> Result<Vec<Record>> {
        let options = TreeOptions::depth(2);
        ids.iter()
            .map(|id| self.get_resource_component_and_children(id, &options))
            .collect()
    }

    /// Creates a child under `parent` and returns its id.
    fn add_child(&mut self, parent: &str, child: &NewChild) -> Result<String>;

    fn add_digital_object(&mut self, parent: &str, object: &DigitalObject)
        -> Result<CreatedObject>;

    fn add_digital_object_component(
        &mut self,
        parent_object: &str,
        parent_component: Option<&str>,
        component: &DigitalObjectComponent,
    ) -> Result<CreatedObject>;

    fn delete_record(&mut self, id: &str) -> Result<DeleteOutcome>;

    fn get_levels_of_description(&mut self) -> Result<Vec<String>>;

    /// Releases the session. Further calls fail.
    fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Children;

    #[test]
    fn test_edit_requires_id_and_fields() {
        let err = RecordEdit::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "No record ID provided");

        let err = RecordEdit::new("/repositories/2/resources/1")
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "No fields to update specified");

        let edit = RecordEdit {
            notes: Some(Vec::new()),
            ..RecordEdit::new("/repositories/2/resources/1")
        };
        assert!(edit.validate().is_ok());
    }

    #[test]
    fn test_edit_from_record() {
        let mut record = Record::new("7", RecordType::ResourceComponent);
        record.title = "Edited".into();
        record.level_of_description = "file".into();
        record.notes = vec![Note::new("odd", "text")];
        record.children = Children::Withheld;

        let edit = RecordEdit::from_record(&record);
        assert_eq!(edit.id, "7");
        assert_eq!(edit.title.as_deref(), Some("Edited"));
        assert_eq!(edit.level.as_deref(), Some("file"));
        assert_eq!(edit.notes.as_ref().map(Vec::len), Some(1));
        assert_eq!(edit.date_expression, None);
    }

    #[test]
    fn test_new_child_drops_empty_note() {
        let child = NewChild::new("Child", "series")
            .with_note(Note::new("", ""))
            .with_note(Note::new("", "text"))
            .with_note(Note::new("accessrestrict", "closed"));
        assert_eq!(
            child.notes("odd"),
            vec![Note::new("odd", "text"), Note::new("accessrestrict", "closed")]
        );
        assert!(!child.has_dates());
    }

    #[test]
    fn test_digital_object_defaults() {
        let object = DigitalObject::new("dobj").uri("http://example.com/files/example.tif");
        assert_eq!(object.xlink_show, "embed");
        assert_eq!(object.xlink_actuate, "onLoad");
        assert_eq!(object.fallback_title().as_deref(), Some("example.tif"));
        assert_eq!(DigitalObject::new("x").fallback_title(), None);
    }

    #[test]
    fn test_find_by_id_parsing() {
        assert_eq!(
            "archival_objects".parse::<FindByIdType>().unwrap(),
            FindByIdType::ArchivalObjects
        );
        assert_eq!(
            "component_id".parse::<FindByIdField>().unwrap(),
            FindByIdField::ComponentId
        );
        assert!("resources".parse::<FindByIdType>().is_err());
        assert!("title".parse::<FindByIdField>().is_err());
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(
            "ArchivesSpace".parse::<BackendKind>().unwrap(),
            BackendKind::ArchivesSpace
        );
        assert_eq!("toolkit".parse::<BackendKind>().unwrap(), BackendKind::Toolkit);
        assert!("dspace".parse::<BackendKind>().is_err());
    }
}
