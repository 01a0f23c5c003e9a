use diesel::prelude::*;

use crate::schema::{
    digital_objects, file_versions, instances, repeating_data, resource_components, resources,
};

/// Note type ids of `ArchDescriptionRepeatingData.notesEtcTypeId`.
pub const NOTE_ACCESS_CONDITIONS: i32 = 8;
pub const NOTE_USE_CONDITIONS: i32 = 9;
pub const NOTE_LOCATION_OF_ORIGINALS: i32 = 13;

/// Maps a Toolkit note type id to its EAD note type.
pub fn note_type_name(type_id: Option<i32>) -> &'static str {
    match type_id {
        Some(NOTE_ACCESS_CONDITIONS) => "accessrestrict",
        Some(NOTE_USE_CONDITIONS) => "userestrict",
        Some(NOTE_LOCATION_OF_ORIGINALS) => "originalsloc",
        _ => "odd",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = resources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Resource {
    pub resource_id: i64,
    pub title: Option<String>,
    pub date_expression: Option<String>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
    pub identifier: Option<String>,
    pub resource_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = resource_components)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResourceComponent {
    pub resource_component_id: i64,
    pub resource_id: Option<i64>,
    pub parent_resource_component_id: Option<i64>,
    pub title: Option<String>,
    pub date_expression: Option<String>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
    pub persistent_id: Option<String>,
    pub resource_level: Option<String>,
}

impl ResourceComponent {
    /// Rank used to list series-like children before files.
    /// Unlisted levels come first, then `subseries`, then `file`.
    pub fn level_rank(&self) -> u8 {
        match self.resource_level.as_deref() {
            Some("subseries") => 1,
            Some("file") => 2,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = repeating_data)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NoteRow {
    pub repeating_data_id: i64,
    pub sequence_number: i32,
    pub note_content: Option<String>,
    pub notes_etc_type_id: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = resources)]
pub struct ResourceChanges<'a> {
    pub title: Option<&'a str>,
    pub resource_level: Option<&'a str>,
    pub date_expression: Option<&'a str>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = resource_components)]
pub struct ComponentChanges<'a> {
    pub title: Option<&'a str>,
    pub resource_level: Option<&'a str>,
    pub date_expression: Option<&'a str>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = instances)]
pub struct NewInstance<'a> {
    pub instance_id: i64,
    pub instance_descriminator: &'a str,
    pub instance_type: &'a str,
    pub resource_id: Option<i64>,
    pub resource_component_id: Option<i64>,
}

#[derive(Insertable)]
#[diesel(table_name = digital_objects)]
pub struct NewDigitalObjectRow<'a> {
    pub version: i32,
    pub last_updated: &'a str,
    pub created: &'a str,
    pub last_updated_by: &'a str,
    pub created_by: &'a str,
    pub title: &'a str,
    pub date_expression: Option<&'a str>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
    pub language_code: &'a str,
    pub restrictions_apply: bool,
    pub ead_dao_actuate: &'a str,
    pub ead_dao_show: &'a str,
    pub mets_identifier: &'a str,
    pub object_type: &'a str,
    pub label: &'a str,
    pub object_order: i32,
    pub instance_id: i64,
    pub repository_id: i64,
}

#[derive(Insertable)]
#[diesel(table_name = file_versions)]
pub struct NewFileVersion<'a> {
    pub file_version_id: i64,
    pub version: i32,
    pub last_updated: &'a str,
    pub created: &'a str,
    pub last_updated_by: &'a str,
    pub created_by: &'a str,
    pub uri: &'a str,
    pub use_statement: &'a str,
    pub sequence_number: i32,
    pub ead_dao_actuate: &'a str,
    pub ead_dao_show: &'a str,
    pub digital_object_id: i64,
}

#[derive(Insertable)]
#[diesel(table_name = repeating_data)]
pub struct NewNoteRow<'a> {
    pub repeating_data_id: i64,
    pub descriminator: &'a str,
    pub version: i32,
    pub last_updated: &'a str,
    pub created: &'a str,
    pub last_updated_by: &'a str,
    pub created_by: &'a str,
    pub repeating_data_type: &'a str,
    pub title: &'a str,
    pub sequence_number: i32,
    pub digital_object_id: Option<i64>,
    pub note_content: Option<&'a str>,
    pub notes_etc_type_id: Option<i32>,
}
