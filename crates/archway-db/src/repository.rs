//! Queries against the Archivists' Toolkit schema.

use std::collections::BTreeSet;

use diesel::{
    dsl::{count_star, max},
    prelude::*,
    sqlite::Sqlite,
};

use crate::{
    models::{
        ComponentChanges, NewDigitalObjectRow, NewFileVersion, NewInstance, NewNoteRow, NoteRow,
        Resource, ResourceChanges, ResourceComponent, NOTE_ACCESS_CONDITIONS,
        NOTE_LOCATION_OF_ORIGINALS, NOTE_USE_CONDITIONS,
    },
    schema::{
        digital_objects, file_versions, instances, repeating_data, repositories,
        resource_components, resources,
    },
};

/// Levels a collection search is restricted to whenever a filter is given.
const COLLECTION_LEVELS: [&str; 2] = ["recordgrp", "collection"];

/// Escape character for LIKE patterns built from user text.
const LIKE_ESCAPE: char = '\\';

/// Escapes `%`, `_` and the escape character so `text` matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

/// Which table a record id lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey {
    Resource(i64),
    Component(i64),
}

impl RecordKey {
    pub fn id(&self) -> i64 {
        match self {
            Self::Resource(id) | Self::Component(id) => *id,
        }
    }
}

/// How an identifier filter matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierMatch {
    Exact(String),
    Prefix(String),
}

impl IdentifierMatch {
    /// A trailing `*` makes the identifier a prefix.
    pub fn parse(identifier: &str) -> Self {
        match identifier.strip_suffix('*') {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(identifier.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    /// Substring of the title or identifier.
    pub search_pattern: Option<String>,
    pub identifier: Option<IdentifierMatch>,
    /// Order titles Z to A.
    pub descending: bool,
}

impl ResourceFilter {
    pub fn is_filtered(&self) -> bool {
        self.search_pattern.is_some() || self.identifier.is_some()
    }
}

/// Field updates for a resource or component row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordChanges<'a> {
    pub title: Option<&'a str>,
    pub level: Option<&'a str>,
    pub date_expression: Option<&'a str>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
}

impl RecordChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.level.is_none()
            && self.date_expression.is_none()
            && self.date_begin.is_none()
            && self.date_end.is_none()
    }
}

/// A digital object to attach to a resource or component.
#[derive(Debug, Clone, Default)]
pub struct NewDigitalObject<'a> {
    pub user: &'a str,
    pub title: &'a str,
    pub identifier: &'a str,
    pub object_type: &'a str,
    pub uri: Option<&'a str>,
    pub use_statement: &'a str,
    pub xlink_show: &'a str,
    pub xlink_actuate: &'a str,
    pub restricted: bool,
    pub date_expression: Option<&'a str>,
    pub date_begin: Option<i32>,
    pub date_end: Option<i32>,
    pub location_of_originals: Option<&'a str>,
    pub access_conditions: Option<&'a str>,
    pub use_conditions: Option<&'a str>,
}

/// Repository for Archivists' Toolkit records.
pub struct ToolkitRepository;

impl ToolkitRepository {
    pub fn find_resource(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Resource>> {
        resources::table
            .find(id)
            .select(Resource::as_select())
            .first(conn)
            .optional()
    }

    pub fn find_component(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> QueryResult<Option<ResourceComponent>> {
        resource_components::table
            .find(id)
            .select(ResourceComponent::as_select())
            .first(conn)
            .optional()
    }

    /// Resolves which table holds `id`. Resources win when both do.
    pub fn record_key(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<RecordKey>> {
        let is_resource = resources::table
            .find(id)
            .select(resources::resource_id)
            .first::<i64>(conn)
            .optional()?
            .is_some();
        if is_resource {
            return Ok(Some(RecordKey::Resource(id)));
        }

        let is_component = resource_components::table
            .find(id)
            .select(resource_components::resource_component_id)
            .first::<i64>(conn)
            .optional()?
            .is_some();
        Ok(is_component.then_some(RecordKey::Component(id)))
    }

    /// Immediate components under `parent`, series-like levels first, then by title.
    pub fn child_components(
        conn: &mut SqliteConnection,
        parent: RecordKey,
        search_pattern: Option<&str>,
    ) -> QueryResult<Vec<ResourceComponent>> {
        let mut query = resource_components::table
            .select(ResourceComponent::as_select())
            .into_boxed();

        query = match parent {
            RecordKey::Resource(id) => {
                query
                    .filter(resource_components::parent_resource_component_id.is_null())
                    .filter(resource_components::resource_id.eq(id))
            }
            RecordKey::Component(id) => {
                query.filter(resource_components::parent_resource_component_id.eq(id))
            }
        };

        if let Some(pattern) = search_pattern.filter(|p| !p.is_empty()) {
            let like = contains_pattern(pattern);
            query = query.filter(
                resource_components::title
                    .like(like.clone())
                    .escape(LIKE_ESCAPE)
                    .or(resource_components::persistent_id.like(like).escape(LIKE_ESCAPE)),
            );
        }

        let mut rows = query
            .order((
                resource_components::title.asc(),
                resource_components::resource_component_id.asc(),
            ))
            .load(conn)?;
        rows.sort_by_key(ResourceComponent::level_rank);
        Ok(rows)
    }

    pub fn notes(conn: &mut SqliteConnection, key: RecordKey) -> QueryResult<Vec<NoteRow>> {
        let query = repeating_data::table
            .filter(repeating_data::descriminator.eq("note"))
            .select(NoteRow::as_select())
            .order((
                repeating_data::sequence_number.asc(),
                repeating_data::repeating_data_id.asc(),
            ))
            .into_boxed();

        let query = match key {
            RecordKey::Resource(id) => query.filter(repeating_data::resource_id.eq(id)),
            RecordKey::Component(id) => {
                query.filter(repeating_data::resource_component_id.eq(id))
            }
        };
        query.load(conn)
    }

    fn filtered_resources(filter: &ResourceFilter) -> resources::BoxedQuery<'static, Sqlite> {
        let mut query = resources::table.into_boxed();

        if let Some(pattern) = &filter.search_pattern {
            let like = contains_pattern(pattern);
            query = query.filter(
                resources::title
                    .like(like.clone())
                    .escape(LIKE_ESCAPE)
                    .or(resources::identifier.like(like).escape(LIKE_ESCAPE)),
            );
        }

        match &filter.identifier {
            Some(IdentifierMatch::Exact(identifier)) => {
                query = query.filter(resources::identifier.eq(identifier.clone()));
            }
            Some(IdentifierMatch::Prefix(prefix)) => {
                query = query.filter(
                    resources::identifier
                        .like(format!("{}%", escape_like(prefix)))
                        .escape(LIKE_ESCAPE),
                );
            }
            None => {}
        }

        if filter.is_filtered() {
            query = query.filter(resources::resource_level.eq_any(COLLECTION_LEVELS));
        }

        query
    }

    /// Matching resource ids ordered by title; `page` is `(offset, limit)`.
    pub fn find_resource_ids(
        conn: &mut SqliteConnection,
        filter: &ResourceFilter,
        page: Option<(i64, i64)>,
    ) -> QueryResult<Vec<i64>> {
        let query = Self::filtered_resources(filter).select(resources::resource_id);
        let mut query = if filter.descending {
            query.order((resources::title.desc(), resources::resource_id.desc()))
        } else {
            query.order((resources::title.asc(), resources::resource_id.asc()))
        };

        if let Some((offset, limit)) = page {
            query = query.offset(offset).limit(limit);
        }

        query.load(conn)
    }

    pub fn count_resources(conn: &mut SqliteConnection, filter: &ResourceFilter) -> QueryResult<i64> {
        Self::filtered_resources(filter)
            .select(count_star())
            .first(conn)
    }

    /// Follows parent pointers until a component that names its resource.
    pub fn resource_id_for_component(conn: &mut SqliteConnection, id: i64) -> QueryResult<i64> {
        let mut current = id;
        let mut visited = BTreeSet::new();
        while visited.insert(current) {
            let (resource_id, parent_id) = resource_components::table
                .find(current)
                .select((
                    resource_components::resource_id,
                    resource_components::parent_resource_component_id,
                ))
                .first::<(Option<i64>, Option<i64>)>(conn)?;

            match (resource_id, parent_id) {
                (Some(resource_id), _) => return Ok(resource_id),
                (None, Some(parent_id)) => current = parent_id,
                (None, None) => break,
            }
        }
        Err(diesel::result::Error::NotFound)
    }

    pub fn update_record(
        conn: &mut SqliteConnection,
        key: RecordKey,
        changes: &RecordChanges,
    ) -> QueryResult<usize> {
        match key {
            RecordKey::Resource(id) => {
                let changeset = ResourceChanges {
                    title: changes.title,
                    resource_level: changes.level,
                    date_expression: changes.date_expression,
                    date_begin: changes.date_begin,
                    date_end: changes.date_end,
                };
                diesel::update(resources::table.find(id))
                    .set(&changeset)
                    .execute(conn)
            }
            RecordKey::Component(id) => {
                let changeset = ComponentChanges {
                    title: changes.title,
                    resource_level: changes.level,
                    date_expression: changes.date_expression,
                    date_begin: changes.date_begin,
                    date_end: changes.date_end,
                };
                diesel::update(resource_components::table.find(id))
                    .set(&changeset)
                    .execute(conn)
            }
        }
    }

    /// Distinct levels used by resources and components, sorted.
    pub fn levels_of_description(conn: &mut SqliteConnection) -> QueryResult<Vec<String>> {
        let mut levels: BTreeSet<String> = resources::table
            .select(resources::resource_level)
            .distinct()
            .load::<Option<String>>(conn)?
            .into_iter()
            .flatten()
            .collect();

        levels.extend(
            resource_components::table
                .select(resource_components::resource_level)
                .distinct()
                .load::<Option<String>>(conn)?
                .into_iter()
                .flatten(),
        );

        Ok(levels.into_iter().filter(|l| !l.is_empty()).collect())
    }

    /// Creates a digital object instance under `parent` with its file version
    /// and notes, returning the new digital object id.
    pub fn insert_digital_object(
        conn: &mut SqliteConnection,
        parent: RecordKey,
        object: &NewDigitalObject,
    ) -> QueryResult<i64> {
        conn.transaction(|conn| {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

            let instance_id = instances::table
                .select(max(instances::instance_id))
                .first::<Option<i64>>(conn)?
                .unwrap_or(0)
                + 1;
            let repository_id = repositories::table
                .select(repositories::repository_id)
                .first::<i64>(conn)?;

            let (resource_id, resource_component_id) = match parent {
                RecordKey::Resource(id) => (Some(id), None),
                RecordKey::Component(id) => (None, Some(id)),
            };
            diesel::insert_into(instances::table)
                .values(NewInstance {
                    instance_id,
                    instance_descriminator: "digital",
                    instance_type: "Digital object",
                    resource_id,
                    resource_component_id,
                })
                .execute(conn)?;

            let digital_object_id = diesel::insert_into(digital_objects::table)
                .values(NewDigitalObjectRow {
                    version: 1,
                    last_updated: &now,
                    created: &now,
                    last_updated_by: object.user,
                    created_by: object.user,
                    title: object.title,
                    date_expression: object.date_expression,
                    date_begin: object.date_begin,
                    date_end: object.date_end,
                    language_code: "English",
                    restrictions_apply: object.restricted,
                    ead_dao_actuate: object.xlink_actuate,
                    ead_dao_show: object.xlink_show,
                    mets_identifier: object.identifier,
                    object_type: object.object_type,
                    label: " ",
                    object_order: 0,
                    instance_id,
                    repository_id,
                })
                .returning(digital_objects::digital_object_id)
                .get_result::<i64>(conn)?;

            if let Some(uri) = object.uri {
                let file_version_id = file_versions::table
                    .select(max(file_versions::file_version_id))
                    .first::<Option<i64>>(conn)?
                    .unwrap_or(0)
                    + 1;
                diesel::insert_into(file_versions::table)
                    .values(NewFileVersion {
                        file_version_id,
                        version: 1,
                        last_updated: &now,
                        created: &now,
                        last_updated_by: object.user,
                        created_by: object.user,
                        uri,
                        use_statement: object.use_statement,
                        sequence_number: 0,
                        ead_dao_actuate: object.xlink_actuate,
                        ead_dao_show: object.xlink_show,
                        digital_object_id,
                    })
                    .execute(conn)?;
            }

            let notes = [
                (object.location_of_originals, NOTE_LOCATION_OF_ORIGINALS),
                (object.access_conditions, NOTE_ACCESS_CONDITIONS),
                (object.use_conditions, NOTE_USE_CONDITIONS),
            ];
            let mut next_note_id = repeating_data::table
                .select(max(repeating_data::repeating_data_id))
                .first::<Option<i64>>(conn)?
                .unwrap_or(0)
                + 1;
            let mut sequence_number = 0;
            for (content, type_id) in notes {
                let Some(content) = content else {
                    continue;
                };
                diesel::insert_into(repeating_data::table)
                    .values(NewNoteRow {
                        repeating_data_id: next_note_id,
                        descriminator: "note",
                        version: 0,
                        last_updated: &now,
                        created: &now,
                        last_updated_by: object.user,
                        created_by: object.user,
                        repeating_data_type: "Note",
                        title: "",
                        sequence_number,
                        digital_object_id: Some(digital_object_id),
                        note_content: Some(content),
                        notes_etc_type_id: Some(type_id),
                    })
                    .execute(conn)?;
                next_note_id += 1;
                sequence_number += 1;
            }

            Ok(digital_object_id)
        })
    }
}
