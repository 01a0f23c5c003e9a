//! Archivists' Toolkit backend over its relational database.

use archway_core::{
    descendant_ids, retain_content, walk, ArchiveClient, ArchiveError, BackendKind,
    CollectionQuery, CreatedObject, DateRange, DeleteOutcome, DigitalObject,
    DigitalObjectComponent, FindByIdField, FindByIdType, FoundRecord, NewChild, Note,
    PageRequest, ParentRef, Record, RecordEdit, RecordType, Result, SortOrder, TreeOptions,
    TreeSource,
};
use archway_db::{
    note_type_name, DbConnection, DbError, IdentifierMatch, NewDigitalObject, RecordChanges,
    RecordKey, ResourceFilter, ToolkitRepository,
};
use diesel::SqliteConnection;
use serde_json::json;
use tracing::{debug, info};

/// Parses a Toolkit record id, which is always a row number.
fn parse_id(id: &str) -> Result<i64> {
    id.trim()
        .parse()
        .map_err(|_| ArchiveError::InvalidInput(format!("Invalid Archivists' Toolkit ID: {id}")))
}

fn parse_year(value: Option<&str>, field: &str) -> Result<Option<i32>> {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            ArchiveError::InvalidInput(format!("{field} must be a year, got {value}"))
        }),
        None => Ok(None),
    }
}

fn resource_filter(query: &CollectionQuery) -> ResourceFilter {
    ResourceFilter {
        search_pattern: query.search_pattern().map(str::to_string),
        identifier: query.identifier().map(IdentifierMatch::parse),
        descending: query.sort == SortOrder::Desc,
    }
}

fn record_key(conn: &mut SqliteConnection, id: &str) -> Result<RecordKey> {
    let row_id = parse_id(id)?;
    ToolkitRepository::record_key(conn, row_id)
        .map_err(DbError::from)?
        .ok_or_else(|| DbError::NotFound(format!("Record {id}")).into())
}

fn year_text(year: Option<i32>) -> Option<String> {
    year.map(|y| y.to_string())
}

/// Walks the parent-pointer hierarchy one child-listing query at a time.
struct ToolkitTree<'a> {
    conn: &'a mut SqliteConnection,
    search_pattern: Option<&'a str>,
}

impl TreeSource for ToolkitTree<'_> {
    type Node = RecordKey;

    fn node_id(&self, node: &RecordKey) -> String {
        node.id().to_string()
    }

    fn normalize(&mut self, node: &RecordKey) -> Result<Record> {
        let (mut record, dates) = match *node {
            RecordKey::Resource(id) => {
                let row = ToolkitRepository::find_resource(self.conn, id)
                    .map_err(DbError::from)?
                    .ok_or_else(|| DbError::NotFound(format!("Resource {id}")))?;
                let mut record = Record::new(id.to_string(), RecordType::Resource);
                record.identifier = row.identifier.unwrap_or_default();
                record.title = row.title.unwrap_or_default();
                record.level_of_description = row.resource_level.unwrap_or_default();
                let dates = DateRange::new(
                    year_text(row.date_begin),
                    year_text(row.date_end),
                    row.date_expression,
                );
                (record, dates)
            }
            RecordKey::Component(id) => {
                let row = ToolkitRepository::find_component(self.conn, id)
                    .map_err(DbError::from)?
                    .ok_or_else(|| DbError::NotFound(format!("Component {id}")))?;
                let mut record = Record::new(id.to_string(), RecordType::ResourceComponent);
                record.identifier = row.persistent_id.unwrap_or_default();
                record.title = row.title.unwrap_or_default();
                record.level_of_description = row.resource_level.unwrap_or_default();
                let dates = DateRange::new(
                    year_text(row.date_begin),
                    year_text(row.date_end),
                    row.date_expression,
                );
                (record, dates)
            }
        };
        record.set_dates(&dates);

        let notes = ToolkitRepository::notes(self.conn, *node).map_err(DbError::from)?;
        record.notes = retain_content(notes.into_iter().map(|row| {
            Note::new(
                note_type_name(row.notes_etc_type_id),
                row.note_content.unwrap_or_default(),
            )
        }));
        Ok(record)
    }

    fn children(&mut self, node: &RecordKey) -> Result<Vec<RecordKey>> {
        let rows = ToolkitRepository::child_components(self.conn, *node, self.search_pattern)
            .map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| RecordKey::Component(row.resource_component_id))
            .collect())
    }
}

pub struct ToolkitClient {
    db: Option<DbConnection>,
    /// Recorded as creator of inserted rows.
    user: String,
    levels: Option<Vec<String>>,
}

impl ToolkitClient {
    pub fn new(db: DbConnection, user: impl Into<String>) -> Self {
        Self {
            db: Some(db),
            user: user.into(),
            levels: None,
        }
    }

    /// Opens the database at `path`.
    pub fn open(path: &str, user: impl Into<String>) -> Result<Self> {
        let db = DbConnection::open(path)?;
        Ok(Self::new(db, user))
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.db
            .as_mut()
            .map(DbConnection::conn)
            .ok_or(ArchiveError::SessionClosed)
    }
}

impl ArchiveClient for ToolkitClient {
    fn backend(&self) -> BackendKind {
        BackendKind::Toolkit
    }

    fn edit_record(&mut self, edit: &RecordEdit) -> Result<()> {
        edit.validate()?;
        if edit.notes.is_some() {
            return Err(ArchiveError::InvalidInput(
                "Notes are not editable in the Archivists' Toolkit".into(),
            ));
        }
        let changes = RecordChanges {
            title: edit.title.as_deref(),
            level: edit.level.as_deref(),
            date_expression: edit.date_expression.as_deref(),
            date_begin: parse_year(edit.start_date.as_deref(), "start_date")?,
            date_end: parse_year(edit.end_date.as_deref(), "end_date")?,
        };
        if changes.is_empty() {
            return Err(ArchiveError::InvalidInput(
                "Archivists' Toolkit records only support editing title, level and dates".into(),
            ));
        }
        let conn = self.conn()?;
        let key = record_key(conn, &edit.id)?;
        let updated = ToolkitRepository::update_record(conn, key, &changes).map_err(DbError::from)?;
        debug!(id = %edit.id, updated, "record updated");
        Ok(())
    }

    fn get_resource_component_and_children(
        &mut self,
        id: &str,
        options: &TreeOptions,
    ) -> Result<Record> {
        options.validate()?;
        let conn = self.conn()?;
        let root = record_key(conn, id)?;
        let mut tree = ToolkitTree {
            conn,
            search_pattern: options.search_pattern.as_deref().filter(|p| !p.is_empty()),
        };
        walk(&mut tree, &root, options)
    }

    fn collection_list(&mut self, id: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let root = record_key(conn, id)?;
        descendant_ids(
            &mut ToolkitTree {
                conn,
                search_pattern: None,
            },
            &root,
        )
    }

    fn find_collection_ids(&mut self, query: &CollectionQuery) -> Result<Vec<String>> {
        let filter = resource_filter(query);
        let ids = ToolkitRepository::find_resource_ids(self.conn()?, &filter, None)
            .map_err(DbError::from)?;
        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    fn count_collections(&mut self, query: &CollectionQuery) -> Result<u64> {
        let filter = resource_filter(query);
        let count =
            ToolkitRepository::count_resources(self.conn()?, &filter).map_err(DbError::from)?;
        Ok(count.max(0) as u64)
    }

    /// One page of collections, each expanded two levels deep.
    fn find_collections(
        &mut self,
        query: &CollectionQuery,
        page: PageRequest,
    ) -> Result<Vec<Record>> {
        let filter = resource_filter(query);
        let window = (page.offset() as i64, i64::from(page.page_size));
        let ids = ToolkitRepository::find_resource_ids(self.conn()?, &filter, Some(window))
            .map_err(DbError::from)?;
        let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
        self.augment_resource_ids(&ids)
    }

    fn find_by_id(
        &mut self,
        _id_type: FindByIdType,
        _field: FindByIdField,
        _value: &str,
    ) -> Result<Vec<FoundRecord>> {
        Err(self.backend().unsupported("find_by_id"))
    }

    fn find_resource_id_for_component(&mut self, id: &str) -> Result<String> {
        let row_id = parse_id(id)?;
        let resource_id = ToolkitRepository::resource_id_for_component(self.conn()?, row_id)
            .map_err(DbError::from)?;
        Ok(resource_id.to_string())
    }

    fn find_parent_id_for_component(&mut self, id: &str) -> Result<ParentRef> {
        let row_id = parse_id(id)?;
        let conn = self.conn()?;
        let component = ToolkitRepository::find_component(conn, row_id)
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound(format!("Component {id}")))?;

        match component.parent_resource_component_id {
            Some(parent) => Ok(ParentRef {
                record_type: RecordType::ResourceComponent,
                id: parent.to_string(),
            }),
            None => {
                let resource = ToolkitRepository::resource_id_for_component(conn, row_id)
                    .map_err(DbError::from)?;
                Ok(ParentRef {
                    record_type: RecordType::Resource,
                    id: resource.to_string(),
                })
            }
        }
    }

    fn add_child(&mut self, _parent: &str, _child: &NewChild) -> Result<String> {
        Err(self.backend().unsupported("add_child"))
    }

    fn add_digital_object(
        &mut self,
        parent: &str,
        object: &DigitalObject,
    ) -> Result<CreatedObject> {
        let user = self.user.clone();
        let conn = self.conn()?;
        let key = record_key(conn, parent)?;

        let (parent_title, parent_dates) = match key {
            RecordKey::Resource(id) => {
                let row = ToolkitRepository::find_resource(conn, id).map_err(DbError::from)?;
                row.map(|r| (r.title, (r.date_expression, r.date_begin, r.date_end)))
            }
            RecordKey::Component(id) => {
                let row = ToolkitRepository::find_component(conn, id).map_err(DbError::from)?;
                row.map(|r| (r.title, (r.date_expression, r.date_begin, r.date_end)))
            }
        }
        .ok_or_else(|| DbError::NotFound(format!("Record {parent}")))?;

        let title = object
            .title
            .clone()
            .filter(|title| !title.is_empty())
            .or(parent_title.filter(|title| !title.is_empty()))
            .or_else(|| object.fallback_title())
            .unwrap_or_else(|| "Untitled".to_string());
        let (date_expression, date_begin, date_end) = if object.inherit_dates {
            parent_dates
        } else {
            (None, None, None)
        };

        let row = NewDigitalObject {
            user: &user,
            title: &title,
            identifier: &object.identifier,
            object_type: object.object_type.as_deref().unwrap_or("text"),
            uri: object.uri.as_deref(),
            use_statement: object.use_statement.as_deref().unwrap_or_default(),
            xlink_show: &object.xlink_show,
            xlink_actuate: &object.xlink_actuate,
            restricted: object.restricted,
            date_expression: date_expression.as_deref(),
            date_begin,
            date_end,
            location_of_originals: object.location_of_originals.as_deref(),
            access_conditions: object.access_conditions.as_deref(),
            use_conditions: object.use_conditions.as_deref(),
        };
        let id = ToolkitRepository::insert_digital_object(conn, key, &row).map_err(DbError::from)?;
        info!(parent, id, "created digital object");

        let body = json!({
            "id": id.to_string(),
            "title": title,
            "identifier": object.identifier,
            "uri": object.uri,
            "parent": parent,
        });
        Ok(CreatedObject {
            id: id.to_string(),
            body,
        })
    }

    fn add_digital_object_component(
        &mut self,
        _parent_object: &str,
        _parent_component: Option<&str>,
        _component: &DigitalObjectComponent,
    ) -> Result<CreatedObject> {
        Err(self.backend().unsupported("add_digital_object_component"))
    }

    fn delete_record(&mut self, _id: &str) -> Result<DeleteOutcome> {
        Err(self.backend().unsupported("delete_record"))
    }

    fn get_levels_of_description(&mut self) -> Result<Vec<String>> {
        if let Some(levels) = &self.levels {
            return Ok(levels.clone());
        }
        let levels =
            ToolkitRepository::levels_of_description(self.conn()?).map_err(DbError::from)?;
        self.levels = Some(levels.clone());
        Ok(levels)
    }

    fn close(&mut self) -> Result<()> {
        if self.db.take().is_some() {
            debug!("closed Archivists' Toolkit database");
        }
        Ok(())
    }
}
