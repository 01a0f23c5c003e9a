//! AtoM backend over its REST API.

use std::collections::HashSet;

use archway_core::{
    descendant_ids, escape_query, retain_content, walk, ArchiveClient, ArchiveError, BackendKind,
    Children, CollectionQuery, CreatedObject, DateRange, DeleteOutcome, DigitalObject,
    DigitalObjectComponent, EscapeLevel, FindByIdField, FindByIdType, FoundRecord, NewChild, Note,
    PageRequest, ParentRef, Record, RecordEdit, RecordType, Result, SortOrder, TreeOptions,
    TreeSource,
};
use archway_http::{join_url, ApiSession, Transport};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::json;

pub const API_KEY_HEADER: &str = "REST-API-Key";

/// Taxonomy holding the levels of description.
const LEVELS_TAXONOMY: &str = "taxonomies/34";

/// Page size used when aggregating search results.
const SEARCH_PAGE_SIZE: u32 = 50;

/// Note fields of an information object and the type each maps to.
const NOTE_FIELDS: &[(&str, &str)] = &[
    ("notes", "general"),
    ("language_and_script_notes", "language_and_script"),
    ("publication_notes", "publication_notes"),
    (
        "physical_characteristics_and_technical_requirements",
        "physical_condition",
    ),
];

/// Notes of an information object. Each field may hold a string, a list of
/// strings or a list of `{type, content}` objects.
pub fn format_notes(record: &Value) -> Vec<Note> {
    let mut notes = Vec::new();
    for (field, note_type) in NOTE_FIELDS {
        match record.get(*field) {
            Some(Value::String(content)) => notes.push(Note::new(*note_type, content.as_str())),
            Some(Value::Array(entries)) => {
                notes.extend(entries.iter().filter_map(|entry| match entry {
                    Value::String(content) => Some(Note::new(*note_type, content.as_str())),
                    Value::Object(_) => Some(Note::new(
                        json::text(entry, "type").unwrap_or_else(|| note_type.to_string()),
                        json::text_or_empty(entry, "content"),
                    )),
                    _ => None,
                }));
            }
            _ => {}
        }
    }
    retain_content(notes)
}

fn dates_of(record: &Value) -> DateRange {
    json::first_date(record, "start_date", "end_date", "date")
}

/// AtoM's date shape: `{start_date?, end_date?, date?}`, or `None` when every field is empty.
fn date_entry(begin: Option<&str>, end: Option<&str>, expression: Option<&str>) -> Option<Value> {
    let mut date = Map::new();
    for (key, value) in [("start_date", begin), ("end_date", end), ("date", expression)] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            date.insert(key.into(), json!(value));
        }
    }
    (!date.is_empty()).then_some(Value::Object(date))
}

/// Search parameters for `informationobjects`.
pub fn search_params(
    query: &CollectionQuery,
    page: u32,
    page_size: u32,
    sort: Option<SortOrder>,
) -> Vec<(String, String)> {
    let skip = u64::from(page.max(1) - 1) * u64::from(page_size);
    let mut params = vec![
        ("limit".to_string(), page_size.to_string()),
        ("skip".to_string(), skip.to_string()),
        ("topLod".to_string(), "1".to_string()),
        ("sf0".to_string(), "_all".to_string()),
    ];
    let pattern = query
        .search_pattern()
        .map(|pattern| format!("\"{}\"", escape_query(pattern, EscapeLevel::Single)))
        .unwrap_or_default();
    params.push(("sq0".to_string(), pattern));

    if let Some(identifier) = query.identifier() {
        params.push(("sf1".to_string(), "identifier".to_string()));
        params.push((
            "sq1".to_string(),
            escape_query(identifier, EscapeLevel::Single),
        ));
    }
    if let Some(order) = sort {
        params.push(("sort".to_string(), "alphabetic".to_string()));
        if order == SortOrder::Desc {
            params.push(("reverse".to_string(), "true".to_string()));
        }
    }
    params
}

/// Walks the nested payload of `informationobjects/tree/{slug}`; each node's
/// own fields come from its full information object.
struct AtomTree<'a> {
    session: &'a ApiSession,
}

impl TreeSource for AtomTree<'_> {
    type Node = Value;

    fn node_id(&self, node: &Value) -> String {
        json::text_or_empty(node, "slug")
    }

    fn normalize(&mut self, node: &Value) -> Result<Record> {
        let slug = json::required_str(node, "slug")?;
        let full_record = information_object(self.session, &slug)?;

        let record_type = if full_record.get("parent").is_some() {
            RecordType::ResourceComponent
        } else {
            RecordType::Resource
        };
        let mut record = Record::new(slug, record_type);
        record.identifier = json::text(node, "identifier")
            .or_else(|| json::text(&full_record, "reference_code"))
            .unwrap_or_default();
        record.title = json::text(node, "title")
            .or_else(|| json::text(&full_record, "title"))
            .unwrap_or_default();
        record.display_title = Some(record.title.clone());
        record.level_of_description = json::text(node, "level")
            .or_else(|| json::text(&full_record, "level_of_description"))
            .unwrap_or_default();
        record.set_dates(&dates_of(&full_record));
        record.notes = format_notes(&full_record);
        Ok(record)
    }

    fn children(&mut self, node: &Value) -> Result<Vec<Value>> {
        Ok(json::array(node, "children").to_vec())
    }
}

fn information_object(session: &ApiSession, slug: &str) -> Result<Value> {
    session.get(&format!("informationobjects/{slug}"), &[])
}

pub struct AtomClient {
    session: Option<ApiSession>,
    levels: Option<Vec<String>>,
}

impl AtomClient {
    /// A client for the AtoM site at `url`; its API lives under `api/`.
    pub fn new(url: &str, api_key: &str, transport: Box<dyn Transport>) -> Result<Self> {
        let base = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        let api_url = join_url(&base, "api/")?;
        let mut session = ApiSession::new("AtoM", api_url, transport);
        session.set_header(API_KEY_HEADER, api_key);
        debug!(url = %session.base_url(), "created AtoM session");

        Ok(Self {
            session: Some(session),
            levels: None,
        })
    }

    fn session(&self) -> Result<&ApiSession> {
        self.session.as_ref().ok_or(ArchiveError::SessionClosed)
    }

    fn tree(&self, slug: &str) -> Result<Value> {
        self.session()?
            .get(&format!("informationobjects/tree/{slug}"), &[])
    }

    fn search(
        &self,
        query: &CollectionQuery,
        page: u32,
        page_size: u32,
        sort: Option<SortOrder>,
    ) -> Result<Value> {
        let params = search_params(query, page, page_size, sort);
        let params: Vec<(&str, &str)> = params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        self.session()?.get("informationobjects", &params)
    }

    fn collection_summary(&self, result: &Value) -> Result<Record> {
        let slug = json::required_str(result, "slug")?;
        let full_record = information_object(self.session()?, &slug)?;
        let tree = self.tree(&slug)?;

        let mut record = Record::new(slug, RecordType::Resource);
        record.identifier = json::text_or_empty(result, "reference_code");
        record.title = json::text_or_empty(result, "title");
        record.level_of_description = json::text_or_empty(result, "level_of_description");
        record.set_dates(&dates_of(&full_record));
        record.notes = format_notes(&full_record);
        if !json::array(&tree, "children").is_empty() {
            record.children = Children::Withheld;
        }
        Ok(record)
    }
}

impl ArchiveClient for AtomClient {
    fn backend(&self) -> BackendKind {
        BackendKind::Atom
    }

    fn edit_record(&mut self, edit: &RecordEdit) -> Result<()> {
        edit.validate()?;
        let session = self.session()?;
        let mut native = information_object(session, &edit.id)?;
        let fields = json::object_mut(&mut native, "the information object")?;

        if let Some(title) = &edit.title {
            fields.insert("title".into(), json!(title));
        }
        if let Some(level) = &edit.level {
            fields.insert("levelOfDescription".into(), json!(level));
        }
        if let Some(notes) = &edit.notes {
            let notes: Vec<Value> = notes
                .iter()
                .filter(|note| note.has_content())
                .map(|note| json!({ "type": note.note_type, "content": note.content }))
                .collect();
            fields.insert("notes".into(), Value::Array(notes));
        }
        if let Some(date) = date_entry(
            edit.start_date.as_deref(),
            edit.end_date.as_deref(),
            edit.date_expression.as_deref(),
        ) {
            fields.insert("dates".into(), json!([date]));
        }

        session.put_json(&format!("informationobjects/{}", edit.id), &native, 200)?;
        debug!(slug = %edit.id, "information object updated");
        Ok(())
    }

    fn get_resource_component_and_children(
        &mut self,
        id: &str,
        options: &TreeOptions,
    ) -> Result<Record> {
        options.validate()?;
        let tree = self.tree(id)?;
        walk(&mut AtomTree { session: self.session()? }, &tree, options)
    }

    fn collection_list(&mut self, id: &str) -> Result<Vec<String>> {
        let tree = self.tree(id)?;
        descendant_ids(&mut AtomTree { session: self.session()? }, &tree)
    }

    fn find_collection_ids(&mut self, query: &CollectionQuery) -> Result<Vec<String>> {
        let mut slugs = Vec::new();
        let mut page = 1;
        loop {
            let response = self.search(query, page, SEARCH_PAGE_SIZE, None)?;
            let results = json::array(&response, "results");
            if results.is_empty() {
                break;
            }
            slugs.extend(results.iter().filter_map(|r| json::text(r, "slug")));

            let total = response.get("total").and_then(Value::as_u64).unwrap_or(0);
            if slugs.len() as u64 >= total {
                break;
            }
            page += 1;
        }
        Ok(slugs)
    }

    fn count_collections(&mut self, query: &CollectionQuery) -> Result<u64> {
        let response = self.search(query, 1, SEARCH_PAGE_SIZE, None)?;
        Ok(response.get("total").and_then(Value::as_u64).unwrap_or(0))
    }

    fn find_collections(
        &mut self,
        query: &CollectionQuery,
        page: PageRequest,
    ) -> Result<Vec<Record>> {
        let response = self.search(query, page.page, page.page_size, Some(query.sort))?;
        json::array(&response, "results")
            .iter()
            .map(|result| self.collection_summary(result))
            .collect()
    }

    fn find_by_id(
        &mut self,
        _id_type: FindByIdType,
        _field: FindByIdField,
        _value: &str,
    ) -> Result<Vec<FoundRecord>> {
        Err(self.backend().unsupported("find_by_id"))
    }

    /// Climbs `parent` links to the top-level description.
    fn find_resource_id_for_component(&mut self, id: &str) -> Result<String> {
        let session = self.session()?;
        let mut current = id.to_string();
        let mut visited = HashSet::new();
        while visited.insert(current.clone()) {
            let native = information_object(session, &current)?;
            match json::text(&native, "parent") {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
        Err(ArchiveError::Backend(format!(
            "Parent links of {id} form a cycle"
        )))
    }

    fn find_parent_id_for_component(&mut self, id: &str) -> Result<ParentRef> {
        let session = self.session()?;
        let native = information_object(session, id)?;
        let Some(parent) = json::text(&native, "parent") else {
            return Ok(ParentRef {
                record_type: RecordType::Resource,
                id: id.to_string(),
            });
        };

        let parent_record = information_object(session, &parent)?;
        let record_type = if parent_record.get("parent").is_some() {
            RecordType::ResourceComponent
        } else {
            RecordType::Resource
        };
        Ok(ParentRef {
            record_type,
            id: parent,
        })
    }

    fn add_child(&mut self, parent: &str, child: &NewChild) -> Result<String> {
        let notes: Vec<Value> = child
            .notes("General note")
            .into_iter()
            .map(|note| json!({ "content": note.content, "type": note.note_type }))
            .collect();
        let mut body = json!({
            "title": child.title,
            "level_of_description": child.level,
            "parent_slug": parent,
            "notes": notes,
        });
        if let Some(date) = date_entry(
            child.start_date.as_deref(),
            child.end_date.as_deref(),
            child.date_expression.as_deref(),
        ) {
            json::object_mut(&mut body, "the new information object")?
                .insert("dates".into(), json!([date]));
        }

        let response = self.session()?.post_json("informationobjects", &body, 201)?;
        let slug = json::required_str(&response, "slug")?;
        info!(parent, slug = %slug, "created information object");
        Ok(slug)
    }

    fn add_digital_object(
        &mut self,
        parent: &str,
        object: &DigitalObject,
    ) -> Result<CreatedObject> {
        let mut body = Map::new();
        body.insert("information_object_slug".into(), json!(parent));
        let name = object
            .title
            .clone()
            .or_else(|| object.fallback_title())
            .unwrap_or_else(|| object.identifier.clone());
        body.insert("name".into(), json!(name));

        let optional = [
            ("uri", object.uri.as_deref()),
            ("media_type", object.object_type.as_deref()),
            ("usage", object.usage.as_deref()),
            ("file_uuid", object.file_uuid.as_deref()),
            ("aip_uuid", object.aip_uuid.as_deref()),
            ("aip_name", object.aip_name.as_deref()),
            ("relative_path_within_aip", object.relative_path_within_aip.as_deref()),
            ("format_name", object.format_name.as_deref()),
            ("format_version", object.format_version.as_deref()),
            ("format_registry_key", object.format_registry_key.as_deref()),
            ("format_registry_name", object.format_registry_name.as_deref()),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                body.insert(key.into(), json!(value));
            }
        }
        if let Some(size) = object.size {
            body.insert("byte_size".into(), json!(size));
        }

        let mut body = Value::Object(body);
        let response = self.session()?.post_json("digitalobjects", &body, 201)?;
        let slug = json::required_str(&response, "slug")?;
        info!(parent, slug = %slug, "created digital object");

        if let Some(fields) = body.as_object_mut() {
            fields.insert("slug".into(), json!(slug));
        }
        Ok(CreatedObject { id: slug, body })
    }

    fn add_digital_object_component(
        &mut self,
        _parent_object: &str,
        _parent_component: Option<&str>,
        _component: &DigitalObjectComponent,
    ) -> Result<CreatedObject> {
        Err(self.backend().unsupported("add_digital_object_component"))
    }

    fn delete_record(&mut self, id: &str) -> Result<DeleteOutcome> {
        self.session()?
            .delete(&format!("informationobjects/{id}"), 204)?;
        info!(slug = id, "deleted information object");
        Ok(DeleteOutcome {
            status: "Deleted".to_string(),
            id: None,
        })
    }

    fn get_levels_of_description(&mut self) -> Result<Vec<String>> {
        if let Some(levels) = &self.levels {
            return Ok(levels.clone());
        }
        let response = self.session()?.get(LEVELS_TAXONOMY, &[])?;
        let levels: Vec<String> = response
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|term| json::text(term, "name"))
            .collect();
        self.levels = Some(levels.clone());
        Ok(levels)
    }

    fn close(&mut self) -> Result<()> {
        if self.session.take().is_some() {
            debug!("closed AtoM session");
        }
        Ok(())
    }
}
