//! ArchivesSpace backend over its REST API.

use std::sync::LazyLock;

use archway_core::{
    descendant_ids, escape_query, retain_content, walk, ArchiveClient, ArchiveError, BackendKind,
    Children, CollectionQuery, CreatedObject, DateRange, DeleteOutcome, DigitalObject,
    DigitalObjectComponent, EscapeLevel, FindByIdField, FindByIdType, FoundRecord, NewChild, Note,
    PageRequest, ParentRef, Record, RecordEdit, RecordType, Result, SortOrder, TreeOptions,
    TreeSource,
};
use archway_http::{session::error_message, ApiSession, Method, Payload, Transport};
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::json;

pub const SESSION_HEADER: &str = "X-ArchivesSpace-Session";

/// Enumeration holding the levels of description.
const LEVELS_ENUMERATION: &str = "/config/enumerations/32";

/// Note types a digital object note may carry; others inherit as `note`.
const DIGITAL_OBJECT_NOTE_TYPES: &[&str] = &[
    "summary",
    "bioghist",
    "accessrestrict",
    "userestrict",
    "custodhist",
    "dimensions",
    "edition",
    "extent",
    "altformavail",
    "originalsloc",
    "note",
    "acqinfo",
    "inscription",
    "langmaterial",
    "legalstatus",
    "physdesc",
    "prefercite",
    "processinfo",
    "relatedmaterial",
];

static RECORD_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"repositories/\d+/(resources|archival_objects)/\d+")
        .expect("unable to compile record URI regex")
});

/// Resource or component, from the shape of a record URI.
pub fn record_type(id: &str) -> Result<RecordType> {
    let kind = RECORD_URI
        .captures(id)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str());
    match kind {
        Some("resources") => Ok(RecordType::Resource),
        Some(_) => Ok(RecordType::ResourceComponent),
        None => Err(ArchiveError::InvalidInput(format!(
            "Unable to determine type of provided ID: {id}"
        ))),
    }
}

/// Notes carrying a `type`, collapsed to their first content block.
pub fn format_notes(record: &Value) -> Vec<Note> {
    retain_content(json::array(record, "notes").iter().filter_map(|note| {
        let note_type = note.get("type")?.as_str().filter(|t| !t.is_empty())?;
        Some(Note::new(note_type, note_content(note).unwrap_or_default()))
    }))
}

fn note_content(note: &Value) -> Option<String> {
    let content = if note.get("jsonmodel_type").and_then(Value::as_str) == Some("note_singlepart") {
        note.get("content")?.get(0)?
    } else {
        note.get("subnotes")?.get(0)?.get("content")?
    };
    content.as_str().map(str::to_string)
}

fn multipart_note(note: &Note) -> Value {
    json!({
        "jsonmodel_type": "note_multipart",
        "publish": true,
        "subnotes": [{
            "content": note.content,
            "jsonmodel_type": "note_text",
            "publish": true,
        }],
        "type": note.note_type,
    })
}

fn date_entry(begin: Option<&str>, end: Option<&str>, expression: Option<&str>) -> Value {
    let mut date = Map::new();
    date.insert("jsonmodel_type".into(), json!("date"));
    date.insert("date_type".into(), json!("inclusive"));
    date.insert("label".into(), json!("creation"));
    if let Some(expression) = expression {
        date.insert("expression".into(), json!(expression));
    }
    if let Some(begin) = begin {
        date.insert("begin".into(), json!(begin));
    }
    if let Some(end) = end {
        date.insert("end".into(), json!(end));
    }
    Value::Object(date)
}

fn dates_of(record: &Value) -> DateRange {
    json::first_date(record, "begin", "end", "expression")
}

/// Resources carry `id_0`; components carry `component_id`.
fn identifier_of(record: &Value) -> String {
    json::text(record, "id_0")
        .or_else(|| json::text(record, "component_id"))
        .unwrap_or_default()
}

/// The Solr query for a collection search.
///
/// Titles take a doubled escape, identifiers a single one.
pub fn search_query(query: &CollectionQuery) -> String {
    let mut q = String::from("primary_type:resource");
    if let Some(pattern) = query.search_pattern() {
        q.push_str(" AND title:");
        q.push_str(&escape_query(pattern, EscapeLevel::Double));
    }
    if let Some(identifier) = query.identifier() {
        q.push_str(" AND identifier:");
        q.push_str(&escape_query(identifier, EscapeLevel::Single));
    }
    q
}

/// Walks a resource through the payload of its `/tree` endpoint, reading
/// each node's full record from its `record_uri`.
struct ResourceTree<'a> {
    session: &'a ApiSession,
}

impl TreeSource for ResourceTree<'_> {
    type Node = Value;

    fn node_id(&self, node: &Value) -> String {
        json::text_or_empty(node, "record_uri")
    }

    fn normalize(&mut self, node: &Value) -> Result<Record> {
        let uri = json::required_str(node, "record_uri")?;
        let full_record = self.session.get(&uri, &[])?;

        let mut record = Record::new(uri.as_str(), record_type(&uri)?);
        record.identifier = identifier_of(&full_record);
        record.title = json::text_or_empty(&full_record, "title");
        record.display_title = json::text(&full_record, "display_string");
        record.level_of_description = json::text(node, "level")
            .or_else(|| json::text(&full_record, "level"))
            .unwrap_or_default();
        record.set_dates(&dates_of(&full_record));
        record.notes = format_notes(&full_record);
        Ok(record)
    }

    fn children(&mut self, node: &Value) -> Result<Vec<Value>> {
        Ok(json::array(node, "children").to_vec())
    }
}

/// Walks archival objects through their `/children` listings.
struct ComponentTree<'a> {
    session: &'a ApiSession,
}

impl TreeSource for ComponentTree<'_> {
    type Node = Value;

    fn node_id(&self, node: &Value) -> String {
        json::text_or_empty(node, "uri")
    }

    fn normalize(&mut self, node: &Value) -> Result<Record> {
        let uri = json::required_str(node, "uri")?;
        let mut record = Record::new(uri, RecordType::ResourceComponent);
        record.identifier = json::text_or_empty(node, "component_id");
        record.title = json::text_or_empty(node, "title");
        record.display_title = Some(json::text_or_empty(node, "display_string"));
        record.level_of_description = json::text_or_empty(node, "level");
        record.set_dates(&dates_of(node));
        record.notes = format_notes(node);
        Ok(record)
    }

    fn children(&mut self, node: &Value) -> Result<Vec<Value>> {
        let uri = json::required_str(node, "uri")?;
        match self.session.get(&format!("{uri}/children"), &[])? {
            Value::Array(children) => Ok(children),
            _ => Ok(Vec::new()),
        }
    }
}

pub struct ArchivesSpaceClient {
    session: Option<ApiSession>,
    /// `/repositories/{n}`
    repository: String,
    levels: Option<Vec<String>>,
}

impl ArchivesSpaceClient {
    /// Logs in as `user` and keeps the session token for every later call.
    pub fn login(
        base_url: &str,
        user: &str,
        password: &str,
        repository: u32,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let mut session = ApiSession::new("ArchivesSpace", base_url, transport);

        let mut request = session.request(Method::Post, &format!("/users/{user}/login"));
        request.payload = Some(Payload::Form(vec![
            ("password".into(), password.into()),
            ("expiring".into(), "false".into()),
        ]));
        let response = session.execute(&request)?;
        let body = session.decode(&response)?;

        if let Some(message) = body.get("error") {
            return Err(ArchiveError::Authentication(error_message(message)));
        }
        let token = body
            .get("session")
            .and_then(Value::as_str)
            .ok_or_else(|| ArchiveError::Authentication("No session token returned".into()))?;
        session.set_header(SESSION_HEADER, token);
        info!(user, url = %session.base_url(), "logged in to ArchivesSpace");

        Ok(Self {
            session: Some(session),
            repository: format!("/repositories/{repository}"),
            levels: None,
        })
    }

    fn session(&self) -> Result<&ApiSession> {
        self.session.as_ref().ok_or(ArchiveError::SessionClosed)
    }

    fn search(
        &self,
        query: &CollectionQuery,
        page: u32,
        page_size: Option<u32>,
        sort: Option<SortOrder>,
    ) -> Result<Value> {
        let page = page.to_string();
        let q = search_query(query);
        let page_size = page_size.map(|size| size.to_string());
        let sort = sort.map(|order| format!("title_sort {}", order.as_str()));

        let mut params = vec![("page", page.as_str()), ("q", q.as_str())];
        if let Some(page_size) = &page_size {
            params.push(("page_size", page_size.as_str()));
        }
        if let Some(sort) = &sort {
            params.push(("sort", sort.as_str()));
        }
        debug!(q = %q, page = %page, "searching collections");
        self.session()?
            .get(&format!("{}/search", self.repository), &params)
    }

    fn collection_summary(&self, result: &Value) -> Result<Record> {
        let native = match result.get("json") {
            Some(Value::String(document)) => serde_json::from_str(document)?,
            Some(document) => document.clone(),
            None => result.clone(),
        };
        let uri = json::required_str(&native, "uri")?;
        let tree = self
            .session()?
            .get(&format!("{uri}/tree"), &[("page", "1")])?;

        let mut record = Record::new(uri, RecordType::Resource);
        record.identifier = identifier_of(&native);
        record.title = json::text_or_empty(&native, "title");
        record.level_of_description = json::text_or_empty(&native, "level");
        record.set_dates(&dates_of(&native));
        record.notes = format_notes(&native);
        if !json::array(&tree, "children").is_empty() {
            record.children = Children::Withheld;
        }
        Ok(record)
    }
}

impl ArchiveClient for ArchivesSpaceClient {
    fn backend(&self) -> BackendKind {
        BackendKind::ArchivesSpace
    }

    fn edit_record(&mut self, edit: &RecordEdit) -> Result<()> {
        edit.validate()?;
        let session = self.session()?;
        let mut native = session.get(&edit.id, &[])?;
        let fields = json::object_mut(&mut native, "the record")?;

        if let Some(title) = &edit.title {
            fields.insert("title".into(), json!(title));
        }
        if let Some(level) = &edit.level {
            fields.insert("level".into(), json!(level));
        }
        if let Some(notes) = &edit.notes {
            let notes: Vec<Value> = notes
                .iter()
                .filter(|note| note.has_content())
                .map(multipart_note)
                .collect();
            fields.insert("notes".into(), Value::Array(notes));
        }
        if edit.has_dates() {
            let date = date_entry(
                edit.start_date.as_deref(),
                edit.end_date.as_deref(),
                edit.date_expression.as_deref(),
            );
            match fields.get_mut("dates").and_then(Value::as_array_mut) {
                Some(dates) if !dates.is_empty() => dates[0] = date,
                _ => {
                    fields.insert("dates".into(), json!([date]));
                }
            }
        }

        session.post_json(&edit.id, &native, 200)?;
        debug!(id = %edit.id, "record updated");
        Ok(())
    }

    fn get_resource_component_and_children(
        &mut self,
        id: &str,
        options: &TreeOptions,
    ) -> Result<Record> {
        options.validate()?;
        let session = self.session()?;
        match record_type(id)? {
            RecordType::Resource => {
                let tree = session.get(&format!("{id}/tree"), &[])?;
                walk(&mut ResourceTree { session }, &tree, options)
            }
            RecordType::ResourceComponent => {
                let native = session.get(id, &[])?;
                walk(&mut ComponentTree { session }, &native, options)
            }
        }
    }

    fn collection_list(&mut self, id: &str) -> Result<Vec<String>> {
        let session = self.session()?;
        match record_type(id)? {
            RecordType::Resource => {
                let tree = session.get(&format!("{id}/tree"), &[])?;
                descendant_ids(&mut ResourceTree { session }, &tree)
            }
            RecordType::ResourceComponent => {
                let native = session.get(id, &[])?;
                descendant_ids(&mut ComponentTree { session }, &native)
            }
        }
    }

    fn find_collection_ids(&mut self, query: &CollectionQuery) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page = 1;
        loop {
            let response = self.search(query, page, None, None)?;
            let results = json::array(&response, "results");
            if results.is_empty() {
                break;
            }
            ids.extend(results.iter().filter_map(|r| json::text(r, "uri")));

            let total = response.get("total_hits").and_then(Value::as_u64).unwrap_or(0);
            if ids.len() as u64 >= total {
                break;
            }
            page += 1;
        }
        Ok(ids)
    }

    fn count_collections(&mut self, query: &CollectionQuery) -> Result<u64> {
        let response = self.search(query, 1, None, None)?;
        Ok(response.get("total_hits").and_then(Value::as_u64).unwrap_or(0))
    }

    fn find_collections(
        &mut self,
        query: &CollectionQuery,
        page: PageRequest,
    ) -> Result<Vec<Record>> {
        let response = self.search(query, page.page, Some(page.page_size), Some(query.sort))?;
        json::array(&response, "results")
            .iter()
            .map(|result| self.collection_summary(result))
            .collect()
    }

    fn find_by_id(
        &mut self,
        id_type: FindByIdType,
        field: FindByIdField,
        value: &str,
    ) -> Result<Vec<FoundRecord>> {
        let key = format!("{}[]", field.as_str());
        let path = format!("{}/find_by_id/{}", self.repository, id_type.as_str());
        let response = self
            .session()?
            .get(&path, &[(key.as_str(), value), ("resolve[]", id_type.as_str())])?;

        json::array(&response, id_type.as_str())
            .iter()
            .map(|hit| {
                let id = json::required_str(hit, "ref")?;
                let resolved = hit.get("_resolved").cloned().unwrap_or(Value::Null);
                Ok(FoundRecord {
                    record_type: record_type(&id).ok(),
                    identifier: json::text(&resolved, "ref_id")
                        .or_else(|| json::text(&resolved, "component_id"))
                        .unwrap_or_default(),
                    title: json::text_or_empty(&resolved, "title"),
                    level_of_description: json::text_or_empty(&resolved, "level"),
                    full_record: resolved,
                    id,
                })
            })
            .collect()
    }

    fn find_resource_id_for_component(&mut self, id: &str) -> Result<String> {
        let native = self.session()?.get(id, &[])?;
        json::reference(&native, "resource")
    }

    fn find_parent_id_for_component(&mut self, id: &str) -> Result<ParentRef> {
        let native = self.session()?.get(id, &[])?;
        if native.get("parent").is_some() {
            return Ok(ParentRef {
                record_type: RecordType::ResourceComponent,
                id: json::reference(&native, "parent")?,
            });
        }
        if native.get("resource").is_some() {
            return Ok(ParentRef {
                record_type: RecordType::Resource,
                id: json::reference(&native, "resource")?,
            });
        }
        Ok(ParentRef {
            record_type: RecordType::Resource,
            id: id.to_string(),
        })
    }

    fn add_child(&mut self, parent: &str, child: &NewChild) -> Result<String> {
        let session = self.session()?;
        let parent_record = session.get(parent, &[])?;
        let parent_type = record_type(parent)?;
        let repository = json::reference(&parent_record, "repository")?;
        let resource = match parent_type {
            RecordType::Resource => parent.to_string(),
            RecordType::ResourceComponent => json::reference(&parent_record, "resource")?,
        };

        let mut object = Map::new();
        object.insert("title".into(), json!(child.title));
        object.insert("level".into(), json!(child.level));
        object.insert("jsonmodel_type".into(), json!("archival_object"));
        object.insert("resource".into(), json!({ "ref": resource }));
        if child.has_dates() {
            let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
            let date = date_entry(
                non_empty(&child.start_date).as_deref(),
                non_empty(&child.end_date).as_deref(),
                non_empty(&child.date_expression).as_deref(),
            );
            object.insert("dates".into(), json!([date]));
        }
        let notes: Vec<Value> = child.notes("odd").iter().map(multipart_note).collect();
        object.insert("notes".into(), Value::Array(notes));
        if parent_type == RecordType::ResourceComponent {
            object.insert("parent".into(), json!({ "ref": parent }));
        }

        let response = session.post_json(
            &format!("{repository}/archival_objects"),
            &Value::Object(object),
            200,
        )?;
        let uri = json::required_str(&response, "uri")?;
        info!(parent, id = %uri, "created archival object");
        Ok(uri)
    }

    fn add_digital_object(
        &mut self,
        parent: &str,
        object: &DigitalObject,
    ) -> Result<CreatedObject> {
        let session = self.session()?;
        let mut parent_record = session.get(parent, &[])?;
        let repository = json::reference(&parent_record, "repository")?;

        let title = object
            .title
            .clone()
            .filter(|title| !title.is_empty())
            .or_else(|| json::text(&parent_record, "display_string"))
            .or_else(|| object.fallback_title())
            .unwrap_or_else(|| "Untitled".to_string());

        let mut body = Map::new();
        body.insert("title".into(), json!(title));
        body.insert("digital_object_id".into(), json!(object.identifier));
        body.insert(
            "digital_object_type".into(),
            json!(object.object_type.as_deref().unwrap_or("text")),
        );
        body.insert(
            "language".into(),
            json!(json::text_or_empty(&parent_record, "language")),
        );
        body.insert("restrictions".into(), json!(object.restricted));
        body.insert(
            "subjects".into(),
            Value::Array(json::array(&parent_record, "subjects").to_vec()),
        );
        body.insert(
            "linked_agents".into(),
            Value::Array(json::array(&parent_record, "linked_agents").to_vec()),
        );
        if object.inherit_dates {
            body.insert(
                "dates".into(),
                Value::Array(json::array(&parent_record, "dates").to_vec()),
            );
        }

        let mut notes = Vec::new();
        if let Some(location) = &object.location_of_originals {
            notes.push(digital_object_note("originalsloc", location, false));
        }
        if object.inherit_notes {
            notes.extend(json::array(&parent_record, "notes").iter().map(inherited_note));
        }
        if let Some(conditions) = object.use_conditions.as_deref().filter(|c| !c.is_empty()) {
            notes.push(digital_object_note("userestrict", conditions, true));
        }
        if let Some(conditions) = object.access_conditions.as_deref().filter(|c| !c.is_empty()) {
            notes.push(digital_object_note("accessrestrict", conditions, true));
        }
        body.insert("notes".into(), Value::Array(notes));

        if let Some(uri) = &object.uri {
            let mut version = Map::new();
            version.insert("file_uri".into(), json!(uri));
            version.insert(
                "use_statement".into(),
                json!(object.use_statement.as_deref().unwrap_or_default()),
            );
            version.insert("xlink_show_attribute".into(), json!(object.xlink_show));
            version.insert("xlink_actuate_attribute".into(), json!(object.xlink_actuate));
            if object.restricted {
                version.insert("publish".into(), json!(false));
            }
            if let Some(size) = object.size {
                version.insert("file_size_bytes".into(), json!(size));
            }
            if let Some(name) = &object.format_name {
                version.insert("file_format_name".into(), json!(name));
            }
            if let Some(version_name) = &object.format_version {
                version.insert("file_format_version".into(), json!(version_name));
            }
            body.insert("file_versions".into(), json!([version]));
        }
        if object.restricted {
            body.insert("publish".into(), json!(false));
        }

        let mut body = Value::Object(body);
        let response = session.post_json(&format!("{repository}/digital_objects"), &body, 200)?;
        let uri = json::required_str(&response, "uri")?;

        let instance = json!({
            "instance_type": "digital_object",
            "digital_object": { "ref": uri },
        });
        let fields = json::object_mut(&mut parent_record, "the parent record")?;
        match fields.get_mut("instances").and_then(Value::as_array_mut) {
            Some(instances) => instances.push(instance),
            None => {
                fields.insert("instances".into(), json!([instance]));
            }
        }
        session.post_json(parent, &parent_record, 200)?;
        info!(parent, id = %uri, "created digital object");

        if let Some(fields) = body.as_object_mut() {
            fields.insert("id".into(), json!(uri));
        }
        Ok(CreatedObject { id: uri, body })
    }

    fn add_digital_object_component(
        &mut self,
        parent_object: &str,
        parent_component: Option<&str>,
        component: &DigitalObjectComponent,
    ) -> Result<CreatedObject> {
        let session = self.session()?;
        let parent_record = session.get(parent_object, &[])?;
        let repository = json::reference(&parent_record, "repository")?;

        let mut body = Map::new();
        body.insert("digital_object".into(), json!({ "ref": parent_object }));
        body.insert("jsonmodel_type".into(), json!("digital_object_component"));
        if let Some(parent) = parent_component {
            body.insert("parent".into(), json!({ "ref": parent }));
        }
        if let Some(label) = &component.label {
            body.insert("label".into(), json!(label));
        }
        if let Some(title) = &component.title {
            body.insert("title".into(), json!(title));
        }

        let mut body = Value::Object(body);
        let response = session.post_json(
            &format!("{repository}/digital_object_components"),
            &body,
            200,
        )?;
        let uri = json::required_str(&response, "uri")?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("id".into(), json!(uri));
        }
        Ok(CreatedObject { id: uri, body })
    }

    fn delete_record(&mut self, id: &str) -> Result<DeleteOutcome> {
        let response = self.session()?.delete(id, 200)?;
        info!(id, "deleted record");
        Ok(DeleteOutcome {
            status: json::text_or_empty(&response, "status"),
            id: json::text(&response, "id"),
        })
    }

    fn get_levels_of_description(&mut self) -> Result<Vec<String>> {
        if let Some(levels) = &self.levels {
            return Ok(levels.clone());
        }
        let response = self.session()?.get(LEVELS_ENUMERATION, &[])?;
        let levels: Vec<String> = json::array(&response, "values")
            .iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect();
        self.levels = Some(levels.clone());
        Ok(levels)
    }

    fn close(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let request = session.request(Method::Post, "/logout");
        session.call(&request, 200)?;
        info!("logged out of ArchivesSpace");
        Ok(())
    }
}

fn digital_object_note(note_type: &str, content: &str, publish: bool) -> Value {
    json!({
        "jsonmodel_type": "note_digital_object",
        "type": note_type,
        "content": [content],
        "publish": publish,
    })
}

/// A parent's note copied onto a digital object.
fn inherited_note(note: &Value) -> Value {
    let note_type = note
        .get("type")
        .and_then(Value::as_str)
        .filter(|t| DIGITAL_OBJECT_NOTE_TYPES.contains(t))
        .unwrap_or("note");
    let content = match note.get("subnotes").and_then(Value::as_array) {
        Some(subnotes) => Value::Array(
            subnotes
                .iter()
                .filter_map(|subnote| subnote.get("content").cloned())
                .collect(),
        ),
        None => note.get("content").cloned().unwrap_or_else(|| json!("")),
    };
    json!({
        "jsonmodel_type": "note_digital_object",
        "type": note_type,
        "label": json::text_or_empty(note, "label"),
        "content": content,
        "publish": note.get("publish").cloned().unwrap_or(Value::Bool(false)),
    })
}
