//! Authenticated request plumbing shared by the REST backends.

use archway_core::{ArchiveError, Result};
use serde_json::Value;
use tracing::{debug, error};

use crate::transport::{HttpRequest, HttpResponse, Method, Payload, Transport};

/// One backend session: a base URL, a transport and the headers sent on
/// every request (session tokens, API keys).
pub struct ApiSession {
    name: &'static str,
    base_url: String,
    transport: Box<dyn Transport>,
    headers: Vec<(String, String)>,
}

impl ApiSession {
    /// `name` is the product name used in error messages.
    pub fn new(name: &'static str, base_url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            headers: Vec::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.headers.push((key, value.into()));
    }

    pub fn remove_header(&mut self, key: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    }

    pub fn has_header(&self, key: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Joins `path` onto the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.contains("://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> HttpRequest {
        let mut request = HttpRequest::new(method, self.url(path));
        request.headers = self.headers.clone();
        request
    }

    /// Executes `request` without any status check.
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.transport.execute(request)
    }

    /// Executes `request` and requires the `expected` status code.
    pub fn send(&self, request: &HttpRequest, expected: u16) -> Result<HttpResponse> {
        let response = self.transport.execute(request)?;
        debug!(
            method = %request.method,
            url = %response.url,
            status = response.status,
            "received response"
        );
        if response.status != expected {
            error!("Response code: {}", response.status);
            error!("Response body: {}", response.body);
            return Err(ArchiveError::Communication {
                status: response.status,
                url: response.url,
                body: response.body,
            });
        }
        Ok(response)
    }

    /// Parses a response body as JSON.
    pub fn decode(&self, response: &HttpResponse) -> Result<Value> {
        serde_json::from_str(&response.body).map_err(|_| {
            ArchiveError::Backend(format!(
                "{} server responded with status {}, but returned a non-JSON document",
                self.name, response.status
            ))
        })
    }

    /// Sends `request`, checks its status and decodes the JSON body.
    /// A `204 No Content` reply yields `Value::Null`; an `error` key in the
    /// payload is a backend error.
    pub fn call(&self, request: &HttpRequest, expected: u16) -> Result<Value> {
        let response = self.send(request, expected)?;
        if expected == 204 {
            return Ok(Value::Null);
        }
        let value = self.decode(&response)?;
        if let Some(message) = value.get("error") {
            return Err(ArchiveError::Backend(error_message(message)));
        }
        Ok(value)
    }

    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        self.get_expecting(path, query, 200)
    }

    pub fn get_expecting(&self, path: &str, query: &[(&str, &str)], expected: u16) -> Result<Value> {
        let mut request = self.request(Method::Get, path);
        request.query = owned_pairs(query);
        self.call(&request, expected)
    }

    pub fn post_json(&self, path: &str, body: &Value, expected: u16) -> Result<Value> {
        let mut request = self.request(Method::Post, path);
        request.payload = Some(Payload::Json(body.to_string()));
        self.call(&request, expected)
    }

    pub fn post_form(&self, path: &str, fields: &[(&str, &str)], expected: u16) -> Result<Value> {
        let mut request = self.request(Method::Post, path);
        request.payload = Some(Payload::Form(owned_pairs(fields)));
        self.call(&request, expected)
    }

    pub fn put_json(&self, path: &str, body: &Value, expected: u16) -> Result<Value> {
        let mut request = self.request(Method::Put, path);
        request.payload = Some(Payload::Json(body.to_string()));
        self.call(&request, expected)
    }

    pub fn delete(&self, path: &str, expected: u16) -> Result<Value> {
        let request = self.request(Method::Delete, path);
        self.call(&request, expected)
    }
}

fn owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Text of an `error` payload, which may be a string or a structure.
pub fn error_message(value: &Value) -> String {
    match value {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Resolves a configured host and port into a base URL.
///
/// A host without a scheme gets `http://` and `port` (unless it already
/// names one); a host with a scheme is used as given.
///
/// # Examples
///
/// ```
/// use archway_http::session::resolve_base_url;
///
/// assert_eq!(resolve_base_url("localhost", Some(8089)).unwrap(), "http://localhost:8089");
/// assert_eq!(resolve_base_url("https://aspace.example/", Some(8089)).unwrap(), "https://aspace.example");
/// ```
pub fn resolve_base_url(host: &str, port: Option<u16>) -> Result<String> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(ArchiveError::InvalidInput("No host configured".into()));
    }
    if host.contains("://") {
        url::Url::parse(host)
            .map_err(|err| ArchiveError::InvalidInput(format!("Invalid host {host}: {err}")))?;
        return Ok(host.to_string());
    }

    let authority = host.split('/').next().unwrap_or(host);
    match port {
        Some(port) if !authority.contains(':') => {
            let (authority, path) = host.split_at(authority.len());
            Ok(format!("http://{authority}:{port}{path}"))
        }
        _ => Ok(format!("http://{host}")),
    }
}

/// Resolves `path` against `base` the way a browser resolves a relative link.
pub fn join_url(base: &str, path: &str) -> Result<String> {
    let base = url::Url::parse(base)
        .map_err(|err| ArchiveError::InvalidInput(format!("Invalid URL {base}: {err}")))?;
    let joined = base
        .join(path)
        .map_err(|err| ArchiveError::InvalidInput(format!("Invalid URL path {path}: {err}")))?;
    Ok(joined.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mock::MockTransport;

    fn session(mock: &MockTransport) -> ApiSession {
        let mut session = ApiSession::new("ArchivesSpace", "http://localhost:8089/", Box::new(mock.clone()));
        session.set_header("X-ArchivesSpace-Session", "token");
        session
    }

    #[test]
    fn test_url_joining() {
        let mock = MockTransport::new();
        let session = session(&mock);
        assert_eq!(
            session.url("/repositories/2/resources/1"),
            "http://localhost:8089/repositories/2/resources/1"
        );
        assert_eq!(session.url("users/admin/login"), "http://localhost:8089/users/admin/login");
        assert_eq!(session.url("http://other/x"), "http://other/x");
    }

    #[test]
    fn test_get_sends_headers_and_query() {
        let mock = MockTransport::new();
        mock.reply_json(200, json!({"title": "Test"}));
        let session = session(&mock);

        let value = session.get("/repositories/2/resources/1", &[("page", "1")]).unwrap();
        assert_eq!(value["title"], "Test");

        let request = mock.last_request().unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_param("page"), Some("1"));
        assert_eq!(request.header("x-archivesspace-session"), Some("token"));
    }

    #[test]
    fn test_unexpected_status_is_communication_error() {
        let mock = MockTransport::new();
        mock.reply_json(404, json!({"error": "Not found"}));
        let session = session(&mock);

        let err = session.get("/repositories/2/resources/9", &[]).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("status code 404"));
    }

    #[test]
    fn test_non_json_body_is_backend_error() {
        let mock = MockTransport::new();
        mock.reply_text(200, "<html></html>");
        let session = session(&mock);

        let err = session.get("/", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ArchivesSpace server responded with status 200, but returned a non-JSON document"
        );
    }

    #[test]
    fn test_error_key_is_backend_error() {
        let mock = MockTransport::new();
        mock.reply_json(200, json!({"error": {"title": ["Property is required"]}}));
        let session = session(&mock);

        let err = session.post_json("/repositories/2/archival_objects", &json!({}), 200).unwrap_err();
        assert!(matches!(err, ArchiveError::Backend(_)));
        assert!(err.to_string().contains("Property is required"));
    }

    #[test]
    fn test_no_content_skips_decoding() {
        let mock = MockTransport::new();
        mock.reply_text(204, "");
        let session = session(&mock);

        assert_eq!(session.delete("informationobjects/test", 204).unwrap(), Value::Null);
        assert_eq!(mock.last_request().unwrap().method, Method::Delete);
    }

    #[test]
    fn test_header_replacement() {
        let mock = MockTransport::new();
        let mut session = session(&mock);
        session.set_header("x-archivesspace-session", "other");
        assert_eq!(
            session.request(Method::Get, "/").header("X-ArchivesSpace-Session"),
            Some("other")
        );
        session.remove_header("X-ArchivesSpace-Session");
        assert!(!session.has_header("X-ArchivesSpace-Session"));
    }

    #[test]
    fn test_resolve_base_url() {
        assert_eq!(resolve_base_url("localhost", Some(8089)).unwrap(), "http://localhost:8089");
        assert_eq!(resolve_base_url("localhost:8080", Some(8089)).unwrap(), "http://localhost:8080");
        assert_eq!(resolve_base_url("localhost", None).unwrap(), "http://localhost");
        assert_eq!(
            resolve_base_url("aspace.example/api/", Some(8089)).unwrap(),
            "http://aspace.example:8089/api"
        );
        assert_eq!(
            resolve_base_url("https://aspace.example/", Some(8089)).unwrap(),
            "https://aspace.example"
        );
        assert!(resolve_base_url("", Some(8089)).is_err());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost/index.php/", "api/").unwrap(),
            "http://localhost/index.php/api/"
        );
        assert_eq!(join_url("http://localhost", "api/").unwrap(), "http://localhost/api/");
    }
}
