use std::time::Duration;

use archway_core::{ArchiveError, Result};
use tracing::debug;
use ureq::{Agent, RequestBuilder};

use crate::transport::{HttpRequest, HttpResponse, Method, Payload, Transport};

/// Library-wide request timeout, in seconds.
pub const DEFAULT_TIMEOUT: u64 = 120;

/// Largest response body read into memory. Full ArchivesSpace trees of large
/// collections exceed ureq's 10 MB default.
pub const DEFAULT_BODY_LIMIT: u64 = 512 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
    /// Maximum response body size in bytes.
    pub body_limit: u64,
}

impl Default for ClientConfig {
    /// Creates a config with the `archway` user agent and the default timeout.
    ///
    /// # Examples
    ///
    /// ```
    /// use archway_http::http_client::ClientConfig;
    ///
    /// let cfg = ClientConfig::default();
    /// assert_eq!(cfg.user_agent.as_deref(), Some("archway"));
    /// assert_eq!(cfg.timeout.map(|t| t.as_secs()), Some(120));
    /// ```
    fn default() -> Self {
        Self {
            user_agent: Some("archway".into()),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT)),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }

    /// Builds an HTTP `Agent` configured from this `ClientConfig`.
    ///
    /// Status codes are never turned into errors by the agent; the session
    /// compares them against what each call expects.
    pub fn build(&self) -> Agent {
        let mut config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.timeout);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

/// Blocking transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.build(),
            body_limit: config.body_limit,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

/// Apply the query string and headers of `request` to a `RequestBuilder`.
fn apply_request<B>(mut req: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        req = req.query(key, value);
    }
    for (key, value) in &request.headers {
        req = req.header(key.as_str(), value.as_str());
    }
    req
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let url = request.url.as_str();
        let result = match request.method {
            Method::Get => apply_request(self.agent.get(url), request).call(),
            Method::Delete => apply_request(self.agent.delete(url), request).call(),
            Method::Post | Method::Put => {
                let req = if request.method == Method::Post {
                    self.agent.post(url)
                } else {
                    self.agent.put(url)
                };
                let req = apply_request(req, request);
                match &request.payload {
                    Some(Payload::Json(body)) => req
                        .header("Content-Type", "application/json")
                        .send(body.as_str()),
                    Some(Payload::Form(fields)) => {
                        req.send_form(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    }
                    None => req.send_empty(),
                }
            }
        };

        let connection_error = |err: ureq::Error| {
            ArchiveError::Connection {
                url: request.url.clone(),
                message: err.to_string(),
            }
        };

        let response = result.map_err(connection_error)?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()
            .map_err(connection_error)?;

        Ok(HttpResponse {
            status,
            url: request.url.clone(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, Some("archway".to_string()));
        assert_eq!(config.timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        assert!(config.body_limit > 10 * 1024 * 1024);
    }

    #[test]
    fn test_client_config_with_timeout() {
        let config = ClientConfig::with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
        let transport = UreqTransport::new(&config);
        assert_eq!(transport.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn test_unreachable_server_is_connection_error() {
        let transport = UreqTransport::new(&ClientConfig::with_timeout(Duration::from_secs(2)));
        let request = HttpRequest::new(Method::Get, "http://127.0.0.1:1/users");
        let err = transport.execute(&request).unwrap_err();
        assert!(matches!(err, ArchiveError::Connection { .. }));
    }
}
