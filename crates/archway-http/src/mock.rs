//! Scripted transport for exercising REST clients without a server.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use archway_core::{ArchiveError, Result};
use serde_json::Value;

use crate::transport::{HttpRequest, HttpResponse, Transport};

enum Reply {
    Response { status: u16, body: String },
    Unreachable,
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<Reply>,
    requests: Vec<HttpRequest>,
}

/// Replies are consumed in the order they were queued, and every request
/// is recorded. Clones share the same script, so a test can keep one handle
/// while the client owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_json(&self, status: u16, body: Value) -> &Self {
        self.reply_text(status, body.to_string())
    }

    pub fn reply_text(&self, status: u16, body: impl Into<String>) -> &Self {
        self.state.borrow_mut().replies.push_back(Reply::Response {
            status,
            body: body.into(),
        });
        self
    }

    /// The next request fails as if the server could not be reached.
    pub fn reply_unreachable(&self) -> &Self {
        self.state.borrow_mut().replies.push_back(Reply::Unreachable);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.state.borrow().requests.last().cloned()
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().replies.len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());
        match state.replies.pop_front() {
            Some(Reply::Response {
                status,
                body,
            }) => {
                Ok(HttpResponse {
                    status,
                    url: request.url.clone(),
                    body,
                })
            }
            Some(Reply::Unreachable) => {
                Err(ArchiveError::Connection {
                    url: request.url.clone(),
                    message: "connection refused".into(),
                })
            }
            None => {
                Err(ArchiveError::Connection {
                    url: request.url.clone(),
                    message: format!("no scripted reply for {} {}", request.method, request.url),
                })
            }
        }
    }
}
