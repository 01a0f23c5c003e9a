pub mod http_client;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod session;
pub mod transport;

pub use http_client::{ClientConfig, UreqTransport, DEFAULT_BODY_LIMIT, DEFAULT_TIMEOUT};
pub use session::{join_url, resolve_base_url, ApiSession};
pub use transport::{HttpRequest, HttpResponse, Method, Payload, Transport};
