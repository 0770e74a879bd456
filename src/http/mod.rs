//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, body collection)
//!     → request.rs (ApiRequest: method, path, query, headers, body)
//!     → dispatch (route, bind, token, handler)
//!     → response.rs (XSSI-prefixed JSON envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiRequest, HttpMethod, QueryParams, RequestBody, X_REQUEST_ID};
pub use response::{encode, strip_type_info, ResponseEnvelope, XSSI_PREFIX};
pub use server::HttpServer;
