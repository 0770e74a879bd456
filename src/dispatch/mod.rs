//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! ApiRequest (from http/server.rs)
//!     → Registry::match_route (method + path → route, path vars)
//!     → binding::bind (path vars, query, body → ArgsObject)
//!     → TokenFactory::derive (headers, query, peer → Token)
//!     → HandlerDescriptor::invoke (ArgsObject, Token → JSON payload)
//!     → response::encode (payload or ApiError → ResponseEnvelope)
//! ```
//!
//! # Design Decisions
//! - Every failure is classified into `ApiError` before it leaves dispatch;
//!   handlers never write responses themselves
//! - Dispatch is synchronous; the server runs it on the blocking pool

pub mod dispatcher;
pub mod error;
pub mod handler;

pub use dispatcher::{Dispatcher, STRIP_TYPE_INFO_PARAM};
pub use error::ApiError;
pub use handler::{ApiHandler, HandlerDescriptor, HandlerError};
