//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request:
//!     → token.rs (derive identity, reason, expiry, source IPs)
//!     → handler
//!         → access_control.rs (checker evaluates token against a subject)
//!         → AccessDenied → 403 with message and subject
//! ```
//!
//! # Design Decisions
//! - Token derivation never fails; missing inputs are simply absent
//! - Authorization decisions belong to checkers, not to the token factory
//! - No trust in client input: the reason is opaque text

pub mod access_control;
pub mod token;

pub use access_control::{AccessChecker, AccessDenied, ReasonRequired};
pub use token::{Token, TokenFactory};
