//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HttpServer stops accepting → in-flight requests drain → exit
//! ```
//!
//! # Design Decisions
//! - Startup lives in main.rs: config, logging, metrics, registry, listener
//! - Shutdown is broadcast so any number of tasks can observe it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
