//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Install metrics → Build store/service → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server stops accepting → drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
