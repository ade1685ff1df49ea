//! Process lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     validate config → build HTTP server → load TLS material
//!
//! Shutdown (shutdown.rs):
//!     done-channel closed exactly once → listener drains → wait loop returns
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT → trigger the done-channel
//! ```
//!
//! # Design Decisions
//! - Two shutdown triggers (OS signal, caller cancellation) merge into one
//!   exit path; whichever fires first wins
//! - A failing listener is logged but never drives shutdown on its own

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::Server;
