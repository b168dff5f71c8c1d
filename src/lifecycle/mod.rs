//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → watch loop stops selecting on config updates → Exit
//! ```

pub mod signals;
