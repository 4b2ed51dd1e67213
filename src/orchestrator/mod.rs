//! Orchestrator module - routing, fallback and budget enforcement.

mod router;

pub use router::*;
