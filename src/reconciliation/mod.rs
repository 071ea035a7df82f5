//! Reconciliation module containing ingestion and per-ticket matching

pub mod core;
pub mod engine;
pub mod ingestion;

pub use self::core::*;
pub use engine::*;
pub use ingestion::*;
