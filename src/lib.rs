//! # Recon Core
//!
//! A payment reconciliation library for daily parking operations: expected
//! payments (tickets sold) are matched against received payments from
//! multiple channels (credit card files, PIX statements, boleto/CNAB files),
//! producing per-day and per-period reconciliation reports.
//!
//! ## Features
//!
//! - **Multi-channel ingestion**: credit card sales files today, reserved
//!   ingestion points for CNAB (boleto) and PIX statements
//! - **Per-ticket matching**: received payments grouped per ticket and
//!   classified against expected amounts (reconciled/pending/error)
//! - **Reporting**: dashboard summaries, filtered and paginated transaction
//!   listings, daily/monthly/yearly history rollups and period comparisons
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage; an in-memory backend ships for tests and development
//!
//! ## Quick Start
//!
//! ```rust
//! use recon_core::{MemoryStorage, ReconciliationService};
//!
//! // The host owns one storage instance and injects it into the service
//! let storage = MemoryStorage::new();
//! let mut service = ReconciliationService::new(storage);
//! ```

pub mod reconciliation;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use reconciliation::*;
pub use reports::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_storage::MemoryStorage;
