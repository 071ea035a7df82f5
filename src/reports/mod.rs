//! Reporting views derived from the payment and expectation stores

pub mod dashboard;
pub mod history;
pub mod transactions;

pub use dashboard::*;
pub use history::*;
pub use transactions::*;
