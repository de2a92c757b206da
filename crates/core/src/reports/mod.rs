//! Financial report generation.
//!
//! This module provides pure business logic for the read-only reports:
//! - Journal listing
//! - Ledger by account
//! - Trial balance
//! - Hierarchical balance ("balance general")
//!
//! All builders expect ACTIVE entries only.

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::ReportService;
pub use types::*;
