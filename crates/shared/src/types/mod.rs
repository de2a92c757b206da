//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use pagination::{MAX_PER_PAGE, PageMeta, PageRequest, PageResponse};
