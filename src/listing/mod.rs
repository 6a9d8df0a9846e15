//! Listing view models: sorting, filtering and pagination.
//!
//! Everything here is a synchronous, pure transform over records that have
//! already been normalized and aggregated.

pub mod pagination;
pub mod sort;

pub use pagination::{page_count, paginate, PageMeta, PageState};
pub use sort::{CategoryFilter, SortDirection, SortFilterState, SortKey};
