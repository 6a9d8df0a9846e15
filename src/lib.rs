//! # Dota Dash
//!
//! Player profile and hero statistics dashboard for a Dota 2 stats backend.
//!
//! ## Architecture
//!
//! - **models**: Heroes, matches, rating brackets and statistic records
//! - **fetch**: The `StatsSource` seam, its HTTP client and an in-memory source
//! - **normalize**: Turns the backend's differently shaped payloads into records
//! - **aggregate**: Joins independently fetched series onto the hero catalog
//! - **listing**: Sort/filter state and pagination
//! - **views**: Per-screen view models with loading, error and retry state
//! - **render**: Text formatting for the terminal
//! - **config**: Configuration loading and validation

pub mod aggregate;
pub mod config;
pub mod fetch;
pub mod listing;
pub mod models;
pub mod normalize;
pub mod render;
pub mod views;

pub use models::*;
