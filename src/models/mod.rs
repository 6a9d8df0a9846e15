//! Core data models for the dashboard.

mod hero;
mod ids;
mod player;
mod rating;
mod stats;

pub use hero::*;
pub use ids::*;
pub use player::*;
pub use rating::*;
pub use stats::*;
