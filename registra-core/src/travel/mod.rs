//! Visit-order optimization
//!
//! Orders points so a tool starting at one location and finishing at
//! another covers as little XY distance as practical.

pub mod optimizer;

pub use optimizer::{
    path_length, TravelError, TravelOptimizer, TravelSummary, DEFAULT_MAX_PASSES, MAX_TRAVEL_POINTS,
};
