//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with the classifier port to
//! implement the assessment use case.

mod engine;
mod model_adapter;

pub use engine::RiskEngine;
pub use model_adapter::ModelAdapter;
