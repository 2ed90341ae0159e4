//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the decision engine and the pre-trained model.

mod classifier;

pub use classifier::{ModelError, RiskClassifier};
