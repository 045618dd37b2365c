//! Ports layer: Trait definitions for replaceable components.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the pipeline and the trained model.

mod classifier;

pub use classifier::{ClassifierError, StressModel};
