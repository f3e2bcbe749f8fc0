//! Internal utilities for the synchronization layer.

pub mod validation;

pub use validation::*;
