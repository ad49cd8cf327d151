//! Helper utilities for integration tests.

pub mod generators;

pub use generators::*;
