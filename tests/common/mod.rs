//! Common test utilities for tm-task-filter integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
