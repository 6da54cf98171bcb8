//! Test support and end-to-end scenarios

pub mod fixtures;
