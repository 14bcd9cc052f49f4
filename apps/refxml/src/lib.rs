//! # refxml Library
//!
//! This library exposes the refxml CLI handlers for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;

// Re-export refxml_core for convenience
pub use refxml_core;
