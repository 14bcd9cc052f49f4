//! # Formats Module
//!
//! Non-XML encodings of a [`Document`](crate::Document).
//!
//! This module contains:
//! - Binary snapshot format (postcard + header)
//!
//! Note: File I/O operations remain in the app layer (apps/refxml).
//! This module only handles format conversion (pure transformations).

mod persistence;

pub use persistence::*;
