//! # refxml-core
//!
//! Object graphs with cycles and shared references, and a serializer that
//! writes them to XML and reads them back without losing either.
//!
//! Objects live in an [`ObjectGraph`] arena and link to each other by
//! [`ObjectId`]. A self cycle is an object holding its own id; aliasing is
//! two fields holding the same id. The XML form marks the first
//! occurrence of an object with `id="K"` and every later occurrence with
//! `ref="K"`.
//!
//! ```
//! use refxml_core::{fixtures, XmlSerializer};
//!
//! let doc = fixtures::full_sample();
//! let serializer = XmlSerializer::default();
//! let xml = serializer.serialize(&doc).unwrap();
//! let restored = serializer.deserialize(&xml).unwrap();
//! assert!(restored.equivalent(&doc));
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! xml / formats  → codecs (XML, binary snapshot)
//!   ↓
//! model          → object shapes, Root, Document
//!   ↓
//! graph          → arena, traversal, equivalence
//!   ↓
//! primitives     → ObjectId, bounds
//! ```

pub mod config;
pub mod error;
pub mod fixtures;
pub mod formats;
pub mod graph;
pub mod model;
pub mod primitives;
pub mod xml;

pub use config::{ReferenceMode, SerializerConfig};
pub use error::{RefXmlError, Result};
pub use graph::ObjectGraph;
pub use model::{
    ClassReference, ClassReferenceWithDictionary, ClassReferenceWithList, Document, GraphStats,
    Reference, Root,
};
pub use primitives::ObjectId;
pub use xml::XmlSerializer;
