//! # Error Types
//!
//! All fallible engine operations return [`RefXmlError`].

use crate::ObjectId;
use thiserror::Error;

/// Result alias used throughout refxml-core.
pub type Result<T> = std::result::Result<T, RefXmlError>;

/// Errors produced by the arena, the XML codec and the snapshot format.
#[derive(Debug, Error)]
pub enum RefXmlError {
    /// An `ObjectId` does not name a slot in the graph.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    /// Two distinct objects share a reference key, or a key is defined twice.
    #[error("duplicate reference id {0}")]
    DuplicateReferenceId(i64),

    /// A `ref` attribute names a key that is never defined.
    #[error("unresolved reference {0}")]
    UnresolvedReference(i64),

    /// The graph contains a cycle but reference tracking is disabled.
    #[error("cycle through object {0} cannot be written with references disabled")]
    CycleWithoutReferences(ObjectId),

    /// Nesting exceeded the configured limit.
    #[error("maximum nesting depth {0} exceeded")]
    DepthExceeded(usize),

    /// The writer would emit more object elements than allowed.
    #[error("document exceeds {0} object elements")]
    LimitExceeded(usize),

    /// An element name was not expected at this position.
    #[error("unexpected element <{found}> (expected {expected})")]
    UnexpectedElement { expected: String, found: String },

    /// A `type` attribute names a different type than the element holds.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A dictionary contains the same key twice.
    #[error("duplicate dictionary key {0}")]
    DuplicateKey(i32),

    /// Text that should hold an integer does not parse.
    #[error("invalid integer {0:?}")]
    InvalidInteger(String),

    /// Structurally invalid document.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Snapshot bytes do not carry a valid header.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("snapshot encoding error: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RefXmlError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub(crate) fn unexpected(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedElement {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
