//! # XML Module
//!
//! Reference-preserving XML serialization of [`Document`]s.
//!
//! Each object element carries either `id="K"` (first occurrence, full
//! body) or `ref="K"` (every later occurrence, empty element):
//!
//! ```xml
//! <ClassReference type="ClassReference" id="1">
//!   <Id>1</Id>
//!   <CyclicReference type="ClassReference" ref="1"/>
//!   <ObjectA type="ClassReference" id="2">
//!     <Id>2</Id>
//!   </ObjectA>
//!   <ReferenceToObjectA type="ClassReference" ref="2"/>
//! </ClassReference>
//! ```
//!
//! `None` fields are omitted; empty collections are written as empty
//! container elements.

mod reader;
mod writer;

use crate::{Document, Result, SerializerConfig};
use reader::XmlReader;
use std::io::{BufRead, Write};
use writer::XmlWriter;

/// Element and attribute names.
pub(crate) mod names {
    pub const ID: &str = "Id";
    pub const CYCLIC_REFERENCE: &str = "CyclicReference";
    pub const OBJECT_A: &str = "ObjectA";
    pub const REFERENCE_TO_OBJECT_A: &str = "ReferenceToObjectA";
    pub const LISTS: &str = "Lists";
    pub const PARENT: &str = "Parent";
    pub const ALL: &str = "All";
    pub const ITEM: &str = "Item";
    pub const KEY: &str = "Key";
    pub const VALUE: &str = "Value";

    pub const TYPE_ATTR: &str = "type";
    pub const ID_ATTR: &str = "id";
    pub const REF_ATTR: &str = "ref";
}

/// XML serializer for object graph documents.
#[derive(Debug, Clone, Default)]
pub struct XmlSerializer {
    config: SerializerConfig,
}

impl XmlSerializer {
    #[must_use]
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Serialize a document to an XML string.
    pub fn serialize(&self, doc: &Document) -> Result<String> {
        let bytes = self.serialize_to(doc, Vec::new())?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Serialize a document into a writer, returning the writer.
    pub fn serialize_to<W: Write>(&self, doc: &Document, out: W) -> Result<W> {
        XmlWriter::new(out, &doc.graph, &self.config).write_document(doc)
    }

    /// Deserialize a document from an XML string.
    pub fn deserialize(&self, xml: &str) -> Result<Document> {
        self.deserialize_from(xml.as_bytes())
    }

    /// Deserialize a document from a buffered reader, pulling events as
    /// the document is parsed.
    pub fn deserialize_from<R: BufRead>(&self, input: R) -> Result<Document> {
        XmlReader::new(input, &self.config).read_document()
    }
}

// =============================================================================
// TESTS
// =============================================================================
