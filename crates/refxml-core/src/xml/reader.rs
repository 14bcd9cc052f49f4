//! XML reader.
//!
//! Recursive descent over `quick_xml` pull events. An `id="K"` element
//! gets its arena slot before its body is read, so a nested `ref="K"`
//! resolves to the object still being built. A `ref` seen before its
//! definition gets a placeholder slot that the later definition fills.
//!
//! Input is pulled through one reusable event buffer; only the start tag
//! of each open element is kept.

use super::names::*;
use crate::model::{
    CLASS_REFERENCE, CLASS_REFERENCE_WITH_DICTIONARY, CLASS_REFERENCE_WITH_LIST, ClassReference,
    ClassReferenceWithDictionary, ClassReferenceWithList,
};
use crate::{
    Document, ObjectGraph, ObjectId, RefXmlError, ReferenceMode, Result, Root, SerializerConfig,
};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

/// Parsed `type` / `id` / `ref` attributes of an object element.
#[derive(Debug, Default)]
struct ObjectAttrs {
    type_name: Option<String>,
    id: Option<i64>,
    reference: Option<i64>,
}

/// The element an object body is read from.
struct Open {
    name: Vec<u8>,
    start: BytesStart<'static>,
    empty: bool,
}

impl Open {
    fn new(start: BytesStart<'_>, empty: bool) -> Self {
        let start = start.into_owned();
        let name = start.name().as_ref().to_vec();
        Self { name, start, empty }
    }

    fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// Field elements already read for the object being built.
#[derive(Default)]
struct SeenFields(BTreeSet<Vec<u8>>);

impl SeenFields {
    fn first(&mut self, owner: &str, name: &[u8]) -> Result<()> {
        if self.0.insert(name.to_vec()) {
            return Ok(());
        }
        Err(RefXmlError::malformed(format!(
            "duplicate field <{}> in {owner}",
            String::from_utf8_lossy(name)
        )))
    }
}

pub(crate) struct XmlReader<'c, R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    config: &'c SerializerConfig,
    graph: ObjectGraph,
    /// Reference key -> slot, for both defined and forward-referenced keys.
    keys: BTreeMap<i64, ObjectId>,
    defined: BTreeSet<i64>,
}

impl<'c, R: BufRead> XmlReader<'c, R> {
    pub(crate) fn new(input: R, config: &'c SerializerConfig) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            config,
            graph: ObjectGraph::new(),
            keys: BTreeMap::new(),
            defined: BTreeSet::new(),
        }
    }

    pub(crate) fn read_document(mut self) -> Result<Document> {
        let open = self.next_open()?;
        let root = match open.name.as_slice() {
            name if name == CLASS_REFERENCE.as_bytes() => {
                Root::Reference(self.read_object(&open, 0)?)
            }
            name if name == CLASS_REFERENCE_WITH_LIST.as_bytes() => {
                Root::WithList(self.read_with_list(&open)?)
            }
            name if name == CLASS_REFERENCE_WITH_DICTIONARY.as_bytes() => {
                Root::WithDictionary(self.read_with_dictionary(&open)?)
            }
            other => {
                return Err(RefXmlError::unexpected(
                    "a document root",
                    String::from_utf8_lossy(other),
                ));
            }
        };
        self.expect_eof()?;

        if let Some(key) = self.keys.keys().find(|k| !self.defined.contains(k)) {
            return Err(RefXmlError::UnresolvedReference(*key));
        }
        Ok(Document::new(self.graph, root))
    }

    // -------------------------------------------------------------------------
    // Roots
    // -------------------------------------------------------------------------

    fn read_with_list(&mut self, open: &Open) -> Result<ClassReferenceWithList> {
        self.check_plain_root(&open.start, CLASS_REFERENCE_WITH_LIST)?;
        let mut out = ClassReferenceWithList::default();
        if open.empty {
            return Ok(out);
        }
        let mut seen = SeenFields::default();
        while let Some(child) = self.next_child()? {
            seen.first(CLASS_REFERENCE_WITH_LIST, &child.name)?;
            match child.name.as_slice() {
                b"Parent" => out.parent = Some(self.read_object(&child, 1)?),
                b"All" => out.all = Some(self.read_list(&child, 1)?),
                other => return Err(unexpected_field(CLASS_REFERENCE_WITH_LIST, other)),
            }
        }
        Ok(out)
    }

    fn read_with_dictionary(&mut self, open: &Open) -> Result<ClassReferenceWithDictionary> {
        self.check_plain_root(&open.start, CLASS_REFERENCE_WITH_DICTIONARY)?;
        let mut out = ClassReferenceWithDictionary::default();
        if open.empty {
            return Ok(out);
        }
        let mut seen = SeenFields::default();
        while let Some(child) = self.next_child()? {
            seen.first(CLASS_REFERENCE_WITH_DICTIONARY, &child.name)?;
            match child.name.as_slice() {
                b"Parent" => out.parent = Some(self.read_object(&child, 1)?),
                b"All" => out.all = Some(self.read_dictionary(&child)?),
                other => return Err(unexpected_field(CLASS_REFERENCE_WITH_DICTIONARY, other)),
            }
        }
        Ok(out)
    }

    fn check_plain_root(&self, start: &BytesStart<'_>, expected: &str) -> Result<()> {
        let attrs = read_attrs(start)?;
        if attrs.id.is_some() || attrs.reference.is_some() {
            return Err(RefXmlError::malformed(format!(
                "{expected} is not referenceable"
            )));
        }
        check_type(attrs.type_name.as_deref(), expected)
    }

    fn read_dictionary(&mut self, open: &Open) -> Result<BTreeMap<i32, ObjectId>> {
        let mut entries = BTreeMap::new();
        if open.empty {
            return Ok(entries);
        }
        while let Some(item) = self.next_child()? {
            if item.name != ITEM.as_bytes() {
                return Err(RefXmlError::unexpected(format!("<{ITEM}>"), item.name_lossy()));
            }
            if item.empty {
                return Err(RefXmlError::malformed("dictionary item without key and value"));
            }
            let mut key = None;
            let mut value = None;
            let mut seen = SeenFields::default();
            while let Some(child) = self.next_child()? {
                seen.first(ITEM, &child.name)?;
                match child.name.as_slice() {
                    b"Key" => key = Some(self.read_int(&child)?),
                    b"Value" => value = Some(self.read_object(&child, 3)?),
                    other => return Err(unexpected_field(ITEM, other)),
                }
            }
            let (Some(key), Some(value)) = (key, value) else {
                return Err(RefXmlError::malformed("dictionary item without key and value"));
            };
            if entries.insert(key, value).is_some() {
                return Err(RefXmlError::DuplicateKey(key));
            }
        }
        Ok(entries)
    }

    fn read_list(&mut self, open: &Open, depth: usize) -> Result<Vec<ObjectId>> {
        let mut items = Vec::new();
        if open.empty {
            return Ok(items);
        }
        while let Some(child) = self.next_child()? {
            if child.name != CLASS_REFERENCE.as_bytes() {
                return Err(RefXmlError::unexpected(
                    format!("<{CLASS_REFERENCE}>"),
                    child.name_lossy(),
                ));
            }
            items.push(self.read_object(&child, depth + 1)?);
        }
        Ok(items)
    }

    // -------------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------------

    fn read_object(&mut self, open: &Open, depth: usize) -> Result<ObjectId> {
        let max_depth = self.config.depth_limit();
        if depth >= max_depth {
            return Err(RefXmlError::DepthExceeded(max_depth));
        }
        let attrs = read_attrs(&open.start)?;
        check_type(attrs.type_name.as_deref(), CLASS_REFERENCE)?;

        if !self.config.reference_mode.tracks_references()
            && (attrs.id.is_some() || attrs.reference.is_some())
        {
            return Err(RefXmlError::malformed(
                "reference attributes present but references are disabled",
            ));
        }

        let (slot, key) = match (attrs.id, attrs.reference) {
            (Some(_), Some(_)) => {
                return Err(RefXmlError::malformed("element has both id and ref"));
            }
            (None, Some(key)) => {
                if !open.empty && self.next_child()?.is_some() {
                    return Err(RefXmlError::malformed(format!(
                        "ref=\"{key}\" element has a body"
                    )));
                }
                return Ok(self.resolve(key));
            }
            (Some(key), None) => (self.define(key)?, Some(key)),
            (None, None) => (self.graph.insert(ClassReference::default()), None),
        };

        let node = if open.empty {
            ClassReference::default()
        } else {
            self.read_fields(depth)?
        };
        let by_id = self.config.reference_mode == ReferenceMode::ById;
        if let Some(key) = key.filter(|key| by_id && *key != i64::from(node.id)) {
            return Err(RefXmlError::malformed(format!(
                "id=\"{key}\" does not match <{ID}>{}</{ID}>",
                node.id
            )));
        }

        let target = self
            .graph
            .get_mut(slot)
            .ok_or(RefXmlError::UnknownObject(slot))?;
        *target = node;
        Ok(slot)
    }

    fn read_fields(&mut self, depth: usize) -> Result<ClassReference> {
        let mut node = ClassReference::default();
        let mut seen = SeenFields::default();
        while let Some(child) = self.next_child()? {
            seen.first(CLASS_REFERENCE, &child.name)?;
            match child.name.as_slice() {
                b"Id" => node.id = self.read_int(&child)?,
                b"CyclicReference" => {
                    node.cyclic_reference = Some(self.read_object(&child, depth + 1)?);
                }
                b"ObjectA" => node.object_a = Some(self.read_object(&child, depth + 1)?),
                b"ReferenceToObjectA" => {
                    node.reference_to_object_a = Some(self.read_object(&child, depth + 1)?);
                }
                b"Lists" => node.lists = Some(self.read_list(&child, depth + 1)?),
                other => return Err(unexpected_field(CLASS_REFERENCE, other)),
            }
        }
        Ok(node)
    }

    fn resolve(&mut self, key: i64) -> ObjectId {
        let graph = &mut self.graph;
        *self
            .keys
            .entry(key)
            .or_insert_with(|| graph.insert(ClassReference::default()))
    }

    fn define(&mut self, key: i64) -> Result<ObjectId> {
        if !self.defined.insert(key) {
            return Err(RefXmlError::DuplicateReferenceId(key));
        }
        Ok(self.resolve(key))
    }

    // -------------------------------------------------------------------------
    // Event plumbing
    // -------------------------------------------------------------------------

    /// Read an integer text element such as `<Id>3</Id>`.
    fn read_int<T: std::str::FromStr>(&mut self, open: &Open) -> Result<T> {
        if open.empty {
            return Err(RefXmlError::InvalidInteger(String::new()));
        }
        self.buf.clear();
        let text = match self.reader.read_event_into(&mut self.buf)? {
            Event::Text(text) => text.unescape()?.into_owned(),
            Event::End(_) => return Err(RefXmlError::InvalidInteger(String::new())),
            other => {
                return Err(RefXmlError::malformed(format!(
                    "expected integer text, found {other:?}"
                )));
            }
        };
        let value = parse_int(&text)?;
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf)? {
            Event::End(_) => Ok(value),
            other => Err(RefXmlError::malformed(format!(
                "expected end of integer element, found {other:?}"
            ))),
        }
    }

    /// Next child element of the current element, or `None` at its end tag.
    fn next_child(&mut self) -> Result<Option<Open>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => return Ok(Some(Open::new(start, false))),
                Event::Empty(start) => return Ok(Some(Open::new(start, true))),
                Event::End(_) => return Ok(None),
                Event::Comment(_) | Event::PI(_) => {}
                Event::Eof => return Err(RefXmlError::malformed("unexpected end of document")),
                other => {
                    return Err(RefXmlError::malformed(format!("unexpected content {other:?}")));
                }
            }
        }
    }

    /// Skip the prolog and return the root element.
    fn next_open(&mut self) -> Result<Open> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => return Ok(Open::new(start, false)),
                Event::Empty(start) => return Ok(Open::new(start, true)),
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => return Err(RefXmlError::malformed("document has no root element")),
                other => {
                    return Err(RefXmlError::malformed(format!("unexpected content {other:?}")));
                }
            }
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => return Ok(()),
                Event::Comment(_) | Event::PI(_) => {}
                other => {
                    return Err(RefXmlError::malformed(format!(
                        "content after root element: {other:?}"
                    )));
                }
            }
        }
    }
}

fn read_attrs(start: &BytesStart<'_>) -> Result<ObjectAttrs> {
    let mut out = ObjectAttrs::default();
    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.as_ref() {
            b"type" => out.type_name = Some(value.into_owned()),
            b"id" => out.id = Some(parse_int(&value)?),
            b"ref" => out.reference = Some(parse_int(&value)?),
            _ => {}
        }
    }
    Ok(out)
}

fn check_type(found: Option<&str>, expected: &str) -> Result<()> {
    match found {
        Some(found) if found != expected => Err(RefXmlError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}

fn parse_int<T: std::str::FromStr>(text: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| RefXmlError::InvalidInteger(text.to_string()))
}

fn unexpected_field(owner: &str, found: &[u8]) -> RefXmlError {
    RefXmlError::unexpected(
        format!("a field of {owner}"),
        String::from_utf8_lossy(found),
    )
}
