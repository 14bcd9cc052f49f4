//! XML writer.
//!
//! Depth-first, preorder, fields in declaration order. An object is
//! registered before its body is written, so any later link to it
//! (including a link from inside its own body) becomes a `ref` element.
//! Without references an alias is expanded on every visit, so the number
//! of object elements is capped by `max_elements`.

use super::names::*;
use crate::model::{CLASS_REFERENCE, ClassReferenceWithDictionary, ClassReferenceWithList};
use crate::{
    Document, ObjectGraph, ObjectId, RefXmlError, ReferenceMode, Result, Root, SerializerConfig,
};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

pub(crate) struct XmlWriter<'g, W: Write> {
    writer: Writer<W>,
    graph: &'g ObjectGraph,
    config: &'g SerializerConfig,
    /// Objects already written, with their reference key.
    emitted: BTreeMap<ObjectId, i64>,
    /// Reverse of `emitted`, for duplicate key detection.
    owners: BTreeMap<i64, ObjectId>,
    /// Objects on the current descent path. Only used without references.
    path: BTreeSet<ObjectId>,
    next_key: i64,
    /// Object elements written so far.
    written: usize,
}

impl<'g, W: Write> XmlWriter<'g, W> {
    pub(crate) fn new(inner: W, graph: &'g ObjectGraph, config: &'g SerializerConfig) -> Self {
        let writer = match config.indent {
            Some(width) => Writer::new_with_indent(inner, b' ', width),
            None => Writer::new(inner),
        };
        Self {
            writer,
            graph,
            config,
            emitted: BTreeMap::new(),
            owners: BTreeMap::new(),
            path: BTreeSet::new(),
            next_key: 1,
            written: 0,
        }
    }

    pub(crate) fn write_document(mut self, doc: &Document) -> Result<W> {
        if self.config.declaration {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        }
        match &doc.root {
            Root::Reference(id) => self.write_object(CLASS_REFERENCE, *id, 0)?,
            Root::WithList(list) => self.write_with_list(list, doc.root.type_name())?,
            Root::WithDictionary(dict) => self.write_with_dictionary(dict, doc.root.type_name())?,
        }
        Ok(self.writer.into_inner())
    }

    fn write_with_list(&mut self, list: &ClassReferenceWithList, name: &str) -> Result<()> {
        self.start(self.typed(name, name))?;
        if let Some(parent) = list.parent {
            self.write_object(PARENT, parent, 1)?;
        }
        if let Some(items) = &list.all {
            self.write_list(ALL, items, 1)?;
        }
        self.end(name)
    }

    fn write_with_dictionary(
        &mut self,
        dict: &ClassReferenceWithDictionary,
        name: &str,
    ) -> Result<()> {
        self.start(self.typed(name, name))?;
        if let Some(parent) = dict.parent {
            self.write_object(PARENT, parent, 1)?;
        }
        if let Some(entries) = &dict.all {
            if entries.is_empty() {
                self.empty(BytesStart::new(ALL))?;
            } else {
                self.start(BytesStart::new(ALL))?;
                for (key, value) in entries {
                    self.start(BytesStart::new(ITEM))?;
                    self.text_element(KEY, &key.to_string())?;
                    self.write_object(VALUE, *value, 3)?;
                    self.end(ITEM)?;
                }
                self.end(ALL)?;
            }
        }
        self.end(name)
    }

    fn write_list(&mut self, name: &str, items: &[ObjectId], depth: usize) -> Result<()> {
        if items.is_empty() {
            return self.empty(BytesStart::new(name));
        }
        self.start(BytesStart::new(name))?;
        for item in items {
            self.write_object(CLASS_REFERENCE, *item, depth + 1)?;
        }
        self.end(name)
    }

    fn write_object(&mut self, name: &str, id: ObjectId, depth: usize) -> Result<()> {
        let max_depth = self.config.depth_limit();
        if depth >= max_depth {
            return Err(RefXmlError::DepthExceeded(max_depth));
        }
        let max_elements = self.config.element_limit();
        if self.written >= max_elements {
            return Err(RefXmlError::LimitExceeded(max_elements));
        }
        self.written += 1;
        let graph = self.graph;
        let node = graph.get(id).ok_or(RefXmlError::UnknownObject(id))?;
        let mut element = self.typed(name, CLASS_REFERENCE);

        match self.config.reference_mode {
            ReferenceMode::Disabled => {
                if !self.path.insert(id) {
                    return Err(RefXmlError::CycleWithoutReferences(id));
                }
            }
            mode => {
                if let Some(key) = self.emitted.get(&id) {
                    element.push_attribute((REF_ATTR, key.to_string().as_str()));
                    return self.empty(element);
                }
                let key = match mode {
                    ReferenceMode::Generated => {
                        let key = self.next_key;
                        self.next_key += 1;
                        key
                    }
                    _ => i64::from(node.id),
                };
                if self.owners.contains_key(&key) {
                    return Err(RefXmlError::DuplicateReferenceId(key));
                }
                self.owners.insert(key, id);
                self.emitted.insert(id, key);
                element.push_attribute((ID_ATTR, key.to_string().as_str()));
            }
        }

        self.start(element)?;
        self.text_element(ID, &node.id.to_string())?;
        if let Some(target) = node.cyclic_reference {
            self.write_object(CYCLIC_REFERENCE, target, depth + 1)?;
        }
        if let Some(target) = node.object_a {
            self.write_object(OBJECT_A, target, depth + 1)?;
        }
        if let Some(target) = node.reference_to_object_a {
            self.write_object(REFERENCE_TO_OBJECT_A, target, depth + 1)?;
        }
        if let Some(items) = &node.lists {
            self.write_list(LISTS, items, depth + 1)?;
        }
        self.end(name)?;

        self.path.remove(&id);
        Ok(())
    }

    fn typed<'n>(&self, name: &'n str, type_name: &str) -> BytesStart<'n> {
        let mut element = BytesStart::new(name);
        if self.config.emit_type {
            element.push_attribute((TYPE_ATTR, type_name));
        }
        element
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start(BytesStart::new(name))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}
