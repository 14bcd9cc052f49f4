//! # Fixtures
//!
//! Builders for the canonical graph shapes: self cycles, aliasing,
//! list and dictionary roots. Used by tests, benches and the CLI.

use crate::model::{ClassReference, ClassReferenceWithDictionary, ClassReferenceWithList};
use crate::{Document, ObjectGraph, ObjectId, Root};
use std::collections::BTreeMap;

/// One object whose `cyclic_reference` points at itself.
#[must_use]
pub fn self_cycle(id: i32) -> Document {
    let mut graph = ObjectGraph::new();
    let node = graph.insert(ClassReference::new(id));
    if let Some(n) = graph.get_mut(node) {
        n.cyclic_reference = Some(node);
    }
    Document::new(graph, Root::Reference(node))
}

/// A root whose `object_a` and `reference_to_object_a` hold the same object.
#[must_use]
pub fn aliased(root_id: i32, a_id: i32) -> Document {
    let mut graph = ObjectGraph::new();
    let root = graph.insert(ClassReference::new(root_id));
    let a = graph.insert(ClassReference::new(a_id));
    if let Some(n) = graph.get_mut(root) {
        n.object_a = Some(a);
        n.reference_to_object_a = Some(a);
    }
    Document::new(graph, Root::Reference(root))
}

/// A list root: parent with id 1, then `len` items (ids 2..) each pointing
/// back at the parent through `object_a`. The parent is appended to the
/// list once more at the end.
#[must_use]
pub fn with_list(len: usize) -> Document {
    let mut graph = ObjectGraph::new();
    let parent = graph.insert(ClassReference::new(1));
    let mut all: Vec<ObjectId> = (0..len)
        .map(|i| {
            graph.insert(ClassReference {
                id: i as i32 + 2,
                object_a: Some(parent),
                ..ClassReference::default()
            })
        })
        .collect();
    all.push(parent);
    Document::new(
        graph,
        Root::WithList(ClassReferenceWithList {
            parent: Some(parent),
            all: Some(all),
        }),
    )
}

/// A dictionary root: parent with id 1 stored under key 1, then `len`
/// items keyed by their own id (2..) with `cyclic_reference` to the parent.
#[must_use]
pub fn with_dictionary(len: usize) -> Document {
    let mut graph = ObjectGraph::new();
    let parent = graph.insert(ClassReference::new(1));
    let mut all = BTreeMap::from([(1, parent)]);
    for i in 0..len {
        let id = i as i32 + 2;
        let item = graph.insert(ClassReference {
            id,
            cyclic_reference: Some(parent),
            ..ClassReference::default()
        });
        all.insert(id, item);
    }
    Document::new(
        graph,
        Root::WithDictionary(ClassReferenceWithDictionary {
            parent: Some(parent),
            all: Some(all),
        }),
    )
}

/// `len` objects linked through `object_a`, ids 1..=len. Acyclic, no aliasing.
#[must_use]
pub fn chain(len: usize) -> Document {
    let mut graph = ObjectGraph::new();
    let ids: Vec<ObjectId> = (0..len.max(1))
        .map(|i| graph.insert(ClassReference::new(i as i32 + 1)))
        .collect();
    for pair in ids.windows(2) {
        if let Some(n) = graph.get_mut(pair[0]) {
            n.object_a = Some(pair[1]);
        }
    }
    Document::new(graph, Root::Reference(ids[0]))
}

/// Every feature at once:
///
/// - root (id 1) cycles to itself
/// - `object_a` and `reference_to_object_a` share object 2
/// - `lists` holds object 3, object 2 again, then object 3 again
/// - object 3 cycles back to the root
#[must_use]
pub fn full_sample() -> Document {
    let mut graph = ObjectGraph::new();
    let root = graph.insert(ClassReference::new(1));
    let a = graph.insert(ClassReference::new(2));
    let b = graph.insert(ClassReference::new(3));
    if let Some(n) = graph.get_mut(b) {
        n.cyclic_reference = Some(root);
    }
    if let Some(n) = graph.get_mut(root) {
        n.cyclic_reference = Some(root);
        n.object_a = Some(a);
        n.reference_to_object_a = Some(a);
        n.lists = Some(vec![b, a, b]);
    }
    Document::new(graph, Root::Reference(root))
}

/// Names accepted by [`by_name`].
pub const FIXTURE_NAMES: [&str; 6] = ["cycle", "alias", "list", "dictionary", "chain", "full"];

/// Build a fixture by name, with `size` used by the sized shapes.
#[must_use]
pub fn by_name(name: &str, size: usize) -> Option<Document> {
    let doc = match name {
        "cycle" => self_cycle(1),
        "alias" => aliased(1, 2),
        "list" => with_list(size),
        "dictionary" => with_dictionary(size),
        "chain" => chain(size),
        "full" => full_sample(),
        _ => return None,
    };
    Some(doc)
}
