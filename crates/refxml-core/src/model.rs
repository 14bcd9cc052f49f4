//! # Object Model
//!
//! The referenceable object shapes and the document that carries them.
//!
//! Objects live in an [`ObjectGraph`] arena. Every link between objects is
//! an [`ObjectId`], so a self cycle is `node.cyclic_reference == Some(own_id)`
//! and aliasing is two fields holding the same id.

use crate::graph::{Matcher, ObjectGraph};
use crate::{ObjectId, RefXmlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type name of [`ClassReference`] as written in XML.
pub const CLASS_REFERENCE: &str = "ClassReference";
/// Type name of [`ClassReferenceWithList`] as written in XML.
pub const CLASS_REFERENCE_WITH_LIST: &str = "ClassReferenceWithList";
/// Type name of [`ClassReferenceWithDictionary`] as written in XML.
pub const CLASS_REFERENCE_WITH_DICTIONARY: &str = "ClassReferenceWithDictionary";

// =============================================================================
// REFERENCE CAPABILITY
// =============================================================================

/// An object that exposes an integer identity.
///
/// In [`ReferenceMode::ById`](crate::ReferenceMode::ById) the serializer
/// uses this value as the XML reference key.
pub trait Reference {
    fn id(&self) -> i32;
    fn set_id(&mut self, id: i32);
}

// =============================================================================
// OBJECT SHAPES
// =============================================================================

/// A referenceable object with self-typed links and a list of children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReference {
    pub id: i32,
    /// May point at this object or at any ancestor.
    pub cyclic_reference: Option<ObjectId>,
    pub object_a: Option<ObjectId>,
    /// Usually the same object as `object_a`.
    pub reference_to_object_a: Option<ObjectId>,
    /// Ordered; `None` and an empty list are distinct.
    pub lists: Option<Vec<ObjectId>>,
}

impl ClassReference {
    /// Create an unlinked object with the given id.
    #[must_use]
    pub fn new(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Outgoing links in field order: `cyclic_reference`, `object_a`,
    /// `reference_to_object_a`, then list elements.
    pub fn links(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.cyclic_reference
            .into_iter()
            .chain(self.object_a)
            .chain(self.reference_to_object_a)
            .chain(self.lists.iter().flatten().copied())
    }
}

impl Reference for ClassReference {
    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }
}

/// A parent object plus an ordered list of objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReferenceWithList {
    pub parent: Option<ObjectId>,
    pub all: Option<Vec<ObjectId>>,
}

/// A parent object plus objects keyed by a unique integer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReferenceWithDictionary {
    pub parent: Option<ObjectId>,
    pub all: Option<BTreeMap<i32, ObjectId>>,
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// The top-level value of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Root {
    Reference(ObjectId),
    WithList(ClassReferenceWithList),
    WithDictionary(ClassReferenceWithDictionary),
}

impl Root {
    /// XML element name for this root.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Reference(_) => CLASS_REFERENCE,
            Self::WithList(_) => CLASS_REFERENCE_WITH_LIST,
            Self::WithDictionary(_) => CLASS_REFERENCE_WITH_DICTIONARY,
        }
    }

    /// Every object slot held directly by the root, in serialization order.
    /// The same object may appear more than once.
    #[must_use]
    pub fn slots(&self) -> Vec<ObjectId> {
        match self {
            Self::Reference(id) => vec![*id],
            Self::WithList(w) => w
                .parent
                .into_iter()
                .chain(w.all.iter().flatten().copied())
                .collect(),
            Self::WithDictionary(w) => w
                .parent
                .into_iter()
                .chain(w.all.iter().flat_map(|m| m.values().copied()))
                .collect(),
        }
    }
}

/// Shape summary of a document's object graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub root_type: String,
    pub objects: usize,
    pub reachable: usize,
    pub has_cycle: bool,
    /// Objects reachable through more than one slot.
    pub shared: Vec<ObjectId>,
}

/// An object graph together with its root. The unit of serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub graph: ObjectGraph,
    pub root: Root,
}

impl Document {
    #[must_use]
    pub fn new(graph: ObjectGraph, root: Root) -> Self {
        Self { graph, root }
    }

    /// Check that every id stored in the root and in every object exists.
    pub fn validate(&self) -> Result<()> {
        let check = |id: ObjectId| {
            if self.graph.contains(id) {
                Ok(())
            } else {
                Err(RefXmlError::UnknownObject(id))
            }
        };
        for id in self.root.slots() {
            check(id)?;
        }
        for (_, node) in self.graph.iter() {
            for link in node.links() {
                check(link)?;
            }
        }
        Ok(())
    }

    /// Identity-preserving structural equality.
    ///
    /// True when a one-to-one mapping between the reachable objects of both
    /// documents exists such that ids, field nullness, list order and
    /// dictionary keys all agree. Aliasing in one document must be mirrored
    /// by aliasing in the other.
    #[must_use]
    pub fn equivalent(&self, other: &Document) -> bool {
        let mut matcher = Matcher::new(&self.graph, &other.graph);
        let roots_match = match (&self.root, &other.root) {
            (Root::Reference(a), Root::Reference(b)) => matcher.pair(*a, *b),
            (Root::WithList(a), Root::WithList(b)) => {
                matcher.pair_opt(a.parent, b.parent) && matcher.pair_list(&a.all, &b.all)
            }
            (Root::WithDictionary(a), Root::WithDictionary(b)) => {
                matcher.pair_opt(a.parent, b.parent)
                    && match (&a.all, &b.all) {
                        (None, None) => true,
                        (Some(ma), Some(mb)) => {
                            ma.len() == mb.len()
                                && ma.iter().zip(mb.iter()).all(|((ka, va), (kb, vb))| {
                                    ka == kb && matcher.pair(*va, *vb)
                                })
                        }
                        _ => false,
                    }
            }
            _ => false,
        };
        roots_match && matcher.finish()
    }

    /// Summarize reachability, cycles and aliasing.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let slots = self.root.slots();
        GraphStats {
            root_type: self.root.type_name().to_string(),
            objects: self.graph.len(),
            reachable: self.graph.reachable(&slots).len(),
            has_cycle: self.graph.has_cycle(&slots),
            shared: self.graph.shared(&slots),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_trait_reads_and_writes_id() {
        let mut node = ClassReference::new(5);
        assert_eq!(Reference::id(&node), 5);
        node.set_id(9);
        assert_eq!(node.id, 9);
    }

    #[test]
    fn links_follow_field_order() {
        let node = ClassReference {
            id: 1,
            cyclic_reference: Some(ObjectId(0)),
            object_a: Some(ObjectId(1)),
            reference_to_object_a: Some(ObjectId(1)),
            lists: Some(vec![ObjectId(2), ObjectId(0)]),
        };
        let links: Vec<_> = node.links().collect();
        assert_eq!(
            links,
            vec![ObjectId(0), ObjectId(1), ObjectId(1), ObjectId(2), ObjectId(0)]
        );
    }

    #[test]
    fn root_slots_include_duplicates() {
        let root = Root::WithList(ClassReferenceWithList {
            parent: Some(ObjectId(0)),
            all: Some(vec![ObjectId(1), ObjectId(0)]),
        });
        assert_eq!(root.slots(), vec![ObjectId(0), ObjectId(1), ObjectId(0)]);
        assert_eq!(root.type_name(), CLASS_REFERENCE_WITH_LIST);
    }

    #[test]
    fn validate_rejects_dangling_root() {
        let doc = Document::new(ObjectGraph::new(), Root::Reference(ObjectId(3)));
        assert!(matches!(
            doc.validate(),
            Err(RefXmlError::UnknownObject(ObjectId(3)))
        ));
    }

    #[test]
    fn equivalent_detects_lost_aliasing() {
        let mut shared = ObjectGraph::new();
        let root = shared.insert(ClassReference::new(1));
        let a = shared.insert(ClassReference::new(2));
        if let Some(node) = shared.get_mut(root) {
            node.object_a = Some(a);
            node.reference_to_object_a = Some(a);
        }

        let mut copied = ObjectGraph::new();
        let root2 = copied.insert(ClassReference::new(1));
        let a1 = copied.insert(ClassReference::new(2));
        let a2 = copied.insert(ClassReference::new(2));
        if let Some(node) = copied.get_mut(root2) {
            node.object_a = Some(a1);
            node.reference_to_object_a = Some(a2);
        }

        let left = Document::new(shared, Root::Reference(root));
        let right = Document::new(copied, Root::Reference(root2));
        assert!(left.equivalent(&left.clone()));
        assert!(!left.equivalent(&right));
        assert!(!right.equivalent(&left));
    }

    #[test]
    fn equivalent_compares_dictionary_keys() {
        let mut graph = ObjectGraph::new();
        let x = graph.insert(ClassReference::new(1));
        let left = Document::new(
            graph.clone(),
            Root::WithDictionary(ClassReferenceWithDictionary {
                parent: None,
                all: Some(BTreeMap::from([(1, x)])),
            }),
        );
        let right = Document::new(
            graph,
            Root::WithDictionary(ClassReferenceWithDictionary {
                parent: None,
                all: Some(BTreeMap::from([(2, x)])),
            }),
        );
        assert!(!left.equivalent(&right));
    }

    #[test]
    fn stats_report_cycle_and_shared() {
        let mut graph = ObjectGraph::new();
        let root = graph.insert(ClassReference::new(1));
        let a = graph.insert(ClassReference::new(2));
        if let Some(node) = graph.get_mut(root) {
            node.cyclic_reference = Some(root);
            node.object_a = Some(a);
            node.reference_to_object_a = Some(a);
        }
        let stats = Document::new(graph, Root::Reference(root)).stats();
        assert_eq!(stats.root_type, CLASS_REFERENCE);
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.reachable, 2);
        assert!(stats.has_cycle);
        assert_eq!(stats.shared, vec![root, a]);
    }
}
