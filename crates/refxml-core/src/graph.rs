//! # Object Graph
//!
//! Arena storage for [`ClassReference`] objects.
//!
//! Objects are addressed by [`ObjectId`] slot indices. Slots are never
//! removed or reused, so an id stays valid for the lifetime of the graph.
//! All traversals keep a visited set and terminate on cycles.

use crate::model::ClassReference;
use crate::{ObjectId, RefXmlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// Arena of referenceable objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectGraph {
    objects: Vec<ClassReference>,
}

impl ObjectGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and return its id.
    pub fn insert(&mut self, node: ClassReference) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(node);
        id
    }

    /// Lookup an object by id.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&ClassReference> {
        self.objects.get(id.index())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ClassReference> {
        self.objects.get_mut(id.index())
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        id.index() < self.objects.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ClassReference)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, node)| (ObjectId(i as u32), node))
    }

    fn node_mut(&mut self, from: ObjectId, to: ObjectId) -> Result<&mut ClassReference> {
        if !self.contains(to) {
            return Err(RefXmlError::UnknownObject(to));
        }
        self.get_mut(from).ok_or(RefXmlError::UnknownObject(from))
    }

    pub fn set_cyclic_reference(&mut self, from: ObjectId, to: ObjectId) -> Result<()> {
        self.node_mut(from, to)?.cyclic_reference = Some(to);
        Ok(())
    }

    pub fn set_object_a(&mut self, from: ObjectId, to: ObjectId) -> Result<()> {
        self.node_mut(from, to)?.object_a = Some(to);
        Ok(())
    }

    pub fn set_reference_to_object_a(&mut self, from: ObjectId, to: ObjectId) -> Result<()> {
        self.node_mut(from, to)?.reference_to_object_a = Some(to);
        Ok(())
    }

    /// Append `to` to `from.lists`, creating the list if it is `None`.
    pub fn push_list(&mut self, from: ObjectId, to: ObjectId) -> Result<()> {
        self.node_mut(from, to)?
            .lists
            .get_or_insert_with(Vec::new)
            .push(to);
        Ok(())
    }

    /// Outgoing links of an object in field order. Empty for unknown ids.
    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.get(id).into_iter().flat_map(ClassReference::links)
    }
}

// =============================================================================
// TRAVERSAL
// =============================================================================

impl ObjectGraph {
    /// Depth-first preorder over every object reachable from `roots`.
    /// Each object appears once. Unknown ids are skipped.
    #[must_use]
    pub fn reachable(&self, roots: &[ObjectId]) -> Vec<ObjectId> {
        let mut visited = BTreeSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<ObjectId> = roots.iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            if !self.contains(current) || !visited.insert(current) {
                continue;
            }
            order.push(current);

            let children: Vec<_> = self.children(current).collect();
            for child in children.into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        }

        order
    }

    /// True if some object reachable from `roots` can reach itself.
    #[must_use]
    pub fn has_cycle(&self, roots: &[ObjectId]) -> bool {
        // Colouring DFS: on_path = grey, done = black.
        let mut done = BTreeSet::new();
        let mut on_path = BTreeSet::new();

        for &root in roots {
            if !self.contains(root) || done.contains(&root) {
                continue;
            }
            let mut stack: Vec<(ObjectId, Vec<ObjectId>)> =
                vec![(root, self.children(root).collect())];
            on_path.insert(root);

            while let Some((node, pending)) = stack.last_mut() {
                match pending.pop() {
                    Some(child) => {
                        if on_path.contains(&child) {
                            return true;
                        }
                        if self.contains(child) && !done.contains(&child) {
                            on_path.insert(child);
                            let grandchildren = self.children(child).collect();
                            stack.push((child, grandchildren));
                        }
                    }
                    None => {
                        let node = *node;
                        on_path.remove(&node);
                        done.insert(node);
                        stack.pop();
                    }
                }
            }
        }

        false
    }

    /// Objects held by more than one slot, counting both the root slots and
    /// the links of every reachable object. Sorted by id.
    #[must_use]
    pub fn shared(&self, roots: &[ObjectId]) -> Vec<ObjectId> {
        let mut incoming: BTreeMap<ObjectId, usize> = BTreeMap::new();
        for &root in roots {
            *incoming.entry(root).or_default() += 1;
        }
        for node in self.reachable(roots) {
            for child in self.children(node) {
                *incoming.entry(child).or_default() += 1;
            }
        }
        incoming
            .into_iter()
            .filter(|&(id, count)| count > 1 && self.contains(id))
            .map(|(id, _)| id)
            .collect()
    }

    /// Identity-preserving structural equality of the subgraphs rooted at
    /// `a` (in `self`) and `b` (in `other`).
    #[must_use]
    pub fn equivalent(&self, a: ObjectId, other: &ObjectGraph, b: ObjectId) -> bool {
        let mut matcher = Matcher::new(self, other);
        matcher.pair(a, b) && matcher.finish()
    }
}

// =============================================================================
// EQUIVALENCE MATCHER
// =============================================================================

/// Builds a bijection between objects of two graphs while comparing them.
///
/// `pair` records a correspondence and queues it; `finish` drains the
/// queue, comparing fields and pairing links as it goes.
pub(crate) struct Matcher<'a> {
    left: &'a ObjectGraph,
    right: &'a ObjectGraph,
    forward: BTreeMap<ObjectId, ObjectId>,
    backward: BTreeMap<ObjectId, ObjectId>,
    queue: Vec<(ObjectId, ObjectId)>,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(left: &'a ObjectGraph, right: &'a ObjectGraph) -> Self {
        Self {
            left,
            right,
            forward: BTreeMap::new(),
            backward: BTreeMap::new(),
            queue: Vec::new(),
        }
    }

    pub(crate) fn pair(&mut self, a: ObjectId, b: ObjectId) -> bool {
        match (self.forward.get(&a), self.backward.get(&b)) {
            (Some(&mapped), _) => mapped == b,
            (None, Some(_)) => false,
            (None, None) => {
                self.forward.insert(a, b);
                self.backward.insert(b, a);
                self.queue.push((a, b));
                true
            }
        }
    }

    pub(crate) fn pair_opt(&mut self, a: Option<ObjectId>, b: Option<ObjectId>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.pair(a, b),
            _ => false,
        }
    }

    pub(crate) fn pair_list(
        &mut self,
        a: &Option<Vec<ObjectId>>,
        b: &Option<Vec<ObjectId>>,
    ) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.pair(*x, *y))
            }
            _ => false,
        }
    }

    pub(crate) fn finish(&mut self) -> bool {
        let (left_graph, right_graph) = (self.left, self.right);
        while let Some((a, b)) = self.queue.pop() {
            let (Some(left), Some(right)) = (left_graph.get(a), right_graph.get(b)) else {
                return false;
            };
            let same = left.id == right.id
                && self.pair_opt(left.cyclic_reference, right.cyclic_reference)
                && self.pair_opt(left.object_a, right.object_a)
                && self.pair_opt(left.reference_to_object_a, right.reference_to_object_a)
                && self.pair_list(&left.lists, &right.lists);
            if !same {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn chain(len: u32) -> (ObjectGraph, Vec<ObjectId>) {
        let mut graph = ObjectGraph::new();
        let ids: Vec<_> = (0..len)
            .map(|i| graph.insert(ClassReference::new(i as i32)))
            .collect();
        for pair in ids.windows(2) {
            graph.set_object_a(pair[0], pair[1]).unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn insert_and_lookup() {
        let mut graph = ObjectGraph::new();
        let id = graph.insert(ClassReference::new(42));
        assert_eq!(graph.get(id).map(|n| n.id), Some(42));
        assert_eq!(graph.len(), 1);
        assert!(graph.get(ObjectId(1)).is_none());
    }

    #[test]
    fn link_rejects_unknown_target() {
        let mut graph = ObjectGraph::new();
        let a = graph.insert(ClassReference::new(1));
        let result = graph.set_cyclic_reference(a, ObjectId(9));
        assert!(matches!(result, Err(RefXmlError::UnknownObject(ObjectId(9)))));
        assert_eq!(graph.get(a).and_then(|n| n.cyclic_reference), None);
    }

    #[test]
    fn push_list_creates_and_appends() {
        let mut graph = ObjectGraph::new();
        let a = graph.insert(ClassReference::new(1));
        let b = graph.insert(ClassReference::new(2));
        graph.push_list(a, b).unwrap();
        graph.push_list(a, a).unwrap();
        assert_eq!(graph.get(a).and_then(|n| n.lists.clone()), Some(vec![b, a]));
    }

    #[test]
    fn reachable_terminates_on_self_cycle() {
        let mut graph = ObjectGraph::new();
        let a = graph.insert(ClassReference::new(1));
        graph.set_cyclic_reference(a, a).unwrap();
        assert_eq!(graph.reachable(&[a]), vec![a]);
        assert!(graph.has_cycle(&[a]));
    }

    #[test]
    fn reachable_is_preorder() {
        let mut graph = ObjectGraph::new();
        let root = graph.insert(ClassReference::new(1));
        let a = graph.insert(ClassReference::new(2));
        let b = graph.insert(ClassReference::new(3));
        let c = graph.insert(ClassReference::new(4));
        graph.set_object_a(root, a).unwrap();
        graph.set_object_a(a, c).unwrap();
        graph.push_list(root, b).unwrap();
        assert_eq!(graph.reachable(&[root]), vec![root, a, c, b]);
    }

    #[test]
    fn chain_has_no_cycle() {
        let (graph, ids) = chain(5);
        assert!(!graph.has_cycle(&[ids[0]]));
        assert!(graph.shared(&[ids[0]]).is_empty());
    }

    #[test]
    fn diamond_is_shared_but_acyclic() {
        let mut graph = ObjectGraph::new();
        let root = graph.insert(ClassReference::new(1));
        let a = graph.insert(ClassReference::new(2));
        graph.set_object_a(root, a).unwrap();
        graph.set_reference_to_object_a(root, a).unwrap();
        assert!(!graph.has_cycle(&[root]));
        assert_eq!(graph.shared(&[root]), vec![a]);
    }

    #[test]
    fn longer_cycle_detected() {
        let (mut graph, ids) = chain(4);
        graph.set_cyclic_reference(ids[3], ids[1]).unwrap();
        assert!(graph.has_cycle(&[ids[0]]));
    }

    #[test]
    fn equivalent_ignores_slot_numbering() {
        let mut left = ObjectGraph::new();
        let l_root = left.insert(ClassReference::new(1));
        let l_a = left.insert(ClassReference::new(2));
        left.set_object_a(l_root, l_a).unwrap();
        left.set_cyclic_reference(l_a, l_root).unwrap();

        let mut right = ObjectGraph::new();
        let r_a = right.insert(ClassReference::new(2));
        let r_root = right.insert(ClassReference::new(1));
        right.set_object_a(r_root, r_a).unwrap();
        right.set_cyclic_reference(r_a, r_root).unwrap();

        assert!(left.equivalent(l_root, &right, r_root));
    }

    #[test]
    fn equivalent_detects_list_order() {
        let mut left = ObjectGraph::new();
        let root = left.insert(ClassReference::new(1));
        let a = left.insert(ClassReference::new(2));
        let b = left.insert(ClassReference::new(3));
        let mut right = left.clone();

        left.push_list(root, a).unwrap();
        left.push_list(root, b).unwrap();
        right.push_list(root, b).unwrap();
        right.push_list(root, a).unwrap();

        assert!(!left.equivalent(root, &right, root));
    }

    #[test]
    fn equivalent_distinguishes_none_and_empty_list() {
        let mut left = ObjectGraph::new();
        let root = left.insert(ClassReference::new(1));
        let mut right = left.clone();
        if let Some(node) = right.get_mut(root) {
            node.lists = Some(Vec::new());
        }
        assert!(!left.equivalent(root, &right, root));
    }
}
