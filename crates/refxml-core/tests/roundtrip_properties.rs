//! Property-based roundtrip tests.
//!
//! Generates arbitrary object graphs (random links, self cycles, long
//! cycles, aliasing, lists) and checks that XML and binary roundtrips
//! produce an equivalent document.

#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::prelude::*;
use refxml_core::formats::{decode_snapshot, encode_snapshot};
use refxml_core::{
    ClassReference, ClassReferenceWithDictionary, ClassReferenceWithList, Document, ObjectGraph,
    ObjectId, ReferenceMode, Root, SerializerConfig, XmlSerializer,
};
use std::collections::BTreeMap;

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Raw description of one object: links are indices taken modulo the
/// object count, so every link is valid.
#[derive(Debug, Clone)]
struct NodeSpec {
    cyclic: Option<usize>,
    object_a: Option<usize>,
    alias_a: bool,
    reference_to_a: Option<usize>,
    lists: Option<Vec<usize>>,
}

fn arb_link() -> impl Strategy<Value = Option<usize>> {
    prop_oneof![2 => Just(None), 3 => (0usize..64).prop_map(Some)]
}

fn arb_node() -> impl Strategy<Value = NodeSpec> {
    (
        arb_link(),
        arb_link(),
        any::<bool>(),
        arb_link(),
        prop::option::of(prop::collection::vec(0usize..64, 0..4)),
    )
        .prop_map(|(cyclic, object_a, alias_a, reference_to_a, lists)| NodeSpec {
            cyclic,
            object_a,
            alias_a,
            reference_to_a,
            lists,
        })
}

fn build_graph(specs: &[NodeSpec], unique_ids: bool) -> ObjectGraph {
    let n = specs.len();
    let mut graph = ObjectGraph::new();
    for i in 0..n {
        let id = if unique_ids { i as i32 + 1 } else { (i % 3) as i32 };
        graph.insert(ClassReference::new(id));
    }
    for (i, spec) in specs.iter().enumerate() {
        let link = |x: usize| ObjectId((x % n) as u32);
        let node = graph.get_mut(ObjectId(i as u32)).unwrap();
        node.cyclic_reference = spec.cyclic.map(link);
        node.object_a = spec.object_a.map(link);
        node.reference_to_object_a = if spec.alias_a {
            node.object_a
        } else {
            spec.reference_to_a.map(link)
        };
        node.lists = spec.lists.as_ref().map(|l| l.iter().copied().map(link).collect());
    }
    graph
}

fn arb_root(n: usize) -> impl Strategy<Value = Root> {
    let slot = move |x: usize| ObjectId((x % n) as u32);
    prop_oneof![
        (0usize..64).prop_map(move |x| Root::Reference(slot(x))),
        (
            prop::option::of(0usize..64),
            prop::option::of(prop::collection::vec(0usize..64, 0..5)),
        )
            .prop_map(move |(parent, all)| Root::WithList(ClassReferenceWithList {
                parent: parent.map(slot),
                all: all.map(|v| v.into_iter().map(slot).collect()),
            })),
        (
            prop::option::of(0usize..64),
            prop::option::of(prop::collection::btree_map(-5i32..5, 0usize..64, 0..5)),
        )
            .prop_map(move |(parent, all)| Root::WithDictionary(ClassReferenceWithDictionary {
                parent: parent.map(slot),
                all: all.map(|m| m.into_iter().map(|(k, v)| (k, slot(v))).collect::<BTreeMap<_, _>>()),
            })),
    ]
}

fn arb_document(unique_ids: bool, max_nodes: usize) -> impl Strategy<Value = Document> {
    prop::collection::vec(arb_node(), 1..max_nodes).prop_flat_map(move |specs| {
        let graph = build_graph(&specs, unique_ids);
        arb_root(specs.len()).prop_map(move |root| Document::new(graph.clone(), root))
    })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn xml_roundtrip_by_id(doc in arb_document(true, 12)) {
        let serializer = XmlSerializer::default();
        let xml = serializer.serialize(&doc).unwrap();
        let restored = serializer.deserialize(&xml).unwrap();
        prop_assert!(restored.equivalent(&doc), "xml:\n{}", xml);
    }

    #[test]
    fn xml_roundtrip_generated_keys(doc in arb_document(false, 12)) {
        let config = SerializerConfig::default()
            .with_reference_mode(ReferenceMode::Generated)
            .compact();
        let serializer = XmlSerializer::new(config);
        let xml = serializer.serialize(&doc).unwrap();
        let restored = serializer.deserialize(&xml).unwrap();
        prop_assert!(restored.equivalent(&doc), "xml:\n{}", xml);
    }

    #[test]
    fn roundtrip_preserves_stats(doc in arb_document(true, 12)) {
        let serializer = XmlSerializer::default();
        let restored = serializer.deserialize(&serializer.serialize(&doc).unwrap()).unwrap();
        let before = doc.stats();
        let after = restored.stats();
        prop_assert_eq!(before.reachable, after.reachable);
        prop_assert_eq!(before.has_cycle, after.has_cycle);
        prop_assert_eq!(before.shared.len(), after.shared.len());
        // Only reachable objects are written.
        prop_assert_eq!(after.objects, after.reachable);
    }

    #[test]
    fn snapshot_roundtrip_exact(doc in arb_document(false, 12)) {
        let bytes = encode_snapshot(&doc).unwrap();
        let restored = decode_snapshot(&bytes).unwrap();
        prop_assert_eq!(&restored, &doc);
    }

    // Without references every alias is expanded, so keep these graphs small.
    #[test]
    fn disabled_mode_never_loops(doc in arb_document(false, 5)) {
        let config = SerializerConfig::default().with_reference_mode(ReferenceMode::Disabled);
        let serializer = XmlSerializer::new(config);
        let result = serializer.serialize(&doc);
        if doc.stats().has_cycle {
            prop_assert!(result.is_err());
        } else if let Ok(xml) = result {
            prop_assert!(!xml.contains("ref="));
        }
    }
}
