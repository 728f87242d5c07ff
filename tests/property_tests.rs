#![allow(missing_docs)]

use gremlite::{ElementId, Graph, PropertyMap};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

const LABELS: [&str; 3] = ["bookmarked", "agency", "follows"];

/// `vertices` vertices with ids `0..vertices` as names, plus the given edges
/// (endpoints reduced modulo the vertex count).
fn build(vertices: usize, edges: &[(usize, usize, usize)]) -> Graph {
    let mut graph = Graph::new();
    let idx: Vec<_> = (0..vertices)
        .map(|i| {
            graph
                .add_vertex("n", PropertyMap::new(), Some(format!("v{i}").into()))
                .unwrap()
        })
        .collect();
    for &(from, to, label) in edges {
        graph
            .add_edge(
                LABELS[label % LABELS.len()],
                idx[from % vertices],
                idx[to % vertices],
                PropertyMap::new(),
            )
            .unwrap();
    }
    graph
}

fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n, 0usize..3), 0..40),
        )
    })
}

fn two_hop(graph: &Graph) -> Vec<ElementId> {
    graph
        .query()
        .vertices()
        .out("bookmarked")
        .in_("follows")
        .to_id_list()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_out_edges_match_add_edge_calls((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        for v in 0..n {
            let idx = graph.get_vertex(&format!("v{v}").into()).unwrap();
            for (l, label) in LABELS.iter().enumerate() {
                let expected: Vec<String> = edges
                    .iter()
                    .filter(|(from, _, lab)| from % n == v && lab % LABELS.len() == l)
                    .map(|(_, to, _)| format!("v{}", to % n))
                    .collect();
                let actual: Vec<String> = graph
                    .vertex(idx)
                    .out_edges()
                    .get(label)
                    .iter()
                    .map(|e| graph.vertex(graph.edge(*e).in_vertex).id.to_string())
                    .collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }

    #[test]
    fn prop_limit_is_a_prefix((n, edges) in arb_graph(), limit in 0usize..50) {
        let graph = build(n, &edges);
        let all = two_hop(&graph);
        let limited = graph
            .query()
            .vertices()
            .out("bookmarked")
            .in_("follows")
            .limit(limit)
            .to_id_list()
            .unwrap();
        prop_assert_eq!(limited.len(), limit.min(all.len()));
        prop_assert_eq!(&limited[..], &all[..limited.len()]);
        let twice = graph
            .query()
            .vertices()
            .out("bookmarked")
            .in_("follows")
            .limit(limit)
            .limit(limit)
            .to_id_list()
            .unwrap();
        prop_assert_eq!(twice, limited);
    }

    #[test]
    fn prop_distinct_is_idempotent_and_order_preserving((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        let all = two_hop(&graph);
        let once = graph
            .query()
            .vertices()
            .out("bookmarked")
            .in_("follows")
            .distinct()
            .to_id_list()
            .unwrap();
        let twice = graph
            .query()
            .vertices()
            .out("bookmarked")
            .in_("follows")
            .distinct()
            .distinct()
            .to_id_list()
            .unwrap();
        prop_assert_eq!(&once, &twice);

        let mut seen = HashSet::new();
        let expected: Vec<ElementId> = all.into_iter().filter(|id| seen.insert(id.clone())).collect();
        prop_assert_eq!(once, expected);
    }

    #[test]
    fn prop_exclude_composes_as_union(
        (n, edges) in arb_graph(),
        split in prop::collection::vec(0usize..3, 12),
    ) {
        let graph = build(n, &edges);
        // 0: kept, 1: first set, 2: second set
        let set = |which: usize| -> BTreeSet<ElementId> {
            (0..n)
                .filter(|v| split[*v] == which)
                .map(|v| format!("v{v}").into())
                .collect()
        };
        let (s1, s2) = (set(1), set(2));
        let chained = graph
            .query()
            .vertices()
            .out("bookmarked")
            .exclude_ids(&s1)
            .exclude_ids(&s2)
            .to_id_list()
            .unwrap();
        let union: BTreeSet<ElementId> = s1.union(&s2).cloned().collect();
        let at_once = graph
            .query()
            .vertices()
            .out("bookmarked")
            .exclude_ids(&union)
            .to_id_list()
            .unwrap();
        prop_assert_eq!(&chained, &at_once);
        prop_assert!(chained.iter().all(|id| !union.contains(id)));
    }

    #[test]
    fn prop_fresh_queries_are_repeatable((n, edges) in arb_graph()) {
        let graph = build(n, &edges);
        let first = graph.query().vertices().both(gremlite::Labels::any()).to_dict().to_list().unwrap();
        let second = graph.query().vertices().both(gremlite::Labels::any()).to_dict().to_list().unwrap();
        prop_assert_eq!(first, second);
    }
}
