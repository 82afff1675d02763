use ddigraph_graph::{layout, query_subgraph, Edge, Graph};
use proptest::prelude::*;
use std::collections::BTreeSet;

const MAX_DRUGS: usize = 30;
const MAX_EDGES: usize = 120;
const MAX_SEEDS: usize = 4;

#[derive(Debug, Clone)]
struct QueryCase {
    edges: Vec<(usize, usize, u64)>,
    seeds: Vec<usize>,
    k: usize,
}

fn drug(i: usize) -> String {
    format!("D{i:02}")
}

fn query_case_strategy() -> impl Strategy<Value = QueryCase> {
    (
        prop::collection::vec((0usize..MAX_DRUGS, 0usize..MAX_DRUGS, 1u64..40), 1..=MAX_EDGES),
        // Indices past MAX_DRUGS name drugs that are never in the graph.
        prop::collection::vec(0usize..MAX_DRUGS + 5, 1..=MAX_SEEDS),
        0usize..8,
    )
        .prop_map(|(edges, seeds, k)| QueryCase { edges, seeds, k })
}

fn build(case: &QueryCase) -> Graph {
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();
    for &(x, y, weight) in &case.edges {
        if x == y {
            continue;
        }
        let (a, b) = if x < y { (x, y) } else { (y, x) };
        if seen.insert((a, b)) {
            edges.push(Edge {
                drug_a: drug(a),
                drug_b: drug(b),
                weight,
                mean_severity: 0.0,
            });
        }
    }
    Graph::from_edges(edges).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    #[test]
    fn query_is_bounded_and_keeps_seeds(case in query_case_strategy()) {
        let graph = build(&case);
        let seeds: Vec<String> = case.seeds.iter().map(|&i| drug(i)).collect();
        let sub = query_subgraph(&graph, &seeds, case.k);

        let present: BTreeSet<&str> = seeds
            .iter()
            .map(String::as_str)
            .filter(|s| graph.contains(s))
            .collect();

        prop_assert!(sub.node_count() <= present.len() * (case.k + 1));
        for seed in &present {
            prop_assert!(sub.contains(seed));
        }
        if present.is_empty() {
            prop_assert!(sub.is_empty());
        }
        for unknown in sub.unknown_seeds() {
            prop_assert!(!graph.contains(unknown));
        }
    }

    #[test]
    fn query_edges_are_fully_induced(case in query_case_strategy()) {
        let graph = build(&case);
        let seeds: Vec<String> = case.seeds.iter().map(|&i| drug(i)).collect();
        let sub = query_subgraph(&graph, &seeds, case.k);

        let members: BTreeSet<&str> = sub.nodes().iter().map(|n| n.drug.as_str()).collect();
        let expected: Vec<&Edge> = graph
            .edges()
            .iter()
            .filter(|e| members.contains(e.drug_a.as_str()) && members.contains(e.drug_b.as_str()))
            .collect();
        let actual: Vec<&Edge> = sub.edges().iter().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn layout_is_deterministic(case in query_case_strategy(), seed in 0u64..1000) {
        let graph = build(&case);
        let seeds: Vec<String> = case.seeds.iter().map(|&i| drug(i)).collect();
        let first = query_subgraph(&graph, &seeds, case.k);
        let second = query_subgraph(&graph, &seeds, case.k);

        let a = layout(&first, seed);
        let b = layout(&second, seed);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), first.node_count());
        for (_, p) in a.iter() {
            prop_assert!(p.x.is_finite() && p.y.is_finite());
        }
    }
}
