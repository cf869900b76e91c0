//! Property-based tests for subgraph filtering and projection
//!
//! Invariants:
//! - Every kept edge joins two kept nodes
//! - Filtering twice with the same filters changes nothing
//! - Wildcard filters return the source graph
//! - Edges without an environment ignore the environment selector
//! - Projection emits one record per node and edge

use std::collections::HashSet;

use graphml_viewer::graph::{
	Category, Criticality, Edge, EdgeKind, FilterState, Graph, Node, Selector, filter_graph,
	project,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

const ENVS: [&str; 3] = ["prod", "stage", "dev"];
const TAGS: [&str; 5] = ["API", "billing", "Critical-API", "pii", "edge"];

fn arb_env() -> impl Strategy<Value = Option<String>> {
	prop::option::of(prop::sample::select(ENVS.to_vec()).prop_map(str::to_owned))
}

fn arb_tags() -> impl Strategy<Value = Vec<String>> {
	prop::collection::vec(prop::sample::select(TAGS.to_vec()).prop_map(str::to_owned), 0..3)
}

fn arb_category() -> impl Strategy<Value = Category> {
	prop::sample::select(Category::KNOWN.to_vec())
}

fn arb_criticality() -> impl Strategy<Value = Criticality> {
	prop::sample::select(Criticality::KNOWN.to_vec())
}

/// Graphs over ids `n0..n7`; edges may point at `n8`/`n9`, which never exist.
fn arb_graph() -> impl Strategy<Value = Graph> {
	let nodes = prop::collection::vec((0..8usize, arb_category(), arb_env(), arb_tags()), 0..8);
	let edges = prop::collection::vec(
		(0..10usize, 0..10usize, arb_criticality(), arb_env(), arb_tags()),
		0..16,
	);
	(nodes, edges).prop_map(|(nodes, edges)| {
		let nodes = nodes.into_iter().map(|(i, category, env, tags)| {
			let mut node = Node::new(format!("n{i}"), format!("Node {i}"), category);
			node.env = env;
			node.tags = tags;
			node
		});
		let edges = edges
			.into_iter()
			.enumerate()
			.map(|(i, (from, to, crit, env, tags))| {
				let mut edge = Edge::new(
					format!("e{i}"),
					format!("n{from}"),
					format!("n{to}"),
					"calls",
					EdgeKind::Sync,
					crit,
				);
				edge.env = env;
				edge.tags = tags;
				edge
			});
		Graph::new(nodes, edges)
	})
}

fn arb_filter() -> impl Strategy<Value = FilterState> {
	(
		prop::option::of(prop::sample::select(ENVS.to_vec())),
		prop::option::of(arb_category()),
		prop::option::of(arb_criticality()),
		prop::sample::select(vec!["", "api", "  PII ", "x", "bill"]),
	)
		.prop_map(|(env, category, criticality, query)| FilterState {
			environment: env.map_or(Selector::All, |e| Selector::Only(e.to_owned())),
			category: category.map_or(Selector::All, Selector::Only),
			criticality: criticality.map_or(Selector::All, Selector::Only),
			tag_query: query.to_owned(),
		})
}

proptest! {
	#[test]
	fn kept_edges_join_kept_nodes(graph in arb_graph(), filter in arb_filter()) {
		let out = filter_graph(&graph, &filter);
		for edge in &out.edges {
			prop_assert!(out.nodes.contains_key(&edge.source));
			prop_assert!(out.nodes.contains_key(&edge.target));
		}
	}

	#[test]
	fn filtering_is_idempotent(graph in arb_graph(), filter in arb_filter()) {
		let once = filter_graph(&graph, &filter);
		let twice = filter_graph(&once, &filter);
		prop_assert_eq!(once, twice);
	}

	#[test]
	fn result_is_a_subset(graph in arb_graph(), filter in arb_filter()) {
		let out = filter_graph(&graph, &filter);
		let source_edges: HashSet<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
		for (id, node) in &out.nodes {
			prop_assert_eq!(graph.node(id), Some(node));
		}
		for edge in &out.edges {
			prop_assert!(source_edges.contains(edge.id.as_str()));
		}
	}

	#[test]
	fn wildcard_keeps_everything_resolvable(graph in arb_graph()) {
		let out = filter_graph(&graph, &FilterState::default());
		prop_assert_eq!(out.nodes.len(), graph.nodes.len());
		let resolvable = graph
			.edges
			.iter()
			.filter(|e| graph.nodes.contains_key(&e.source) && graph.nodes.contains_key(&e.target))
			.count();
		prop_assert_eq!(out.edges.len(), resolvable);
	}

	#[test]
	fn untagged_edges_ignore_environment(graph in arb_graph(), env in prop::sample::select(ENVS.to_vec())) {
		let filter = FilterState {
			environment: Selector::Only(env.to_owned()),
			..Default::default()
		};
		let out = filter_graph(&graph, &filter);
		for edge in graph.edges.iter().filter(|e| e.env.is_none()) {
			let endpoints_kept =
				out.nodes.contains_key(&edge.source) && out.nodes.contains_key(&edge.target);
			prop_assert_eq!(out.edges.iter().any(|e| e.id == edge.id), endpoints_kept);
		}
	}

	#[test]
	fn projection_is_one_to_one(graph in arb_graph(), filter in arb_filter()) {
		let out = filter_graph(&graph, &filter);
		let model = project(&out);
		prop_assert_eq!(model.nodes.len(), out.nodes.len());
		prop_assert_eq!(model.edges.len(), out.edges.len());
		let ids: HashSet<&str> = model.nodes.iter().map(|n| n.id.as_str()).collect();
		for edge in &model.edges {
			prop_assert!(ids.contains(edge.from.as_str()) && ids.contains(edge.to.as_str()));
		}
	}
}
