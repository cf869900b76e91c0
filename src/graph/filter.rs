//! Derives the visible subgraph from a loaded graph and the active filters.

use log::debug;

use super::model::{Category, Criticality, Edge, Graph, Node};

/// Control value that stands for "no restriction".
pub const ALL: &str = "all";

/// A single-choice filter: the wildcard, one exact value, or a control value
/// this build does not recognize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector<T> {
	All,
	Only(T),
	/// Kept verbatim so the control still shows it. Matches nothing.
	Unrecognized(String),
}

impl<T> Default for Selector<T> {
	fn default() -> Self {
		Selector::All
	}
}

impl<T: PartialEq> Selector<T> {
	pub fn matches(&self, value: &T) -> bool {
		match self {
			Selector::All => true,
			Selector::Only(expected) => expected == value,
			Selector::Unrecognized(_) => false,
		}
	}

	pub fn is_all(&self) -> bool {
		matches!(self, Selector::All)
	}
}

/// A value that round-trips through a `<select>` control.
pub trait ControlValue: Sized + PartialEq {
	/// `None` when the control value names no known variant.
	fn from_control(value: &str) -> Option<Self>;
	fn control(&self) -> &str;
}

impl ControlValue for String {
	fn from_control(value: &str) -> Option<Self> {
		Some(value.to_owned())
	}

	fn control(&self) -> &str {
		self
	}
}

impl ControlValue for Category {
	fn from_control(value: &str) -> Option<Self> {
		Category::parse(value)
	}

	fn control(&self) -> &str {
		self.as_str()
	}
}

impl ControlValue for Criticality {
	fn from_control(value: &str) -> Option<Self> {
		Criticality::parse(value)
	}

	fn control(&self) -> &str {
		self.as_str()
	}
}

impl<T: ControlValue> Selector<T> {
	/// Reads a control value; `"all"` is the wildcard.
	pub fn from_control(value: &str) -> Self {
		if value == ALL {
			return Selector::All;
		}
		match T::from_control(value) {
			Some(v) => Selector::Only(v),
			None => Selector::Unrecognized(value.to_owned()),
		}
	}

	pub fn control(&self) -> &str {
		match self {
			Selector::All => ALL,
			Selector::Only(value) => value.control(),
			Selector::Unrecognized(raw) => raw,
		}
	}
}

impl Selector<String> {
	pub fn matches_str(&self, value: &str) -> bool {
		match self {
			Selector::All => true,
			Selector::Only(expected) => expected == value,
			Selector::Unrecognized(_) => false,
		}
	}
}

/// Active filter values. Always evaluated against the original graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterState {
	pub environment: Selector<String>,
	pub category: Selector<Category>,
	pub criticality: Selector<Criticality>,
	/// Raw text from the tag field; trimmed and lowercased when matching.
	pub tag_query: String,
}

impl FilterState {
	pub fn is_wildcard(&self) -> bool {
		self.environment.is_all()
			&& self.category.is_all()
			&& self.criticality.is_all()
			&& self.normalized_query().is_none()
	}

	fn normalized_query(&self) -> Option<String> {
		let q = self.tag_query.trim();
		(!q.is_empty()).then(|| q.to_lowercase())
	}
}

fn tags_match(tags: &[String], query: Option<&str>) -> bool {
	match query {
		None => true,
		Some(q) => tags.iter().any(|t| t.to_lowercase().contains(q)),
	}
}

fn keep_node(node: &Node, filter: &FilterState, query: Option<&str>) -> bool {
	node.env
		.as_deref()
		.map_or(filter.environment.is_all(), |env| filter.environment.matches_str(env))
		&& filter.category.matches(&node.category)
		&& tags_match(&node.tags, query)
}

// Edges without an env tag pass any environment selector; nodes do not.
fn keep_edge(edge: &Edge, filter: &FilterState, query: Option<&str>) -> bool {
	filter.criticality.matches(&edge.criticality)
		&& edge
			.env
			.as_deref()
			.filter(|env| !env.is_empty())
			.is_none_or(|env| filter.environment.matches_str(env))
		&& tags_match(&edge.tags, query)
}

/// Returns the subgraph visible under `filter`.
///
/// A node is kept when it passes the environment, category and tag checks.
/// An edge is kept only when both endpoints were kept and the edge passes
/// the criticality, environment and tag checks. Source order is preserved
/// and the input is left untouched.
pub fn filter_graph(graph: &Graph, filter: &FilterState) -> Graph {
	let query = filter.normalized_query();
	let query = query.as_deref();

	let nodes: indexmap::IndexMap<String, Node> = graph
		.nodes
		.iter()
		.filter(|(_, node)| keep_node(node, filter, query))
		.map(|(id, node)| (id.clone(), node.clone()))
		.collect();

	let edges: Vec<Edge> = graph
		.edges
		.iter()
		.filter(|e| nodes.contains_key(&e.source) && nodes.contains_key(&e.target))
		.filter(|e| keep_edge(e, filter, query))
		.cloned()
		.collect();

	debug!(
		"filtered graph: {}/{} nodes, {}/{} edges",
		nodes.len(),
		graph.nodes.len(),
		edges.len(),
		graph.edges.len()
	);
	Graph { nodes, edges }
}
