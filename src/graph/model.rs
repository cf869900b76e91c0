//! Graph data model shared by the decoder, the filter and the projection.
//!
//! The wire shape matches the upload payload: a `nodes` array and an `edges`
//! array, where optional attributes may be omitted or `null`.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Node category. Drives grouping and node color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Service,
	Db,
	Cache,
	Queue,
	External,
	/// Any category outside the known set; styled with the fallback token.
	#[serde(other)]
	Unknown,
}

impl Category {
	/// Categories accepted by the GraphML decoder, in legend order.
	pub const KNOWN: [Category; 5] = [
		Category::Service,
		Category::Db,
		Category::Cache,
		Category::Queue,
		Category::External,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Category::Service => "service",
			Category::Db => "db",
			Category::Cache => "cache",
			Category::Queue => "queue",
			Category::External => "external",
			Category::Unknown => "unknown",
		}
	}

	/// Parses a known category name. Returns `None` for anything else.
	pub fn parse(value: &str) -> Option<Self> {
		Self::KNOWN.into_iter().find(|c| c.as_str() == value)
	}
}

/// Edge interaction style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
	Sync,
	Async,
	Stream,
	#[serde(other)]
	Unknown,
}

impl EdgeKind {
	pub const KNOWN: [EdgeKind; 3] = [EdgeKind::Sync, EdgeKind::Async, EdgeKind::Stream];

	pub fn as_str(self) -> &'static str {
		match self {
			EdgeKind::Sync => "sync",
			EdgeKind::Async => "async",
			EdgeKind::Stream => "stream",
			EdgeKind::Unknown => "unknown",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::KNOWN.into_iter().find(|k| k.as_str() == value)
	}
}

/// Edge criticality. Drives edge color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
	Low,
	Medium,
	High,
	#[serde(other)]
	Unknown,
}

impl Criticality {
	/// Known levels, most critical first.
	pub const KNOWN: [Criticality; 3] = [Criticality::High, Criticality::Medium, Criticality::Low];

	pub fn as_str(self) -> &'static str {
		match self {
			Criticality::Low => "low",
			Criticality::Medium => "medium",
			Criticality::High => "high",
			Criticality::Unknown => "unknown",
		}
	}

	pub fn parse(value: &str) -> Option<Self> {
		Self::KNOWN.into_iter().find(|c| c.as_str() == value)
	}
}

macro_rules! display_as_str {
	($($ty:ty),*) => {
		$(impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		})*
	};
}

display_as_str!(Category, EdgeKind, Criticality);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: String,
	pub label: String,
	#[serde(rename = "type")]
	pub category: Category,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub env: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub domain: Option<String>,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub tier: Option<String>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub tags: Vec<String>,
	#[serde(default)]
	pub x: Option<f64>,
	#[serde(default)]
	pub y: Option<f64>,
}

impl Node {
	/// Creates a node with only the required attributes set.
	pub fn new(id: impl Into<String>, label: impl Into<String>, category: Category) -> Self {
		Self {
			id: id.into(),
			label: label.into(),
			category,
			env: None,
			domain: None,
			tier: None,
			tags: Vec::new(),
			x: None,
			y: None,
		}
	}

	/// A pinned coordinate, present only when both axes are supplied.
	pub fn fixed_position(&self) -> Option<(f64, f64)> {
		self.x.zip(self.y)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub id: String,
	pub source: String,
	pub target: String,
	pub label: String,
	pub kind: EdgeKind,
	pub criticality: Criticality,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub protocol: Option<String>,
	#[serde(default = "default_weight", deserialize_with = "null_as_default_weight")]
	pub weight: f64,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub env: Option<String>,
	#[serde(default, deserialize_with = "null_as_empty")]
	pub tags: Vec<String>,
}

impl Edge {
	/// Creates an edge with only the required attributes set and a weight of 1.
	pub fn new(
		id: impl Into<String>,
		source: impl Into<String>,
		target: impl Into<String>,
		label: impl Into<String>,
		kind: EdgeKind,
		criticality: Criticality,
	) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			label: label.into(),
			kind,
			criticality,
			protocol: None,
			weight: default_weight(),
			env: None,
			tags: Vec::new(),
		}
	}
}

/// Weight used when a document leaves it out or it does not parse.
pub const DEFAULT_WEIGHT: f64 = 1.0;

fn default_weight() -> f64 {
	DEFAULT_WEIGHT
}

fn null_as_default_weight<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
	Ok(Option::<f64>::deserialize(de)?.unwrap_or(DEFAULT_WEIGHT))
}

fn empty_as_none<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<String>::deserialize(de)?.filter(|v| !v.is_empty()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
	Ok(Option::<Vec<String>>::deserialize(de)?.unwrap_or_default())
}

/// A loaded graph: nodes unique by id, in document order, plus edges.
///
/// Edges are not checked against the node set; the filter drops any edge
/// whose endpoints are missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphPayload", into = "GraphPayload")]
pub struct Graph {
	pub nodes: IndexMap<String, Node>,
	pub edges: Vec<Edge>,
}

impl Graph {
	pub fn new(nodes: impl IntoIterator<Item = Node>, edges: impl IntoIterator<Item = Edge>) -> Self {
		Self {
			nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
			edges: edges.into_iter().collect(),
		}
	}

	/// Decodes an upload payload.
	pub fn from_json(payload: &str) -> serde_json::Result<Self> {
		serde_json::from_str(payload)
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	/// Distinct environment tags across nodes and edges, sorted.
	pub fn environments(&self) -> Vec<String> {
		let envs: BTreeSet<&str> = self
			.nodes
			.values()
			.filter_map(|n| n.env.as_deref())
			.chain(self.edges.iter().filter_map(|e| e.env.as_deref()))
			.collect();
		envs.into_iter().map(str::to_owned).collect()
	}
}

#[derive(Serialize, Deserialize)]
struct GraphPayload {
	#[serde(default)]
	nodes: Vec<Node>,
	#[serde(default)]
	edges: Vec<Edge>,
}

impl From<GraphPayload> for Graph {
	fn from(payload: GraphPayload) -> Self {
		Graph::new(payload.nodes, payload.edges)
	}
}

impl From<Graph> for GraphPayload {
	fn from(graph: Graph) -> Self {
		GraphPayload {
			nodes: graph.nodes.into_values().collect(),
			edges: graph.edges,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn payload_with_nulls_and_omissions() {
		let graph = Graph::from_json(
			r#"{
				"nodes": [
					{"id": "a", "label": "API", "type": "service", "env": "prod",
					 "domain": null, "tags": null, "x": 10.0, "y": null},
					{"id": "b", "label": "Store", "type": "db"}
				],
				"edges": [
					{"id": "e1", "source": "a", "target": "b", "label": "reads",
					 "kind": "sync", "criticality": "high", "weight": null}
				]
			}"#,
		)
		.unwrap();

		let a = graph.node("a").unwrap();
		assert_eq!(a.env.as_deref(), Some("prod"));
		assert_eq!(a.domain, None);
		assert!(a.tags.is_empty());
		assert_eq!(a.fixed_position(), None);
		assert_eq!(graph.node("b").unwrap().category, Category::Db);
		assert_eq!(graph.edges[0].weight, DEFAULT_WEIGHT);
		assert!(graph.edges[0].tags.is_empty());
	}

	#[test]
	fn empty_strings_are_absent() {
		let graph = Graph::from_json(
			r#"{
				"nodes": [{"id": "a", "label": "A", "type": "db", "env": "", "domain": "", "tier": ""}],
				"edges": [{"id": "e1", "source": "a", "target": "a", "label": "l",
					"kind": "sync", "criticality": "low", "env": "", "protocol": ""}]
			}"#,
		)
		.unwrap();
		let a = graph.node("a").unwrap();
		assert_eq!((&a.env, &a.domain, &a.tier), (&None, &None, &None));
		assert_eq!(graph.edges[0].env, None);
		assert_eq!(graph.edges[0].protocol, None);
	}

	#[test]
	fn unknown_enum_values_decode_to_unknown() {
		let graph = Graph::from_json(
			r#"{
				"nodes": [{"id": "a", "label": "A", "type": "lambda"}],
				"edges": [{"id": "e1", "source": "a", "target": "a", "label": "self",
					"kind": "batch", "criticality": "urgent", "weight": 2}]
			}"#,
		)
		.unwrap();
		assert_eq!(graph.node("a").unwrap().category, Category::Unknown);
		assert_eq!(graph.edges[0].kind, EdgeKind::Unknown);
		assert_eq!(graph.edges[0].criticality, Criticality::Unknown);
	}

	#[test]
	fn duplicate_node_ids_keep_first_slot_last_value() {
		let graph = Graph::new(
			[
				Node::new("a", "first", Category::Service),
				Node::new("b", "other", Category::Db),
				Node::new("a", "second", Category::Cache),
			],
			[],
		);
		let ids: Vec<_> = graph.nodes.keys().cloned().collect();
		assert_eq!(ids, ["a", "b"]);
		assert_eq!(graph.node("a").unwrap().label, "second");
	}

	#[test]
	fn environments_are_distinct_and_sorted() {
		let mut n1 = Node::new("n1", "n1", Category::Service);
		n1.env = Some("prod".into());
		let mut n2 = Node::new("n2", "n2", Category::Service);
		n2.env = Some("dev".into());
		let mut e1 = Edge::new("e1", "n1", "n2", "e", EdgeKind::Sync, Criticality::Low);
		e1.env = Some("stage".into());
		let mut e2 = e1.clone();
		e2.env = Some("prod".into());

		let graph = Graph::new([n1, n2], [e1, e2]);
		assert_eq!(graph.environments(), ["dev", "prod", "stage"]);
	}

	#[test]
	fn fixed_position_requires_both_axes() {
		let mut node = Node::new("n", "n", Category::Queue);
		node.x = Some(1.0);
		assert_eq!(node.fixed_position(), None);
		node.y = Some(2.0);
		assert_eq!(node.fixed_position(), Some((1.0, 2.0)));
	}

	#[test]
	fn known_values_parse() {
		assert_eq!(Category::parse("queue"), Some(Category::Queue));
		assert_eq!(Category::parse("unknown"), None);
		assert_eq!(EdgeKind::parse("stream"), Some(EdgeKind::Stream));
		assert_eq!(Criticality::parse("medium"), Some(Criticality::Medium));
		assert_eq!(Criticality::High.to_string(), "high");
	}
}
