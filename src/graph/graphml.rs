//! GraphML decoding with the validation rules of the upload endpoint.
//!
//! Attribute values are read through `<key>` declarations (`attr.name`),
//! with `<default>` values applied to elements that omit them.

use std::collections::{HashMap, HashSet};

use roxmltree::{Document, Node as XmlNode};
use thiserror::Error;

use super::model::{Category, Criticality, DEFAULT_WEIGHT, Edge, EdgeKind, Graph, Node};

#[derive(Debug, Error)]
pub enum GraphmlError {
	#[error("Invalid XML: {0}")]
	InvalidXml(#[from] roxmltree::Error),

	#[error("Invalid GraphML: {0}")]
	InvalidGraphml(String),

	#[error("Node '{node}' missing required field: {field}")]
	MissingNodeField { node: String, field: &'static str },

	#[error("Node '{node}' has invalid type '{value}'. Allowed: {}", allowed(&Category::KNOWN.map(Category::as_str)))]
	InvalidNodeType { node: String, value: String },

	#[error("Edge {from}->{to} missing required field: {field}")]
	MissingEdgeField {
		from: String,
		to: String,
		field: &'static str,
	},

	#[error("Edge {from}->{to} has invalid {field} '{value}'. Allowed: {allowed}")]
	InvalidEdgeValue {
		from: String,
		to: String,
		field: &'static str,
		value: String,
		allowed: String,
	},
}

fn allowed(values: &[&str]) -> String {
	values.join(", ")
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Domain {
	Node,
	Edge,
}

struct KeyDef<'a> {
	name: &'a str,
	domain: Option<Domain>,
	default: Option<&'a str>,
}

/// `<key>` declarations by id.
struct Keys<'a>(HashMap<&'a str, KeyDef<'a>>);

impl<'a> Keys<'a> {
	fn collect(root: XmlNode<'a, '_>) -> Self {
		let defs = root
			.children()
			.filter(|n| n.has_tag_name("key"))
			.filter_map(|key| {
				let id = key.attribute("id")?;
				let domain = match key.attribute("for") {
					Some("node") => Some(Domain::Node),
					Some("edge") => Some(Domain::Edge),
					_ => None,
				};
				let default = key
					.children()
					.find(|n| n.has_tag_name("default"))
					.and_then(|n| n.text());
				Some((
					id,
					KeyDef {
						name: key.attribute("attr.name").unwrap_or(id),
						domain,
						default,
					},
				))
			})
			.collect();
		Self(defs)
	}

	/// Attribute map for one element: key defaults first, then its `<data>`.
	fn attributes(&self, element: XmlNode<'a, '_>, domain: Domain) -> HashMap<&'a str, &'a str> {
		let mut attrs: HashMap<&str, &str> = self
			.0
			.values()
			.filter(|k| k.domain.is_none_or(|d| d == domain))
			.filter_map(|k| Some((k.name, k.default?)))
			.collect();
		for data in element.children().filter(|n| n.has_tag_name("data")) {
			let Some(key) = data.attribute("key") else {
				continue;
			};
			let name = self.0.get(key).map_or(key, |k| k.name);
			attrs.insert(name, data.text().unwrap_or(""));
		}
		attrs
	}
}

/// Splits a comma-separated tag list, dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.map(str::to_owned)
		.collect()
}

fn to_float(raw: Option<&str>) -> Option<f64> {
	raw.and_then(|v| v.trim().parse().ok())
}

fn non_empty<'a>(attrs: &HashMap<&str, &'a str>, name: &str) -> Option<&'a str> {
	attrs.get(name).copied().filter(|v| !v.is_empty())
}

fn owned(attrs: &HashMap<&str, &str>, name: &str) -> Option<String> {
	non_empty(attrs, name).map(str::to_owned)
}

fn decode_node(id: &str, attrs: &HashMap<&str, &str>) -> Result<Node, GraphmlError> {
	let missing = |field| GraphmlError::MissingNodeField {
		node: id.to_owned(),
		field,
	};
	let label = non_empty(attrs, "label").ok_or_else(|| missing("label"))?;
	let raw_type = non_empty(attrs, "type").ok_or_else(|| missing("type"))?;
	let category = Category::parse(raw_type).ok_or_else(|| GraphmlError::InvalidNodeType {
		node: id.to_owned(),
		value: raw_type.to_owned(),
	})?;

	Ok(Node {
		id: id.to_owned(),
		label: label.to_owned(),
		category,
		env: owned(attrs, "env"),
		domain: owned(attrs, "domain"),
		tier: owned(attrs, "tier"),
		tags: attrs.get("tags").map(|t| parse_tags(t)).unwrap_or_default(),
		x: to_float(attrs.get("x").copied()),
		y: to_float(attrs.get("y").copied()),
	})
}

fn decode_edge(
	index: usize,
	source: &str,
	target: &str,
	attrs: &HashMap<&str, &str>,
) -> Result<Edge, GraphmlError> {
	let missing = |field| GraphmlError::MissingEdgeField {
		from: source.to_owned(),
		to: target.to_owned(),
		field,
	};
	let invalid = |field, value: &str, allowed_values: &[&str]| GraphmlError::InvalidEdgeValue {
		from: source.to_owned(),
		to: target.to_owned(),
		field,
		value: value.to_owned(),
		allowed: allowed(allowed_values),
	};

	let label = non_empty(attrs, "label").ok_or_else(|| missing("label"))?;
	let raw_kind = non_empty(attrs, "kind").ok_or_else(|| missing("kind"))?;
	let raw_crit = non_empty(attrs, "criticality").ok_or_else(|| missing("criticality"))?;
	let kind = EdgeKind::parse(raw_kind)
		.ok_or_else(|| invalid("kind", raw_kind, &EdgeKind::KNOWN.map(EdgeKind::as_str)))?;
	let criticality = Criticality::parse(raw_crit).ok_or_else(|| {
		invalid(
			"criticality",
			raw_crit,
			&Criticality::KNOWN.map(Criticality::as_str),
		)
	})?;

	Ok(Edge {
		id: format!("e{index}"),
		source: source.to_owned(),
		target: target.to_owned(),
		label: label.to_owned(),
		kind,
		criticality,
		protocol: owned(attrs, "protocol"),
		weight: to_float(attrs.get("weight").copied()).unwrap_or(DEFAULT_WEIGHT),
		env: owned(attrs, "env"),
		tags: attrs.get("tags").map(|t| parse_tags(t)).unwrap_or_default(),
	})
}

/// Decodes a GraphML document into a validated graph.
///
/// Nodes must carry `label` and a known `type`; edges must carry `label`,
/// a known `kind` and a known `criticality`. An edge endpoint with no
/// `<node>` element is an implicit node without data, so it fails the node
/// checks. All nodes are checked before any edge. Edge ids are assigned
/// `e1, e2, ...` in document order.
pub fn parse(text: &str) -> Result<Graph, GraphmlError> {
	let doc = Document::parse(text)?;
	let root = doc.root_element();
	if !root.has_tag_name("graphml") {
		return Err(GraphmlError::InvalidGraphml(format!(
			"expected <graphml> root, found <{}>",
			root.tag_name().name()
		)));
	}
	let keys = Keys::collect(root);
	let graph = root
		.children()
		.find(|n| n.has_tag_name("graph"))
		.ok_or_else(|| GraphmlError::InvalidGraphml("no <graph> element".into()))?;

	let mut nodes = Vec::new();
	for element in graph.children().filter(|n| n.has_tag_name("node")) {
		let id = element
			.attribute("id")
			.ok_or_else(|| GraphmlError::InvalidGraphml("<node> without id".into()))?;
		nodes.push(decode_node(id, &keys.attributes(element, Domain::Node))?);
	}
	let mut node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

	let mut endpoints = Vec::new();
	for element in graph.children().filter(|n| n.has_tag_name("edge")) {
		let (Some(source), Some(target)) = (element.attribute("source"), element.attribute("target"))
		else {
			return Err(GraphmlError::InvalidGraphml(
				"<edge> without source or target".into(),
			));
		};
		for id in [source, target] {
			if node_ids.insert(id) {
				decode_node(id, &HashMap::new())?;
			}
		}
		endpoints.push((element, source, target));
	}

	let mut edges = Vec::with_capacity(endpoints.len());
	for (i, (element, source, target)) in endpoints.into_iter().enumerate() {
		edges.push(decode_edge(
			i + 1,
			source,
			target,
			&keys.attributes(element, Domain::Edge),
		)?);
	}

	Ok(Graph::new(nodes, edges))
}
