//! Turns a filtered graph into the render model consumed by a rendering
//! engine: visual records, tooltip payloads, colors and the static options
//! block.

use super::model::{Category, Criticality, Edge, Graph, Node};

/// A CSS color string.
pub type ColorToken = &'static str;

/// Token for any category or criticality outside the known set.
pub const FALLBACK_COLOR: ColorToken = "#6b7280";

/// Edge width per unit of weight.
pub const EDGE_WIDTH_SCALE: f64 = 1.5;

/// Static color lookups for categories and criticality levels.
pub struct Palette;

impl Palette {
	pub fn category(category: Category) -> ColorToken {
		match category {
			Category::Service => "#2563eb",
			Category::Db => "#16a34a",
			Category::Cache => "#22c55e",
			Category::Queue => "#a855f7",
			Category::External => "#6b7280",
			Category::Unknown => FALLBACK_COLOR,
		}
	}

	/// Fill used while a node of this category is hovered or selected.
	pub fn category_highlight(category: Category) -> ColorToken {
		match category {
			Category::Service => "#1d4ed8",
			Category::Db => "#15803d",
			Category::Cache => "#16a34a",
			Category::Queue => "#9333ea",
			Category::External => "#4b5563",
			Category::Unknown => "#4b5563",
		}
	}

	pub fn criticality(criticality: Criticality) -> ColorToken {
		match criticality {
			Criticality::High => "#dc2626",
			Criticality::Medium => "#f59e0b",
			Criticality::Low => "#10b981",
			Criticality::Unknown => FALLBACK_COLOR,
		}
	}
}

/// Attribute shown on a tooltip row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TooltipField {
	Type,
	Env,
	Domain,
	Tier,
	Tags,
	Kind,
	Criticality,
	Protocol,
	Weight,
}

impl TooltipField {
	pub fn label(self) -> &'static str {
		match self {
			TooltipField::Type => "Type",
			TooltipField::Env => "Env",
			TooltipField::Domain => "Domain",
			TooltipField::Tier => "Tier",
			TooltipField::Tags => "Tags",
			TooltipField::Kind => "Kind",
			TooltipField::Criticality => "Criticality",
			TooltipField::Protocol => "Protocol",
			TooltipField::Weight => "Weight",
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct TooltipRow {
	pub field: TooltipField,
	pub value: String,
	/// Emphasis color for the value, if any.
	pub color: Option<ColorToken>,
}

/// Hover content: a bold title followed by attribute rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tooltip {
	pub title: String,
	pub rows: Vec<TooltipRow>,
}

impl Tooltip {
	fn new(title: &str) -> Self {
		Self {
			title: title.to_owned(),
			rows: Vec::new(),
		}
	}

	fn row(mut self, field: TooltipField, value: impl Into<String>) -> Self {
		self.rows.push(TooltipRow {
			field,
			value: value.into(),
			color: None,
		});
		self
	}

	fn colored_row(mut self, field: TooltipField, value: impl Into<String>, color: ColorToken) -> Self {
		self.rows.push(TooltipRow {
			field,
			value: value.into(),
			color: Some(color),
		});
		self
	}

	fn optional_row(self, field: TooltipField, value: Option<&str>) -> Self {
		match value {
			Some(v) if !v.is_empty() => self.row(field, v),
			_ => self,
		}
	}

	fn tags_row(self, tags: &[String]) -> Self {
		if tags.is_empty() {
			self
		} else {
			self.row(TooltipField::Tags, tags.join(", "))
		}
	}

	/// Looks up the value of a row by field.
	pub fn get(&self, field: TooltipField) -> Option<&str> {
		self.rows
			.iter()
			.find(|r| r.field == field)
			.map(|r| r.value.as_str())
	}

	pub fn fields(&self) -> Vec<TooltipField> {
		self.rows.iter().map(|r| r.field).collect()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
	pub id: String,
	pub label: String,
	/// Grouping key; selects `color` and `highlight`.
	pub category: Category,
	pub color: ColorToken,
	pub highlight: ColorToken,
	/// Pinned coordinate. `None` leaves placement to the layout engine.
	pub position: Option<(f64, f64)>,
	pub tooltip: Tooltip,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualEdge {
	pub id: String,
	pub from: String,
	pub to: String,
	pub label: String,
	/// `weight * EDGE_WIDTH_SCALE`; the engine applies its own minimum.
	pub width: f64,
	pub color: ColorToken,
	pub tooltip: Tooltip,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsOptions {
	pub enabled: bool,
	/// Simulation steps run before the first frame.
	pub stabilization_iterations: u32,
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShadowOptions {
	pub color: ColorToken,
	pub size: f64,
	pub offset: (f64, f64),
}

/// Nodes are drawn as labelled boxes.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStyle {
	pub margin: f64,
	pub max_width: f64,
	pub border_width: f64,
	pub border_width_selected: f64,
	pub font_size: f64,
	pub font_face: &'static str,
	pub font_color: ColorToken,
	pub shadow: Option<ShadowOptions>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeStyle {
	pub arrow_scale: f64,
	pub opacity: f64,
	pub font_size: f64,
	pub font_color: ColorToken,
	pub label_background: Option<ColorToken>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InteractionOptions {
	pub hover: bool,
	pub navigation_buttons: bool,
	pub keyboard: bool,
	pub tooltip_delay_ms: u32,
	pub hide_edges_on_drag: bool,
}

/// Layout, style and interaction settings. Constant for every graph.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
	pub physics: PhysicsOptions,
	pub nodes: NodeStyle,
	pub edges: EdgeStyle,
	pub interaction: InteractionOptions,
	/// Seed for initial placement of unpinned nodes.
	pub random_seed: u64,
}

impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			physics: PhysicsOptions {
				enabled: true,
				stabilization_iterations: 200,
				force_charge: 150.0,
				force_spring: 0.05,
				force_max: 100.0,
				node_speed: 3000.0,
				damping_factor: 0.9,
			},
			nodes: NodeStyle {
				margin: 10.0,
				max_width: 200.0,
				border_width: 2.0,
				border_width_selected: 3.0,
				font_size: 14.0,
				font_face: "system-ui",
				font_color: "#ffffff",
				shadow: Some(ShadowOptions {
					color: "rgba(0,0,0,0.2)",
					size: 10.0,
					offset: (5.0, 5.0),
				}),
			},
			edges: EdgeStyle {
				arrow_scale: 0.5,
				opacity: 0.8,
				font_size: 12.0,
				font_color: "#1f2937",
				label_background: Some("white"),
			},
			interaction: InteractionOptions {
				hover: true,
				navigation_buttons: true,
				keyboard: true,
				tooltip_delay_ms: 200,
				hide_edges_on_drag: true,
			},
			random_seed: 42,
		}
	}
}

/// Everything a rendering engine needs to draw one graph.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderModel {
	pub nodes: Vec<VisualNode>,
	pub edges: Vec<VisualEdge>,
	pub options: RenderOptions,
}

impl Default for RenderModel {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
			options: RenderOptions::default(),
		}
	}
}

pub fn node_tooltip(node: &Node) -> Tooltip {
	Tooltip::new(&node.label)
		.row(TooltipField::Type, node.category.as_str())
		.optional_row(TooltipField::Env, node.env.as_deref())
		.optional_row(TooltipField::Domain, node.domain.as_deref())
		.optional_row(TooltipField::Tier, node.tier.as_deref())
		.tags_row(&node.tags)
}

pub fn edge_tooltip(edge: &Edge) -> Tooltip {
	Tooltip::new(&edge.label)
		.row(TooltipField::Kind, edge.kind.as_str())
		.colored_row(
			TooltipField::Criticality,
			edge.criticality.as_str(),
			Palette::criticality(edge.criticality),
		)
		.optional_row(TooltipField::Protocol, edge.protocol.as_deref())
		.row(TooltipField::Weight, edge.weight.to_string())
		.optional_row(TooltipField::Env, edge.env.as_deref())
		.tags_row(&edge.tags)
}

fn visual_node(node: &Node) -> VisualNode {
	VisualNode {
		id: node.id.clone(),
		label: node.label.clone(),
		category: node.category,
		color: Palette::category(node.category),
		highlight: Palette::category_highlight(node.category),
		position: node.fixed_position(),
		tooltip: node_tooltip(node),
	}
}

fn visual_edge(edge: &Edge) -> VisualEdge {
	VisualEdge {
		id: edge.id.clone(),
		from: edge.source.clone(),
		to: edge.target.clone(),
		label: edge.label.clone(),
		width: edge.weight.max(0.0) * EDGE_WIDTH_SCALE,
		color: Palette::criticality(edge.criticality),
		tooltip: edge_tooltip(edge),
	}
}

/// Builds the render model for an already filtered graph.
pub fn project(graph: &Graph) -> RenderModel {
	RenderModel {
		nodes: graph.nodes.values().map(visual_node).collect(),
		edges: graph.edges.iter().map(visual_edge).collect(),
		options: RenderOptions::default(),
	}
}

/// What a legend swatch describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegendKind {
	Category(Category),
	Criticality(Criticality),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
	pub kind: LegendKind,
	pub label: &'static str,
	pub color: ColorToken,
}

fn category_label(category: Category) -> Option<&'static str> {
	match category {
		Category::Service => Some("Service"),
		Category::Db => Some("Database"),
		Category::Cache => Some("Cache"),
		Category::Queue => Some("Queue"),
		Category::External => Some("External"),
		Category::Unknown => None,
	}
}

fn criticality_label(level: Criticality) -> Option<&'static str> {
	match level {
		Criticality::High => Some("Critical"),
		Criticality::Medium => Some("Medium"),
		Criticality::Low => Some("Low"),
		Criticality::Unknown => None,
	}
}

/// Legend swatches: the five categories, then criticality high to low.
/// `Unknown` has no swatch.
pub fn legend() -> Vec<LegendEntry> {
	let categories = Category::KNOWN.into_iter().filter_map(|c| {
		Some(LegendEntry {
			kind: LegendKind::Category(c),
			label: category_label(c)?,
			color: Palette::category(c),
		})
	});
	let levels = Criticality::KNOWN.into_iter().filter_map(|c| {
		Some(LegendEntry {
			kind: LegendKind::Criticality(c),
			label: criticality_label(c)?,
			color: Palette::criticality(c),
		})
	});
	categories.chain(levels).collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::graph::model::EdgeKind;

	#[test]
	fn bare_node_tooltip_omits_optional_rows() {
		let node = Node::new("n1", "Orders", Category::Service);
		let tip = node_tooltip(&node);
		assert_eq!(tip.title, "Orders");
		assert_eq!(tip.fields(), [TooltipField::Type]);
		assert_eq!(tip.get(TooltipField::Type), Some("service"));
	}

	#[test]
	fn blank_attributes_are_omitted() {
		let mut node = Node::new("n1", "Orders", Category::Service);
		node.domain = Some(String::new());
		node.env = Some("prod".into());
		assert_eq!(
			node_tooltip(&node).fields(),
			[TooltipField::Type, TooltipField::Env]
		);

		let graph = Graph::from_json(
			r#"{"nodes": [{"id": "n", "label": "N", "type": "db", "domain": ""}], "edges": []}"#,
		)
		.unwrap();
		let model = project(&graph);
		assert_eq!(model.nodes[0].tooltip.get(TooltipField::Domain), None);
	}

	#[test]
	fn full_node_tooltip_keeps_order() {
		let mut node = Node::new("n1", "Orders", Category::Db);
		node.tags = vec!["pii".into(), "core".into()];
		node.tier = Some("1".into());
		node.env = Some("prod".into());
		node.domain = Some("sales".into());
		let tip = node_tooltip(&node);
		assert_eq!(
			tip.fields(),
			[
				TooltipField::Type,
				TooltipField::Env,
				TooltipField::Domain,
				TooltipField::Tier,
				TooltipField::Tags
			]
		);
		assert_eq!(tip.get(TooltipField::Tags), Some("pii, core"));
	}

	#[test]
	fn edge_tooltip_rows_and_criticality_color() {
		let mut edge = Edge::new("e1", "a", "b", "writes", EdgeKind::Async, Criticality::High);
		edge.protocol = Some("grpc".into());
		edge.weight = 2.5;
		let tip = edge_tooltip(&edge);
		assert_eq!(
			tip.fields(),
			[
				TooltipField::Kind,
				TooltipField::Criticality,
				TooltipField::Protocol,
				TooltipField::Weight
			]
		);
		assert_eq!(tip.rows[1].color, Some("#dc2626"));
		assert_eq!(tip.get(TooltipField::Weight), Some("2.5"));
	}

	#[test]
	fn edge_width_scales_with_weight() {
		let mut edge = Edge::new("e1", "a", "b", "x", EdgeKind::Sync, Criticality::Low);
		edge.weight = 4.0;
		assert_eq!(visual_edge(&edge).width, 6.0);
		edge.weight = 0.0;
		assert_eq!(visual_edge(&edge).width, 0.0);
		edge.weight = -3.0;
		assert_eq!(visual_edge(&edge).width, 0.0);
	}

	#[test]
	fn unknown_values_use_fallback() {
		let node = Node::new("n", "n", Category::Unknown);
		let edge = Edge::new("e", "n", "n", "e", EdgeKind::Unknown, Criticality::Unknown);
		let model = project(&Graph::new([node], [edge]));
		assert_eq!(model.nodes[0].color, FALLBACK_COLOR);
		assert_eq!(model.edges[0].color, FALLBACK_COLOR);
	}

	#[test]
	fn position_needs_both_axes() {
		let mut pinned = Node::new("p", "p", Category::Cache);
		pinned.x = Some(3.0);
		pinned.y = Some(4.0);
		let mut half = Node::new("h", "h", Category::Cache);
		half.y = Some(4.0);
		let model = project(&Graph::new([pinned, half], []));
		assert_eq!(model.nodes[0].position, Some((3.0, 4.0)));
		assert_eq!(model.nodes[1].position, None);
	}

	#[test]
	fn options_do_not_depend_on_graph() {
		let empty = project(&Graph::default());
		let one = project(&Graph::new([Node::new("a", "a", Category::Queue)], []));
		assert_eq!(empty.options, one.options);
		assert_eq!(empty.options, RenderOptions::default());
	}

	#[test]
	fn legend_order() {
		let labels: Vec<_> = legend().into_iter().map(|e| e.label).collect();
		assert_eq!(
			labels,
			["Service", "Database", "Cache", "Queue", "External", "Critical", "Medium", "Low"]
		);
	}

	#[test]
	fn unknown_values_have_no_legend_label() {
		assert_eq!(category_label(Category::Unknown), None);
		assert_eq!(criticality_label(Criticality::Unknown), None);
		assert!(legend().iter().all(|e| !matches!(
			e.kind,
			LegendKind::Category(Category::Unknown) | LegendKind::Criticality(Criticality::Unknown)
		)));
	}
}
