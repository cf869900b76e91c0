use force_graph::DefaultNodeIdx;

use crate::graph::projection::{ColorToken, NodeStyle, Tooltip, VisualEdge, VisualNode};

/// Approximate glyph advance relative to font size, used to size boxes
/// before a canvas context is available.
const GLYPH_WIDTH: f64 = 0.6;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub color: ColorToken,
	pub highlight: ColorToken,
	pub tooltip: Tooltip,
	pub half_width: f64,
	pub half_height: f64,
}

impl NodeInfo {
	pub fn new(node: &VisualNode, style: &NodeStyle) -> Self {
		let text = node.label.chars().count() as f64 * style.font_size * GLYPH_WIDTH;
		let width = (text + 2.0 * style.margin).min(style.max_width);
		let height = style.font_size + 2.0 * style.margin;
		Self {
			id: node.id.clone(),
			label: node.label.clone(),
			color: node.color,
			highlight: node.highlight,
			tooltip: node.tooltip.clone(),
			half_width: width / 2.0,
			half_height: height / 2.0,
		}
	}

	/// Label shortened with an ellipsis to fit the box.
	pub fn display_label(&self, style: &NodeStyle) -> String {
		let room = ((self.half_width * 2.0 - 2.0 * style.margin) / (style.font_size * GLYPH_WIDTH)
			+ 1e-6)
			.floor()
			.max(1.0) as usize;
		if self.label.chars().count() <= room {
			self.label.clone()
		} else {
			let mut short: String = self.label.chars().take(room.saturating_sub(1)).collect();
			short.push('…');
			short
		}
	}
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub label: String,
	pub color: ColorToken,
	pub width: f64,
	pub tooltip: Tooltip,
}

impl EdgeInfo {
	pub fn new(edge: &VisualEdge, source: DefaultNodeIdx, target: DefaultNodeIdx) -> Self {
		Self {
			source,
			target,
			label: edge.label.clone(),
			color: edge.color,
			width: edge.width,
			tooltip: edge.tooltip.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::projection::RenderOptions;
	use crate::graph::{Category, Graph, Node, project};

	fn info(label: &str) -> (NodeInfo, NodeStyle) {
		let model = project(&Graph::new([Node::new("n", label, Category::Service)], []));
		let style = RenderOptions::default().nodes;
		(NodeInfo::new(&model.nodes[0], &style), style)
	}

	#[test]
	fn box_width_is_capped() {
		let (short, style) = info("api");
		assert!(short.half_width * 2.0 < style.max_width);
		let (long, style) = info(&"x".repeat(200));
		assert_eq!(long.half_width * 2.0, style.max_width);
		assert!(long.display_label(&style).ends_with('…'));
		assert_eq!(short.display_label(&style), "api");
	}
}
