use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use super::types::{EdgeInfo, NodeInfo};
use crate::graph::projection::{RenderModel, RenderOptions, Tooltip};

/// Simulation step used for stabilization and animation frames.
pub const FRAME_DT: f32 = 0.016;
/// Edge pick distance in world units.
pub const EDGE_HIT_DISTANCE: f64 = 6.0;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Screen pixels moved per arrow key press.
pub const KEY_PAN_STEP: f64 = 40.0;

/// A consumer of render models. Any engine that can draw a `RenderModel`
/// can stand in for the force-directed canvas.
pub trait RenderEngine {
	/// Replaces whatever is displayed with `model`.
	fn load(&mut self, model: &RenderModel);
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// What the pointer is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	Node(DefaultNodeIdx),
	Edge(usize),
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub target: Option<HoverTarget>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	/// Pointer position in screen space, for tooltip placement.
	pub pointer: (f64, f64),
	/// Seconds since the current target was entered.
	pub dwell_t: f64,
}

impl HoverState {
	pub fn node(&self) -> Option<DefaultNodeIdx> {
		match self.target {
			Some(HoverTarget::Node(idx)) => Some(idx),
			_ => None,
		}
	}

	pub fn edge(&self) -> Option<usize> {
		match self.target {
			Some(HoverTarget::Edge(i)) => Some(i),
			_ => None,
		}
	}
}

/// Deterministic pseudo-random value in `[0, 1)`.
fn rand_simple(seed: u64) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn simulation(options: &RenderOptions) -> SimulationParameters {
	SimulationParameters {
		force_charge: options.physics.force_charge,
		force_spring: options.physics.force_spring,
		force_max: options.physics.force_max,
		node_speed: options.physics.node_speed,
		damping_factor: options.physics.damping_factor,
	}
}

/// Distance from `(px, py)` to the segment `(x1, y1)-(x2, y2)`.
pub fn segment_distance(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (x1 + t * dx, y1 + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub edges: Vec<EdgeInfo>,
	pub options: RenderOptions,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
}

impl ForceGraphState {
	pub fn new(model: &RenderModel, width: f64, height: f64) -> Self {
		let mut state = Self {
			graph: ForceGraph::new(simulation(&model.options)),
			edges: Vec::new(),
			options: model.options.clone(),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
		};
		state.load(model);
		state
	}

	/// Node centers by index, in world space.
	pub fn positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut out = HashMap::new();
		self.graph.visit_nodes(|node| {
			out.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		out
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if dx.abs() <= info.half_width && dy.abs() <= info.half_height {
				found = Some(node.index());
			}
		});
		found
	}

	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let positions = self.positions();
		self.edges
			.iter()
			.enumerate()
			.filter_map(|(i, edge)| {
				let (x1, y1) = positions.get(&edge.source)?;
				let (x2, y2) = positions.get(&edge.target)?;
				let d = segment_distance(gx, gy, *x1, *y1, *x2, *y2);
				(d <= EDGE_HIT_DISTANCE.max(edge.width / 2.0)).then_some((i, d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	/// Nodes take precedence over edges.
	pub fn target_at_position(&self, sx: f64, sy: f64) -> Option<HoverTarget> {
		self.node_at_position(sx, sy)
			.map(HoverTarget::Node)
			.or_else(|| self.edge_at_position(sx, sy).map(HoverTarget::Edge))
	}

	pub fn set_hover(&mut self, target: Option<HoverTarget>) {
		if !self.options.interaction.hover || self.hover.target == target {
			return;
		}
		let was_hovering = self.hover.node();

		// Keep the old highlight around so it can fade out
		if was_hovering.is_some() && target.is_none() {
			self.hover.prev_node = was_hovering;
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.target = target;
		self.hover.neighbors.clear();
		self.hover.dwell_t = 0.0;

		match target {
			Some(HoverTarget::Node(idx)) => {
				for edge in &self.edges {
					if edge.source == idx {
						self.hover.neighbors.insert(edge.target);
					} else if edge.target == idx {
						self.hover.neighbors.insert(edge.source);
					}
				}
			}
			Some(HoverTarget::Edge(i)) => {
				if let Some(edge) = self.edges.get(i) {
					self.hover.neighbors.insert(edge.source);
					self.hover.neighbors.insert(edge.target);
				}
			}
			None => {}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node() == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node() == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.target.is_some() || self.hover.prev_node.is_some()
	}

	pub fn is_edge_highlighted(&self, i: usize) -> bool {
		if self.hover.edge() == Some(i) {
			return true;
		}
		let Some(edge) = self.edges.get(i) else {
			return false;
		};
		match self.hover.node().or(self.hover.prev_node) {
			Some(idx) => edge.source == idx || edge.target == idx,
			None => false,
		}
	}

	/// Tooltip for the hovered entity once the pointer has rested long enough.
	pub fn active_tooltip(&self) -> Option<Tooltip> {
		let delay = self.options.interaction.tooltip_delay_ms as f64 / 1000.0;
		if self.hover.dwell_t < delay || self.drag.active {
			return None;
		}
		match self.hover.target? {
			HoverTarget::Node(idx) => {
				let mut found = None;
				self.graph.visit_nodes(|node| {
					if node.index() == idx {
						found = Some(node.data.user_data.tooltip.clone());
					}
				});
				found
			}
			HoverTarget::Edge(i) => self.edges.get(i).map(|e| e.tooltip.clone()),
		}
	}

	/// Zooms by `factor` keeping the screen point `(cx, cy)` fixed.
	pub fn zoom_by(&mut self, factor: f64, cx: f64, cy: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = cx - (cx - self.transform.x) * ratio;
		self.transform.y = cy - (cy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Centers the view on all nodes and scales them to fit.
	pub fn fit(&mut self) {
		let (mut min_x, mut min_y, mut max_x, mut max_y) =
			(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			let (x, y) = (node.x() as f64, node.y() as f64);
			min_x = min_x.min(x - info.half_width);
			max_x = max_x.max(x + info.half_width);
			min_y = min_y.min(y - info.half_height);
			max_y = max_y.max(y + info.half_height);
		});
		if min_x > max_x {
			return;
		}
		let padding = 40.0;
		let (w, h) = ((max_x - min_x).max(1.0), (max_y - min_y).max(1.0));
		let k = ((self.width - 2.0 * padding) / w)
			.min((self.height - 2.0 * padding) / h)
			.clamp(MIN_ZOOM, MAX_ZOOM.min(1.5));
		self.transform.k = k;
		self.transform.x = self.width / 2.0 - (min_x + w / 2.0) * k;
		self.transform.y = self.height / 2.0 - (min_y + h / 2.0) * k;
	}

	pub fn tick(&mut self, dt: f32) {
		if self.options.physics.enabled {
			self.graph.update(dt);
		}
		self.hover.dwell_t += dt as f64;

		let (target, delay, speed) = if self.hover.target.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.target.is_some() {
			if self.hover.dwell_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

impl RenderEngine for ForceGraphState {
	fn load(&mut self, model: &RenderModel) {
		self.options = model.options.clone();
		self.graph = ForceGraph::new(simulation(&self.options));
		self.edges.clear();
		self.drag = DragState::default();
		self.hover = HoverState::default();

		let mut id_to_idx = HashMap::new();
		let count = model.nodes.len().max(1) as f64;
		let seed = self.options.random_seed;

		for (i, node) in model.nodes.iter().enumerate() {
			let (x, y, is_anchor) = match node.position {
				Some((x, y)) => (x as f32, y as f32, true),
				None => {
					let angle = (i as f64) * 2.0 * PI / count;
					let radius = 100.0 + 50.0 * rand_simple(seed + i as u64);
					(
						(radius * angle.cos()) as f32,
						(radius * angle.sin()) as f32,
						false,
					)
				}
			};
			let idx = self.graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor,
				user_data: NodeInfo::new(node, &self.options.nodes),
			});
			id_to_idx.insert(node.id.as_str(), idx);
		}

		for edge in &model.edges {
			if let (Some(&src), Some(&tgt)) = (
				id_to_idx.get(edge.from.as_str()),
				id_to_idx.get(edge.to.as_str()),
			) {
				if src != tgt {
					self.graph.add_edge(src, tgt, EdgeData::default());
				}
				self.edges.push(EdgeInfo::new(edge, src, tgt));
			}
		}

		if self.options.physics.enabled {
			for _ in 0..self.options.physics.stabilization_iterations {
				self.graph.update(FRAME_DT);
			}
		}
		self.fit();
		debug!(
			"render engine loaded {} nodes, {} edges",
			model.nodes.len(),
			self.edges.len()
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Category, Criticality, Edge, EdgeKind, Graph, Node, project};

	fn model() -> RenderModel {
		let mut pinned = Node::new("pinned", "Pinned", Category::Db);
		pinned.x = Some(300.0);
		pinned.y = Some(-120.0);
		let graph = Graph::new(
			[Node::new("free", "Free", Category::Service), pinned],
			[
				Edge::new("e1", "free", "pinned", "reads", EdgeKind::Sync, Criticality::High),
				Edge::new("e2", "free", "ghost", "lost", EdgeKind::Sync, Criticality::Low),
			],
		);
		project(&graph)
	}

	#[test]
	fn pinned_nodes_stay_put() {
		let state = ForceGraphState::new(&model(), 800.0, 600.0);
		let mut pinned = None;
		state.graph.visit_nodes(|node| {
			if node.data.user_data.id == "pinned" {
				pinned = Some((node.x(), node.y(), node.data.is_anchor));
			}
		});
		assert_eq!(pinned, Some((300.0, -120.0, true)));
	}

	#[test]
	fn unresolved_edges_are_skipped() {
		let state = ForceGraphState::new(&model(), 800.0, 600.0);
		assert_eq!(state.edges.len(), 1);
	}

	#[test]
	fn reload_replaces_scene() {
		let mut state = ForceGraphState::new(&model(), 800.0, 600.0);
		state.load(&RenderModel::default());
		assert!(state.edges.is_empty());
		assert!(state.positions().is_empty());
	}

	#[test]
	fn segment_distance_clamps_to_ends() {
		assert_eq!(segment_distance(0.0, 5.0, -10.0, 0.0, 10.0, 0.0), 5.0);
		assert_eq!(segment_distance(13.0, 4.0, -10.0, 0.0, 10.0, 0.0), 5.0);
		assert_eq!(segment_distance(3.0, 4.0, 0.0, 0.0, 0.0, 0.0), 5.0);
	}

	#[test]
	fn zoom_is_clamped() {
		let mut state = ForceGraphState::new(&RenderModel::default(), 800.0, 600.0);
		state.zoom_by(1000.0, 400.0, 300.0);
		assert_eq!(state.transform.k, MAX_ZOOM);
		state.zoom_by(0.0001, 400.0, 300.0);
		assert_eq!(state.transform.k, MIN_ZOOM);
	}

	#[test]
	fn tooltip_waits_for_delay() {
		let mut state = ForceGraphState::new(&model(), 800.0, 600.0);
		state.set_hover(Some(HoverTarget::Edge(0)));
		assert!(state.active_tooltip().is_none());
		for _ in 0..20 {
			state.tick(FRAME_DT);
		}
		assert_eq!(state.active_tooltip().map(|t| t.title), Some("reads".to_string()));
	}
}
