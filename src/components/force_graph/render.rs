use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ForceGraphState;
use crate::graph::projection::Tooltip;

const BACKGROUND: &str = "#1a1a2e";
/// Thinnest edge drawn, in screen pixels.
const MIN_EDGE_WIDTH: f64 = 1.0;
const TOOLTIP_FONT: f64 = 13.0;
const TOOLTIP_PADDING: f64 = 8.0;
const TOOLTIP_LINE: f64 = 18.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Distance from a box center to its border along the unit direction.
fn box_offset(ux: f64, uy: f64, half_width: f64, half_height: f64) -> f64 {
	let tx = if ux.abs() > 1e-9 {
		half_width / ux.abs()
	} else {
		f64::MAX
	};
	let ty = if uy.abs() > 1e-9 {
		half_height / uy.abs()
	} else {
		f64::MAX
	};
	tx.min(ty)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	if !(state.drag.active && state.options.interaction.hide_edges_on_drag) {
		draw_edges(state, ctx);
	}
	draw_nodes(state, ctx);
	ctx.restore();
	if let Some(tooltip) = state.active_tooltip() {
		draw_tooltip(state, ctx, &tooltip);
	}
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let style = &state.options.edges;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();
	let positions = state.positions();
	let mut sizes = std::collections::HashMap::new();
	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		sizes.insert(node.index(), (info.half_width, info.half_height));
	});

	for (i, edge) in state.edges.iter().enumerate() {
		let (Some(&(x1, y1)), Some(&(x2, y2))) =
			(positions.get(&edge.source), positions.get(&edge.target))
		else {
			continue;
		};

		// Highlighted edges brighten and thicken, the rest dim
		let base_width = edge.width.max(MIN_EDGE_WIDTH / k);
		let (alpha, width) = if !has_highlight {
			(style.opacity, base_width)
		} else if state.is_edge_highlighted(i) {
			(
				style.opacity + (1.0 - style.opacity) * t,
				base_width * (1.0 + 0.3 * t),
			)
		} else {
			(style.opacity * (1.0 - 0.8 * t), base_width * (1.0 - 0.3 * t))
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(edge.color);
		ctx.set_fill_style_str(edge.color);
		ctx.set_line_width(width);
		let arrow_size = 16.0 * style.arrow_scale + width;
		let (hw, hh) = sizes.get(&edge.target).copied().unwrap_or((0.0, 0.0));

		if edge.source == edge.target {
			// Self-loop drawn above the node
			let r = hh.max(12.0);
			ctx.begin_path();
			let _ = ctx.arc(x1, y1 - hh - r * 0.6, r, 0.2 * PI, 0.8 * PI + PI);
			ctx.stroke();
			draw_label(state, ctx, &edge.label, x1, y1 - hh - r * 1.8);
			continue;
		}

		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let (shw, shh) = sizes.get(&edge.source).copied().unwrap_or((0.0, 0.0));
		let start = box_offset(ux, uy, shw, shh);
		let end = box_offset(ux, uy, hw, hh);
		if start + end >= dist {
			continue;
		}

		ctx.begin_path();
		ctx.move_to(x1 + ux * start, y1 + uy * start);
		ctx.line_to(x2 - ux * (end + arrow_size), y2 - uy * (end + arrow_size));
		ctx.stroke();

		let (tip_x, tip_y) = (x2 - ux * end, y2 - uy * end);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		draw_label(state, ctx, &edge.label, (x1 + x2) / 2.0, (y1 + y2) / 2.0);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_label(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, text: &str, x: f64, y: f64) {
	if text.is_empty() {
		return;
	}
	let style = &state.options.edges;
	ctx.set_font(&format!("{}px {}", style.font_size, state.options.nodes.font_face));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	if let Some(background) = style.label_background {
		let width = ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
		ctx.set_fill_style_str(background);
		ctx.fill_rect(
			x - width / 2.0 - 2.0,
			y - style.font_size / 2.0 - 1.0,
			width + 4.0,
			style.font_size + 2.0,
		);
	}
	ctx.set_fill_style_str(style.font_color);
	let _ = ctx.fill_text(text, x, y);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
	);
	let style = &state.options.nodes;

	// Dimmed nodes first so highlighted ones draw on top
	for highlighted_pass in [false, true] {
		state.graph.visit_nodes(|node| {
			let idx = node.index();
			let highlighted = has_highlight && state.is_highlighted(idx);
			if highlighted != highlighted_pass {
				return;
			}
			let info = &node.data.user_data;
			let (x, y) = (node.x() as f64, node.y() as f64);
			let hovered = highlighted && state.is_hovered(idx);
			let alpha = if has_highlight && !highlighted {
				1.0 - 0.7 * t
			} else {
				1.0
			};
			let (hw, hh) = (info.half_width, info.half_height);

			if hovered && t > 0.01 {
				let glow = hw.max(hh) * (1.4 + 0.6 * t);
				if let Ok(gradient) = ctx.create_radial_gradient(x, y, hh * 0.5, x, y, glow) {
					let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", 0.35 * t));
					let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
					ctx.begin_path();
					let _ = ctx.arc(x, y, glow, 0.0, 2.0 * PI);
					#[allow(deprecated)]
					ctx.set_fill_style(&gradient);
					ctx.fill();
				}
			}

			ctx.set_global_alpha(alpha);
			ctx.save();
			if let Some(shadow) = &style.shadow {
				ctx.set_shadow_color(shadow.color);
				ctx.set_shadow_blur(shadow.size);
				ctx.set_shadow_offset_x(shadow.offset.0);
				ctx.set_shadow_offset_y(shadow.offset.1);
			}
			ctx.set_fill_style_str(if hovered { info.highlight } else { info.color });
			ctx.begin_path();
			ctx.rect(x - hw, y - hh, hw * 2.0, hh * 2.0);
			ctx.fill();
			ctx.restore();

			ctx.set_stroke_style_str(info.highlight);
			ctx.set_line_width(if hovered {
				style.border_width_selected
			} else {
				style.border_width
			});
			ctx.stroke();

			ctx.set_fill_style_str(style.font_color);
			ctx.set_font(&format!("{}px {}", style.font_size, style.font_face));
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(&info.display_label(style), x, y);
			ctx.set_global_alpha(1.0);
		});
	}
}

fn draw_tooltip(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, tooltip: &Tooltip) {
	let face = state.options.nodes.font_face;
	let regular = format!("{TOOLTIP_FONT}px {face}");
	let bold = format!("bold {TOOLTIP_FONT}px {face}");
	let measure = |text: &str| ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);

	ctx.set_font(&bold);
	let mut width = measure(&tooltip.title).max(200.0);
	let lines: Vec<(String, String)> = tooltip
		.rows
		.iter()
		.map(|r| (format!("{}: ", r.field.label()), r.value.clone()))
		.collect();
	for (key, value) in &lines {
		ctx.set_font(&bold);
		let key_width = measure(key);
		ctx.set_font(&regular);
		width = width.max(key_width + measure(value));
	}
	let height = TOOLTIP_LINE * (lines.len() as f64 + 1.0) + 6.0 + 2.0 * TOOLTIP_PADDING;
	let box_width = width + 2.0 * TOOLTIP_PADDING;

	// Keep the box on screen
	let (px, py) = state.hover.pointer;
	let x = (px + 12.0).min(state.width - box_width - 4.0).max(4.0);
	let y = (py + 12.0).min(state.height - height - 4.0).max(4.0);

	ctx.set_fill_style_str("white");
	ctx.fill_rect(x, y, box_width, height);
	ctx.set_stroke_style_str("#dddddd");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, box_width, height);

	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	let (left, mut line_y) = (x + TOOLTIP_PADDING, y + TOOLTIP_PADDING);
	ctx.set_font(&bold);
	ctx.set_fill_style_str("#111827");
	let _ = ctx.fill_text(&tooltip.title, left, line_y);
	line_y += TOOLTIP_LINE;

	ctx.begin_path();
	ctx.move_to(left, line_y);
	ctx.line_to(left + width, line_y);
	ctx.stroke();
	line_y += 6.0;

	for (row, (key, value)) in tooltip.rows.iter().zip(&lines) {
		ctx.set_font(&bold);
		ctx.set_fill_style_str("#111827");
		let _ = ctx.fill_text(key, left, line_y);
		let key_width = measure(key);
		ctx.set_font(if row.color.is_some() { &bold } else { &regular });
		ctx.set_fill_style_str(row.color.unwrap_or("#374151"));
		let _ = ctx.fill_text(value, left + key_width, line_y);
		line_y += TOOLTIP_LINE;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn box_offset_hits_nearest_side() {
		assert_eq!(box_offset(1.0, 0.0, 30.0, 10.0), 30.0);
		assert_eq!(box_offset(0.0, -1.0, 30.0, 10.0), 10.0);
		let d = std::f64::consts::FRAC_1_SQRT_2;
		assert!((box_offset(d, d, 30.0, 10.0) - 10.0 / d).abs() < 1e-9);
	}

	#[test]
	fn easing_bounds() {
		assert_eq!(ease_out_cubic(0.0), 0.0);
		assert_eq!(ease_out_cubic(1.0), 1.0);
	}
}
