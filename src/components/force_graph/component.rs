use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window,
};

use super::render;
use super::state::{FRAME_DT, ForceGraphState, KEY_PAN_STEP, RenderEngine};
use crate::graph::RenderModel;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;

/// Stop flag for the animation loop, raised when the canvas unmounts.
///
/// The frame callback holds a reference to itself, so the loop has to tear
/// itself down on the next frame after this is set.
#[derive(Clone, Debug, Default)]
struct LoopGuard(Arc<AtomicBool>);

impl LoopGuard {
	fn stop(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	fn is_stopped(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn local_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Force-directed canvas view of a render model.
///
/// The scene is rebuilt whenever `model` changes; fixed positions are kept,
/// everything else is laid out by the simulation.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] model: Signal<RenderModel>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());
	let guard = LoopGuard::default();
	let guard_cleanup = guard.clone();
	on_cleanup(move || guard_cleanup.stop());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.filter(|h| *h > 0.0)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("canvas 2d context unavailable");
				return;
			}
		};
		*state_init.borrow_mut() = Some(ForceGraphState::new(&model.get_untracked(), w, h));

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner, resize_anim) =
			(state_init.clone(), animate_init.clone(), resize_cb_init.clone());
		let guard = guard.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if guard.is_stopped() {
				*state_anim.borrow_mut() = None;
				if let (Some(cb), Some(win)) = (resize_anim.borrow_mut().take(), web_sys::window()) {
					let _ = win
						.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
				// Breaks the self reference; wasm-bindgen frees it once this call returns
				drop(animate_inner.borrow_mut().take());
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(FRAME_DT);
				}
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Rebuild the scene on every new model
	let state_model = state.clone();
	Effect::new(move |_| {
		let next = model.get();
		if let Some(ref mut s) = *state_model.borrow_mut() {
			s.load(&next);
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.hover.pointer = (x, y);
			if !s.drag.active {
				let hovered = s.target_at_position(x, y);
				s.set_hover(hovered);
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_by(factor, x, y);
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if let Some(ref mut s) = *state_kd.borrow_mut() {
			if !s.options.interaction.keyboard {
				return;
			}
			let (cx, cy) = (s.width / 2.0, s.height / 2.0);
			match ev.key().as_str() {
				"ArrowLeft" => s.pan_by(KEY_PAN_STEP, 0.0),
				"ArrowRight" => s.pan_by(-KEY_PAN_STEP, 0.0),
				"ArrowUp" => s.pan_by(0.0, KEY_PAN_STEP),
				"ArrowDown" => s.pan_by(0.0, -KEY_PAN_STEP),
				"+" | "=" => s.zoom_by(1.1, cx, cy),
				"-" | "_" => s.zoom_by(0.9, cx, cy),
				"0" => s.fit(),
				_ => return,
			}
			ev.prevent_default();
		}
	};

	let show_buttons = model.with_untracked(|m| m.options.interaction.navigation_buttons);
	let nav = move |action: fn(&mut ForceGraphState)| {
		let state = state.clone();
		move |_: MouseEvent| {
			if let Some(ref mut s) = *state.borrow_mut() {
				action(s);
			}
		}
	};
	let zoom_in = nav(|s| s.zoom_by(1.2, s.width / 2.0, s.height / 2.0));
	let zoom_out = nav(|s| s.zoom_by(1.0 / 1.2, s.width / 2.0, s.height / 2.0));
	let fit = nav(ForceGraphState::fit);

	view! {
		<div class="force-graph" style="position: relative;">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: grab; outline: none;"
			/>
			{show_buttons
				.then(|| {
					view! {
						<div class="graph-nav" style="position: absolute; right: 12px; bottom: 12px;">
							<button title="Zoom in" on:click=zoom_in>"+"</button>
							<button title="Zoom out" on:click=zoom_out>"−"</button>
							<button title="Fit" on:click=fit>"⤢"</button>
						</div>
					}
				})}
		</div>
	}
}
