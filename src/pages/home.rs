use leptos::prelude::*;

use crate::components::filter_panel::FilterPanel;
use crate::components::force_graph::ForceGraphCanvas;
use crate::components::legend::LegendView;
use crate::components::upload_panel::UploadPanel;
use crate::session::Session;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let session = RwSignal::new(Session::default());
	let has_graph = Memo::new(move |_| session.with(|s| s.graph().is_some()));
	// Recomputed from the original graph whenever the graph or a filter changes
	let render_model = Memo::new(move |_| session.with(Session::render_model));
	let model = Signal::derive(move || render_model.get().unwrap_or_default());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="header">
				<div class="container">
					<h1>"GraphML Visualizer"</h1>
					<p>"Upload and explore service graphs with interactive filtering"</p>
				</div>
			</div>

			<div class="container">
				<UploadPanel session=session />
				{move || {
					if has_graph.get() {
						view! {
							<FilterPanel session=session />
							<div class="graph-container">
								<h2>"Graph Visualization"</h2>
								<div id="graph-visualization">
									<ForceGraphCanvas model=model height=Some(600.0) />
								</div>
								<LegendView />
							</div>
						}
							.into_any()
					} else {
						view! {
							<div class="card empty-state">
								<h3>"No Graph Loaded"</h3>
								<p>
									"Upload a GraphML file to get started. The file should contain nodes and edges definitions."
								</p>
								<p class="hint">
									"Node types: service, db, cache, queue, external. Edge kinds: sync, async, stream."
								</p>
							</div>
						}
							.into_any()
					}
				}}
			</div>
		</ErrorBoundary>
	}
}
