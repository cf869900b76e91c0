use leptos::prelude::*;

use crate::graph::projection::legend;

/// Color key for node categories and edge criticality.
#[component]
pub fn LegendView() -> impl IntoView {
	view! {
		<div class="legend">
			{legend()
				.into_iter()
				.map(|entry| {
					view! {
						<div class="legend-item">
							<div
								class="legend-color"
								style:background-color=entry.color
							/>
							<span>{entry.label}</span>
						</div>
					}
				})
				.collect_view()}
		</div>
	}
}
