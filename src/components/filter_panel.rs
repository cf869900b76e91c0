use leptos::prelude::*;

use crate::graph::{Category, Criticality, Selector};
use crate::session::Session;

fn category_label(category: Category) -> &'static str {
	match category {
		Category::Service => "Service",
		Category::Db => "Database",
		Category::Cache => "Cache",
		Category::Queue => "Queue",
		Category::External => "External",
		Category::Unknown => "Unknown",
	}
}

fn criticality_label(criticality: Criticality) -> &'static str {
	match criticality {
		Criticality::High => "High",
		Criticality::Medium => "Medium",
		Criticality::Low => "Low",
		Criticality::Unknown => "Unknown",
	}
}

/// Environment, category and criticality selectors plus the tag search.
///
/// Each control writes one field of the session filter; the tag field
/// updates on every keystroke.
#[component]
pub fn FilterPanel(session: RwSignal<Session>) -> impl IntoView {
	let env_options = Memo::new(move |_| session.with(Session::environment_options));

	view! {
		<div class="card">
			<h2>"Filters"</h2>
			<div class="filters-section">
				<div class="filter-group">
					<label for="env-filter">"Environment"</label>
					<select
						id="env-filter"
						prop:value=move || session.with(|s| s.filter.environment.control().to_owned())
						on:change=move |ev| {
							let value = event_target_value(&ev);
							session.update(|s| s.filter.environment = Selector::from_control(&value));
						}
					>
						<option value="all">"All"</option>
						{move || {
							env_options
								.get()
								.into_iter()
								.map(|(value, label)| view! { <option value=value>{label}</option> })
								.collect_view()
						}}
					</select>
				</div>

				<div class="filter-group">
					<label for="type-filter">"Node Type"</label>
					<select
						id="type-filter"
						prop:value=move || session.with(|s| s.filter.category.control().to_owned())
						on:change=move |ev| {
							let value = event_target_value(&ev);
							session.update(|s| s.filter.category = Selector::from_control(&value));
						}
					>
						<option value="all">"All"</option>
						{Category::KNOWN
							.into_iter()
							.map(|c| view! { <option value=c.as_str()>{category_label(c)}</option> })
							.collect_view()}
					</select>
				</div>

				<div class="filter-group">
					<label for="criticality-filter">"Edge Criticality"</label>
					<select
						id="criticality-filter"
						prop:value=move || session.with(|s| s.filter.criticality.control().to_owned())
						on:change=move |ev| {
							let value = event_target_value(&ev);
							session.update(|s| s.filter.criticality = Selector::from_control(&value));
						}
					>
						<option value="all">"All"</option>
						{Criticality::KNOWN
							.into_iter()
							.map(|c| view! { <option value=c.as_str()>{criticality_label(c)}</option> })
							.collect_view()}
					</select>
				</div>

				<div class="filter-group">
					<label for="tag-search">"Search Tags"</label>
					<input
						id="tag-search"
						type="text"
						placeholder="Search by tag..."
						prop:value=move || session.with(|s| s.filter.tag_query.clone())
						on:input=move |ev| {
							let value = event_target_value(&ev);
							session.update(|s| s.filter.tag_query = value);
						}
					/>
				</div>
			</div>
		</div>
	}
}
