use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::HtmlInputElement;

use crate::session::{Session, UploadStatus};
use crate::upload;

/// File picker plus the status line for the last upload.
#[component]
pub fn UploadPanel(session: RwSignal<Session>) -> impl IntoView {
	let on_change = move |ev: web_sys::Event| {
		let input = event_target::<HtmlInputElement>(&ev);
		let Some(file) = input.files().and_then(|files| files.get(0)) else {
			return;
		};
		session.update(|s| s.begin_upload(file.name()));
		spawn_local(async move {
			let result = upload::read_file(file).await;
			session.update(|s| s.finish_upload(result));
		});
	};

	let status = move || {
		session.with(|s| match &s.status {
			UploadStatus::Idle => None,
			UploadStatus::Loading { .. } => Some(view! {
				<span class="status-text loading">"Loading..."</span>
			}.into_any()),
			UploadStatus::Failed { message } => Some(view! {
				<span class="status-text error">"Error: " {message.clone()}</span>
			}.into_any()),
			UploadStatus::Loaded { file, nodes, edges } => Some(view! {
				<span class="status-text success">
					{format!("Loaded: {file} ({nodes} nodes, {edges} edges)")}
				</span>
			}.into_any()),
		})
	};

	view! {
		<div class="card">
			<h2>"Upload GraphML File"</h2>
			<div class="upload-section">
				<label for="file-input" class="file-label">"Choose File"</label>
				<input
					id="file-input"
					type="file"
					accept=".graphml,.json"
					on:change=on_change
					disabled=move || session.with(Session::is_loading)
				/>
				{status}
			</div>
		</div>
	}
}
