//! Turning a chosen file into a graph, and the messages shown when that fails.

use log::{info, warn};
use thiserror::Error;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::File;

use crate::graph::{Graph, graphml};

/// Shown when neither a detail nor a transport message is available.
pub const GENERIC_FAILURE: &str = "Failed to upload and parse file";

#[derive(Debug, Error)]
pub enum UploadError {
	/// The document was read but rejected; `detail` is shown verbatim.
	#[error("{detail}")]
	Rejected { detail: String },

	/// The file could not be read at all.
	#[error("{}", .0.as_deref().unwrap_or(GENERIC_FAILURE))]
	Transport(Option<String>),
}

impl UploadError {
	pub fn rejected(detail: impl Into<String>) -> Self {
		UploadError::Rejected {
			detail: detail.into(),
		}
	}

	/// The single string surfaced to the user: the rejection detail, else the
	/// transport message, else a generic message.
	pub fn display_message(&self) -> String {
		match self {
			UploadError::Rejected { detail } if !detail.is_empty() => detail.clone(),
			UploadError::Rejected { .. } => GENERIC_FAILURE.to_owned(),
			UploadError::Transport(Some(message)) if !message.is_empty() => message.clone(),
			UploadError::Transport(_) => GENERIC_FAILURE.to_owned(),
		}
	}
}

impl From<graphml::GraphmlError> for UploadError {
	fn from(err: graphml::GraphmlError) -> Self {
		UploadError::rejected(err.to_string())
	}
}

impl From<serde_json::Error> for UploadError {
	fn from(err: serde_json::Error) -> Self {
		UploadError::rejected(format!("Invalid JSON: {err}"))
	}
}

/// Decodes uploaded content, choosing the format by file extension.
///
/// `.graphml` goes through the GraphML decoder; `.json` is read as an
/// already converted `{nodes, edges}` payload. Extensions are matched
/// case-sensitively. Only zero-length content counts as empty; whitespace
/// is left for the decoder to reject.
pub fn decode(file_name: &str, content: &str) -> Result<Graph, UploadError> {
	let is_graphml = file_name.ends_with(".graphml");
	if !is_graphml && !file_name.ends_with(".json") {
		return Err(UploadError::rejected("File must have .graphml extension"));
	}
	if content.is_empty() {
		return Err(UploadError::rejected("Empty file"));
	}
	let graph = if is_graphml {
		graphml::parse(content)?
	} else {
		Graph::from_json(content)?
	};
	info!(
		"decoded {file_name}: {} nodes, {} edges",
		graph.node_count(),
		graph.edge_count()
	);
	Ok(graph)
}

fn js_message(err: JsValue) -> Option<String> {
	err.as_string().or_else(|| {
		js_sys::Reflect::get(&err, &JsValue::from_str("message"))
			.ok()
			.and_then(|m| m.as_string())
	})
}

/// Reads a browser file and decodes it.
pub async fn read_file(file: File) -> Result<Graph, UploadError> {
	let name = file.name();
	let text = JsFuture::from(file.text())
		.await
		.map_err(|e| UploadError::Transport(js_message(e)))?
		.as_string()
		.ok_or(UploadError::Transport(None))?;
	decode(&name, &text).inspect_err(|e| warn!("upload of {name} failed: {e}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_fallback_chain() {
		assert_eq!(
			UploadError::rejected("Empty file").display_message(),
			"Empty file"
		);
		assert_eq!(
			UploadError::Transport(Some("Network Error".into())).display_message(),
			"Network Error"
		);
		assert_eq!(UploadError::Transport(None).display_message(), GENERIC_FAILURE);
		assert_eq!(UploadError::rejected("").display_message(), GENERIC_FAILURE);
	}

	#[test]
	fn rejects_other_extensions() {
		let err = decode("graph.xml", "<graphml/>").unwrap_err();
		assert_eq!(err.display_message(), "File must have .graphml extension");
		let err = decode("GRAPH.GRAPHML", "<graphml/>").unwrap_err();
		assert_eq!(err.display_message(), "File must have .graphml extension");
	}

	#[test]
	fn rejects_empty_content() {
		let err = decode("graph.graphml", "").unwrap_err();
		assert_eq!(err.display_message(), "Empty file");
	}

	#[test]
	fn whitespace_reaches_the_decoder() {
		let err = decode("graph.graphml", "  \n").unwrap_err();
		assert!(err.display_message().starts_with("Invalid XML: "));
	}

	#[test]
	fn graphml_errors_become_details() {
		let err = decode("g.graphml", "<graphml><graph>").unwrap_err();
		assert!(err.display_message().starts_with("Invalid XML: "));
	}

	#[test]
	fn json_payloads_are_accepted() {
		let graph = decode(
			"export.json",
			r#"{"nodes":[{"id":"a","label":"A","type":"queue"}],"edges":[]}"#,
		)
		.unwrap();
		assert_eq!(graph.node_count(), 1);
	}

	#[test]
	fn single_node_graphml() {
		let graph = decode(
			"one.graphml",
			r#"<graphml><key id="l" for="node" attr.name="label"/>
			<key id="t" for="node" attr.name="type"/>
			<graph><node id="n"><data key="l">Solo</data><data key="t">external</data></node>
			</graph></graphml>"#,
		)
		.unwrap();
		assert_eq!(graph.node_count(), 1);
		assert_eq!(graph.edge_count(), 0);
	}
}
