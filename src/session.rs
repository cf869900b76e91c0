//! Viewer state: the loaded graph, the active filters and the upload status.

use log::{info, warn};

use crate::graph::{FilterState, Graph, RenderModel, filter_graph, project};
use crate::upload::UploadError;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum UploadStatus {
	#[default]
	Idle,
	Loading {
		file: String,
	},
	Loaded {
		file: String,
		nodes: usize,
		edges: usize,
	},
	Failed {
		message: String,
	},
}

/// One viewer session. A new upload replaces the graph wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
	graph: Option<Graph>,
	pub filter: FilterState,
	pub status: UploadStatus,
}

impl Session {
	pub fn graph(&self) -> Option<&Graph> {
		self.graph.as_ref()
	}

	pub fn is_loading(&self) -> bool {
		matches!(self.status, UploadStatus::Loading { .. })
	}

	/// Drops the current graph and marks `file` as in flight.
	pub fn begin_upload(&mut self, file: impl Into<String>) {
		self.graph = None;
		self.status = UploadStatus::Loading { file: file.into() };
	}

	pub fn finish_upload(&mut self, result: Result<Graph, UploadError>) {
		let file = match &self.status {
			UploadStatus::Loading { file } => file.clone(),
			_ => String::new(),
		};
		match result {
			Ok(graph) => {
				info!(
					"loaded {file}: {} nodes, {} edges",
					graph.node_count(),
					graph.edge_count()
				);
				self.status = UploadStatus::Loaded {
					file,
					nodes: graph.node_count(),
					edges: graph.edge_count(),
				};
				self.graph = Some(graph);
			}
			Err(err) => {
				let message = err.display_message();
				warn!("upload failed: {message}");
				self.graph = None;
				self.status = UploadStatus::Failed { message };
			}
		}
	}

	/// The visible graph, filtered from the original. `None` without a graph.
	pub fn visible_graph(&self) -> Option<Graph> {
		self.graph.as_ref().map(|g| filter_graph(g, &self.filter))
	}

	pub fn render_model(&self) -> Option<RenderModel> {
		self.visible_graph().map(|g| project(&g))
	}

	/// Environment choices: the usual deployment stages plus any other
	/// environment present in the loaded graph.
	pub fn environment_options(&self) -> Vec<(String, String)> {
		let mut options: Vec<(String, String)> = [
			("prod", "Production"),
			("stage", "Staging"),
			("dev", "Development"),
		]
		.into_iter()
		.map(|(v, l)| (v.to_owned(), l.to_owned()))
		.collect();
		if let Some(graph) = &self.graph {
			for env in graph.environments() {
				if !options.iter().any(|(v, _)| *v == env) {
					options.push((env.clone(), env));
				}
			}
		}
		options
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Category, Criticality, Edge, EdgeKind, Node, Selector};

	fn graph() -> Graph {
		let mut a = Node::new("a", "A", Category::Service);
		a.env = Some("prod".into());
		let mut b = Node::new("b", "B", Category::Db);
		b.env = Some("qa".into());
		Graph::new(
			[a, b],
			[Edge::new("e1", "a", "b", "calls", EdgeKind::Sync, Criticality::High)],
		)
	}

	#[test]
	fn no_graph_no_model() {
		let session = Session::default();
		assert!(session.render_model().is_none());
		assert!(session.visible_graph().is_none());
	}

	#[test]
	fn successful_upload_installs_graph() {
		let mut session = Session::default();
		session.begin_upload("g.graphml");
		assert!(session.is_loading());
		session.finish_upload(Ok(graph()));
		assert_eq!(
			session.status,
			UploadStatus::Loaded {
				file: "g.graphml".into(),
				nodes: 2,
				edges: 1
			}
		);
		let model = session.render_model().unwrap();
		assert_eq!(model.nodes.len(), 2);
		assert_eq!(model.edges.len(), 1);
	}

	#[test]
	fn failed_upload_clears_previous_graph() {
		let mut session = Session::default();
		session.begin_upload("good.graphml");
		session.finish_upload(Ok(graph()));
		session.begin_upload("bad.graphml");
		assert!(session.graph().is_none());
		session.finish_upload(Err(UploadError::rejected("Empty file")));
		assert!(session.graph().is_none());
		assert_eq!(
			session.status,
			UploadStatus::Failed {
				message: "Empty file".into()
			}
		);
	}

	#[test]
	fn filters_always_apply_to_original() {
		let mut session = Session::default();
		session.begin_upload("g.graphml");
		session.finish_upload(Ok(graph()));

		session.filter.category = Selector::Only(Category::Db);
		assert_eq!(session.visible_graph().unwrap().node_count(), 1);
		session.filter.category = Selector::All;
		assert_eq!(session.visible_graph().unwrap().node_count(), 2);
	}

	#[test]
	fn environment_options_include_graph_envs() {
		let mut session = Session::default();
		assert_eq!(session.environment_options().len(), 3);
		session.begin_upload("g.graphml");
		session.finish_upload(Ok(graph()));
		let values: Vec<_> = session
			.environment_options()
			.into_iter()
			.map(|(v, _)| v)
			.collect();
		assert_eq!(values, ["prod", "stage", "dev", "qa"]);
	}
}
