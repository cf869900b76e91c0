pub mod filter_panel;
pub mod force_graph;
pub mod legend;
pub mod upload_panel;
