//! Graph model, decoding, filtering and render projection.

pub mod filter;
pub mod graphml;
pub mod model;
pub mod projection;

pub use filter::{ControlValue, FilterState, Selector, filter_graph};
pub use model::{Category, Criticality, Edge, EdgeKind, Graph, Node};
pub use projection::{RenderModel, RenderOptions, project};
