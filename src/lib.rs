pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod input;
pub mod object;

pub use config::Config;
pub use error::{AggregateError, KubegraphError, Result};
pub use graph::{build_graph, Format, Graph, GraphBuilder};
pub use object::Object;
