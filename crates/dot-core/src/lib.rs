pub mod emitter;
pub mod error;
pub mod index;
pub mod model;
pub mod parser;
pub mod quote;

pub use emitter::emit_graph;
pub use error::ParseError;
pub use index::{Attributes, GraphIndex};
pub use model::*;
pub use parser::parse_graph;
pub use quote::{is_bare_id, quote_id, quote_id_if_necessary};
