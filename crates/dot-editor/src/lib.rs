pub mod config;
pub mod cursor;
pub mod error;
pub mod splice;
pub mod sync;

pub use config::EditorConfig;
pub use error::EditError;
pub use sync::{DotGraph, NO_ATTRS};
