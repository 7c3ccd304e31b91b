//! ConfigMap manifest discovery and parsing.

pub mod layout;
pub mod loader;
pub mod parser;

pub use loader::ManifestLoader;
pub use parser::parse_config_map_stream;
