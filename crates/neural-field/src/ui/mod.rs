mod bindings;

pub use bindings::{apply_to_engine, parse_key, Action};
