#![doc = include_str!("../README.md")]
#![deny(clippy::mod_module_files)]

pub mod binder;
pub mod errors;
pub mod loader;
mod macros;
pub mod segmenter;
pub mod statements;
#[cfg(feature = "testing")]
pub mod testing;

// Re-export main types
pub use binder::{Binding, QueryField, QueryTarget, Slot, bind, bind_new};
pub use loader::{
    Aggregation, Loader, extract_from_sources, find_files_with_ext, load_from_dir, load_from_file,
    load_from_sources, load_from_str, must_load_from_dir, must_load_from_file,
    must_load_from_sources, must_load_from_str, read_source,
};
pub use segmenter::{DEFAULT_MARKER, Segmenter, is_comment_line, segment, strip_comment_lines};
pub use statements::{Statements, is_valid_statement_name};

// Re-export errors
pub use errors::{BindError, Error, LoadError, ParseError};
