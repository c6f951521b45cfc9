//! pysource - Python source discovery and parsing
//!
//! Walks a package tree, derives dotted module names and parses each file with tree-sitter.

mod discover;
mod parser;
mod types;

pub use discover::{collect_source_files, module_name, PYTHON_EXTENSION};
pub use parser::{ParsedModule, PythonParser, Result, SourceError};
pub use types::SourceFile;
