use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A Python file found under a package root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path on disk
    pub path: PathBuf,
    /// Dotted module name: "pkg.sub.module"
    pub module: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            module: module.into(),
        }
    }
}
