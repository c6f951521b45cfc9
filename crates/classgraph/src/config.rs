//! Diagram configuration

use crate::dot::ImportStyle;
use crate::layout::{Graphviz, ImageFormat};
use crate::model::BaseEdgePolicy;
use crate::visitor::ImportAttribution;
use std::path::{Path, PathBuf};

/// Settings for one diagram run
#[derive(Debug, Clone)]
pub struct DiagramConfig {
    /// Package directory to analyze
    pub package: PathBuf,
    /// Directory receiving the image
    pub output_dir: PathBuf,
    pub format: ImageFormat,
    /// Keep the intermediate `.dot` file next to the image
    pub keep_dot: bool,
    /// Graphviz executable
    pub dot_program: String,
    pub base_edges: BaseEdgePolicy,
    pub import_style: ImportStyle,
    pub import_attribution: ImportAttribution,
    /// Imports starting with this character are never treated as classes
    pub reserved_prefix: Option<char>,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            package: PathBuf::from("blyzer"),
            output_dir: PathBuf::from("documentation/UML"),
            format: ImageFormat::Png,
            keep_dot: false,
            dot_program: Graphviz::DEFAULT_PROGRAM.to_string(),
            base_edges: BaseEdgePolicy::Last,
            import_style: ImportStyle::Merged,
            import_attribution: ImportAttribution::PendingOrdinal,
            reserved_prefix: Some('Q'),
        }
    }
}

impl DiagramConfig {
    /// Defaults overridden by `UMLSCAN_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unknown or malformed values keep the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("UMLSCAN_PACKAGE") {
            config.package = PathBuf::from(v);
        }

        if let Some(v) = lookup("UMLSCAN_OUT") {
            config.output_dir = PathBuf::from(v);
        }

        if let Some(v) = lookup("UMLSCAN_FORMAT") {
            if let Some(format) = ImageFormat::from_str(&v) {
                config.format = format;
            }
        }

        if let Some(v) = lookup("UMLSCAN_KEEP_DOT") {
            config.keep_dot = matches!(v.as_str(), "1" | "true" | "yes");
        }

        if let Some(v) = lookup("UMLSCAN_DOT_BIN") {
            config.dot_program = v;
        }

        config
    }

    /// Last path component of the package, used in artifact names
    pub fn package_name(&self) -> String {
        let named = |p: &Path| p.file_name().map(|n| n.to_string_lossy().into_owned());
        named(&self.package)
            .or_else(|| self.package.canonicalize().ok().and_then(|p| named(&p)))
            .unwrap_or_else(|| "package".to_string())
    }

    /// `<output_dir>/classes_<package>.dot`
    pub fn dot_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("classes_{}.dot", self.package_name()))
    }

    /// Same base path as the DOT file, image extension
    pub fn image_path(&self) -> PathBuf {
        self.dot_path().with_extension(self.format.extension())
    }
}
