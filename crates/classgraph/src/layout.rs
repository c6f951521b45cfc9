//! Conversion of a DOT file into an image by an external layout tool

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Layout tool `{0}` not found; install Graphviz (https://graphviz.org/download/)")]
    NotInstalled(String),
    #[error("`{program}` failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Image format of the final artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ImageFormat {
    /// Parse from CLI / environment input
    pub fn from_str(s: &str) -> Option<ImageFormat> {
        match s.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "svg" => Some(ImageFormat::Svg),
            "pdf" => Some(ImageFormat::Pdf),
            _ => None,
        }
    }

    /// File extension, also the Graphviz `-T` value
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Turns a graph description file into an image
pub trait LayoutEngine {
    fn convert(&self, dot_file: &Path, image_file: &Path, format: ImageFormat) -> Result<()>;
}

/// Graphviz `dot` executable
#[derive(Debug, Clone)]
pub struct Graphviz {
    program: String,
}

impl Graphviz {
    pub const DEFAULT_PROGRAM: &'static str = "dot";

    pub fn new() -> Self {
        Self {
            program: Self::DEFAULT_PROGRAM.to_string(),
        }
    }

    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_args(dot_file: &Path, image_file: &Path, format: ImageFormat) -> Vec<String> {
        vec![
            format!("-T{}", format.extension()),
            dot_file.to_string_lossy().to_string(),
            "-o".to_string(),
            image_file.to_string_lossy().to_string(),
        ]
    }
}

impl Default for Graphviz {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine for Graphviz {
    fn convert(&self, dot_file: &Path, image_file: &Path, format: ImageFormat) -> Result<()> {
        let args = Self::build_args(dot_file, image_file, format);
        tracing::info!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => LayoutError::NotInstalled(self.program.clone()),
                _ => LayoutError::Io(e),
            })?;

        if !output.status.success() {
            return Err(LayoutError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
