//! End-to-end run: discover, parse, visit, render, lay out

use crate::config::DiagramConfig;
use crate::dot::DotRenderer;
use crate::filter::HeuristicImportFilter;
use crate::layout::{LayoutEngine, LayoutError};
use crate::model::ClassModel;
use crate::visitor::ClassVisitor;
use pysource::{collect_source_files, PythonParser, SourceError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DiagramError>;

/// Artifacts of a finished run
#[derive(Debug, Clone)]
pub struct DiagramOutput {
    pub image: PathBuf,
    /// Present only when the DOT file was kept
    pub dot: Option<PathBuf>,
    pub classes: usize,
}

impl ClassVisitor {
    /// Visitor set up with the analysis options of `config`
    pub fn from_config(config: &DiagramConfig) -> Self {
        ClassVisitor::new()
            .with_filter(HeuristicImportFilter::new().with_reserved_prefix(config.reserved_prefix))
            .with_attribution(config.import_attribution)
    }
}

impl DotRenderer {
    /// Renderer set up with the edge options of `config`
    pub fn from_config(config: &DiagramConfig) -> Self {
        DotRenderer::new()
            .with_base_edges(config.base_edges)
            .with_import_style(config.import_style)
    }
}

/// Visit every Python file under `root`. The first unparsable file aborts the
/// whole analysis.
pub fn analyze_package(root: &Path, mut visitor: ClassVisitor) -> Result<ClassModel> {
    let files = collect_source_files(root)?;
    tracing::info!("Analyzing {} Python files under {}", files.len(), root.display());

    let mut parser = PythonParser::new()?;
    for file in &files {
        let parsed = parser.parse_file(file)?;
        visitor.visit_module(&parsed);
    }

    let model = visitor.finish();
    tracing::info!("Found {} classes in {} modules", model.len(), model.modules().len());
    Ok(model)
}

/// Analyze `config.package`, write the DOT file, convert it with `engine` and
/// remove the DOT file unless `config.keep_dot` is set.
///
/// When the conversion fails the DOT file stays on disk.
pub fn generate_diagram<E: LayoutEngine + ?Sized>(
    config: &DiagramConfig,
    engine: &E,
) -> Result<DiagramOutput> {
    fs::create_dir_all(&config.output_dir).map_err(|source| DiagramError::Io {
        path: config.output_dir.clone(),
        source,
    })?;

    let model = analyze_package(&config.package, ClassVisitor::from_config(config))?;

    let dot_path = config.dot_path();
    DotRenderer::from_config(config)
        .export(&model, &dot_path)
        .map_err(|source| DiagramError::Io {
            path: dot_path.clone(),
            source,
        })?;

    let image = config.image_path();
    engine.convert(&dot_path, &image, config.format)?;
    tracing::info!("Diagram written to {}", image.display());

    let dot = if config.keep_dot {
        Some(dot_path)
    } else {
        fs::remove_file(&dot_path).map_err(|source| DiagramError::Io {
            path: dot_path.clone(),
            source,
        })?;
        None
    };

    Ok(DiagramOutput {
        image,
        dot,
        classes: model.len(),
    })
}
