//! classgraph - class diagrams for Python packages
//!
//! Syntax visitor, DOT renderer and the Graphviz conversion step

mod config;
mod dot;
mod filter;
mod layout;
mod model;
mod pipeline;
mod visitor;

pub use config::DiagramConfig;
pub use dot::{DotRenderer, ImportStyle};
pub use filter::{HeuristicImportFilter, ImportFilter};
pub use layout::{Graphviz, ImageFormat, LayoutEngine, LayoutError};
pub use model::{BaseEdgePolicy, ClassModel, ClassRecord, EdgeKind, ModuleClasses, Relation};
pub use pipeline::{analyze_package, generate_diagram, DiagramError, DiagramOutput};
pub use visitor::{ClassVisitor, ImportAttribution};
