use crate::types::SourceFile;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Unparsable input: {path} (line {line}, column {column})")]
    Unparsable {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    #[error("Language error: {0}")]
    Language(String),
}

impl SourceError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// A parsed Python file. Keeps the source text next to its tree, since nodes
/// only carry byte ranges.
pub struct ParsedModule {
    pub file: SourceFile,
    source: String,
    tree: Tree,
}

impl ParsedModule {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn module(&self) -> &str {
        &self.file.module
    }
}

/// tree-sitter parser for Python
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| SourceError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Read and parse a file from disk
    pub fn parse_file(&mut self, file: &SourceFile) -> Result<ParsedModule> {
        let source = fs::read_to_string(&file.path).map_err(|e| SourceError::io(&file.path, e))?;
        self.parse_source(file.clone(), source)
    }

    /// Parse in-memory source. Any syntax error rejects the whole file.
    pub fn parse_source(&mut self, file: SourceFile, source: String) -> Result<ParsedModule> {
        let tree = match self.parser.parse(&source, None) {
            Some(tree) => tree,
            None => {
                return Err(SourceError::Unparsable {
                    path: file.path,
                    line: 1,
                    column: 1,
                })
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error(root)
                .map(|n| {
                    let pos = n.start_position();
                    (pos.row + 1, pos.column + 1)
                })
                .unwrap_or((1, 1));
            tracing::debug!("Syntax error in {} at {}:{}", file.path.display(), line, column);
            return Err(SourceError::Unparsable {
                path: file.path,
                line,
                column,
            });
        }

        Ok(ParsedModule { file, source, tree })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(found) = first_error(child) {
                return Some(found);
            }
        }
    }
    None
}
