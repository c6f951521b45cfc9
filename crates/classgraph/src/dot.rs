use crate::model::{BaseEdgePolicy, ClassModel, EdgeKind};
use std::fs::{self, File};
use std::io::{BufWriter, Result, Write};
use std::path::Path;

const GENERALIZATION_STYLE: &str = r#"arrowhead="empty", arrowtail="none""#;
const DISTINCT_IMPORT_STYLE: &str = r#"arrowhead="open", arrowtail="none", style="dashed""#;

/// How import edges look next to inheritance edges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportStyle {
    /// Same arrow as inheritance
    #[default]
    Merged,
    /// Dashed, open arrowhead
    Distinct,
}

/// Graphviz DOT generator for a class model
#[derive(Debug, Clone, Default)]
pub struct DotRenderer {
    base_edges: BaseEdgePolicy,
    import_style: ImportStyle,
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_edges(mut self, policy: BaseEdgePolicy) -> Self {
        self.base_edges = policy;
        self
    }

    pub fn with_import_style(mut self, style: ImportStyle) -> Self {
        self.import_style = style;
        self
    }

    /// Write the graph description to `path`, creating missing parent
    /// directories
    pub fn export(&self, model: &ClassModel, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(path)?);
        self.render(model, &mut out)?;
        tracing::info!("Wrote {} classes to {}", model.len(), path.display());
        Ok(())
    }

    /// Stream the graph description into `out`
    pub fn render<W: Write>(&self, model: &ClassModel, out: &mut W) -> Result<()> {
        out.write_all(self.to_dot(model).as_bytes())?;
        out.flush()
    }

    /// Nodes in module order, then inheritance edges, then import edges
    pub fn to_dot(&self, model: &ClassModel) -> String {
        let mut lines = vec![
            "digraph G {".to_string(),
            "ranksep=1.0;".to_string(),
            "node [style=filled,fontname=Helvetica,fontsize=10];".to_string(),
        ];

        for (_, classes) in model.dependency_graph() {
            for class in classes {
                lines.push(format!(
                    "\"{}\" [label=\"{}\", shape=\"record\"];",
                    class.ordinal,
                    class.label()
                ));
            }
        }

        for relation in model.relations(self.base_edges) {
            lines.push(format!(
                "\"{}\" -> \"{}\" [{}];",
                relation.from,
                relation.to,
                self.edge_style(relation.kind)
            ));
        }

        lines.push("}".to_string());

        let mut dot = lines.join("\n");
        dot.push('\n');
        dot
    }

    fn edge_style(&self, kind: EdgeKind) -> &'static str {
        match (kind, self.import_style) {
            (EdgeKind::Import, ImportStyle::Distinct) => DISTINCT_IMPORT_STYLE,
            _ => GENERALIZATION_STYLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassRecord, ModuleClasses};
    use tempfile::tempdir;

    fn sample() -> ClassModel {
        let mut model = ClassModel::default();
        let records = [("Base", vec![]), ("Child", vec!["Base".to_string()])];
        for (ordinal, (name, bases)) in records.into_iter().enumerate() {
            model.ordinals.insert(name.to_string(), ordinal);
            model.classes.push(ClassRecord {
                name: name.to_string(),
                ordinal,
                module: "pkg.models".to_string(),
                fields: vec![],
                methods: vec![],
                bases,
            });
        }
        model.modules.push(ModuleClasses {
            name: "pkg.models".to_string(),
            ordinals: vec![0, 1],
        });
        model.imports.insert(1, vec!["Base".to_string()]);
        model
    }

    #[test]
    fn test_to_dot_layout() {
        let dot = DotRenderer::new().to_dot(&sample());
        let expected = [
            "digraph G {",
            "ranksep=1.0;",
            "node [style=filled,fontname=Helvetica,fontsize=10];",
            "\"0\" [label=\"{Base| | }\", shape=\"record\"];",
            "\"1\" [label=\"{Child| | }\", shape=\"record\"];",
            "\"1\" -> \"0\" [arrowhead=\"empty\", arrowtail=\"none\"];",
            "\"0\" -> \"1\" [arrowhead=\"empty\", arrowtail=\"none\"];",
            "}",
        ]
        .join("\n")
            + "\n";
        assert_eq!(dot, expected);
    }

    #[test]
    fn test_distinct_import_style() {
        let dot = DotRenderer::new()
            .with_import_style(ImportStyle::Distinct)
            .to_dot(&sample());
        assert!(dot.contains("\"1\" -> \"0\" [arrowhead=\"empty\", arrowtail=\"none\"];"));
        assert!(dot.contains("\"0\" -> \"1\" [arrowhead=\"open\", arrowtail=\"none\", style=\"dashed\"];"));
    }

    #[test]
    fn test_empty_model() {
        let dot = DotRenderer::new().to_dot(&ClassModel::default());
        assert!(dot.starts_with("digraph G {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(!dot.contains("->"));
    }

    #[test]
    fn test_render_into_writer() {
        let mut buf = Vec::new();
        DotRenderer::new().render(&sample(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), DotRenderer::new().to_dot(&sample()));
    }

    #[test]
    fn test_export_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("docs/UML/classes_pkg.dot");

        DotRenderer::new().export(&sample(), &target).unwrap();
        assert!(fs::read_to_string(&target).unwrap().contains("shape=\"record\""));
    }

    #[test]
    fn test_export_writes_rendered_graph() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("classes_pkg.dot");

        DotRenderer::new().export(&sample(), &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), DotRenderer::new().to_dot(&sample()));
    }

    #[test]
    fn test_export_fails_when_parent_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        // a regular file cannot act as a directory
        let result = DotRenderer::new().export(&sample(), &blocker.join("out.dot"));
        assert!(result.is_err());
    }
}
