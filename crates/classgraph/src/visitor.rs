use crate::filter::{HeuristicImportFilter, ImportFilter};
use crate::model::{push_unique, ClassModel, ClassRecord, ModuleClasses};
use pysource::ParsedModule;
use std::collections::{HashMap, VecDeque};
use tree_sitter::Node;

/// Which class an accepted `from X import Y` is attached to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportAttribution {
    /// The ordinal the next declared class will receive
    #[default]
    PendingOrdinal,
    /// Every class declared in the importing module
    Module,
}

/// Syntax visitor: accumulates classes, bases, imports and attribute usage
/// over any number of parsed modules.
pub struct ClassVisitor {
    model: ClassModel,
    current_module: String,
    filter: Box<dyn ImportFilter>,
    attribution: ImportAttribution,
    /// Module -> accepted imports, for `ImportAttribution::Module`
    module_imports: HashMap<String, Vec<String>>,
}

impl ClassVisitor {
    pub fn new() -> Self {
        Self {
            model: ClassModel::default(),
            current_module: String::new(),
            filter: Box::new(HeuristicImportFilter::new()),
            attribution: ImportAttribution::default(),
            module_imports: HashMap::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl ImportFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_attribution(mut self, attribution: ImportAttribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// Subsequent class declarations belong to `name`
    pub fn set_current_module(&mut self, name: &str) {
        self.current_module = name.to_string();
        if !self.model.modules.iter().any(|m| m.name == name) {
            self.model.modules.push(ModuleClasses {
                name: name.to_string(),
                ordinals: Vec::new(),
            });
        }
    }

    /// Visit a whole parsed file
    pub fn visit_module(&mut self, module: &ParsedModule) {
        tracing::debug!("Visiting {}", module.module());
        self.set_current_module(module.module());
        self.visit(module.root(), module.source());
    }

    /// Breadth-first walk over the subtree of `node`, dispatching on node
    /// kind. Ordinals and pending imports follow this order: every class of a
    /// nesting level is numbered before any class nested inside it.
    pub fn visit(&mut self, node: Node<'_>, source: &str) {
        // class node id -> ordinal, for lexical attribute attribution
        let mut class_ordinals: HashMap<usize, usize> = HashMap::new();
        let mut queue = VecDeque::from([node]);

        while let Some(node) = queue.pop_front() {
            match node.kind() {
                "import_from_statement" => self.import_info(node, source),
                "class_definition" => {
                    if let Some(ordinal) = self.class_info(node, source) {
                        class_ordinals.insert(node.id(), ordinal);
                    }
                }
                "attribute" => self.attribute_info(node, source, &class_ordinals),
                _ => {}
            }
            push_children(node, &mut queue);
        }
    }

    /// Number of classes seen so far; the ordinal of the next one
    pub fn counter(&self) -> usize {
        self.model.classes.len()
    }

    pub fn finish(mut self) -> ClassModel {
        if self.attribution == ImportAttribution::Module {
            for module in &self.model.modules {
                let Some(names) = self.module_imports.get(&module.name) else {
                    continue;
                };
                for &ordinal in &module.ordinals {
                    let list = self.model.imports.entry(ordinal).or_default();
                    for name in names {
                        push_unique(list, name);
                    }
                }
            }
        }
        // drop modules that declared nothing
        self.model.modules.retain(|m| !m.ordinals.is_empty());
        self.model
    }

    fn import_info(&mut self, node: Node<'_>, source: &str) {
        let Some(name) = first_imported_name(node, source) else {
            return;
        };
        if !self.filter.accepts(name) {
            tracing::trace!("Ignoring import of {}", name);
            return;
        }

        let list = match self.attribution {
            ImportAttribution::PendingOrdinal => {
                let pending = self.counter();
                self.model.imports.entry(pending).or_default()
            }
            ImportAttribution::Module => self
                .module_imports
                .entry(self.current_module.clone())
                .or_default(),
        };
        push_unique(list, name);
    }

    fn class_info(&mut self, node: Node<'_>, source: &str) -> Option<usize> {
        let name = text(node.child_by_field_name("name")?, source);

        let ordinal = self.counter();
        let mut record = ClassRecord {
            name: name.to_string(),
            ordinal,
            module: self.current_module.clone(),
            fields: Vec::new(),
            methods: Vec::new(),
            bases: base_names(node, source),
        };

        if let Some(body) = node.child_by_field_name("body") {
            for method in methods(body) {
                let Some(method_name) = method.child_by_field_name("name").map(|n| text(n, source)) else {
                    continue;
                };
                if method_name == "__init__" {
                    collect_private_fields(method, source, &mut record.fields);
                } else if !method_name.starts_with("__") {
                    push_unique(&mut record.methods, method_name);
                }
            }
        }

        tracing::debug!(
            "Class {} #{} in {} ({} fields, {} methods)",
            record.name,
            ordinal,
            self.current_module,
            record.fields.len(),
            record.methods.len()
        );

        self.model.ordinals.insert(record.name.clone(), ordinal);
        self.module_entry().ordinals.push(ordinal);
        self.model.classes.push(record);
        Some(ordinal)
    }

    /// Attributes belong to the innermost class enclosing them in the source
    fn attribute_info(&mut self, node: Node<'_>, source: &str, class_ordinals: &HashMap<usize, usize>) {
        let Some(ordinal) = enclosing_class(node).and_then(|c| class_ordinals.get(&c.id()).copied())
        else {
            return;
        };
        if let Some(attr) = node.child_by_field_name("attribute") {
            let list = self.model.attributes.entry(ordinal).or_default();
            push_unique(list, text(attr, source));
        }
    }

    fn module_entry(&mut self) -> &mut ModuleClasses {
        let modules = &mut self.model.modules;
        let index = match modules.iter().position(|m| m.name == self.current_module) {
            Some(index) => index,
            None => {
                modules.push(ModuleClasses {
                    name: self.current_module.clone(),
                    ordinals: Vec::new(),
                });
                modules.len() - 1
            }
        };
        &mut modules[index]
    }
}

impl Default for ClassVisitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue the children of `node`. Statement blocks and decorator wrappers are
/// spliced into their parent so that one queue level is one statement nesting
/// level.
fn push_children<'t>(node: Node<'t>, queue: &mut VecDeque<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "block" | "decorated_definition" | "else_clause" | "finally_clause" => {
                push_children(child, queue)
            }
            _ => queue.push_back(child),
        }
    }
}

fn enclosing_class(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.kind() == "class_definition" {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// First name of `from X import Y, Z`; `*` for a wildcard import
fn first_imported_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import")
    {
        return Some("*");
    }

    let mut cursor = node.walk();
    let first = node.children_by_field_name("name", &mut cursor).next()?;
    let name = match first.kind() {
        "aliased_import" => first.child_by_field_name("name")?,
        _ => first,
    };
    Some(text(name, source))
}

/// Function definitions directly in a class body, decorated ones included
fn methods(body: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = body.walk();
    body.named_children(&mut cursor)
        .filter_map(|child| match child.kind() {
            "function_definition" => Some(child),
            "decorated_definition" => child
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        })
        .collect()
}

/// Simple-name bases; dotted bases, keyword arguments and calls are skipped
fn base_names(class: Node<'_>, source: &str) -> Vec<String> {
    let mut bases = Vec::new();
    if let Some(args) = class.child_by_field_name("superclasses") {
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if arg.kind() == "identifier" {
                push_unique(&mut bases, text(arg, source));
            }
        }
    }
    bases
}

/// `self._x` style attributes (exactly one leading underscore) inside `__init__`
fn collect_private_fields(init: Node<'_>, source: &str, fields: &mut Vec<String>) {
    let receiver = receiver_name(init, source).unwrap_or("self");
    if let Some(body) = init.child_by_field_name("body") {
        walk_self_attributes(body, source, receiver, fields);
    }
}

fn receiver_name<'s>(function: Node<'_>, source: &'s str) -> Option<&'s str> {
    let params = function.child_by_field_name("parameters")?;
    let first = params.named_child(0)?;
    match first.kind() {
        "identifier" => Some(text(first, source)),
        // `self: "Foo"` or `self=...`
        "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
            let mut cursor = first.walk();
            let ident = first
                .named_children(&mut cursor)
                .find(|c| c.kind() == "identifier")?;
            Some(text(ident, source))
        }
        _ => None,
    }
}

fn walk_self_attributes(node: Node<'_>, source: &str, receiver: &str, fields: &mut Vec<String>) {
    if node.kind() == "class_definition" {
        return;
    }
    if node.kind() == "attribute" {
        let object = node.child_by_field_name("object");
        let attr = node.child_by_field_name("attribute");
        if let (Some(object), Some(attr)) = (object, attr) {
            let name = text(attr, source);
            if object.kind() == "identifier"
                && text(object, source) == receiver
                && name.starts_with('_')
                && !name.starts_with("__")
            {
                push_unique(fields, name);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_self_attributes(child, source, receiver, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pysource::{PythonParser, SourceFile};

    fn analyze(files: &[(&str, &str)]) -> ClassModel {
        analyze_with(ClassVisitor::new(), files)
    }

    fn analyze_with(mut visitor: ClassVisitor, files: &[(&str, &str)]) -> ClassModel {
        let mut parser = PythonParser::new().unwrap();
        for (module, source) in files {
            let file = SourceFile::new(format!("/{}.py", module.replace('.', "/")), *module);
            let parsed = parser.parse_source(file, source.to_string()).unwrap();
            visitor.visit_module(&parsed);
        }
        visitor.finish()
    }

    #[test]
    fn test_ordinals_follow_visitation_order() {
        let model = analyze(&[
            ("pkg.a", "class A:\n    pass\n\nclass B:\n    pass\n"),
            ("pkg.b", "class C:\n    class Inner:\n        pass\n"),
        ]);

        let names: Vec<_> = model.classes().iter().map(|c| (c.ordinal, c.name.as_str())).collect();
        assert_eq!(names, vec![(0, "A"), (1, "B"), (2, "C"), (3, "Inner")]);
        assert_eq!(model.ordinal_of("Inner"), Some(3));
        assert_eq!(model.class(2).unwrap().module, "pkg.b");
    }

    #[test]
    fn test_ordinals_are_breadth_first() {
        let source = r#"
class C:
    class Inner:
        pass

class D:
    def f(self):
        from x import Helper

@register
class E:
    pass
"#;
        let model = analyze(&[("pkg.nested", source)]);

        let names: Vec<_> = model.classes().iter().map(|c| (c.ordinal, c.name.as_str())).collect();
        assert_eq!(names, vec![(0, "C"), (1, "D"), (2, "E"), (3, "Inner")]);
        // queued after Inner, so keyed by the next free ordinal
        assert_eq!(model.imports().get(&4), Some(&vec!["Helper".to_string()]));
        assert_eq!(model.imports().len(), 1);
        assert_eq!(model.modules()[0].ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_fields_and_methods() {
        let source = r#"
class Child(Base):
    def __init__(self, value):
        self._x = value
        self.__hidden = 1
        self.public = 2
        other._not_self = 3
        self._x += 1

    def method(self):
        self._late = 1

    def _helper(self):
        pass

    def __repr__(self):
        return ""

    def __mangled(self):
        pass
"#;
        let model = analyze(&[("pkg.m", source)]);
        let child = &model.classes()[0];

        assert_eq!(child.fields, vec!["_x"]);
        assert_eq!(child.methods, vec!["method", "_helper"]);
        assert_eq!(child.bases, vec!["Base"]);
        assert_eq!(child.label(), "{Child| _x\\l| method()\\l_helper()\\l}");
    }

    #[test]
    fn test_decorated_and_async_methods() {
        let source = r#"
class Service:
    @property
    def name(self):
        return self._name

    @name.setter
    def name(self, value):
        self._name = value

    async def fetch(self):
        pass
"#;
        let model = analyze(&[("pkg.s", source)]);
        assert_eq!(model.classes()[0].methods, vec!["name", "fetch"]);
    }

    #[test]
    fn test_custom_receiver_name() {
        let source = "class P:\n    def __init__(this):\n        this._a = 1\n        self._b = 2\n";
        let model = analyze(&[("pkg.p", source)]);
        assert_eq!(model.classes()[0].fields, vec!["_a"]);
    }

    #[test]
    fn test_only_dunder_methods() {
        let source = "class D:\n    def __eq__(self, other):\n        return True\n";
        let model = analyze(&[("pkg.d", source)]);
        assert_eq!(model.classes()[0].label(), "{D| | }");
    }

    #[test]
    fn test_bases_keep_simple_names_only() {
        let source = "class M(Base, mixins.Loggable, Other, metaclass=Meta):\n    pass\n";
        let model = analyze(&[("pkg.b", source)]);
        assert_eq!(model.classes()[0].bases, vec!["Base", "Other"]);
    }

    #[test]
    fn test_import_keyed_by_pending_ordinal() {
        let model = analyze(&[
            ("pkg.a", "class Helper:\n    pass\n"),
            ("pkg.b", "from somepkg import Helper\nfrom x import Helper\n\nclass User:\n    pass\n"),
        ]);
        assert_eq!(model.imports().get(&1), Some(&vec!["Helper".to_string()]));
        assert_eq!(model.imports().len(), 1);
    }

    #[test]
    fn test_import_filter_and_first_name_only() {
        let source = r#"
from a import helper
from a import CONSTANT
from a import QWidget
from a import *
from a import Good as Alias, Second
from a.b import Other
class K:
    pass
"#;
        let model = analyze(&[("pkg.k", source)]);
        assert_eq!(
            model.imports().get(&0),
            Some(&vec!["Good".to_string(), "Other".to_string()])
        );
    }

    #[test]
    fn test_custom_filter() {
        let visitor = ClassVisitor::new().with_filter(|name: &str| name == "helper");
        let model = analyze_with(visitor, &[("pkg.k", "from a import helper\nfrom a import Helper\n")]);
        assert_eq!(model.imports().get(&0), Some(&vec!["helper".to_string()]));
    }

    #[test]
    fn test_module_attribution() {
        let visitor = ClassVisitor::new().with_attribution(ImportAttribution::Module);
        let model = analyze_with(
            visitor,
            &[
                ("pkg.a", "class Helper:\n    pass\n"),
                ("pkg.b", "class First:\n    pass\n\nclass Second:\n    pass\n\nfrom a import Helper\n"),
            ],
        );
        assert_eq!(model.imports().get(&0), None);
        assert_eq!(model.imports().get(&1), Some(&vec!["Helper".to_string()]));
        assert_eq!(model.imports().get(&2), Some(&vec!["Helper".to_string()]));
    }

    #[test]
    fn test_attributes_use_lexical_scope() {
        let source = r#"
class A:
    def run(self):
        self.alpha()

value = obj.outside

class B:
    class Nested:
        def go(self):
            self.inner
    def stop(self):
        self.beta
"#;
        let model = analyze(&[("pkg.scope", source)]);
        let usage = model.attribute_usage();

        assert_eq!(usage.get(&0), Some(&vec!["alpha".to_string()]));
        assert_eq!(usage.get(&1), Some(&vec!["beta".to_string()]));
        assert_eq!(usage.get(&2), Some(&vec!["inner".to_string()]));
        assert!(!usage.values().flatten().any(|a| a == "outside"));
    }

    #[test]
    fn test_modules_without_classes_are_dropped() {
        let model = analyze(&[("pkg.empty", "x = 1\n"), ("pkg.full", "class F:\n    pass\n")]);
        let modules: Vec<_> = model.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(modules, vec!["pkg.full"]);
    }

    #[test]
    fn test_duplicate_class_name_last_wins() {
        let model = analyze(&[
            ("pkg.a", "class Dup:\n    pass\n"),
            ("pkg.b", "class Dup:\n    pass\n"),
        ]);
        assert_eq!(model.len(), 2);
        assert_eq!(model.ordinal_of("Dup"), Some(1));
    }

    #[test]
    fn test_visit_without_module() {
        let mut parser = PythonParser::new().unwrap();
        let parsed = parser
            .parse_source(SourceFile::new("/x.py", "x"), "class Lone:\n    pass\n".to_string())
            .unwrap();

        let mut visitor = ClassVisitor::new();
        visitor.visit(parsed.root(), parsed.source());
        assert_eq!(visitor.counter(), 1);

        let model = visitor.finish();
        assert_eq!(model.modules()[0].name, "");
    }
}
