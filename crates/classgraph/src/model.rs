use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which relation an edge stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// derived -> base
    Inheritance,
    /// imported class -> importing class
    Import,
}

/// How many inheritance edges a class with several bases gets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BaseEdgePolicy {
    /// Only the last simple-name base
    #[default]
    Last,
    /// One edge per simple-name base
    All,
}

/// One declared class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    /// Node id in the rendered graph, assigned in visitation order
    pub ordinal: usize,
    pub module: String,
    /// Single-underscore attributes touched on `self` in `__init__`
    pub fields: Vec<String>,
    /// Methods not starting with `__`
    pub methods: Vec<String>,
    /// Simple-name base classes in declaration order
    pub bases: Vec<String>,
}

impl ClassRecord {
    /// Record label: `{Name| field\l...| method()\l...}`
    pub fn label(&self) -> String {
        let fields: String = self.fields.iter().map(|f| format!("{}\\l", f)).collect();
        let methods: String = self.methods.iter().map(|m| format!("{}()\\l", m)).collect();
        format!("{{{}| {}| {}}}", self.name, fields, methods)
    }
}

/// Classes declared by one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleClasses {
    pub name: String,
    pub ordinals: Vec<usize>,
}

/// A directed edge between two ordinals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
}

/// Result of visiting a package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassModel {
    /// Indexed by ordinal
    pub(crate) classes: Vec<ClassRecord>,
    /// Dependency graph, in module insertion order
    pub(crate) modules: Vec<ModuleClasses>,
    /// Class name -> ordinal; a later declaration of the same name wins
    pub(crate) ordinals: BTreeMap<String, usize>,
    /// Ordinal -> imported names
    pub(crate) imports: BTreeMap<usize, Vec<String>>,
    /// Ordinal -> attribute names used in the class scope
    pub(crate) attributes: BTreeMap<usize, Vec<String>>,
}

impl ClassModel {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> &[ClassRecord] {
        &self.classes
    }

    pub fn class(&self, ordinal: usize) -> Option<&ClassRecord> {
        self.classes.get(ordinal)
    }

    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    pub fn ordinals(&self) -> &BTreeMap<String, usize> {
        &self.ordinals
    }

    pub fn modules(&self) -> &[ModuleClasses] {
        &self.modules
    }

    /// Module -> declared classes, the node set of the diagram
    pub fn dependency_graph(&self) -> impl Iterator<Item = (&str, Vec<&ClassRecord>)> + '_ {
        self.modules.iter().map(move |m| {
            let classes: Vec<&ClassRecord> = m.ordinals.iter().filter_map(|&o| self.classes.get(o)).collect();
            (m.name.as_str(), classes)
        })
    }

    /// Derived class -> base names
    pub fn inheritance(&self) -> impl Iterator<Item = (&ClassRecord, &[String])> + '_ {
        self.classes
            .iter()
            .filter(|c| !c.bases.is_empty())
            .map(|c| (c, c.bases.as_slice()))
    }

    pub fn imports(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.imports
    }

    pub fn attribute_usage(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.attributes
    }

    /// Edges between declared classes: inheritance first, then imports.
    ///
    /// Bases and imported names that are not declared anywhere in the package
    /// yield no edge.
    pub fn relations(&self, policy: BaseEdgePolicy) -> Vec<Relation> {
        let mut relations = Vec::new();

        for (class, bases) in self.inheritance() {
            let selected: &[String] = match policy {
                BaseEdgePolicy::Last => &bases[bases.len() - 1..],
                BaseEdgePolicy::All => bases,
            };
            for base in selected {
                match self.ordinal_of(base) {
                    Some(to) => relations.push(Relation {
                        from: class.ordinal,
                        to,
                        kind: EdgeKind::Inheritance,
                    }),
                    None => tracing::trace!("{} extends external {}", class.name, base),
                }
            }
        }

        for (&importer, names) in &self.imports {
            // pending ordinal that no class ever received
            if importer >= self.classes.len() {
                tracing::debug!("Dropping imports {:?} with no importing class", names);
                continue;
            }
            for name in names {
                if let Some(from) = self.ordinal_of(name) {
                    relations.push(Relation {
                        from,
                        to: importer,
                        kind: EdgeKind::Import,
                    });
                }
            }
        }

        relations
    }
}

pub(crate) fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}
