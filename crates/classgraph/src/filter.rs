//! Which `from X import Y` names count as project classes

/// Decides whether an imported name may refer to a class of the analyzed package
pub trait ImportFilter {
    fn accepts(&self, name: &str) -> bool;
}

impl<F> ImportFilter for F
where
    F: Fn(&str) -> bool,
{
    fn accepts(&self, name: &str) -> bool {
        self(name)
    }
}

/// Case-based guess at class-like names.
///
/// Rejects the wildcard, names starting with the reserved prefix, and names
/// whose cased letters are all lowercase or all uppercase. Both false
/// positives and false negatives are expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicImportFilter {
    reserved_prefix: Option<char>,
}

impl HeuristicImportFilter {
    /// Prefix of third-party GUI classes (`QWidget`, `QDialog`, ...)
    pub const DEFAULT_RESERVED_PREFIX: char = 'Q';

    pub fn new() -> Self {
        Self {
            reserved_prefix: Some(Self::DEFAULT_RESERVED_PREFIX),
        }
    }

    pub fn with_reserved_prefix(mut self, prefix: Option<char>) -> Self {
        self.reserved_prefix = prefix;
        self
    }
}

impl Default for HeuristicImportFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFilter for HeuristicImportFilter {
    fn accepts(&self, name: &str) -> bool {
        if name == "*" {
            return false;
        }
        if let Some(prefix) = self.reserved_prefix {
            if name.starts_with(prefix) {
                return false;
            }
        }
        !is_all_lowercase(name) && !is_all_uppercase(name)
    }
}

/// At least one cased letter, none of them uppercase
fn is_all_lowercase(name: &str) -> bool {
    let mut cased = false;
    for c in name.chars() {
        if c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            cased = true;
        }
    }
    cased
}

/// At least one cased letter, none of them lowercase
fn is_all_uppercase(name: &str) -> bool {
    let mut cased = false;
    for c in name.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}
