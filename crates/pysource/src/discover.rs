use crate::parser::{Result, SourceError};
use crate::types::SourceFile;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Extension of the files picked up by the walk
pub const PYTHON_EXTENSION: &str = "py";

/// Collect every `.py` file under `root`.
///
/// Within a directory, files come first (sorted by name), then subdirectories
/// (sorted by name), so the order is stable across runs. Hidden directories
/// and `__pycache__` are skipped.
pub fn collect_source_files(root: &Path) -> Result<Vec<SourceFile>> {
    let root = root.canonicalize().map_err(|e| SourceError::io(root, e))?;
    if !root.is_dir() {
        return Err(SourceError::NotADirectory(root));
    }

    let mut paths = Vec::new();
    collect_python_files(&root, &mut paths)?;

    Ok(paths
        .into_iter()
        .map(|path| {
            let module = module_name(&root, &path);
            SourceFile { path, module }
        })
        .collect())
}

/// Dotted module name of `path`, relative to the parent of `package_root`.
///
/// The package directory itself is the first segment: `pkg/sub/a.py` under
/// package root `pkg` becomes `pkg.sub.a`.
pub fn module_name(package_root: &Path, path: &Path) -> String {
    let base = package_root.parent().unwrap_or(package_root);
    let relative = path.strip_prefix(base).unwrap_or(path);

    relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn collect_python_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))? {
        let entry = entry.map_err(|e| SourceError::io(dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();

    let (dirs, plain): (Vec<PathBuf>, Vec<PathBuf>) = entries.into_iter().partition(|p| p.is_dir());

    files.extend(
        plain
            .into_iter()
            .filter(|p| p.extension().map(|e| e == PYTHON_EXTENSION).unwrap_or(false)),
    );

    for sub in dirs {
        if is_skipped_dir(&sub) {
            continue;
        }
        collect_python_files(&sub, files)?;
    }

    Ok(())
}

fn is_skipped_dir(dir: &Path) -> bool {
    dir.file_name()
        .map(|n| {
            let name = n.to_string_lossy();
            name.starts_with('.') || name == "__pycache__"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_module_name_includes_package() {
        let name = module_name(Path::new("/work/pkg"), Path::new("/work/pkg/sub/models.py"));
        assert_eq!(name, "pkg.sub.models");
    }

    #[test]
    fn test_module_name_top_level_file() {
        let name = module_name(Path::new("/work/pkg"), Path::new("/work/pkg/__init__.py"));
        assert_eq!(name, "pkg.__init__");
    }

    #[test]
    fn test_module_name_outside_root_keeps_full_path() {
        let name = module_name(Path::new("/work/pkg"), Path::new("/other/x.py"));
        assert_eq!(name, "other.x");
    }

    #[test]
    fn test_collect_orders_files_before_subdirs() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        fs::create_dir_all(pkg.join("alpha")).unwrap();
        fs::write(pkg.join("zeta.py"), "").unwrap();
        fs::write(pkg.join("beta.py"), "").unwrap();
        fs::write(pkg.join("notes.txt"), "").unwrap();
        fs::write(pkg.join("alpha/inner.py"), "").unwrap();

        let files = collect_source_files(&pkg).unwrap();
        let modules: Vec<_> = files.iter().map(|f| f.module.as_str()).collect();

        assert_eq!(modules, vec!["pkg.beta", "pkg.zeta", "pkg.alpha.inner"]);
    }

    #[test]
    fn test_collect_skips_hidden_and_cache_dirs() {
        let dir = tempdir().unwrap();
        let pkg = dir.path().join("pkg");
        fs::create_dir_all(pkg.join(".venv")).unwrap();
        fs::create_dir_all(pkg.join("__pycache__")).unwrap();
        fs::write(pkg.join(".venv/site.py"), "").unwrap();
        fs::write(pkg.join("__pycache__/cached.py"), "").unwrap();
        fs::write(pkg.join("main.py"), "").unwrap();

        let files = collect_source_files(&pkg).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].module, "pkg.main");
    }

    #[test]
    fn test_collect_missing_root_is_io_error() {
        let dir = tempdir().unwrap();
        let err = collect_source_files(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_collect_file_root_is_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("single.py");
        fs::write(&file, "").unwrap();

        let err = collect_source_files(&file).unwrap_err();
        assert!(matches!(err, SourceError::NotADirectory(_)));
    }
}
