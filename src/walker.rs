//! Recursive discovery of source files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EtlResult;

/// Recursively collect every `*.json` file under `root`.
///
/// Paths are returned sorted so a load over the same tree always processes
/// files in the same order regardless of filesystem enumeration order.
pub fn discover_json_files(root: &Path) -> EtlResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> EtlResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect(&path, files)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let root = tempdir().expect("temp dir");
        let nested = root.path().join("2018").join("11");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.json"), "{}").unwrap();
        fs::write(nested.join("a.json"), "{}").unwrap();
        fs::write(root.path().join("top.json"), "{}").unwrap();
        fs::write(root.path().join("notes.txt"), "skip me").unwrap();

        let files = discover_json_files(root.path()).expect("discover");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2018/11/a.json", "2018/11/b.json", "top.json"]);
    }

    #[test]
    fn test_empty_tree() {
        let root = tempdir().expect("temp dir");
        let files = discover_json_files(root.path()).expect("discover");
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let root = tempdir().expect("temp dir");
        let missing = root.path().join("does-not-exist");
        assert!(discover_json_files(&missing).is_err());
    }
}
