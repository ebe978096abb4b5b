use crate::error::{ParseError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const GO_EXTENSION: &str = "go";
const TEST_SUFFIX: &str = "_test.go";

/// Check whether a path is an analyzable Go source file (tests excluded)
pub fn is_go_source(path: &Path) -> bool {
    let is_go = path.extension().map(|e| e == GO_EXTENSION).unwrap_or(false);
    let is_test = path
        .file_name()
        .map(|n| n.to_string_lossy().ends_with(TEST_SUFFIX))
        .unwrap_or(false);
    is_go && !is_test
}

/// Go source files directly inside `dir`, sorted by file name.
///
/// Sorting keeps declaration order stable across runs.
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_err = |source| ParseError::Io { path: dir.to_path_buf(), source };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_go_source(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_go_source() {
        assert!(is_go_source(Path::new("main.go")));
        assert!(is_go_source(Path::new("pkg/parser/class_parser.go")));
        assert!(!is_go_source(Path::new("main_test.go")));
        assert!(!is_go_source(Path::new("README.md")));
        assert!(!is_go_source(Path::new("go")));
    }

    #[test]
    fn test_go_files_sorted_and_filtered() {
        let dir = tempdir().expect("Failed to create temp dir");
        for name in ["z.go", "a.go", "a_test.go", "notes.txt"] {
            fs::write(dir.path().join(name), "package x\n").expect("Failed to write file");
        }
        fs::create_dir(dir.path().join("sub.go")).expect("Failed to create dir");

        let files = go_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.go", "z.go"]);
    }

    #[test]
    fn test_go_files_missing_dir() {
        let result = go_files(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(ParseError::Io { .. })));
    }
}
