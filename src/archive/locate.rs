//! Locate the geodatabase container inside an extracted upload.

use crate::error::ArchiveResult;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory name suffix of a File Geodatabase
pub const CONTAINER_SUFFIX: &str = ".gdb";

/// Find the first directory under `root` whose name ends with `.gdb`.
///
/// Siblings are visited in file-name order so the pick is stable across
/// platforms when an upload holds more than one container. The search does
/// not descend into a matched container.
pub fn find_container(root: &Path) -> ArchiveResult<Option<PathBuf>> {
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(CONTAINER_SUFFIX));
        if matches {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_finds_nested_container() {
        let dir = tempdir().unwrap();
        let gdb = dir.path().join("export/2024/data.gdb");
        fs::create_dir_all(&gdb).unwrap();
        fs::write(dir.path().join("export/notes.gdb"), b"a file, not a dir").unwrap();

        let found = find_container(dir.path()).unwrap();
        assert_eq!(found, Some(gdb));
    }

    #[test]
    fn test_no_container() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("shapefiles")).unwrap();
        fs::write(dir.path().join("upload.zip"), b"zip").unwrap();

        assert_eq!(find_container(dir.path()).unwrap(), None);
    }

    #[test]
    fn test_first_match_in_name_order() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b.gdb")).unwrap();
        fs::create_dir_all(dir.path().join("a.gdb")).unwrap();

        let found = find_container(dir.path()).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "a.gdb");
    }

    #[test]
    fn test_root_itself_is_not_matched() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("only.gdb");
        fs::create_dir_all(&root).unwrap();

        assert_eq!(find_container(&root).unwrap(), None);
    }
}
