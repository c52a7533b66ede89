//! Bundle converted spreadsheets into a single in-memory zip.

use crate::error::{ArchiveError, ArchiveResult};
use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write each file into one deflate-compressed zip under its base name,
/// in the given order. The returned buffer holds the complete archive.
pub fn package_files<P: AsRef<Path>>(files: &[P]) -> ArchiveResult<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for path in files {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArchiveError::UnsafePath {
                entry: path.display().to_string(),
            })?;

        writer.start_file(name, options)?;
        let mut source = File::open(path)?;
        io::copy(&mut source, &mut writer)?;
    }

    let buffer = writer.finish()?.into_inner();
    debug!(entries = files.len(), bytes = buffer.len(), "Packaged results");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_package_preserves_order_and_names() {
        let dir = tempdir().unwrap();
        let roads = dir.path().join("roads.xlsx");
        let parcels = dir.path().join("parcels_2020.xlsx");
        fs::write(&roads, b"roads-bytes").unwrap();
        fs::write(&parcels, b"parcels-bytes").unwrap();

        let bytes = package_files(&[&roads, &parcels]).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<_> = archive.file_names().map(str::to_string).collect();
        assert_eq!(names.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "roads.xlsx");
        assert_eq!(archive.by_index(1).unwrap().name(), "parcels_2020.xlsx");

        let mut content = String::new();
        archive
            .by_name("parcels_2020.xlsx")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "parcels-bytes");
    }

    #[test]
    fn test_empty_package_is_valid_zip() {
        let files: Vec<std::path::PathBuf> = Vec::new();
        let bytes = package_files(&files).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = package_files(&[dir.path().join("gone.xlsx")]).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
