//! Upload persistence and zip extraction
//!
//! Every entry path goes through `enclosed_name()`; entries that would land
//! outside the destination abort the extraction.

use crate::error::{ArchiveError, ArchiveResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filename used when the upload did not carry a usable one
pub const FALLBACK_UPLOAD_NAME: &str = "upload.zip";

/// Reduce a client-supplied filename to a bare file name.
fn upload_file_name(original: Option<&str>) -> &str {
    original
        .and_then(|name| {
            // Clients may send Windows-style paths as the filename
            let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
            Path::new(name).file_name().and_then(|n| n.to_str())
        })
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_UPLOAD_NAME)
}

/// Write the uploaded payload into `dest` under its original file name.
pub fn save_upload(payload: &[u8], original_name: Option<&str>, dest: &Path) -> ArchiveResult<PathBuf> {
    let path = dest.join(upload_file_name(original_name));
    fs::write(&path, payload)?;
    debug!(path = %path.display(), bytes = payload.len(), "Saved upload");
    Ok(path)
}

/// Decompress every entry of the zip at `archive_path` into `dest`.
///
/// Returns the number of files written.
pub fn unpack(archive_path: &Path, dest: &Path) -> ArchiveResult<usize> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut count = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let relative = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(ArchiveError::UnsafePath {
                    entry: entry.name().to_string(),
                })
            }
        };
        let output_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)?;
        count += 1;
    }

    debug!(files = count, dest = %dest.display(), "Unpacked archive");
    Ok(count)
}

/// Save the payload and unpack it into `dest` in one step.
pub fn extract_upload(payload: &[u8], original_name: Option<&str>, dest: &Path) -> ArchiveResult<usize> {
    let archive_path = save_upload(payload, original_name, dest)?;
    unpack(&archive_path, dest)
}
