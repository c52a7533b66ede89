//! The conversion pipeline for one upload.
//!
//! ```text
//! upload bytes
//!     │  save + unzip           (archive::extract)
//!     ▼
//! workspace/upload/...
//!     │  find *.gdb             (archive::locate)
//!     ▼
//! container ── list layers ──► for each layer:
//!                                 read → strip tz → .xlsx   (layer::convert)
//!                                 report min(i*100/N, 90)
//!                                 optional pause
//!     │  zip spreadsheets       (archive::package)
//!     ▼
//! exports.zip bytes
//! ```
//!
//! The workspace is a [`tempfile::TempDir`] wrapped in a guard that deletes
//! it and then reports 100% on every exit path, including early returns,
//! errors and a dropped request future.

use crate::archive::{extract_upload, find_container, package_files};
use crate::error::PipelineError;
use crate::layer::{convert_layer, LayerReader, OutputNames};
use crate::progress::{layer_progress, ProgressSink, COMPLETE};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// Body of the JSON error returned when the upload holds no container
pub const NO_CONTAINER_MESSAGE: &str = "No .gdb folder found in zip.";

/// File name clients receive the result archive under
pub const EXPORT_FILE_NAME: &str = "exports.zip";

/// Subdirectory of the workspace the upload is saved and unpacked into
const UPLOAD_DIR: &str = "upload";

/// Subdirectory of the workspace that receives the spreadsheets.
/// Sibling of [`UPLOAD_DIR`], so archive contents never collide with it.
const OUTPUT_DIR: &str = "exports";

/// Workspace directory name prefix
const WORKSPACE_PREFIX: &str = "gdb2xlsx-";

/// An uploaded archive
#[derive(Debug, Clone)]
pub struct Upload {
    /// File name as sent by the client, if any
    pub file_name: Option<String>,
    /// Archive bytes, shared with the request body without copying
    pub payload: Bytes,
}

/// Result archive of a successful conversion
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// Zip bytes, complete and ready to send
    pub bytes: Vec<u8>,
    /// Source layer names in enumeration order
    pub layers: Vec<String>,
    /// Archive entry names, parallel to `layers`
    pub entries: Vec<String>,
}

/// How a conversion ended when no error occurred
#[derive(Debug, Clone)]
pub enum ConversionOutcome {
    Archive(ExportArchive),
    /// The upload did not contain a `.gdb` directory
    NoContainer,
}

/// Runtime settings for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory under which per-request workspaces are created
    pub work_root: PathBuf,
    /// Pause after each converted layer (zero disables it)
    pub layer_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_root: std::env::temp_dir(),
            layer_delay: Duration::ZERO,
        }
    }
}

/// Scoped scratch directory for one conversion
struct Workspace<'a> {
    dir: Option<TempDir>,
    progress: &'a dyn ProgressSink,
}

impl<'a> Workspace<'a> {
    fn create(root: &Path, progress: &'a dyn ProgressSink) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)?;
        debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self {
            dir: Some(dir),
            progress,
        })
    }

    fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => unreachable!("workspace used after release"),
        }
    }
}

impl Drop for Workspace<'_> {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "Removed workspace"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove workspace"),
            }
        }
        self.progress.report(COMPLETE);
    }
}

/// Runs conversions with a shared layer reader
pub struct Converter {
    reader: Arc<dyn LayerReader>,
    config: PipelineConfig,
}

impl Converter {
    pub fn new(reader: Arc<dyn LayerReader>, config: PipelineConfig) -> Self {
        Self { reader, config }
    }

    /// Convert one upload.
    ///
    /// Reports 0 on entry, a capped per-layer value after each layer, and
    /// 100 once the workspace is gone, whatever the result.
    pub async fn convert(
        &self,
        upload: Upload,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, PipelineError> {
        progress.report(0);
        let workspace = Workspace::create(&self.config.work_root, progress)?;
        let outcome = self.run(upload, workspace.path(), progress).await;
        drop(workspace);
        outcome
    }

    async fn run(
        &self,
        upload: Upload,
        dir: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<ConversionOutcome, PipelineError> {
        let upload_dir = dir.join(UPLOAD_DIR);
        let out_dir = dir.join(OUTPUT_DIR);
        tokio::fs::create_dir(&upload_dir).await?;
        tokio::fs::create_dir(&out_dir).await?;

        let dest = upload_dir.clone();
        let payload_len = upload.payload.len();
        let extracted = spawn_blocking(move || {
            extract_upload(&upload.payload, upload.file_name.as_deref(), &dest)
        })
        .await??;
        info!(bytes = payload_len, files = extracted, "Extracted upload");

        let root = upload_dir;
        let Some(container) = spawn_blocking(move || find_container(&root)).await?? else {
            info!("No .gdb container in upload");
            return Ok(ConversionOutcome::NoContainer);
        };

        let reader = Arc::clone(&self.reader);
        let listed_from = container.clone();
        let layers = spawn_blocking(move || reader.list_layers(&listed_from)).await??;
        info!(
            container = %container.display(),
            layers = layers.len(),
            "Converting layers"
        );

        let mut names = OutputNames::new();
        let mut files = Vec::with_capacity(layers.len());
        let mut entries = Vec::with_capacity(layers.len());

        for (i, layer) in layers.iter().enumerate() {
            let stem = names.claim(layer);
            let reader = Arc::clone(&self.reader);
            let container = container.clone();
            let out = out_dir.clone();
            let name = layer.clone();

            let path = spawn_blocking(move || {
                convert_layer(reader.as_ref(), &container, &name, &stem, &out)
            })
            .await??;

            if let Some(entry) = path.file_name().and_then(|n| n.to_str()) {
                entries.push(entry.to_string());
            }
            files.push(path);

            let pct = layer_progress(i + 1, layers.len());
            progress.report(pct);
            info!(layer = %layer, progress = pct, "Layer converted");

            if !self.config.layer_delay.is_zero() {
                tokio::time::sleep(self.config.layer_delay).await;
            }
        }

        let bytes = spawn_blocking(move || package_files(&files)).await??;
        info!(entries = entries.len(), bytes = bytes.len(), "Packaged results");

        Ok(ConversionOutcome::Archive(ExportArchive {
            bytes,
            layers,
            entries,
        }))
    }
}
