//! gdb2xlsx - File Geodatabase to Excel converter
//!
//! Takes a zip archive holding a File Geodatabase (`*.gdb` directory),
//! converts every layer to an `.xlsx` spreadsheet, and hands the
//! spreadsheets back as a single zip. Runs as an HTTP service with a
//! progress polling endpoint, or as a one-shot local command.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  POST /convert (multipart: file, upload_id)                   │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Converter (pipeline)                        │
//! │                                                               │
//! │   TempDir workspace ── unzip ── find *.gdb ── list layers     │
//! │                                     │                         │
//! │              ┌──────────────────────┘                         │
//! │              ▼                                                │
//! │   for each layer:  LayerReader ─► Table ─► strip tz ─► .xlsx  │
//! │                    progress = min(i*100/N, 90)                │
//! │                                                               │
//! │   zip spreadsheets ─► exports.zip bytes                       │
//! │   drop workspace ─► progress = 100                            │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │
//!              ┌─────────────────┴──────────────┐
//!              ▼                                ▼
//!     ┌─────────────────┐            ┌─────────────────────┐
//!     │  ProgressStore  │◄───────────│ GET /progress/{id}  │
//!     │  (TTL, in-mem)  │            └─────────────────────┘
//!     └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Start the service
//! gdb2xlsx serve --port 8000
//!
//! # Upload and poll
//! curl -F file=@parcels.zip -F upload_id=abc123 localhost:8000/convert -o exports.zip
//! curl localhost:8000/progress/abc123
//!
//! # Convert locally
//! gdb2xlsx convert parcels.zip -o exports.zip
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod layer;
pub mod pipeline;
pub mod progress;
pub mod server;

pub use config::{CliArgs, Command, ConvertConfig, ServerConfig};
pub use error::{ConfigError, PipelineError, ServerError};
pub use pipeline::{ConversionOutcome, Converter, ExportArchive, PipelineConfig, Upload};
