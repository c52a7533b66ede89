//! Configuration types for gdb2xlsx
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Validated runtime configuration for the server and the local converter

use crate::error::ConfigError;
use crate::pipeline::{PipelineConfig, EXPORT_FILE_NAME};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for the request body limit
const MAX_UPLOAD_MB: usize = 4096;

/// Convert zipped File Geodatabases to Excel spreadsheets
#[derive(Parser, Debug, Clone)]
#[command(
    name = "gdb2xlsx",
    version,
    about = "Convert zipped File Geodatabase layers to Excel spreadsheets",
    long_about = "Accepts a zip holding a .gdb folder, converts every layer to an .xlsx \
                  spreadsheet with GDAL, and returns the spreadsheets as exports.zip.\n\n\
                  Run as an HTTP service with 'serve', or convert a local file with 'convert'.",
    after_help = "EXAMPLES:\n    \
        gdb2xlsx serve --port 8000\n    \
        gdb2xlsx serve --layer-delay-ms 1000 --max-upload-mb 1024\n    \
        gdb2xlsx convert parcels.zip -o parcels-xlsx.zip"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP conversion service
    Serve {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Directory for per-request scratch space (defaults to the system temp dir)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        /// Largest accepted upload, in megabytes
        #[arg(long, default_value = "512", value_name = "MB")]
        max_upload_mb: usize,

        /// Pause after each converted layer, in milliseconds (0 disables)
        #[arg(long, default_value = "0", value_name = "MS")]
        layer_delay_ms: u64,

        /// Forget progress of uploads idle this long, in seconds (0 keeps forever)
        #[arg(long, default_value = "3600", value_name = "SECS")]
        progress_ttl_secs: u64,
    },

    /// Convert a local zip file
    Convert {
        /// Zip archive containing a .gdb folder
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output zip file
        #[arg(short, long, default_value = EXPORT_FILE_NAME, value_name = "FILE")]
        output: PathBuf,

        /// Directory for scratch space (defaults to the system temp dir)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        /// Quiet mode - suppress progress output
        #[arg(short = 'q', long)]
        quiet: bool,
    },
}

/// Validated settings for `serve`
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub pipeline: PipelineConfig,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Progress entry lifetime; None keeps entries forever
    pub progress_ttl: Option<Duration>,
}

/// Validated settings for `convert`
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pipeline: PipelineConfig,
    pub show_progress: bool,
}

fn resolve_work_dir(work_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    let dir = work_dir.unwrap_or_else(std::env::temp_dir);
    if !dir.is_dir() {
        return Err(ConfigError::InvalidWorkDir {
            path: dir,
            reason: "not an existing directory".to_string(),
        });
    }
    Ok(dir)
}

impl ServerConfig {
    /// Validate the `serve` arguments
    pub fn new(
        bind: &str,
        port: u16,
        work_dir: Option<PathBuf>,
        max_upload_mb: usize,
        layer_delay_ms: u64,
        progress_ttl_secs: u64,
    ) -> Result<Self, ConfigError> {
        let address = format!("{}:{}", bind, port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidBindAddress {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        if max_upload_mb == 0 || max_upload_mb > MAX_UPLOAD_MB {
            return Err(ConfigError::InvalidUploadLimit {
                mb: max_upload_mb,
                max: MAX_UPLOAD_MB,
            });
        }

        let progress_ttl = (progress_ttl_secs > 0).then(|| Duration::from_secs(progress_ttl_secs));

        Ok(Self {
            addr,
            pipeline: PipelineConfig {
                work_root: resolve_work_dir(work_dir)?,
                layer_delay: Duration::from_millis(layer_delay_ms),
            },
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            progress_ttl,
        })
    }
}

impl ConvertConfig {
    /// Validate the `convert` arguments
    pub fn new(
        input: PathBuf,
        output: PathBuf,
        work_dir: Option<PathBuf>,
        quiet: bool,
    ) -> Result<Self, ConfigError> {
        if !input.is_file() {
            return Err(ConfigError::InvalidInput {
                path: input,
                reason: "file does not exist".to_string(),
            });
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ConfigError::InvalidInput {
                    path: output.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        Ok(Self {
            input,
            output,
            pipeline: PipelineConfig {
                work_root: resolve_work_dir(work_dir)?,
                layer_delay: Duration::ZERO,
            },
            show_progress: !quiet,
        })
    }
}
