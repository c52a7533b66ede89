//! gdb2xlsx - File Geodatabase to Excel converter
//!
//! Entry point for the CLI application.

use anyhow::{bail, Context, Result};
use clap::Parser;
use gdb2xlsx::config::{CliArgs, Command, ConvertConfig, ServerConfig};
use gdb2xlsx::layer::LayerReader;
use gdb2xlsx::pipeline::{ConversionOutcome, Converter, Upload, NO_CONTAINER_MESSAGE};
use gdb2xlsx::progress::{print_header, print_summary, NoProgress, ProgressReporter};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(dispatch(args.command))
}

async fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Serve {
            bind,
            port,
            work_dir,
            max_upload_mb,
            layer_delay_ms,
            progress_ttl_secs,
        } => {
            let config = ServerConfig::new(
                &bind,
                port,
                work_dir,
                max_upload_mb,
                layer_delay_ms,
                progress_ttl_secs,
            )
            .context("Invalid configuration")?;
            run_serve(config).await
        }
        Command::Convert {
            input,
            output,
            work_dir,
            quiet,
        } => {
            let config = ConvertConfig::new(input, output, work_dir, quiet)
                .context("Invalid configuration")?;
            run_convert(config).await
        }
    }
}

async fn run_serve(config: ServerConfig) -> Result<()> {
    let reader = layer_reader()?;
    gdb2xlsx::server::serve(config, reader)
        .await
        .context("Server failed")
}

/// Run the conversion pipeline on a local file
async fn run_convert(config: ConvertConfig) -> Result<()> {
    let reader = layer_reader()?;
    let input_display = config.input.display().to_string();
    let output_display = config.output.display().to_string();

    if config.show_progress {
        print_header(&input_display, &output_display);
    }

    let payload = tokio::fs::read(&config.input)
        .await
        .with_context(|| format!("Failed to read {}", input_display))?;
    let upload = Upload {
        file_name: config
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string),
        payload: payload.into(),
    };

    let converter = Converter::new(reader, config.pipeline.clone());
    let start = Instant::now();

    let outcome = if config.show_progress {
        let reporter = ProgressReporter::new();
        reporter.set_status("Converting layers...");
        let result = converter.convert(upload, &reporter).await;
        match &result {
            Ok(ConversionOutcome::Archive(_)) => reporter.finish("Conversion complete"),
            _ => reporter.finish_and_clear(),
        }
        result
    } else {
        converter.convert(upload, &NoProgress).await
    };

    let archive = match outcome.context("Conversion failed")? {
        ConversionOutcome::Archive(archive) => archive,
        ConversionOutcome::NoContainer => bail!(NO_CONTAINER_MESSAGE),
    };

    tokio::fs::write(&config.output, &archive.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output_display))?;

    info!(
        layers = archive.layers.len(),
        bytes = archive.bytes.len(),
        output = %output_display,
        "Conversion finished"
    );

    if config.show_progress {
        print_summary(
            &archive.entries,
            archive.bytes.len() as u64,
            start.elapsed(),
            &output_display,
        );
    }

    Ok(())
}

#[cfg(feature = "gdal")]
fn layer_reader() -> Result<Arc<dyn LayerReader>> {
    Ok(Arc::new(gdb2xlsx::layer::GdalReader::new()))
}

#[cfg(not(feature = "gdal"))]
fn layer_reader() -> Result<Arc<dyn LayerReader>> {
    bail!("gdb2xlsx was built without the `gdal` feature; no layer reader is available")
}

fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose {
        "gdb2xlsx=debug,tower_http=debug,warn"
    } else {
        "gdb2xlsx=info,tower_http=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
