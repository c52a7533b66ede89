//! Conversion progress tracking
//!
//! Two consumers care about progress:
//! - the HTTP service, which records a percentage per upload id in a
//!   [`ProgressStore`] so clients can poll it
//! - the local `convert` command, which draws an indicatif progress bar
//!
//! The pipeline only sees the [`ProgressSink`] trait and does not know which
//! one it is feeding.

use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Highest value reported while layers are still being converted.
/// 100 is only reported once the workspace has been cleaned up.
pub const MAX_LAYER_PROGRESS: u8 = 90;

/// Final value, reported after cleanup
pub const COMPLETE: u8 = 100;

/// Percentage after `done` of `total` layers, capped at [`MAX_LAYER_PROGRESS`].
pub fn layer_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (done.min(total) * 100) / total;
    pct.min(MAX_LAYER_PROGRESS as usize) as u8
}

/// Keyed progress storage shared between requests.
///
/// Implementations must be safe to call from any request handler.
pub trait ProgressStore: Send + Sync {
    /// Record the progress for an upload, creating the entry if needed
    fn set(&self, upload_id: &str, percent: u8);

    /// Last recorded progress, 0 for unknown ids
    fn get(&self, upload_id: &str) -> u8;
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    percent: u8,
    touched: Instant,
}

/// In-memory progress store with idle-entry eviction
pub struct MemoryProgressStore {
    slots: RwLock<HashMap<String, Slot>>,
    /// Entries not written for this long are dropped (None = keep forever)
    ttl: Option<Duration>,
}

impl MemoryProgressStore {
    /// Create a store; `ttl` of `None` keeps entries for the process lifetime
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of tracked uploads
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, slot: &Slot) -> bool {
        self.ttl.is_some_and(|ttl| slot.touched.elapsed() > ttl)
    }
}

impl Default for MemoryProgressStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProgressStore for MemoryProgressStore {
    fn set(&self, upload_id: &str, percent: u8) {
        let slot = Slot {
            percent: percent.min(COMPLETE),
            touched: Instant::now(),
        };
        let mut slots = self.slots.write();
        slots.retain(|_, s| !self.is_expired(s));
        slots.insert(upload_id.to_string(), slot);
    }

    fn get(&self, upload_id: &str) -> u8 {
        match self.slots.read().get(upload_id) {
            Some(slot) if !self.is_expired(slot) => slot.percent,
            _ => 0,
        }
    }
}

/// Receives progress updates from a running conversion
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

/// Sink that records progress for one upload id in a [`ProgressStore`]
pub struct StoreSink {
    store: Arc<dyn ProgressStore>,
    upload_id: String,
}

impl StoreSink {
    pub fn new(store: Arc<dyn ProgressStore>, upload_id: impl Into<String>) -> Self {
        Self {
            store,
            upload_id: upload_id.into(),
        }
    }
}

impl ProgressSink for StoreSink {
    fn report(&self, percent: u8) {
        self.store.set(&self.upload_id, percent);
    }
}

/// Sink that discards updates
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8) {}
}

/// Terminal progress bar for the local convert command
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(u64::from(COMPLETE));

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .expect("Invalid progress template")
                .progress_chars("=> "),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressReporter {
    fn report(&self, percent: u8) {
        self.bar.set_position(u64::from(percent.min(COMPLETE)));
    }
}

/// Print a summary of a local conversion
pub fn print_summary(layers: &[String], archive_bytes: u64, duration: Duration, output: &str) {
    println!();
    println!("{}", style("Conversion Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Layers:").bold(), layers.len());
    for name in layers {
        println!("    {} {}", style("-").dim(), name);
    }
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        duration.as_secs_f64()
    );
    println!(
        "  {} {} ({})",
        style("Output:").bold(),
        output,
        format_size(archive_bytes, BINARY)
    );
    println!();
}

/// Print a header at the start of a local conversion
pub fn print_header(input: &str, output: &str) {
    println!();
    println!(
        "{} {}",
        style("gdb2xlsx").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Input:").bold(), input);
    println!("  {} {}", style("Output:").bold(), output);
    println!();
}
