//! Source of layer data.

use crate::error::LayerResult;
use crate::layer::Table;
use std::path::Path;

/// Reads layers out of a geodatabase container.
///
/// Calls are blocking; the pipeline runs them on the blocking thread pool.
pub trait LayerReader: Send + Sync {
    /// Layer names in the container's enumeration order
    fn list_layers(&self, container: &Path) -> LayerResult<Vec<String>>;

    /// Read one layer, preserving field and feature order
    fn read_layer(&self, container: &Path, layer: &str) -> LayerResult<Table>;
}
