//! GDAL-backed layer reader
//!
//! Opens the container with GDAL's vector drivers (OpenFileGDB for `.gdb`
//! directories) and copies each feature's attributes into a [`Table`].
//! Geometry, when the layer has any, is appended as a WKT column.

use crate::error::{LayerError, LayerResult};
use crate::layer::reader::LayerReader;
use crate::layer::{Cell, Table, GEOMETRY_COLUMN};
use gdal::vector::{FieldValue, LayerAccess};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use std::path::Path;
use tracing::debug;

/// Reads layers through the system GDAL library
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalReader;

impl GdalReader {
    pub fn new() -> Self {
        Self
    }

    fn open(container: &Path) -> LayerResult<Dataset> {
        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_READONLY,
            ..Default::default()
        };
        Dataset::open_ex(container, options).map_err(|e| LayerError::Open {
            path: container.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl LayerReader for GdalReader {
    fn list_layers(&self, container: &Path) -> LayerResult<Vec<String>> {
        let dataset = Self::open(container)?;
        let names: Vec<String> = dataset.layers().map(|layer| layer.name()).collect();
        debug!(container = %container.display(), layers = names.len(), "Listed layers");
        Ok(names)
    }

    fn read_layer(&self, container: &Path, name: &str) -> LayerResult<Table> {
        let dataset = Self::open(container)?;
        let mut layer = dataset.layer_by_name(name).map_err(|e| LayerError::Read {
            layer: name.to_string(),
            reason: e.to_string(),
        })?;

        let mut columns: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
        let has_geometry = layer.defn().geom_fields().next().is_some();
        if has_geometry {
            columns.push(GEOMETRY_COLUMN.to_string());
        }

        let mut table = Table::new(columns);
        for feature in layer.features() {
            let mut row: Vec<Cell> = feature
                .fields()
                .map(|(_, value)| value.map(field_to_cell).unwrap_or(Cell::Null))
                .collect();

            if has_geometry {
                let geometry = match feature.geometry() {
                    Some(geom) => Cell::Geometry(geom.wkt().map_err(|e| LayerError::Read {
                        layer: name.to_string(),
                        reason: e.to_string(),
                    })?),
                    None => Cell::Null,
                };
                row.push(geometry);
            }

            table.push_row(row);
        }

        debug!(layer = name, rows = table.row_count(), "Read layer");
        Ok(table)
    }
}

#[allow(unreachable_patterns)]
fn field_to_cell(value: FieldValue) -> Cell {
    match value {
        FieldValue::IntegerValue(v) => Cell::Integer(i64::from(v)),
        FieldValue::Integer64Value(v) => Cell::Integer(v),
        FieldValue::RealValue(v) => Cell::Real(v),
        FieldValue::StringValue(v) => Cell::Text(v),
        FieldValue::DateValue(v) => Cell::Date(v),
        FieldValue::DateTimeValue(v) => Cell::DateTimeTz(v),
        FieldValue::IntegerListValue(v) => Cell::Text(format!("{v:?}")),
        FieldValue::Integer64ListValue(v) => Cell::Text(format!("{v:?}")),
        FieldValue::RealListValue(v) => Cell::Text(format!("{v:?}")),
        FieldValue::StringListValue(v) => Cell::Text(format!("{v:?}")),
        other => other.into_string().map(Cell::Text).unwrap_or(Cell::Null),
    }
}
