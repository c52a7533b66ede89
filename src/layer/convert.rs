//! Convert one layer to one spreadsheet file.

use crate::error::LayerResult;
use crate::layer::reader::LayerReader;
use crate::layer::{sanitize_layer_name, xlsx};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Spreadsheet file extension
pub const XLSX_EXTENSION: &str = "xlsx";

/// Hands out output file stems for one conversion.
///
/// Layers whose sanitized names collide (`a-b` and `a_b`) get a numeric
/// suffix so no spreadsheet overwrites another.
#[derive(Debug, Default)]
pub struct OutputNames {
    taken: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique file stem for `layer`
    pub fn claim(&mut self, layer: &str) -> String {
        let base = sanitize_layer_name(layer);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}

/// Read `layer` from `container`, strip timezone offsets, and write it to
/// `<out_dir>/<stem>.xlsx`. Returns the written path.
pub fn convert_layer(
    reader: &dyn LayerReader,
    container: &Path,
    layer: &str,
    stem: &str,
    out_dir: &Path,
) -> LayerResult<PathBuf> {
    let mut table = reader.read_layer(container, layer)?;
    table.strip_timezones();

    let out_path = out_dir.join(format!("{stem}.{XLSX_EXTENSION}"));
    xlsx::write_table(&table, stem, &out_path)?;

    debug!(
        layer,
        rows = table.row_count(),
        columns = table.columns.len(),
        path = %out_path.display(),
        "Converted layer"
    );
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayerError;
    use crate::layer::{Cell, Table};
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use chrono::{FixedOffset, TimeZone};
    use tempfile::tempdir;

    struct OneLayer;

    impl LayerReader for OneLayer {
        fn list_layers(&self, _container: &Path) -> LayerResult<Vec<String>> {
            Ok(vec!["events".into()])
        }

        fn read_layer(&self, _container: &Path, layer: &str) -> LayerResult<Table> {
            if layer != "events" {
                return Err(LayerError::Read {
                    layer: layer.into(),
                    reason: "no such layer".into(),
                });
            }
            let offset = FixedOffset::east_opt(2 * 3600).unwrap();
            let mut table = Table::new(vec!["id".into(), "at".into()]);
            table.push_row(vec![
                Cell::Integer(1),
                Cell::DateTimeTz(offset.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()),
            ]);
            Ok(table)
        }
    }

    #[test]
    fn test_output_names_dedupe() {
        let mut names = OutputNames::new();
        assert_eq!(names.claim("parcels-2020"), "parcels_2020");
        assert_eq!(names.claim("parcels_2020"), "parcels_2020_2");
        assert_eq!(names.claim("parcels 2020"), "parcels_2020_3");
        assert_eq!(names.claim("roads"), "roads");
    }

    #[test]
    fn test_convert_layer_writes_naive_local_time() {
        let dir = tempdir().unwrap();
        let path = convert_layer(&OneLayer, dir.path(), "events", "events", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("events.xlsx"));

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("events").unwrap();
        // 2021-06-01 12:00 local wall clock, offset dropped
        let serial = match range.get_value((1, 1)) {
            Some(Data::DateTime(dt)) => dt.as_f64(),
            Some(Data::Float(f)) => *f,
            other => panic!("unexpected cell {other:?}"),
        };
        assert!((serial - 44348.5).abs() < 1e-9);
    }

    #[test]
    fn test_convert_layer_propagates_read_errors() {
        let dir = tempdir().unwrap();
        let err = convert_layer(&OneLayer, dir.path(), "missing", "missing", dir.path()).unwrap_err();
        assert!(matches!(err, LayerError::Read { .. }));
        assert!(!dir.path().join("missing.xlsx").exists());
    }
}
