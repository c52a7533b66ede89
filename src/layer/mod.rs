//! Layer model and conversion.
//!
//! A layer is read into a [`Table`] (ordered columns, rows of [`Cell`]s)
//! by a [`LayerReader`], normalized, and written out as one `.xlsx` file.

pub mod convert;
#[cfg(feature = "gdal")]
pub mod gdal_reader;
pub mod reader;
pub mod xlsx;

pub use convert::{convert_layer, OutputNames};
#[cfg(feature = "gdal")]
pub use gdal_reader::GdalReader;
pub use reader::LayerReader;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Name of the trailing column that carries geometry as WKT
pub const GEOMETRY_COLUMN: &str = "geometry";

/// One attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Timestamp carrying a UTC offset; not representable in xlsx
    DateTimeTz(DateTime<FixedOffset>),
    /// Geometry rendered as WKT
    Geometry(String),
}

impl Cell {
    /// Replace an offset-carrying timestamp with its local wall-clock time
    pub fn strip_timezone(self) -> Self {
        match self {
            Cell::DateTimeTz(dt) => Cell::DateTime(dt.naive_local()),
            other => other,
        }
    }
}

/// In-memory rows of one layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Convert every timezone-aware timestamp to naive local time
    pub fn strip_timezones(&mut self) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if matches!(cell, Cell::DateTimeTz(_)) {
                    *cell = std::mem::replace(cell, Cell::Null).strip_timezone();
                }
            }
        }
    }
}

/// Make a layer name safe for use as a file name: every character that is
/// not alphanumeric becomes `_`.
pub fn sanitize_layer_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_layer_name() {
        assert_eq!(sanitize_layer_name("roads"), "roads");
        assert_eq!(sanitize_layer_name("parcels-2020"), "parcels_2020");
        assert_eq!(sanitize_layer_name("a b.c/d\\e"), "a_b_c_d_e");
        assert_eq!(sanitize_layer_name("Straße_ß"), "Straße_ß");
        assert_eq!(sanitize_layer_name(""), "");
    }

    #[test]
    fn test_sanitize_idempotent_and_total() {
        for name in ["roads", "parcels-2020", "../../etc", "x y z", "ü-ñ", "__a__", "%%"] {
            let once = sanitize_layer_name(name);
            assert_eq!(sanitize_layer_name(&once), once);
            assert!(once.chars().all(|c| c.is_alphanumeric() || c == '_'));
            assert_eq!(once.chars().count(), name.chars().count());
        }
    }

    #[test]
    fn test_strip_timezones_keeps_wall_clock() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let aware = offset.with_ymd_and_hms(2021, 6, 1, 8, 30, 0).unwrap();

        let mut table = Table::new(vec!["id".into(), "created".into()]);
        table.push_row(vec![Cell::Integer(1), Cell::DateTimeTz(aware)]);
        table.push_row(vec![Cell::Integer(2), Cell::Null]);
        table.strip_timezones();

        let expected = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(table.rows[0][1], Cell::DateTime(expected));
        assert_eq!(table.rows[1][1], Cell::Null);
        assert_eq!(table.rows[0][0], Cell::Integer(1));
    }
}
