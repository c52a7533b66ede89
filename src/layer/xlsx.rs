//! Write a [`Table`] to an `.xlsx` workbook with rust_xlsxwriter.
//!
//! Layout: one worksheet, a bold header row with the column names, then one
//! row per feature. No index column.

use crate::error::LayerResult;
use crate::layer::{Cell, Table};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// Longest string an xlsx cell may hold
pub const MAX_CELL_CHARS: usize = 32_767;

/// Longest worksheet name Excel accepts
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// Sheet name Excel keeps for itself, compared case-insensitively
const RESERVED_SHEET_NAME: &str = "History";

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Cell formats shared by every row
struct Formats {
    header: Format,
    date: Format,
    datetime: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            date: Format::new().set_num_format(DATE_FORMAT),
            datetime: Format::new().set_num_format(DATETIME_FORMAT),
        }
    }
}

/// Write `table` to `path`, naming the worksheet after `sheet_name`.
pub fn write_table(table: &Table, sheet_name: &str, path: &Path) -> LayerResult<()> {
    let formats = Formats::new();
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    if let Some(name) = sheet_title(sheet_name) {
        worksheet.set_name(&name)?;
    }

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, truncate(name), &formats.header)?;
    }

    for (row_idx, cells) in table.rows.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            write_cell(worksheet, &formats, row, col as u16, cell)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Worksheet name for `name`, or `None` to keep the default `Sheet1`
fn sheet_title(name: &str) -> Option<String> {
    let name: String = name.chars().take(MAX_SHEET_NAME_CHARS).collect();
    if name.is_empty() || name.eq_ignore_ascii_case(RESERVED_SHEET_NAME) {
        return None;
    }
    Some(name)
}

fn write_cell(ws: &mut Worksheet, formats: &Formats, row: u32, col: u16, cell: &Cell) -> LayerResult<()> {
    match cell {
        Cell::Null => { /* Leave cell empty */ }
        Cell::Integer(i) => {
            ws.write_number(row, col, *i as f64)?;
        }
        Cell::Real(f) if f.is_finite() => {
            ws.write_number(row, col, *f)?;
        }
        Cell::Real(_) => { /* NaN and infinities stay empty */ }
        Cell::Text(s) | Cell::Geometry(s) => {
            ws.write_string(row, col, truncate(s))?;
        }
        Cell::Date(d) => match d.and_hms_opt(0, 0, 0).and_then(excel_serial) {
            Some(serial) => {
                ws.write_number_with_format(row, col, serial, &formats.date)?;
            }
            None => {
                ws.write_string(row, col, d.format("%Y-%m-%d").to_string())?;
            }
        },
        Cell::DateTime(dt) => write_datetime(ws, formats, row, col, *dt)?,
        Cell::DateTimeTz(dt) => write_datetime(ws, formats, row, col, dt.naive_local())?,
    }
    Ok(())
}

fn write_datetime(
    ws: &mut Worksheet,
    formats: &Formats,
    row: u32,
    col: u16,
    dt: NaiveDateTime,
) -> LayerResult<()> {
    match excel_serial(dt) {
        Some(serial) => {
            ws.write_number_with_format(row, col, serial, &formats.datetime)?;
        }
        None => {
            ws.write_string(row, col, dt.format("%Y-%m-%dT%H:%M:%S").to_string())?;
        }
    }
    Ok(())
}

/// Excel 1900-system serial number for a timestamp.
///
/// None before 1900-03-01, where Excel's phantom 1900-02-29 makes serials
/// ambiguous.
pub fn excel_serial(dt: NaiveDateTime) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let first_valid = NaiveDate::from_ymd_opt(1900, 3, 1)?.and_hms_opt(0, 0, 0)?;
    if dt < first_valid {
        return None;
    }
    let millis = (dt - epoch).num_milliseconds();
    Some(millis as f64 / 86_400_000.0)
}

/// Clip text to the xlsx cell limit on a character boundary
fn truncate(s: &str) -> &str {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::tempdir;

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_excel_serial() {
        assert_eq!(excel_serial(datetime(1900, 3, 1, 0, 0, 0)), Some(61.0));
        assert_eq!(excel_serial(datetime(2021, 6, 1, 0, 0, 0)), Some(44348.0));
        assert_eq!(excel_serial(datetime(2021, 6, 1, 12, 0, 0)), Some(44348.5));
        assert_eq!(excel_serial(datetime(1899, 12, 31, 0, 0, 0)), None);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "é".repeat(MAX_CELL_CHARS + 10);
        assert_eq!(truncate(&long).chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn test_write_table_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roads.xlsx");

        let mut table = Table::new(vec!["id".into(), "name".into(), "length".into(), "geometry".into()]);
        table.push_row(vec![
            Cell::Integer(7),
            Cell::Text("Main St".into()),
            Cell::Real(12.5),
            Cell::Geometry("LINESTRING (0 0,1 1)".into()),
        ]);
        table.push_row(vec![Cell::Integer(8), Cell::Null, Cell::Real(f64::NAN), Cell::Null]);

        write_table(&table, "roads", &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["roads".to_string()]);
        let range = workbook.worksheet_range("roads").unwrap();

        assert_eq!(range.get_value((0, 0)), Some(&Data::String("id".into())));
        assert_eq!(range.get_value((0, 3)), Some(&Data::String("geometry".into())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(7.0)));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("Main St".into())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(12.5)));
        assert_eq!(
            range.get_value((1, 3)),
            Some(&Data::String("LINESTRING (0 0,1 1)".into()))
        );
        assert!(matches!(range.get_value((2, 1)), None | Some(Data::Empty)));
    }

    #[test]
    fn test_reserved_sheet_name_falls_back() {
        let dir = tempdir().unwrap();
        for name in ["History", "history", "HISTORY"] {
            let path = dir.path().join(format!("{name}.xlsx"));
            write_table(&Table::new(vec!["x".into()]), name, &path).unwrap();

            let workbook: Xlsx<_> = open_workbook(&path).unwrap();
            assert_eq!(workbook.sheet_names(), vec!["Sheet1".to_string()]);
        }
        assert_eq!(sheet_title("Historic").as_deref(), Some("Historic"));
    }

    #[test]
    fn test_long_sheet_name_is_clipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.xlsx");
        let name = "a".repeat(40);

        write_table(&Table::new(vec!["x".into()]), &name, &path).unwrap();

        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["a".repeat(MAX_SHEET_NAME_CHARS)]);
    }
}
