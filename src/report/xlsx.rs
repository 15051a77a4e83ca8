use rust_xlsxwriter::{Format, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::data::model::{CellValue, Table};
use crate::error::Result;

/// Write `table` to a single-sheet workbook, header row first, column
/// order preserved.
pub fn write_table(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_with_format(0, col as u16, name.as_str(), &header)?;
        let width = name.len().clamp(10, 40) as f64 + 2.0;
        sheet.set_column_width(col as u16, width)?;
    }

    for (r, record) in table.rows.iter().enumerate() {
        let row = r as u32 + 1;
        for (col, cell) in record.cells.iter().enumerate() {
            write_cell(sheet, row, col as u16, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Write a cell with its native type; nulls stay blank.
fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
) -> std::result::Result<(), XlsxError> {
    match cell {
        CellValue::String(s) | CellValue::Date(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(v) if v.is_finite() => {
            sheet.write_number(row, col, *v)?;
        }
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::Float(_) | CellValue::Null => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_workbook_bytes;
    use crate::data::model::tests::{s, table};

    #[test]
    fn reload_preserves_rows_and_columns() {
        let t = table(
            &["YEAR", "QUARTER NO", "A/C TYPE", "P/N", "ATA", "NO OF REMOVAL", "REMOVAL RATE"],
            vec![
                vec![CellValue::Integer(2024), CellValue::Integer(1), s("A320"), s("3214552-5"), CellValue::Integer(21), CellValue::Integer(5), CellValue::Float(0.42)],
                vec![CellValue::Integer(2024), CellValue::Integer(2), s("B777"), CellValue::Null, CellValue::Integer(32), CellValue::Integer(2), CellValue::Float(1.5)],
            ],
        );

        let bytes = write_table(&t, "Filtered CAN").unwrap();
        assert_eq!(&bytes[0..2], b"PK");

        let back = load_workbook_bytes(&bytes).unwrap();
        assert_eq!(back.columns, t.columns);
        assert_eq!(back.len(), t.len());
        assert_eq!(back.rows[0].cells, t.rows[0].cells);
        assert_eq!(back.rows[1].get(3), &CellValue::Null);
    }

    #[test]
    fn empty_table_keeps_header() {
        let t = table(&["YEARS", "ETOPS"], vec![]);
        let back = load_workbook_bytes(&write_table(&t, "Filtered SAN").unwrap()).unwrap();
        assert_eq!(back.columns, vec!["YEARS", "ETOPS"]);
        assert!(back.is_empty());
    }

    #[test]
    fn booleans_survive() {
        let t = table(&["ETOPS"], vec![vec![CellValue::Bool(true)], vec![CellValue::Bool(false)]]);
        let back = load_workbook_bytes(&write_table(&t, "Filtered SAN").unwrap()).unwrap();
        assert_eq!(back.rows[0].cells, vec![CellValue::Bool(true)]);
        assert_eq!(back.rows[1].cells, vec![CellValue::Bool(false)]);
    }
}
