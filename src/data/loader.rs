use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Record, Table};
use crate::error::{DashboardError, Result};

/// Header prefix given to columns without a name.
const UNNAMED_PREFIX: &str = "Unnamed";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, first row is the header
/// * `.csv`     – header row followed by records
/// * `.json`    – `[{ "YEAR": 2024, "ATA": 21, ... }, ...]`
/// * `.parquet` – flat columns of strings, ints, floats, bools
///
/// Whatever the format, unnamed columns are dropped and header whitespace
/// is trimmed before the table is returned.
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !path.is_file() {
        return Err(DashboardError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_workbook(path)?,
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(DashboardError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Load the first worksheet of an in-memory workbook.
pub fn load_workbook_bytes(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = first_sheet(&mut workbook)?;
    Ok(table_from_range(&range))
}

// ---------------------------------------------------------------------------
// Column cleaning
// ---------------------------------------------------------------------------

/// Whether a header is a placeholder for a column that had no name.
pub fn is_unnamed(header: &str) -> bool {
    let h = header.trim();
    h.is_empty() || h.starts_with(UNNAMED_PREFIX)
}

/// Drop unnamed columns, trim the remaining headers, and realign rows.
pub fn clean_columns(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Table {
    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_unnamed(h))
        .map(|(i, _)| i)
        .collect();

    let dropped = headers.len() - keep.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} unnamed column(s)");
    }

    let columns = keep.iter().map(|&i| headers[i].trim().to_string()).collect();
    let rows = rows
        .into_iter()
        .map(|mut cells| {
            let kept = keep
                .iter()
                .map(|&i| {
                    cells
                        .get_mut(i)
                        .map(|c| std::mem::replace(c, CellValue::Null))
                        .unwrap_or(CellValue::Null)
                })
                .collect();
            Record::new(kept)
        })
        .collect();

    Table::new(columns, rows)
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = first_sheet(&mut workbook)?;
    Ok(table_from_range(&range))
}

fn first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Range<Data>> {
    match workbook.worksheet_range_at(0) {
        Some(range) => Ok(range?),
        None => Err(DashboardError::Workbook("workbook has no worksheets".into())),
    }
}

fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => format!("{UNNAMED_PREFIX}: {i}"),
                other => other.to_string(),
            })
            .collect(),
        None => return Table::default(),
    };

    let rows: Vec<Vec<CellValue>> = rows_iter
        .map(|row| row.iter().map(workbook_cell).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_null()))
        .collect();

    clean_columns(headers, rows)
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::from_number(*f),
        // Only headers are trimmed; values keep their spacing.
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => CellValue::Date(d.date().to_string()),
            None => CellValue::from_number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one record per line.
///
/// Each column gets one type for all of its cells, see [`infer_column`].
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut raw: Vec<csv::StringRecord> = Vec::new();
    for result in reader.records() {
        raw.push(result?);
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_column(raw.iter().filter_map(|r| r.get(col))))
        .collect();

    let rows: Vec<Vec<CellValue>> = raw
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(&kinds)
                .map(|(text, kind)| kind.cell(text))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(clean_columns(headers, rows))
}

/// Type shared by every cell of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    Bool,
    Text,
}

impl ColumnKind {
    /// Blank cells are null in every kind.
    fn cell(self, text: &str) -> CellValue {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match self {
            ColumnKind::Number => match trimmed.parse::<i64>() {
                Ok(i) => CellValue::Integer(i),
                Err(_) => trimmed
                    .parse::<f64>()
                    .map(CellValue::from_number)
                    .unwrap_or_else(|_| CellValue::String(text.to_string())),
            },
            ColumnKind::Bool => CellValue::Bool(trimmed.eq_ignore_ascii_case("true")),
            ColumnKind::Text => CellValue::String(text.to_string()),
        }
    }
}

/// Numeric when every non-blank cell is a plain decimal, boolean when
/// every one is `true`/`false`, text otherwise. A column of blanks is text.
fn infer_column<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        let this = if is_plain_number(cell) {
            ColumnKind::Number
        } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
            ColumnKind::Bool
        } else {
            return ColumnKind::Text;
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => return ColumnKind::Text,
            Some(_) => {}
        }
    }
    kind.unwrap_or(ColumnKind::Text)
}

/// Optional sign, digits, optional fraction. Exponents, `inf`/`nan` and
/// leading zeros (`0651`) are not numbers here.
fn is_plain_number(s: &str) -> bool {
    let unsigned = s.strip_prefix(&['-', '+'][..]).unwrap_or(s);
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    digits(int) && frac.map_or(true, digits) && !(int.len() > 1 && int.starts_with('0'))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (an array of records):
///
/// ```json
/// [
///   { "YEAR": 2024, "QUARTER NO": 1, "A/C TYPE": "A320", "ATA": 21 },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen order across records.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let records = root
        .as_array()
        .ok_or_else(|| DashboardError::Workbook("expected top-level JSON array".into()))?;

    let mut headers: Vec<String> = Vec::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
    }

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec.as_object().ok_or_else(|| {
                DashboardError::Workbook(format!("row {i} is not a JSON object"))
            })?;
            Ok(headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect())
        })
        .collect::<Result<Vec<Vec<CellValue>>>>()?;

    Ok(clean_columns(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::from_number(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file, one table column per field.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        if headers.is_empty() {
            headers = batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect();
        }
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(clean_columns(headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            CellValue::from_number(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => CellValue::from_number(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::s;

    #[test]
    fn unnamed_and_blank_headers_are_dropped() {
        let headers = vec![
            " YEAR ".to_string(),
            "Unnamed: 1".to_string(),
            "ATA".to_string(),
            "  ".to_string(),
        ];
        let rows = vec![vec![
            CellValue::Integer(2024),
            s("junk"),
            CellValue::Integer(21),
            s("more junk"),
        ]];
        let table = clean_columns(headers, rows);
        assert_eq!(table.columns, vec!["YEAR", "ATA"]);
        assert_eq!(
            table.rows[0].cells,
            vec![CellValue::Integer(2024), CellValue::Integer(21)]
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let table = clean_columns(
            vec!["A".into(), "B".into()],
            vec![vec![CellValue::Integer(1)]],
        );
        assert_eq!(table.rows[0].cells, vec![CellValue::Integer(1), CellValue::Null]);
    }

    #[test]
    fn csv_columns_are_typed_as_a_whole() {
        assert_eq!(infer_column(["21", "", "2024.0", "0.75"].into_iter()), ColumnKind::Number);
        assert_eq!(infer_column(["TRUE", "false"].into_iter()), ColumnKind::Bool);
        assert_eq!(infer_column(["21", "A320"].into_iter()), ColumnKind::Text);
        assert_eq!(infer_column(["1", "true"].into_iter()), ColumnKind::Text);
        assert_eq!(infer_column(["", " "].into_iter()), ColumnKind::Text);

        assert_eq!(ColumnKind::Number.cell(""), CellValue::Null);
        assert_eq!(ColumnKind::Number.cell("21"), CellValue::Integer(21));
        assert_eq!(ColumnKind::Number.cell("2024.0"), CellValue::Integer(2024));
        assert_eq!(ColumnKind::Number.cell("-0.75"), CellValue::Float(-0.75));
        assert_eq!(ColumnKind::Bool.cell("TRUE"), CellValue::Bool(true));
        assert_eq!(ColumnKind::Text.cell("A320"), s("A320"));
    }

    #[test]
    fn plain_numbers_only() {
        for ok in ["0", "651", "-3", "+2", "0.5", "12.75"] {
            assert!(is_plain_number(ok), "{ok}");
        }
        for bad in ["0651", "1E3", "1e-2", "NaN", "inf", "-", ".5", "5.", "1.2.3", "0x1F"] {
            assert!(!is_plain_number(bad), "{bad}");
        }
    }

    #[test]
    fn part_numbers_in_csv_stay_distinct() {
        let path = std::env::temp_dir().join("fleet-reliability-part-numbers.csv");
        std::fs::write(&path, "P/N,ATA\n0651,21\n651,21\nNaN,32\n1E3,32\n,49\n").unwrap();
        let table = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let parts: Vec<&CellValue> = table.column_values(0).collect();
        assert_eq!(
            parts,
            vec![&s("0651"), &s("651"), &s("NaN"), &s("1E3"), &CellValue::Null]
        );
        assert_eq!(table.unique_values("P/N").unwrap().len(), 4);
        assert_eq!(table.rows[0].get(1), &CellValue::Integer(21));
    }

    #[test]
    fn workbook_blank_header_column_is_dropped() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, " YEAR ").unwrap();
        sheet.write_string(0, 2, "A/C TYPE").unwrap();
        for (row, (year, note, aircraft)) in
            [(2023.0, "shop visit", " A320"), (2024.0, "deferred", "A320")]
                .into_iter()
                .enumerate()
        {
            let row = row as u32 + 1;
            sheet.write_number(row, 0, year).unwrap();
            sheet.write_string(row, 1, note).unwrap();
            sheet.write_string(row, 2, aircraft).unwrap();
        }
        let bytes = workbook.save_to_buffer().unwrap();

        let table = load_workbook_bytes(&bytes).unwrap();
        assert_eq!(table.columns, vec!["YEAR", "A/C TYPE"]);
        assert_eq!(
            table.rows[0].cells,
            vec![CellValue::Integer(2023), s(" A320")]
        );
        assert_eq!(table.unique_values("A/C TYPE").unwrap().len(), 2);
    }

    #[test]
    fn missing_file_fails_with_path() {
        let err = load_file(Path::new("does-not-exist/CAN.xlsx")).unwrap_err();
        assert!(err.to_string().contains("CAN.xlsx"), "{err}");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = std::env::temp_dir().join("fleet-reliability-unsupported.txt");
        std::fs::write(&path, "ATA\n21\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DashboardError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn json_records_keep_first_seen_column_order() {
        let dir = std::env::temp_dir().join("fleet-reliability-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("san.json");
        std::fs::write(
            &path,
            r#"[{"ATA": 21, "ETOPS": true}, {"ATA": 32, "RATE": 1.5}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["ATA", "ETOPS", "RATE"]);
        assert_eq!(table.rows[1].cells[1], CellValue::Null);
        assert_eq!(table.rows[1].cells[2], CellValue::Float(1.5));
    }
}
