//! Spreadsheet ingestion
//!
//! Turns an uploaded workbook or CSV file into row-records. The first
//! non-empty row of each sheet names the columns. Every later non-empty row
//! becomes one record holding only its non-empty cells, keyed in header order.
//!
//! Header rules:
//! - blank header cells are named `__EMPTY`
//! - repeated names get `_1`, `_2`, ... suffixes
//! - rows wider than the header extend it with further `__EMPTY` columns

use arms_common::row::{cell_text, RowRecord};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Records included in each sheet summary
pub const PREVIEW_ROWS: usize = 10;

/// Sheet name reported for CSV uploads
pub const CSV_SHEET_NAME: &str = "Sheet1";

const EMPTY_HEADER: &str = "__EMPTY";

/// Largest integer an f64 holds exactly (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Extension is not a supported spreadsheet format
    #[error("Invalid file type. Only Excel and CSV files are allowed.")]
    UnsupportedFileType(String),

    /// Workbook could not be opened or a sheet could not be read
    #[error("{0}")]
    Workbook(#[from] calamine::Error),

    /// CSV could not be read
    #[error("{0}")]
    Csv(#[from] csv::Error),
}

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Workbook,
    Csv,
}

impl FileKind {
    /// Classify a file by its extension (case-insensitive)
    pub fn from_file_name(file_name: &str) -> Result<Self, IngestError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xls" | "ods") => Ok(FileKind::Workbook),
            Some("csv") => Ok(FileKind::Csv),
            _ => Err(IngestError::UnsupportedFileType(file_name.to_string())),
        }
    }
}

/// Per-sheet overview returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub name: String,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub preview: Vec<RowRecord>,
}

/// Result of ingesting one upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedWorkbook {
    /// Every sheet in the file
    pub available_sheets: Vec<String>,
    /// Sheets that were processed, in processing order
    pub sheets: Vec<String>,
    pub summaries: Vec<SheetSummary>,
    /// Records of all processed sheets, concatenated in sheet order
    pub records: Vec<RowRecord>,
}

/// Cells of one sheet, row by row. None marks an empty cell.
type Grid = Vec<Vec<Option<Value>>>;

/// Parse an uploaded file into row-records
///
/// An empty `selected_sheets` processes every sheet. Selected names that do
/// not exist in the file are skipped.
pub fn parse_upload(
    file_name: &str,
    bytes: &[u8],
    selected_sheets: &[String],
) -> Result<IngestedWorkbook, IngestError> {
    let (available_sheets, grids) = match FileKind::from_file_name(file_name)? {
        FileKind::Workbook => read_workbook(bytes, selected_sheets)?,
        FileKind::Csv => {
            let available = vec![CSV_SHEET_NAME.to_string()];
            let grids = if select_sheets(&available, selected_sheets).is_empty() {
                Vec::new()
            } else {
                vec![(CSV_SHEET_NAME.to_string(), read_csv(bytes)?)]
            };
            (available, grids)
        }
    };

    let mut workbook = IngestedWorkbook {
        available_sheets,
        ..IngestedWorkbook::default()
    };

    for (name, grid) in grids {
        let (columns, records) = tabulate(grid);
        debug!(
            sheet = %name,
            columns = columns.len(),
            records = records.len(),
            "Parsed sheet"
        );

        workbook.summaries.push(SheetSummary {
            name: name.clone(),
            columns,
            row_count: records.len(),
            preview: records.iter().take(PREVIEW_ROWS).cloned().collect(),
        });
        workbook.sheets.push(name);
        workbook.records.extend(records);
    }

    info!(
        file = %file_name,
        sheets = workbook.sheets.len(),
        records = workbook.records.len(),
        "Ingested upload"
    );

    Ok(workbook)
}

/// Sheets to process: the selection filtered to known names, or everything
fn select_sheets(available: &[String], selected: &[String]) -> Vec<String> {
    if selected.is_empty() {
        return available.to_vec();
    }

    selected
        .iter()
        .filter(|name| {
            let known = available.contains(name);
            if !known {
                debug!(sheet = %name, "Skipping unknown sheet");
            }
            known
        })
        .cloned()
        .collect()
}

fn read_workbook(
    bytes: &[u8],
    selected: &[String],
) -> Result<(Vec<String>, Vec<(String, Grid)>), IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let available = workbook.sheet_names();

    let mut grids = Vec::new();
    for name in select_sheets(&available, selected) {
        let range = workbook.worksheet_range(&name)?;
        let grid = range
            .rows()
            .map(|row| row.iter().map(workbook_cell).collect())
            .collect();
        grids.push((name, grid));
    }

    Ok((available, grids))
}

fn read_csv(bytes: &[u8]) -> Result<Grid, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(csv_cell).collect());
    }
    Ok(grid)
}

fn workbook_cell(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(text) if text.is_empty() => None,
        Data::String(text) => Some(Value::String(text.clone())),
        Data::Int(n) => Some(Value::from(*n)),
        Data::Float(n) => number(*n),
        Data::Bool(b) => Some(Value::Bool(*b)),
        // Excel serial day number
        Data::DateTime(dt) => number(dt.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Some(Value::String(text.clone())),
        Data::Error(err) => Some(Value::String(err.to_string())),
    }
}

fn csv_cell(text: &str) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => number(n),
        _ => Some(Value::String(text.to_string())),
    }
}

/// Whole numbers become JSON integers so `3.0` reads back as `3`
fn number(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return Some(Value::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number)
}

/// Split a grid into header names and sparse records
fn tabulate(grid: Grid) -> (Vec<String>, Vec<RowRecord>) {
    let mut rows = grid
        .into_iter()
        .filter(|row| row.iter().any(Option::is_some));

    let Some(header_row) = rows.next() else {
        return (Vec::new(), Vec::new());
    };
    let body: Grid = rows.collect();

    let width = body
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(header_row.len());
    let headers = header_names(&header_row, width);

    let records = body
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&headers)
                .filter_map(|(cell, header)| cell.map(|value| (header.clone(), value)))
                .collect::<RowRecord>()
        })
        .collect();

    (headers, records)
}

fn header_names(header_row: &[Option<Value>], width: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    (0..width)
        .map(|index| {
            let text = cell_text(header_row.get(index).and_then(Option::as_ref));
            let base = if text.trim().is_empty() {
                EMPTY_HEADER.to_string()
            } else {
                text
            };

            let mut counter = match seen.get(&base).copied() {
                None => {
                    seen.insert(base.clone(), 1);
                    return base;
                }
                Some(counter) => counter,
            };

            // Generated names skip anything already used, literal headers included
            let mut name = format!("{}_{}", base, counter);
            while seen.contains_key(&name) {
                counter += 1;
                name = format!("{}_{}", base, counter);
            }
            seen.insert(base, counter + 1);
            seen.insert(name.clone(), 1);
            name
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn csv_upload(content: &str) -> IngestedWorkbook {
        parse_upload("cases.csv", content.as_bytes(), &[]).unwrap()
    }

    #[test]
    fn test_file_kind_by_extension() {
        assert_eq!(FileKind::from_file_name("Book1.XLSX").unwrap(), FileKind::Workbook);
        assert_eq!(FileKind::from_file_name("legacy.xls").unwrap(), FileKind::Workbook);
        assert_eq!(FileKind::from_file_name("export.csv").unwrap(), FileKind::Csv);
        assert!(matches!(
            FileKind::from_file_name("notes.txt"),
            Err(IngestError::UnsupportedFileType(_))
        ));
        assert!(FileKind::from_file_name("no_extension").is_err());
    }

    #[test]
    fn test_csv_rows_become_records() {
        let workbook = csv_upload("status,analyst,work_units\npending,Ann,3\ndone,Bob,2.5\n");

        assert_eq!(workbook.available_sheets, vec![CSV_SHEET_NAME]);
        assert_eq!(workbook.sheets, vec![CSV_SHEET_NAME]);
        assert_eq!(workbook.records.len(), 2);
        assert_eq!(workbook.records[0]["status"], json!("pending"));
        assert_eq!(workbook.records[0]["work_units"], json!(3));
        assert_eq!(workbook.records[1]["work_units"], json!(2.5));

        let keys: Vec<&String> = workbook.records[0].keys().collect();
        assert_eq!(keys, ["status", "analyst", "work_units"]);
    }

    #[test]
    fn test_empty_cells_are_omitted_and_blank_rows_skipped() {
        let workbook = csv_upload("status,analyst\n,Ann\n,\npending,\n");

        assert_eq!(workbook.records.len(), 2);
        assert!(!workbook.records[0].contains_key("status"));
        assert_eq!(workbook.records[0]["analyst"], json!("Ann"));
        assert!(!workbook.records[1].contains_key("analyst"));
    }

    #[test]
    fn test_header_naming_rules() {
        let workbook = csv_upload("name,,name,\na,b,c,d,e\n");

        assert_eq!(
            workbook.summaries[0].columns,
            vec!["name", "__EMPTY", "name_1", "__EMPTY_1", "__EMPTY_2"]
        );
        assert_eq!(workbook.records[0]["name_1"], json!("c"));
        assert_eq!(workbook.records[0]["__EMPTY_2"], json!("e"));
    }

    #[test]
    fn test_generated_header_names_never_collide() {
        let workbook = csv_upload("name,name_1,name\na,b,c\n");

        assert_eq!(workbook.summaries[0].columns, vec!["name", "name_1", "name_2"]);
        let record = &workbook.records[0];
        assert_eq!(record.len(), 3);
        assert_eq!(record["name_1"], json!("b"));
        assert_eq!(record["name_2"], json!("c"));

        let workbook = csv_upload("__EMPTY,,__EMPTY_1,\na,b,c,d\n");
        assert_eq!(
            workbook.summaries[0].columns,
            vec!["__EMPTY", "__EMPTY_1", "__EMPTY_1_1", "__EMPTY_2"]
        );
        assert_eq!(workbook.records[0].len(), 4);
    }

    #[test]
    fn test_leading_blank_rows_before_header() {
        let workbook = csv_upload(",\nchapter\nChapter 7\n");
        assert_eq!(workbook.summaries[0].columns, vec!["chapter"]);
        assert_eq!(workbook.records.len(), 1);
    }

    #[test]
    fn test_summary_preview_is_capped() {
        let mut content = String::from("id\n");
        for i in 0..25 {
            content.push_str(&format!("{}\n", i));
        }
        let workbook = csv_upload(&content);

        let summary = &workbook.summaries[0];
        assert_eq!(summary.row_count, 25);
        assert_eq!(summary.preview.len(), PREVIEW_ROWS);
        assert_eq!(summary.preview[0]["id"], json!(0));
    }

    #[test]
    fn test_unknown_selected_sheet_processes_nothing() {
        let workbook =
            parse_upload("cases.csv", b"a\n1\n", &["Missing".to_string()]).unwrap();
        assert_eq!(workbook.available_sheets, vec![CSV_SHEET_NAME]);
        assert!(workbook.sheets.is_empty());
        assert!(workbook.records.is_empty());
    }

    #[test]
    fn test_header_only_file_has_no_records() {
        let workbook = csv_upload("status,analyst\n");
        assert_eq!(workbook.summaries[0].columns, vec!["status", "analyst"]);
        assert!(workbook.records.is_empty());
    }

    #[test]
    fn test_cell_conversions() {
        assert_eq!(csv_cell("42"), Some(json!(42)));
        assert_eq!(csv_cell("1e3"), Some(json!(1000)));
        assert_eq!(csv_cell("NaN"), Some(json!("NaN")));
        assert_eq!(csv_cell("Ch 11"), Some(json!("Ch 11")));
        assert_eq!(csv_cell(""), None);

        assert_eq!(workbook_cell(&Data::Float(7.0)), Some(json!(7)));
        assert_eq!(workbook_cell(&Data::Float(0.25)), Some(json!(0.25)));
        assert_eq!(workbook_cell(&Data::Int(-3)), Some(json!(-3)));
        assert_eq!(workbook_cell(&Data::Bool(true)), Some(json!(true)));
        assert_eq!(workbook_cell(&Data::String(String::new())), None);
        assert_eq!(workbook_cell(&Data::Empty), None);
    }

    #[test]
    fn test_corrupt_workbook_is_an_error() {
        let result = parse_upload("broken.xlsx", b"definitely not a zip archive", &[]);
        assert!(matches!(result, Err(IngestError::Workbook(_))));
    }
}
