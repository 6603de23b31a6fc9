//! Turns an uploaded file into rows of strings. Row 0 is the header row.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{EnrollError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "xls" => Ok(Self::Xls),
            _ => Err(EnrollError::UnsupportedFileType(ext)),
        }
    }
}

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Reads a `.csv`, `.xlsx` or `.xls` file, drops blank rows and fails on a
/// file with nothing left.
pub fn decode_file(file_path: &Path, max_bytes: u64) -> Result<Vec<Vec<String>>> {
    let kind = FileKind::from_path(file_path)?;
    let size = std::fs::metadata(file_path)?.len();
    if size > max_bytes {
        return Err(EnrollError::FileTooLarge {
            size,
            limit: max_bytes,
        });
    }

    let rows = match kind {
        FileKind::Csv => read_csv(file_path)?,
        FileKind::Xlsx | FileKind::Xls => read_workbook(file_path)?,
    };
    let total = rows.len();
    let rows: Vec<Vec<String>> = rows.into_iter().filter(|r| !is_blank(r)).collect();
    debug!(total, blank = total - rows.len(), "decoded rows");

    if rows.is_empty() {
        return Err(EnrollError::EmptyFile);
    }
    info!(file = %file_path.display(), rows = rows.len(), "decoded file");
    Ok(rows)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn read_csv(file_path: &Path) -> Result<Vec<Vec<String>>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|f| f.trim_start_matches('\u{feff}').to_string()).collect());
    }
    Ok(rows)
}

#[cfg(feature = "excel")]
fn read_workbook(file_path: &Path) -> Result<Vec<Vec<String>>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| EnrollError::Spreadsheet(e.to_string()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| EnrollError::Spreadsheet(e.to_string()))?,
        None => return Err(EnrollError::EmptyFile),
    };
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

#[cfg(not(feature = "excel"))]
fn read_workbook(file_path: &Path) -> Result<Vec<Vec<String>>> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    Err(EnrollError::UnsupportedFileType(format!(
        "{ext} (built without spreadsheet support)"
    )))
}

/// Date cells become their serial number; the row parser resolves those.
#[cfg(feature = "excel")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Whole numbers lose their fractional part: 12345.0 → "12345".
pub fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
