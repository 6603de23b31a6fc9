use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File appears to be empty. Please ensure your file has data.")]
    EmptyFile,

    #[error("File contains only headers. Please add data rows.")]
    HeaderOnly,

    #[error("Invalid file type '{0}'. Please upload .xlsx, .xls, or .csv file.")]
    UnsupportedFileType(String),

    #[error("File size ({size} bytes) exceeds the {limit} byte limit. Please upload a smaller file.")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Failed to parse file: {0}")]
    Spreadsheet(String),

    #[error("Required columns are not mapped: {}", .0.join(", "))]
    MappingIncomplete(Vec<String>),

    #[error("Column mapping not confirmed. Re-run with --use-saved-mapping or --map FIELD=COLUMN.")]
    MappingUnconfirmed,

    #[error("Import is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EnrollError>;
