//! Import orchestration: decode → auto-map → (manual map) → validate →
//! preview → commit.
//!
//! Every mapping change re-parses and re-validates the whole batch. Parsing
//! always finishes for every row before validation starts, since in-batch
//! duplicate checks need all parsed values.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::dates::CoverageDefaults;
use crate::decoder::decode_file;
use crate::error::{EnrollError, Result};
use crate::fields::CanonicalField;
use crate::mapper::{map_headers, ColumnMap, MappingResult};
use crate::models::{
    CanonicalEmployeeRecord, CommitPayload, ExistingMember, ParsedRecord, ValidationOutcome,
};
use crate::parser::parse_rows;
use crate::preferences::{MappingPreferences, PreferenceStore};
use crate::resolver::ManualMappingResolver;
use crate::validator::{validate_batch, BatchScope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
    AwaitingFile,
    Decoding,
    AutoMapping,
    ManualMappingRequired,
    ManualMappingInProgress,
    Validating,
    PreviewReady,
    Committing,
    Done,
    Failed(String),
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingFile => "awaiting file",
            Self::Decoding => "decoding",
            Self::AutoMapping => "auto-mapping",
            Self::ManualMappingRequired => "manual mapping required",
            Self::ManualMappingInProgress => "manual mapping in progress",
            Self::Validating => "validating",
            Self::PreviewReady => "preview ready",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Failed(reason) => return write!(f, "failed: {reason}"),
        };
        f.write_str(name)
    }
}

/// A data row with its parse and verdict. `row_number` is the 1-based
/// spreadsheet row, so the first data row is 2.
#[derive(Debug, Clone)]
pub struct RowReport {
    pub row_number: usize,
    pub record: ParsedRecord,
    pub outcome: ValidationOutcome,
}

pub struct ImportSession<'s> {
    state: ImportState,
    store: &'s dyn PreferenceStore,
    existing: Vec<ExistingMember>,
    coverage: CoverageDefaults,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    auto: Option<MappingResult>,
    resolver: Option<ManualMappingResolver<'s>>,
    column_map: Option<ColumnMap>,
    reports: Vec<RowReport>,
}

impl<'s> ImportSession<'s> {
    pub fn new(
        store: &'s dyn PreferenceStore,
        existing: Vec<ExistingMember>,
        coverage: CoverageDefaults,
    ) -> Self {
        Self {
            state: ImportState::AwaitingFile,
            store,
            existing,
            coverage,
            headers: Vec::new(),
            rows: Vec::new(),
            auto: None,
            resolver: None,
            column_map: None,
            reports: Vec::new(),
        }
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn auto_mapping(&self) -> Option<&MappingResult> {
        self.auto.as_ref()
    }

    pub fn column_map(&self) -> Option<&ColumnMap> {
        self.column_map.as_ref()
    }

    /// Manual selections in effect, if manual mapping was entered.
    pub fn selection(&self) -> Option<&MappingPreferences> {
        self.resolver.as_ref().map(|r| r.selection())
    }

    pub fn unmapped_required(&self) -> Vec<CanonicalField> {
        self.column_map
            .map(|m| m.unmapped_required())
            .unwrap_or_else(|| CanonicalField::REQUIRED.to_vec())
    }

    pub fn reports(&self) -> &[RowReport] {
        &self.reports
    }

    pub fn valid_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.valid).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.reports.len() - self.valid_count()
    }

    fn require(&self, ok: bool, expected: &'static str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(EnrollError::InvalidState {
                expected,
                actual: self.state.to_string(),
            })
        }
    }

    pub fn begin_decoding(&mut self) -> Result<()> {
        self.require(self.state == ImportState::AwaitingFile, "awaiting file")?;
        self.state = ImportState::Decoding;
        Ok(())
    }

    /// Records a decoding failure. The message is what the uploader sees.
    pub fn fail(&mut self, err: &EnrollError) {
        warn!(error = %err, "import failed");
        self.state = ImportState::Failed(err.to_string());
    }

    /// Decodes `file_path` and feeds the rows in.
    pub fn load_file(&mut self, file_path: &Path, max_bytes: u64) -> Result<&ImportState> {
        self.begin_decoding()?;
        match decode_file(file_path, max_bytes) {
            Ok(rows) => self.load_rows(rows),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Takes decoded rows (row 0 = headers) and runs automatic mapping. A
    /// complete mapping goes straight to preview; otherwise manual mapping
    /// starts, pre-filled from the saved preferences, and only
    /// `confirm_mapping` leads on to preview.
    pub fn load_rows(&mut self, mut rows: Vec<Vec<String>>) -> Result<&ImportState> {
        self.require(self.state == ImportState::Decoding, "decoding")?;
        if rows.is_empty() {
            let e = EnrollError::EmptyFile;
            self.fail(&e);
            return Err(e);
        }
        let headers = rows.remove(0);
        if rows.is_empty() {
            let e = EnrollError::HeaderOnly;
            self.fail(&e);
            return Err(e);
        }
        info!(columns = headers.len(), rows = rows.len(), "file loaded");
        self.headers = headers;
        self.rows = rows;

        self.state = ImportState::AutoMapping;
        let auto = map_headers(&self.headers);
        if auto.unmapped_required.is_empty() {
            info!("all required columns auto-detected");
            self.column_map = Some(auto.column_map);
            self.auto = Some(auto);
            self.revalidate();
            self.state = ImportState::PreviewReady;
        } else {
            info!(
                unmapped = ?auto.unmapped_required.iter().map(|f| f.key()).collect::<Vec<_>>(),
                "manual mapping required"
            );
            let resolver = ManualMappingResolver::new(self.store, self.headers.len(), auto.column_map);
            self.column_map = Some(resolver.column_map());
            self.resolver = Some(resolver);
            self.auto = Some(auto);
            self.revalidate();
            self.state = ImportState::ManualMappingRequired;
        }
        Ok(&self.state)
    }

    /// Binds `field` to `column`, persists the selection and re-validates
    /// the whole batch. The preview updates, but the mapping must be
    /// confirmed again before commit.
    pub fn select_column(&mut self, field: CanonicalField, column: usize) -> Result<&ImportState> {
        self.require(
            matches!(
                self.state,
                ImportState::ManualMappingRequired
                    | ImportState::ManualMappingInProgress
                    | ImportState::PreviewReady
            ),
            "mapping or preview",
        )?;
        let (store, column_count) = (self.store, self.headers.len());
        let base = self.column_map.unwrap_or_default();
        // An override on top of a complete automatic map starts clean
        // instead of replaying old selections over it.
        let resolver = self
            .resolver
            .get_or_insert_with(|| ManualMappingResolver::without_saved(store, column_count, base));
        let map = resolver.select(field, column)?;
        self.state = ImportState::ManualMappingInProgress;
        self.column_map = Some(map);
        self.revalidate();
        Ok(&self.state)
    }

    /// Accepts the current manual mapping. Fails while a required field is
    /// still unmapped.
    pub fn confirm_mapping(&mut self) -> Result<&ImportState> {
        self.require(
            matches!(
                self.state,
                ImportState::ManualMappingRequired | ImportState::ManualMappingInProgress
            ),
            "manual mapping",
        )?;
        let missing = self.unmapped_required();
        if !missing.is_empty() {
            return Err(EnrollError::MappingIncomplete(
                missing.iter().map(|f| f.display_name().to_string()).collect(),
            ));
        }
        info!("manual mapping confirmed");
        self.state = ImportState::PreviewReady;
        Ok(&self.state)
    }

    /// Full re-parse then full re-validate; the previous preview is discarded.
    fn revalidate(&mut self) {
        let Some(map) = self.column_map else {
            return;
        };
        let previous = std::mem::replace(&mut self.state, ImportState::Validating);
        let parsed = parse_rows(&self.rows, &map, &self.coverage);
        let outcomes = validate_batch(&parsed, &self.existing, BatchScope::Upload);
        self.reports = parsed
            .into_iter()
            .zip(outcomes)
            .enumerate()
            .map(|(i, (record, outcome))| RowReport {
                row_number: i + 2,
                record,
                outcome,
            })
            .collect();
        info!(
            valid = self.valid_count(),
            invalid = self.invalid_count(),
            "batch validated"
        );
        self.state = previous;
    }

    /// Builds the payload for the registry. Invalid rows are kept, flagged
    /// with their errors.
    pub fn commit(&mut self, corporate_id: &str) -> Result<CommitPayload> {
        self.require(self.state == ImportState::PreviewReady, "preview ready")?;
        self.state = ImportState::Committing;

        let stamp = chrono::Utc::now().timestamp_millis();
        let mut payload = CommitPayload::default();
        for (index, report) in self.reports.iter().enumerate() {
            let mut record = CanonicalEmployeeRecord::from_parsed(
                format!("emp-{stamp}-{index}"),
                corporate_id,
                &report.record,
                &self.coverage,
            );
            if report.outcome.valid {
                payload.valid.push(record);
            } else {
                record.mark_invalid(report.outcome.errors.clone());
                payload.invalid.push(record);
            }
        }
        info!(
            valid = payload.valid.len(),
            invalid = payload.invalid.len(),
            "commit payload ready"
        );
        self.state = ImportState::Done;
        Ok(payload)
    }
}
