use tracing::trace;

use crate::dates::{normalize_or_default, CoverageDefaults};
use crate::fields::CanonicalField;
use crate::logging::redact_value;
use crate::mapper::ColumnMap;
use crate::models::ParsedRecord;

/// Trimmed cell value; empty when the column is unset or past the row end.
pub fn cell(row: &[String], column: Option<usize>) -> String {
    column
        .and_then(|i| row.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Never fails: every field resolves to a string, dates to a canonical
/// date, the plan-year default, or the untouched raw text.
pub fn parse_row(row: &[String], map: &ColumnMap, coverage: &CoverageDefaults) -> ParsedRecord {
    let get = |field: CanonicalField| cell(row, map.get(field));
    let record = ParsedRecord {
        employee_number: get(CanonicalField::EmployeeNumber),
        name: get(CanonicalField::FullName),
        email: get(CanonicalField::Email),
        mobile: get(CanonicalField::Mobile),
        national_id: get(CanonicalField::NationalId),
        plan_id: get(CanonicalField::PlanId),
        designation: get(CanonicalField::Designation),
        department: get(CanonicalField::Department),
        coverage_start: normalize_or_default(&get(CanonicalField::CoverageStart), &coverage.start),
        coverage_end: normalize_or_default(&get(CanonicalField::CoverageEnd), &coverage.end),
    };
    trace!(
        employee_number = redact_value(&record.employee_number),
        coverage_start = %record.coverage_start,
        coverage_end = %record.coverage_end,
        "parsed row"
    );
    record
}

pub fn parse_rows(rows: &[Vec<String>], map: &ColumnMap, coverage: &CoverageDefaults) -> Vec<ParsedRecord> {
    rows.iter().map(|row| parse_row(row, map, coverage)).collect()
}

/// Re-applies date normalization to a record edited outside the parser.
pub fn renormalize(mut record: ParsedRecord, coverage: &CoverageDefaults) -> ParsedRecord {
    record.coverage_start = normalize_or_default(&record.coverage_start, &coverage.start);
    record.coverage_end = normalize_or_default(&record.coverage_end, &coverage.end);
    record
}
