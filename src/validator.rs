//! Row validation and duplicate detection.
//!
//! Duplicates are looked up in two separate universes: the registry
//! (members committed earlier) and the batch being validated. Batch
//! lookups count every row, so both halves of a duplicate pair fail.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::dates::is_valid_date;
use crate::fields::CanonicalField;
use crate::models::{ExistingMember, ParsedRecord, ValidationOutcome};

pub const ALLOWED_DEPARTMENTS: &[&str] = &[
    "R&D",
    "Product",
    "Finance",
    "People",
    "IT",
    "Engineering",
    "Sales",
    "Logistics",
    "Production",
    "Design",
    "Customer",
];

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
// +92-3XX-XXXXXXX or 03XX-XXXXXXX
static MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+92-3\d{2}-\d{7}|03\d{2}-\d{7})$").expect("valid regex"));
// XXXXX-XXXXXXX-X
static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}-\d{7}-\d$").expect("valid regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE.is_match(mobile)
}

pub fn is_valid_national_id(national_id: &str) -> bool {
    NATIONAL_ID.is_match(national_id)
}

pub fn is_allowed_department(department: &str) -> bool {
    ALLOWED_DEPARTMENTS.contains(&department)
}

fn match_key(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_lowercase())
}

/// Where the batch being validated came from; only changes the wording of
/// in-batch duplicate errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchScope {
    Upload,
    EditSession,
}

impl BatchScope {
    fn label(self) -> &'static str {
        match self {
            Self::Upload => "upload file",
            Self::EditSession => "current edit session",
        }
    }
}

/// Registry lookup by lowercased employee number and email. The first
/// member registered under a key is the one reported.
pub struct RegistryIndex<'a> {
    by_number: HashMap<String, &'a ExistingMember>,
    by_email: HashMap<String, &'a ExistingMember>,
}

impl<'a> RegistryIndex<'a> {
    pub fn new(existing: &'a [ExistingMember]) -> Self {
        let mut by_number = HashMap::new();
        let mut by_email = HashMap::new();
        for member in existing {
            if let Some(k) = match_key(&member.employee_number) {
                by_number.entry(k).or_insert(member);
            }
            if let Some(k) = match_key(&member.email) {
                by_email.entry(k).or_insert(member);
            }
        }
        Self { by_number, by_email }
    }
}

/// Occurrence counts across the whole batch, the row itself included.
pub struct BatchIndex {
    numbers: HashMap<String, usize>,
    emails: HashMap<String, usize>,
}

impl BatchIndex {
    pub fn new(batch: &[ParsedRecord]) -> Self {
        let mut numbers = HashMap::new();
        let mut emails = HashMap::new();
        for record in batch {
            if let Some(k) = match_key(&record.employee_number) {
                *numbers.entry(k).or_insert(0) += 1;
            }
            if let Some(k) = match_key(&record.email) {
                *emails.entry(k).or_insert(0) += 1;
            }
        }
        Self { numbers, emails }
    }

    fn shared(counts: &HashMap<String, usize>, value: &str) -> bool {
        match_key(value).is_some_and(|k| counts.get(&k).copied().unwrap_or(0) > 1)
    }
}

fn format_error(field: CanonicalField, value: &str) -> Option<&'static str> {
    match field {
        CanonicalField::Email if !is_valid_email(value) => Some("Invalid email format"),
        CanonicalField::Mobile if !is_valid_mobile(value) => {
            Some("Invalid mobile format (expected: +92-3XX-XXXXXXX or 03XX-XXXXXXX)")
        }
        CanonicalField::NationalId if !is_valid_national_id(value) => {
            Some("Invalid CNIC format (expected: XXXXX-XXXXXXX-X, e.g., 12345-1234567-1)")
        }
        _ => None,
    }
}

/// Validates one record that is a member of the batch `batch` was built from.
pub fn validate_record(
    record: &ParsedRecord,
    batch: &BatchIndex,
    registry: &RegistryIndex<'_>,
    scope: BatchScope,
) -> ValidationOutcome {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for field in CanonicalField::REQUIRED {
        let value = record.value(field);
        if value.trim().is_empty() {
            errors.push(format!("{} is required", field.display_name()));
        } else if let Some(message) = format_error(field, value) {
            errors.push(message.to_string());
        }
    }

    if !record.department.is_empty() && !is_allowed_department(&record.department) {
        errors.push(format!(
            "Department must be one of: {}",
            ALLOWED_DEPARTMENTS.join(", ")
        ));
    }
    if !record.coverage_start.is_empty() && !is_valid_date(&record.coverage_start) {
        errors.push("Invalid Coverage Start Date format (expected: YYYY-MM-DD)".to_string());
    }
    if !record.coverage_end.is_empty() && !is_valid_date(&record.coverage_end) {
        errors.push("Invalid Coverage End Date format (expected: YYYY-MM-DD)".to_string());
    }

    if let Some(member) = match_key(&record.employee_number).and_then(|k| registry.by_number.get(&k)) {
        errors.push(format!("Duplicate Employee Number: already exists ({})", member.name));
    }
    if let Some(member) = match_key(&record.email).and_then(|k| registry.by_email.get(&k)) {
        errors.push(format!("Duplicate Email: already exists ({})", member.name));
    }

    if BatchIndex::shared(&batch.numbers, &record.employee_number) {
        errors.push(format!("Duplicate Employee Number in {}", scope.label()));
    }
    if BatchIndex::shared(&batch.emails, &record.email) {
        errors.push(format!("Duplicate Email in {}", scope.label()));
    }

    if record.designation.is_empty() {
        warnings.push("Designation not provided".to_string());
    }
    if record.department.is_empty() {
        warnings.push("Department not provided".to_string());
    }

    ValidationOutcome::new(errors, warnings)
}

/// One outcome per record, same order. Must be given the complete batch.
pub fn validate_batch(
    batch: &[ParsedRecord],
    existing: &[ExistingMember],
    scope: BatchScope,
) -> Vec<ValidationOutcome> {
    let batch_index = BatchIndex::new(batch);
    let registry = RegistryIndex::new(existing);
    batch
        .iter()
        .map(|record| validate_record(record, &batch_index, &registry, scope))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good(number: &str, email: &str) -> ParsedRecord {
        ParsedRecord {
            employee_number: number.into(),
            name: "Ali Raza".into(),
            email: email.into(),
            mobile: "0300-1234567".into(),
            national_id: "12345-1234567-1".into(),
            plan_id: "plan-a".into(),
            designation: "Engineer".into(),
            department: "Engineering".into(),
            coverage_start: "2025-01-01".into(),
            coverage_end: "2025-12-31".into(),
        }
    }

    fn single(record: ParsedRecord, existing: &[ExistingMember]) -> ValidationOutcome {
        validate_batch(&[record], existing, BatchScope::Upload).remove(0)
    }

    #[test]
    fn test_clean_row_is_valid() {
        let out = single(good("E-001", "ali@x.com"), &[]);
        assert!(out.valid, "{:?}", out.errors);
        assert!(out.errors.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_missing_optional_metadata_only_warns() {
        let mut r = good("E-001", "ali@x.com");
        r.designation.clear();
        r.department.clear();
        let out = single(r, &[]);
        assert!(out.valid);
        assert_eq!(out.warnings, vec!["Designation not provided", "Department not provided"]);
    }

    #[test]
    fn test_all_required_empty_gives_six_errors_without_format_noise() {
        let r = ParsedRecord {
            designation: "Engineer".into(),
            department: "IT".into(),
            coverage_start: "2025-01-01".into(),
            coverage_end: "2025-12-31".into(),
            ..ParsedRecord::default()
        };
        let out = single(r, &[]);
        assert!(!out.valid);
        assert_eq!(
            out.errors,
            vec![
                "Employee Number is required",
                "Full Name is required",
                "Email is required",
                "Mobile is required",
                "CNIC is required",
                "Plan ID is required",
            ]
        );
    }

    #[test]
    fn test_format_checks() {
        let mut r = good("E-001", "not-an-email");
        r.mobile = "0300 1234567".into();
        r.national_id = "1234512345671".into();
        r.department = "engineering".into();
        r.coverage_start = "sometime".into();
        r.coverage_end = "2025-02-30".into();
        let out = single(r, &[]);
        assert_eq!(out.errors.len(), 6, "{:?}", out.errors);
        assert!(out.errors[0].starts_with("Invalid email"));
        assert!(out.errors[1].starts_with("Invalid mobile"));
        assert!(out.errors[2].starts_with("Invalid CNIC"));
        assert!(out.errors[3].starts_with("Department must be one of: R&D"));
        assert!(out.errors[4].contains("Coverage Start"));
        assert!(out.errors[5].contains("Coverage End"));
    }

    #[test]
    fn test_errors_follow_field_order() {
        let mut r = good("E-001", "not-an-email");
        r.mobile.clear();
        r.national_id = "123".into();
        let out = single(r, &[]);
        assert_eq!(
            out.errors,
            vec![
                "Invalid email format",
                "Mobile is required",
                "Invalid CNIC format (expected: XXXXX-XXXXXXX-X, e.g., 12345-1234567-1)",
            ]
        );
    }

    #[test]
    fn test_mobile_patterns() {
        assert!(is_valid_mobile("+92-300-1234567"));
        assert!(is_valid_mobile("0321-7654321"));
        assert!(!is_valid_mobile("+92-400-1234567"));
        assert!(!is_valid_mobile("0300-123456"));
        assert!(!is_valid_mobile("03001234567"));
    }

    #[test]
    fn test_national_id_pattern() {
        assert!(is_valid_national_id("12345-1234567-1"));
        assert!(!is_valid_national_id("12345-1234567-12"));
        assert!(!is_valid_national_id("1234-1234567-1"));
    }

    #[test]
    fn test_duplicate_against_registry_names_member() {
        let existing = vec![ExistingMember {
            employee_number: "e-001".into(),
            email: "ALI@X.COM".into(),
            name: "Ali Khan".into(),
        }];
        let out = single(good("E-001", "ali@x.com"), &existing);
        assert_eq!(
            out.errors,
            vec![
                "Duplicate Employee Number: already exists (Ali Khan)",
                "Duplicate Email: already exists (Ali Khan)",
            ]
        );
    }

    #[test]
    fn test_batch_duplicates_flag_both_rows() {
        let batch = vec![good("E-001", "a@b.com"), good("e-001", "c@d.com")];
        let outs = validate_batch(&batch, &[], BatchScope::Upload);
        for out in &outs {
            assert!(!out.valid);
            assert_eq!(out.errors, vec!["Duplicate Employee Number in upload file"]);
        }
    }

    #[test]
    fn test_batch_duplicate_email_any_case() {
        let batch = vec![
            good("E-001", "a@b.com"),
            good("E-002", "A@B.COM"),
            good("E-003", "other@b.com"),
        ];
        let outs = validate_batch(&batch, &[], BatchScope::Upload);
        assert_eq!(outs[0].errors, vec!["Duplicate Email in upload file"]);
        assert_eq!(outs[1].errors, vec!["Duplicate Email in upload file"]);
        assert!(outs[2].valid);
    }

    #[test]
    fn test_row_is_not_its_own_duplicate() {
        let outs = validate_batch(&[good("E-001", "a@b.com")], &[], BatchScope::Upload);
        assert!(outs[0].valid);
    }

    #[test]
    fn test_empty_keys_never_collide() {
        let mut a = good("", "");
        a.name = "A".into();
        let mut b = good("", "");
        b.name = "B".into();
        let outs = validate_batch(&[a, b], &[], BatchScope::Upload);
        for out in outs {
            assert!(!out.errors.iter().any(|e| e.starts_with("Duplicate")));
        }
    }

    #[test]
    fn test_edit_session_wording() {
        let batch = vec![good("E-9", "x@y.com"), good("E-9", "z@y.com")];
        let outs = validate_batch(&batch, &[], BatchScope::EditSession);
        assert_eq!(outs[0].errors, vec!["Duplicate Employee Number in current edit session"]);
    }
}
