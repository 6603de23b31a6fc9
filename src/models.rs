use serde::{Deserialize, Serialize};

use crate::dates::CoverageDefaults;
use crate::fields::CanonicalField;

/// One spreadsheet row after field extraction and date normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    pub employee_number: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub national_id: String,
    pub plan_id: String,
    pub designation: String,
    pub department: String,
    pub coverage_start: String,
    pub coverage_end: String,
}

impl ParsedRecord {
    pub fn value(&self, field: CanonicalField) -> &str {
        match field {
            CanonicalField::EmployeeNumber => &self.employee_number,
            CanonicalField::FullName => &self.name,
            CanonicalField::Email => &self.email,
            CanonicalField::Mobile => &self.mobile,
            CanonicalField::NationalId => &self.national_id,
            CanonicalField::PlanId => &self.plan_id,
            CanonicalField::Designation => &self.designation,
            CanonicalField::Department => &self.department,
            CanonicalField::CoverageStart => &self.coverage_start,
            CanonicalField::CoverageEnd => &self.coverage_end,
        }
    }
}

/// Per-row verdict. Warnings never affect validity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationOutcome {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// A member already in the registry, as far as duplicate checks care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingMember {
    pub employee_number: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Valid,
    Invalid,
}

/// Final record handed to the registry, or back to the uploader when it
/// failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEmployeeRecord {
    pub id: String,
    pub employee_number: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub national_id: String,
    pub corporate_id: String,
    pub plan_id: String,
    #[serde(default)]
    pub coverage_start: String,
    #[serde(default)]
    pub coverage_end: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_status: Option<ImportStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub import_errors: Vec<String>,
}

impl CanonicalEmployeeRecord {
    pub fn from_parsed(
        id: String,
        corporate_id: &str,
        record: &ParsedRecord,
        coverage: &CoverageDefaults,
    ) -> Self {
        let or_default = |value: &str, default: &str| {
            if value.is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };
        Self {
            id,
            employee_number: record.employee_number.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            mobile: record.mobile.clone(),
            national_id: record.national_id.clone(),
            corporate_id: corporate_id.to_string(),
            plan_id: record.plan_id.clone(),
            coverage_start: or_default(&record.coverage_start, &coverage.start),
            coverage_end: or_default(&record.coverage_end, &coverage.end),
            designation: record.designation.clone(),
            department: record.department.clone(),
            import_status: None,
            import_errors: Vec::new(),
        }
    }

    pub fn mark_invalid(&mut self, errors: Vec<String>) {
        self.import_status = Some(ImportStatus::Invalid);
        self.import_errors = errors;
    }
}

impl From<&CanonicalEmployeeRecord> for ParsedRecord {
    fn from(r: &CanonicalEmployeeRecord) -> Self {
        Self {
            employee_number: r.employee_number.trim().to_string(),
            name: r.name.trim().to_string(),
            email: r.email.trim().to_string(),
            mobile: r.mobile.trim().to_string(),
            national_id: r.national_id.trim().to_string(),
            plan_id: r.plan_id.trim().to_string(),
            designation: r.designation.trim().to_string(),
            department: r.department.trim().to_string(),
            coverage_start: r.coverage_start.trim().to_string(),
            coverage_end: r.coverage_end.trim().to_string(),
        }
    }
}

/// What a commit hands to the registry: accepted rows and rejected rows,
/// each in original row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPayload {
    pub valid: Vec<CanonicalEmployeeRecord>,
    pub invalid: Vec<CanonicalEmployeeRecord>,
}
