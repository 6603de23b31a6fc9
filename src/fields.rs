use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnrollError;

/// The ten attributes every imported employee resolves to, in
/// field-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    EmployeeNumber,
    FullName,
    Email,
    Mobile,
    NationalId,
    PlanId,
    Designation,
    Department,
    CoverageStart,
    CoverageEnd,
}

impl CanonicalField {
    pub const COUNT: usize = 10;

    pub const ALL: [CanonicalField; Self::COUNT] = [
        Self::EmployeeNumber,
        Self::FullName,
        Self::Email,
        Self::Mobile,
        Self::NationalId,
        Self::PlanId,
        Self::Designation,
        Self::Department,
        Self::CoverageStart,
        Self::CoverageEnd,
    ];

    pub const REQUIRED: [CanonicalField; 6] = [
        Self::EmployeeNumber,
        Self::FullName,
        Self::Email,
        Self::Mobile,
        Self::NationalId,
        Self::PlanId,
    ];

    pub const OPTIONAL: [CanonicalField; 4] = [
        Self::Designation,
        Self::Department,
        Self::CoverageStart,
        Self::CoverageEnd,
    ];

    /// Position in field-priority order; also the slot index in a `ColumnMap`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::EmployeeNumber => "employeeNumber",
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Mobile => "mobile",
            Self::NationalId => "nationalId",
            Self::PlanId => "planId",
            Self::Designation => "designation",
            Self::Department => "department",
            Self::CoverageStart => "coverageStart",
            Self::CoverageEnd => "coverageEnd",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::EmployeeNumber => "Employee Number",
            Self::FullName => "Full Name",
            Self::Email => "Email",
            Self::Mobile => "Mobile",
            Self::NationalId => "CNIC",
            Self::PlanId => "Plan ID",
            Self::Designation => "Designation",
            Self::Department => "Department",
            Self::CoverageStart => "Coverage Start Date",
            Self::CoverageEnd => "Coverage End Date",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    /// Accepted header phrasings, already in normalized form.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::EmployeeNumber => &[
                "employee number",
                "emp no",
                "employee id",
                "id",
                "emp number",
                "emp id",
            ],
            Self::FullName => &["full name", "name", "employee name", "emp name", "fullname"],
            Self::Email => &["email", "email address", "e-mail", "e-mail address", "email id"],
            Self::Mobile => &[
                "mobile",
                "phone",
                "mobile number",
                "phone number",
                "contact number",
                "contact",
                "mobile no",
                "phone no",
            ],
            Self::NationalId => &[
                "cnic",
                "cnic number",
                "id number",
                "national id",
                "identity number",
                "national identity",
                "cnic no",
            ],
            Self::PlanId => &[
                "plan id",
                "plan",
                "insurance plan",
                "plan code",
                "insurance",
                "policy plan",
            ],
            Self::Designation => &["designation", "job title", "position", "role", "job", "title"],
            Self::Department => &["department", "dept", "division", "dept name"],
            Self::CoverageStart => &[
                "coverage start",
                "start date",
                "effective date",
                "coverage start date",
                "coverage begins",
            ],
            Self::CoverageEnd => &[
                "coverage end",
                "end date",
                "expiry date",
                "coverage end date",
                "coverage expires",
            ],
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CanonicalField {
    type Err = EnrollError;

    /// Accepts the field key or its display name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| {
                f.key().eq_ignore_ascii_case(wanted) || f.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| EnrollError::UnknownField(wanted.to_string()))
    }
}
