//! Header synonym mapping: binds spreadsheet columns to canonical fields.

use tracing::debug;

use crate::fields::CanonicalField;

/// Field → column index binding for one header row. `None` means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    slots: [Option<usize>; CanonicalField::COUNT],
}

impl ColumnMap {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.slots[field.index()]
    }

    pub fn set(&mut self, field: CanonicalField, column: Option<usize>) {
        self.slots[field.index()] = column;
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, Option<usize>)> + '_ {
        CanonicalField::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    pub fn unmapped_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    pub fn unmapped_optional(&self) -> Vec<CanonicalField> {
        CanonicalField::OPTIONAL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unmapped_required().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingResult {
    pub column_map: ColumnMap,
    pub unmapped_required: Vec<CanonicalField>,
    pub unmapped_optional: Vec<CanonicalField>,
}

impl MappingResult {
    pub fn from_map(column_map: ColumnMap) -> Self {
        Self {
            unmapped_required: column_map.unmapped_required(),
            unmapped_optional: column_map.unmapped_optional(),
            column_map,
        }
    }
}

/// Lowercases, trims and collapses inner whitespace runs to one space.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Maps each field to the first header matching one of its synonyms.
///
/// Fields are resolved in priority order; a header already claimed by an
/// earlier field is not offered to later ones.
pub fn map_headers(headers: &[String]) -> MappingResult {
    let mut column_map = ColumnMap::default();
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mut claimed = vec![false; headers.len()];

    for field in CanonicalField::ALL {
        let column = normalized
            .iter()
            .enumerate()
            .position(|(i, header)| !claimed[i] && field.synonyms().contains(&header.as_str()));
        if let Some(i) = column {
            claimed[i] = true;
            debug!(field = field.key(), column = i, header = %headers[i], "auto-mapped");
        } else {
            debug!(field = field.key(), "no unclaimed header matched");
        }
        column_map.set(field, column);
    }

    MappingResult::from_map(column_map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Employee   Number "), "employee number");
        assert_eq!(normalize_header("E-Mail\tAddress"), "e-mail address");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_full_template_maps_every_field() {
        let h: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|f| f.display_name().to_string())
            .collect();
        let result = map_headers(&h);
        assert!(result.unmapped_required.is_empty());
        assert!(result.unmapped_optional.is_empty());
        for field in CanonicalField::ALL {
            assert_eq!(result.column_map.get(field), Some(field.index()));
        }
    }

    #[test]
    fn test_arbitrary_order_and_wording() {
        let h = headers(&["Plan Code", "E-mail", "Emp ID", "Phone No", "Full Name", "National ID", "Dept"]);
        let m = map_headers(&h).column_map;
        assert_eq!(m.get(CanonicalField::PlanId), Some(0));
        assert_eq!(m.get(CanonicalField::Email), Some(1));
        assert_eq!(m.get(CanonicalField::EmployeeNumber), Some(2));
        assert_eq!(m.get(CanonicalField::Mobile), Some(3));
        assert_eq!(m.get(CanonicalField::FullName), Some(4));
        assert_eq!(m.get(CanonicalField::NationalId), Some(5));
        assert_eq!(m.get(CanonicalField::Department), Some(6));
        assert_eq!(m.get(CanonicalField::Designation), None);
    }

    #[test]
    fn test_missing_employee_number_reported() {
        let h = headers(&["Name", "Email", "Mobile", "CNIC", "Plan"]);
        let result = map_headers(&h);
        assert_eq!(result.unmapped_required, vec![CanonicalField::EmployeeNumber]);
        assert_eq!(result.unmapped_optional, CanonicalField::OPTIONAL.to_vec());
    }

    #[test]
    fn test_duplicate_headers_resolve_to_first() {
        let h = headers(&["Email", "Name", "email "]);
        let m = map_headers(&h).column_map;
        assert_eq!(m.get(CanonicalField::Email), Some(0));
    }

    #[test]
    fn test_no_partial_matching() {
        let h = headers(&["Employee Numbers", "Primary Email", "Mobile #"]);
        let result = map_headers(&h);
        assert_eq!(result.unmapped_required, CanonicalField::REQUIRED.to_vec());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let h = headers(&["ID", "Name", "Email", "Contact", "CNIC No", "Plan", "Role", "Division"]);
        let first = map_headers(&h);
        for _ in 0..5 {
            assert_eq!(map_headers(&h), first);
        }
    }

    #[test]
    fn test_each_header_bound_at_most_once() {
        let h = headers(&["  EMAIL ", "Name", "ID", "Phone", "CNIC", "Plan", "Role", "Dept", "Start Date", "End Date"]);
        let m = map_headers(&h).column_map;
        let mut used: Vec<usize> = m.iter().filter_map(|(_, c)| c).collect();
        assert_eq!(used.len(), CanonicalField::COUNT);
        used.sort_unstable();
        used.dedup();
        assert_eq!(used.len(), CanonicalField::COUNT);
        assert_eq!(m.get(CanonicalField::Email), Some(0));
    }
}
