//! Manual mapping: explicit user choices layered over the automatic map.

use tracing::{debug, info};

use crate::error::{EnrollError, Result};
use crate::fields::CanonicalField;
use crate::mapper::{normalize_header, ColumnMap};
use crate::preferences::{load_preferences, save_preferences, MappingPreferences, PreferenceStore};

/// Overlays `selection` on `base`; selections pointing past the header row
/// are ignored.
pub fn create_manual_column_map(
    base: &ColumnMap,
    selection: &MappingPreferences,
    column_count: usize,
) -> ColumnMap {
    let mut map = *base;
    for (field, column) in selection.iter() {
        if column < column_count {
            map.set(field, Some(column));
        }
    }
    map
}

fn without_collisions(selection: &MappingPreferences, base: &ColumnMap) -> MappingPreferences {
    let mut kept = MappingPreferences::default();
    for (field, column) in selection.iter() {
        let taken = base
            .iter()
            .any(|(other, bound)| other != field && bound == Some(column));
        if taken {
            debug!(field = field.key(), column, "saved column already auto-mapped elsewhere");
        } else {
            kept.select(field, column);
        }
    }
    kept
}

/// Turns a user-typed column reference into an index: either a zero-based
/// position or the header text (matched after normalization).
pub fn resolve_column(headers: &[String], token: &str) -> Result<usize> {
    let token = token.trim();
    if let Ok(index) = token.parse::<usize>() {
        if index < headers.len() {
            return Ok(index);
        }
        return Err(EnrollError::UnknownColumn(format!(
            "{index} (file has {} columns)",
            headers.len()
        )));
    }
    let wanted = normalize_header(token);
    headers
        .iter()
        .position(|h| normalize_header(h) == wanted)
        .ok_or_else(|| EnrollError::UnknownColumn(token.to_string()))
}

pub struct ManualMappingResolver<'s> {
    store: &'s dyn PreferenceStore,
    column_count: usize,
    base: ColumnMap,
    selection: MappingPreferences,
}

impl<'s> ManualMappingResolver<'s> {
    /// Starts from the persisted selection, keeping only the entries that
    /// fit the current header row and do not take a column the automatic
    /// map gave to another field.
    pub fn new(store: &'s dyn PreferenceStore, column_count: usize, base: ColumnMap) -> Self {
        let saved = load_preferences(store);
        let selection = without_collisions(&saved.compatible_with(column_count), &base);
        if selection.len() < saved.len() {
            debug!(
                dropped = saved.len() - selection.len(),
                "saved selections do not fit this file"
            );
        }
        info!(prefilled = selection.len(), "manual mapping started");
        Self {
            store,
            column_count,
            base,
            selection,
        }
    }

    /// Starts with no selections; the first `select` overwrites what was
    /// saved.
    pub fn without_saved(store: &'s dyn PreferenceStore, column_count: usize, base: ColumnMap) -> Self {
        Self {
            store,
            column_count,
            base,
            selection: MappingPreferences::default(),
        }
    }

    pub fn selection(&self) -> &MappingPreferences {
        &self.selection
    }

    pub fn column_map(&self) -> ColumnMap {
        create_manual_column_map(&self.base, &self.selection, self.column_count)
    }

    /// Binds one field and persists the whole selection. The new map takes
    /// effect even when persisting fails.
    pub fn select(&mut self, field: CanonicalField, column: usize) -> Result<ColumnMap> {
        if column >= self.column_count {
            return Err(EnrollError::UnknownColumn(format!(
                "{column} (file has {} columns)",
                self.column_count
            )));
        }
        self.selection.select(field, column);
        save_preferences(self.store, &self.selection);
        debug!(field = field.key(), column, "manual selection");
        Ok(self.column_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_headers;
    use crate::preferences::testing::MemoryStore;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selection_completes_automatic_map() {
        let h = headers(&["Staff Code", "Name", "Email", "Mobile", "CNIC", "Plan"]);
        let auto = map_headers(&h).column_map;
        let store = MemoryStore::default();
        let mut resolver = ManualMappingResolver::new(&store, h.len(), auto);
        assert_eq!(resolver.column_map().unmapped_required(), vec![CanonicalField::EmployeeNumber]);

        let map = resolver.select(CanonicalField::EmployeeNumber, 0).unwrap();
        assert!(map.is_complete());
        assert_eq!(map.get(CanonicalField::FullName), Some(1));
    }

    #[test]
    fn test_every_selection_is_persisted_whole() {
        let store = MemoryStore::default();
        let mut resolver = ManualMappingResolver::new(&store, 4, ColumnMap::default());
        resolver.select(CanonicalField::Email, 2).unwrap();
        resolver.select(CanonicalField::Mobile, 3).unwrap();
        let saved = store.value.borrow().clone().unwrap();
        assert_eq!(saved, r#"{"email":2,"mobile":3}"#);
    }

    #[test]
    fn test_prefill_skips_incompatible_entries() {
        let store = MemoryStore::with(r#"{"employeeNumber":1,"planId":12}"#);
        let resolver = ManualMappingResolver::new(&store, 3, ColumnMap::default());
        let map = resolver.column_map();
        assert_eq!(map.get(CanonicalField::EmployeeNumber), Some(1));
        assert_eq!(map.get(CanonicalField::PlanId), None);
    }

    #[test]
    fn test_prefill_skips_columns_auto_mapped_elsewhere() {
        let h = headers(&["Name", "Email", "Mobile", "CNIC", "Plan", "Emp Code"]);
        let auto = map_headers(&h).column_map;
        let store = MemoryStore::with(r#"{"employeeNumber":0,"designation":5}"#);
        let resolver = ManualMappingResolver::new(&store, h.len(), auto);
        let map = resolver.column_map();
        assert_eq!(map.get(CanonicalField::EmployeeNumber), None);
        assert_eq!(map.get(CanonicalField::FullName), Some(0));
        assert_eq!(map.get(CanonicalField::Designation), Some(5));
        assert_eq!(resolver.selection().len(), 1);
    }

    #[test]
    fn test_selection_overrides_automatic_choice() {
        let h = headers(&["ID", "Employee ID", "Name"]);
        let auto = map_headers(&h).column_map;
        assert_eq!(auto.get(CanonicalField::EmployeeNumber), Some(0));
        let store = MemoryStore::default();
        let mut resolver = ManualMappingResolver::new(&store, h.len(), auto);
        let map = resolver.select(CanonicalField::EmployeeNumber, 1).unwrap();
        assert_eq!(map.get(CanonicalField::EmployeeNumber), Some(1));
    }

    #[test]
    fn test_broken_store_does_not_block_selection() {
        let store = MemoryStore::broken();
        let mut resolver = ManualMappingResolver::new(&store, 2, ColumnMap::default());
        let map = resolver.select(CanonicalField::FullName, 1).unwrap();
        assert_eq!(map.get(CanonicalField::FullName), Some(1));
    }

    #[test]
    fn test_select_rejects_missing_column() {
        let store = MemoryStore::default();
        let mut resolver = ManualMappingResolver::new(&store, 2, ColumnMap::default());
        assert!(resolver.select(CanonicalField::FullName, 2).is_err());
        assert!(store.value.borrow().is_none());
    }

    #[test]
    fn test_resolve_column_by_index_or_header() {
        let h = headers(&["Staff Code", "Name"]);
        assert_eq!(resolve_column(&h, "1").unwrap(), 1);
        assert_eq!(resolve_column(&h, "staff  code").unwrap(), 0);
        assert!(resolve_column(&h, "5").is_err());
        assert!(resolve_column(&h, "Salary").is_err());
    }
}
