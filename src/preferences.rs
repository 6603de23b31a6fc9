//! Durable mapping preferences: the user's last explicit column choices.
//!
//! Reads are best-effort and writes are fire-and-forget. A broken store
//! costs the user a pre-filled form next time, never the current import.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::{delete_preference, get_preference, set_preference};
use crate::error::Result;
use crate::fields::CanonicalField;

/// Fixed key the selection is stored under.
pub const COLUMN_MAP_KEY: &str = "bulk-upload-column-map";

/// Partial field → column selection confirmed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingPreferences(BTreeMap<CanonicalField, usize>);

impl MappingPreferences {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.0.get(&field).copied()
    }

    pub fn select(&mut self, field: CanonicalField, column: usize) {
        self.0.insert(field, column);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        self.0.iter().map(|(f, c)| (*f, *c))
    }

    /// Keeps only the selections that point at an existing column.
    pub fn compatible_with(&self, column_count: usize) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, c)| **c < column_count)
                .map(|(f, c)| (*f, *c))
                .collect(),
        )
    }
}

/// Key-value storage for the serialized selection.
pub trait PreferenceStore {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, value: &str) -> Result<()>;
    fn clear(&self) -> Result<bool>;
}

pub struct SqlitePreferenceStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePreferenceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl PreferenceStore for SqlitePreferenceStore<'_> {
    fn read(&self) -> Result<Option<String>> {
        get_preference(self.conn, COLUMN_MAP_KEY)
    }

    fn write(&self, value: &str) -> Result<()> {
        set_preference(self.conn, COLUMN_MAP_KEY, value)
    }

    fn clear(&self) -> Result<bool> {
        delete_preference(self.conn, COLUMN_MAP_KEY)
    }
}

/// Degrades to an empty selection on any storage or decode failure.
pub fn load_preferences(store: &dyn PreferenceStore) -> MappingPreferences {
    let raw = match store.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return MappingPreferences::default(),
        Err(e) => {
            warn!(error = %e, "could not read mapping preferences");
            return MappingPreferences::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(prefs) => prefs,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable mapping preferences");
            MappingPreferences::default()
        }
    }
}

/// Writes the whole selection. Failures are logged and dropped.
pub fn save_preferences(store: &dyn PreferenceStore, prefs: &MappingPreferences) {
    let json = match serde_json::to_string(prefs) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "could not encode mapping preferences");
            return;
        }
    };
    match store.write(&json) {
        Ok(()) => debug!(selections = prefs.len(), "mapping preferences saved"),
        Err(e) => warn!(error = %e, "could not persist mapping preferences"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;
    use crate::error::EnrollError;

    /// In-memory store; `broken` makes every call fail.
    #[derive(Default)]
    pub struct MemoryStore {
        pub value: RefCell<Option<String>>,
        pub broken: bool,
    }

    impl MemoryStore {
        pub fn broken() -> Self {
            Self {
                value: RefCell::new(None),
                broken: true,
            }
        }

        pub fn with(value: &str) -> Self {
            Self {
                value: RefCell::new(Some(value.to_string())),
                broken: false,
            }
        }
    }

    impl PreferenceStore for MemoryStore {
        fn read(&self) -> Result<Option<String>> {
            if self.broken {
                return Err(EnrollError::Other("storage unavailable".into()));
            }
            Ok(self.value.borrow().clone())
        }

        fn write(&self, value: &str) -> Result<()> {
            if self.broken {
                return Err(EnrollError::Other("storage unavailable".into()));
            }
            *self.value.borrow_mut() = Some(value.to_string());
            Ok(())
        }

        fn clear(&self) -> Result<bool> {
            if self.broken {
                return Err(EnrollError::Other("storage unavailable".into()));
            }
            Ok(self.value.borrow_mut().take().is_some())
        }
    }
}
