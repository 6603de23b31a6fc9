use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::preferences::{load_preferences, PreferenceStore, SqlitePreferenceStore};
use crate::settings::load_settings;

pub fn show() -> Result<()> {
    let conn = open_db(&load_settings())?;
    let store = SqlitePreferenceStore::new(&conn);
    let prefs = load_preferences(&store);
    if prefs.is_empty() {
        println!("No saved column mapping.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Field", "Key", "Column"]);
    for (field, column) in prefs.iter() {
        table.add_row(vec![
            Cell::new(field.display_name()),
            Cell::new(field.key()),
            Cell::new(column),
        ]);
    }
    println!("Saved column mapping\n{table}");
    Ok(())
}

pub fn clear() -> Result<()> {
    let conn = open_db(&load_settings())?;
    let store = SqlitePreferenceStore::new(&conn);
    if store.clear()? {
        println!("Saved column mapping cleared.");
    } else {
        println!("No saved column mapping.");
    }
    Ok(())
}
