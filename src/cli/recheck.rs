use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::import::write_rejected;
use crate::cli::open_db;
use crate::dates::CoverageDefaults;
use crate::error::Result;
use crate::models::{CanonicalEmployeeRecord, ExistingMember, ParsedRecord, ValidationOutcome};
use crate::parser::renormalize;
use crate::registry::{existing_members, insert_members, ImportBatch};
use crate::settings::load_settings;
use crate::validator::{validate_batch, BatchScope};

/// Re-validates edited records. Returns each record rebuilt from its
/// normalized values, paired with its verdict.
pub fn recheck_records(
    records: &[CanonicalEmployeeRecord],
    existing: &[ExistingMember],
    coverage: &CoverageDefaults,
) -> Vec<(CanonicalEmployeeRecord, ValidationOutcome)> {
    let parsed: Vec<ParsedRecord> = records
        .iter()
        .map(|r| renormalize(ParsedRecord::from(r), coverage))
        .collect();
    let outcomes = validate_batch(&parsed, existing, BatchScope::EditSession);
    records
        .iter()
        .zip(parsed.iter())
        .zip(outcomes)
        .map(|((original, parsed), outcome)| {
            let mut record = CanonicalEmployeeRecord::from_parsed(
                original.id.clone(),
                &original.corporate_id,
                parsed,
                coverage,
            );
            if !outcome.valid {
                record.mark_invalid(outcome.errors.clone());
            }
            (record, outcome)
        })
        .collect()
}

pub fn run(file: &str, commit: bool) -> Result<()> {
    let settings = load_settings();
    let mut conn = open_db(&settings)?;
    let path = PathBuf::from(file);
    let content = std::fs::read_to_string(&path)?;
    let records: Vec<CanonicalEmployeeRecord> = serde_json::from_str(&content)?;

    let existing = existing_members(&conn)?;
    let coverage = CoverageDefaults::for_plan_year(settings.effective_plan_year());
    let checked = recheck_records(&records, &existing, &coverage);

    let mut table = Table::new();
    table.set_header(vec!["Status", "Employee Number", "Name", "Errors"]);
    for (record, outcome) in &checked {
        let status = if outcome.valid {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        table.add_row(vec![
            Cell::new(status),
            Cell::new(&record.employee_number),
            Cell::new(&record.name),
            Cell::new(outcome.errors.join(", ")),
        ]);
    }
    println!("{table}");

    let (valid, invalid): (Vec<_>, Vec<_>) = checked.into_iter().partition(|(_, o)| o.valid);
    let valid: Vec<CanonicalEmployeeRecord> = valid.into_iter().map(|(r, _)| r).collect();
    let invalid: Vec<CanonicalEmployeeRecord> = invalid.into_iter().map(|(r, _)| r).collect();
    println!(
        "{} valid, {} invalid",
        valid.len().to_string().green().bold(),
        invalid.len().to_string().red().bold()
    );

    if !commit {
        return Ok(());
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    let batch = ImportBatch {
        filename: &filename,
        checksum: None,
        corporate_id: &settings.corporate_id,
        invalid_count: invalid.len(),
    };
    let inserted = insert_members(&mut conn, &batch, &valid)?;
    write_rejected(&path, &invalid)?;
    println!("{inserted} members registered, {} left in {}", invalid.len(), path.display());
    Ok(())
}
