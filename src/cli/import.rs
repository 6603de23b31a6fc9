use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::warn;

use crate::cli::{open_db, parse_mapping};
use crate::dates::CoverageDefaults;
use crate::decoder::compute_checksum;
use crate::error::{EnrollError, Result};
use crate::fields::CanonicalField;
use crate::importer::{ImportSession, ImportState, RowReport};
use crate::models::CanonicalEmployeeRecord;
use crate::preferences::SqlitePreferenceStore;
use crate::registry::{existing_members, insert_members, previous_import, ImportBatch};
use crate::resolver::resolve_column;
use crate::settings::{load_settings, Settings};

pub fn run(
    file: &str,
    maps: &[String],
    use_saved_mapping: bool,
    commit: bool,
    rejected_out: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let mut conn = open_db(&settings)?;
    let file_path = PathBuf::from(file);
    let overrides = maps
        .iter()
        .map(|m| parse_mapping(m))
        .collect::<Result<Vec<_>>>()?;

    let existing = existing_members(&conn)?;
    let coverage = CoverageDefaults::for_plan_year(settings.effective_plan_year());

    let payload = {
        let store = SqlitePreferenceStore::new(&conn);
        let mut session = ImportSession::new(&store, existing, coverage);
        session.load_file(&file_path, settings.max_upload_bytes)?;

        for (field, column) in &overrides {
            let index = resolve_column(session.headers(), column)?;
            session.select_column(*field, index)?;
        }
        let manual = matches!(
            session.state(),
            ImportState::ManualMappingRequired | ImportState::ManualMappingInProgress
        );
        let complete = session.unmapped_required().is_empty();
        if manual && complete && (use_saved_mapping || !overrides.is_empty()) {
            session.confirm_mapping()?;
        }

        print_mapping(&session);
        print_preview(session.reports());

        if session.state() != &ImportState::PreviewReady && complete {
            println!();
            println!("{}", "Column mapping was filled in from saved selections.".yellow().bold());
            println!("Check the mapping above, then re-run with --use-saved-mapping to accept it");
            println!("or with --map FIELD=COLUMN to change it.");
            return Err(EnrollError::MappingUnconfirmed);
        }
        if session.state() != &ImportState::PreviewReady {
            let missing: Vec<String> = session
                .unmapped_required()
                .iter()
                .map(|f| f.display_name().to_string())
                .collect();
            println!();
            println!("{}", "Required fields are not mapped.".red().bold());
            println!("Available columns:");
            for (i, header) in session.headers().iter().enumerate() {
                println!("  {i}: {header}");
            }
            println!("Map them with --map FIELD=COLUMN, e.g. --map employeeNumber=0");
            return Err(EnrollError::MappingIncomplete(missing));
        }

        if !commit {
            println!();
            println!(
                "Dry run: re-run with --commit to register {} valid rows.",
                session.valid_count()
            );
            return Ok(());
        }
        session.commit(&settings.corporate_id)?
    };

    let checksum = compute_checksum(&file_path)?;
    if let Some((imported_at, count)) = previous_import(&conn, &checksum)? {
        println!(
            "{}",
            format!("Note: this file was already imported on {imported_at} ({count} members).").yellow()
        );
    }

    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    let batch = ImportBatch {
        filename: &filename,
        checksum: Some(&checksum),
        corporate_id: &settings.corporate_id,
        invalid_count: payload.invalid.len(),
    };
    let inserted = insert_members(&mut conn, &batch, &payload.valid)?;
    println!("{inserted} members registered, {} rejected", payload.invalid.len());

    if !payload.invalid.is_empty() {
        let out = match rejected_out {
            Some(path) => PathBuf::from(path),
            None => default_rejected_path(&settings, &file_path),
        };
        write_rejected(&out, &payload.invalid)?;
        warn!(rejected = payload.invalid.len(), "rows rejected");
        println!("Rejected rows written to {}", out.display());
        println!("Fix them and run `enroll recheck {}`", out.display());
    }
    Ok(())
}

fn default_rejected_path(settings: &Settings, file_path: &Path) -> PathBuf {
    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "import".to_string());
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(&settings.data_dir)
        .join("rejected")
        .join(format!("{stem}-{stamp}.json"))
}

pub(crate) fn write_rejected(out: &Path, records: &[CanonicalEmployeeRecord]) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(out, format!("{json}\n"))?;
    Ok(())
}

fn print_mapping(session: &ImportSession<'_>) {
    let Some(map) = session.column_map() else {
        return;
    };
    let mut table = Table::new();
    table.set_header(vec!["Field", "Column", "Source"]);
    let auto = session.auto_mapping().map(|a| a.column_map);
    let manual = session.selection();
    for (field, column) in map.iter() {
        let name = if field.is_required() {
            format!("{} *", field.display_name())
        } else {
            field.display_name().to_string()
        };
        let (column_text, source) = match column {
            Some(i) => {
                let header = session.headers().get(i).map(String::as_str).unwrap_or("");
                let source = if manual.and_then(|m| m.get(field)) == Some(i) {
                    "manual"
                } else if auto.and_then(|a| a.get(field)) == Some(i) {
                    "auto"
                } else {
                    ""
                };
                (format!("{i}: {header}"), source)
            }
            None if field.is_required() => ("(unmapped)".red().to_string(), ""),
            None => ("(unmapped)".dimmed().to_string(), ""),
        };
        table.add_row(vec![Cell::new(name), Cell::new(column_text), Cell::new(source)]);
    }
    println!("Column mapping\n{table}");
    if let Some(auto) = session.auto_mapping() {
        if !auto.unmapped_optional.is_empty() {
            let names: Vec<&str> = auto.unmapped_optional.iter().map(|f| f.display_name()).collect();
            println!("Optional columns not detected: {}", names.join(", "));
        }
    }
}

fn first_errors(errors: &[String]) -> String {
    let mut shown = errors.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
    if errors.len() > 2 {
        shown.push_str("...");
    }
    shown
}

fn print_preview(reports: &[RowReport]) {
    let mut table = Table::new();
    table.set_header(vec!["Status", "Row", "Employee Number", "Name", "Email", "Errors"]);
    for report in reports {
        let status = if report.outcome.valid {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        table.add_row(vec![
            Cell::new(status),
            Cell::new(report.row_number),
            Cell::new(&report.record.employee_number),
            Cell::new(&report.record.name),
            Cell::new(&report.record.email),
            Cell::new(first_errors(&report.outcome.errors)),
        ]);
    }
    let valid = reports.iter().filter(|r| r.outcome.valid).count();
    let invalid = reports.len() - valid;
    println!("Preview\n{table}");
    println!(
        "{} valid, {} invalid",
        valid.to_string().green().bold(),
        invalid.to_string().red().bold()
    );
    let warned = reports.iter().filter(|r| !r.outcome.warnings.is_empty()).count();
    if warned > 0 {
        println!(
            "{warned} rows have warnings (missing {} or {})",
            CanonicalField::Designation.display_name(),
            CanonicalField::Department.display_name()
        );
    }
}
