pub mod import;
pub mod init;
pub mod mapping;
pub mod members;
pub mod recheck;
pub mod status;
pub mod template;

use clap::{ArgAction, Parser, Subcommand};
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::error::{EnrollError, Result};
use crate::fields::CanonicalField;
use crate::logging::LogFormat;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "enroll", about = "Bulk employee enrollment for corporate health plans.")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Log output format
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,
    /// Also write logs to this file
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<String>,
    /// Include row values in logs (off by default)
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up enroll: choose a data directory and initialize the database.
    Init {
        /// Path for enroll data (default: ~/Documents/enroll)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Corporate account new members are enrolled under
        #[arg(long = "corporate-id")]
        corporate_id: Option<String>,
        /// Year used for default coverage dates
        #[arg(long = "plan-year")]
        plan_year: Option<i32>,
    },
    /// Validate an employee spreadsheet and optionally register it.
    Import {
        /// Path to a .csv, .xlsx or .xls file
        file: String,
        /// Bind a field to a column: FIELD=COLUMN (column index or header text)
        #[arg(long = "map", value_name = "FIELD=COLUMN")]
        maps: Vec<String>,
        /// Accept a column mapping completed from saved selections
        #[arg(long = "use-saved-mapping")]
        use_saved_mapping: bool,
        /// Register the valid rows
        #[arg(long)]
        commit: bool,
        /// Where to write rejected rows (default: <data_dir>/rejected/)
        #[arg(long = "rejected-out")]
        rejected_out: Option<String>,
    },
    /// Inspect or clear the saved column mapping.
    Mapping {
        #[command(subcommand)]
        command: MappingCommands,
    },
    /// List registered members.
    Members,
    /// Re-validate an edited rejected-rows file.
    Recheck {
        /// Rejected-rows JSON written by `enroll import --commit`
        file: String,
        /// Register the rows that now pass
        #[arg(long)]
        commit: bool,
    },
    /// Write a blank CSV template with the expected headers.
    Template {
        /// Output path
        output: String,
    },
    /// Show current settings and registry statistics.
    Status,
}

#[derive(Subcommand)]
pub enum MappingCommands {
    /// Show saved manual column selections.
    Show,
    /// Forget saved manual column selections.
    Clear,
}

/// Opens the registry database; `enroll init` must have run.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(EnrollError::Other(
            "Database not found. Run `enroll init` to set up.".into(),
        ));
    }
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    Ok(conn)
}

/// Splits `FIELD=COLUMN`. The column part is resolved against the headers
/// later.
pub(crate) fn parse_mapping(raw: &str) -> Result<(CanonicalField, String)> {
    let (field, column) = raw
        .split_once('=')
        .ok_or_else(|| EnrollError::Other(format!("Expected FIELD=COLUMN, got '{raw}'")))?;
    let field: CanonicalField = field.parse()?;
    let column = column.trim();
    if column.is_empty() {
        return Err(EnrollError::UnknownColumn(String::new()));
    }
    Ok((field, column.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        let (field, column) = parse_mapping("employeeNumber=Staff Code").unwrap();
        assert_eq!(field, CanonicalField::EmployeeNumber);
        assert_eq!(column, "Staff Code");

        let (field, column) = parse_mapping("CNIC=4").unwrap();
        assert_eq!(field, CanonicalField::NationalId);
        assert_eq!(column, "4");
    }

    #[test]
    fn test_parse_mapping_errors() {
        assert!(parse_mapping("employeeNumber").is_err());
        assert!(parse_mapping("salary=2").is_err());
        assert!(parse_mapping("email= ").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_maps() {
        let cli = Cli::try_parse_from([
            "enroll", "-vv", "import", "staff.csv", "--map", "email=2", "--map", "mobile=3", "--commit",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Import {
                file,
                maps,
                use_saved_mapping,
                commit,
                rejected_out,
            } => {
                assert_eq!(file, "staff.csv");
                assert_eq!(maps, vec!["email=2", "mobile=3"]);
                assert!(!use_saved_mapping);
                assert!(commit);
                assert!(rejected_out.is_none());
            }
            _ => panic!("expected import"),
        }
    }
}
