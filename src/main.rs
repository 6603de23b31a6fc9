mod cli;
mod dates;
mod db;
mod decoder;
mod error;
mod fields;
mod importer;
mod logging;
mod mapper;
mod models;
mod parser;
mod preferences;
mod registry;
mod resolver;
mod settings;
mod validator;

use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use cli::{Cli, Commands, MappingCommands};
use logging::{init_logging, LogConfig};

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig {
        format: cli.log_format,
        log_file: cli.log_file.as_ref().map(PathBuf::from),
        log_data: cli.log_data,
        ..LogConfig::from_verbosity(cli.verbose)
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: could not set up logging: {e}");
    }

    let result = match cli.command {
        Commands::Init {
            data_dir,
            corporate_id,
            plan_year,
        } => cli::init::run(data_dir, corporate_id, plan_year),
        Commands::Import {
            file,
            maps,
            use_saved_mapping,
            commit,
            rejected_out,
        } => cli::import::run(&file, &maps, use_saved_mapping, commit, rejected_out.as_deref()),
        Commands::Mapping { command } => match command {
            MappingCommands::Show => cli::mapping::show(),
            MappingCommands::Clear => cli::mapping::clear(),
        },
        Commands::Members => cli::members::run(),
        Commands::Recheck { file, commit } => cli::recheck::run(&file, commit),
        Commands::Template { output } => cli::template::run(&output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
