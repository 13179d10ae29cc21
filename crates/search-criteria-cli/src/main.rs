mod commands;
mod logger;
mod record;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::Outcome;
use record::FieldOptions;

#[derive(Parser)]
#[command(
    name = "searchq",
    version,
    about = "Parse search criteria strings and filter JSON records with them"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a search string and print its canonical form
    Check {
        #[arg(env = "SEARCHQ_SEARCH", help = "Search string, e.g. 'a:b;|c>d'")]
        search: String,

        #[arg(long, help = "Print the parsed criteria as JSON")]
        json: bool,
    },

    /// Print the records of a JSON array that match a search string
    Filter {
        #[arg(env = "SEARCHQ_SEARCH", help = "Search string, e.g. 'a:b;|c>d'")]
        search: String,

        #[arg(long, env = "SEARCHQ_INPUT", help = "JSON file to read (default: stdin)")]
        input: Option<PathBuf>,

        #[arg(
            long = "date-field",
            env = "SEARCHQ_DATE_FIELDS",
            value_delimiter = ',',
            help = "Field holding RFC 3339 dates, compared as epoch milliseconds"
        )]
        date_fields: Vec<String>,

        #[arg(long, help = "Treat fields absent from a record as null")]
        missing_as_null: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    match run(cli.command) {
        Ok(outcome) => ExitCode::from(outcome.code()),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(Outcome::Invalid.code())
        }
    }
}

fn run(command: Command) -> Result<Outcome> {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    match command {
        Command::Check { search, json } => {
            commands::check(&search, json, &mut stdout, &mut stderr)
        }
        Command::Filter {
            search,
            input,
            date_fields,
            missing_as_null,
        } => {
            let text = read_input(input.as_deref())?;
            let options = FieldOptions {
                date_fields: date_fields.into_iter().collect(),
                missing_as_null,
            };
            commands::filter(&search, &text, &options, &mut stdout, &mut stderr)
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
