//! Command-line surface and command dispatch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{log_file_path, resolve_database_path};
use crate::db::SqliteLedger;
use crate::export::export_to_path;
use crate::logging::{self, LogSink};
use crate::maintenance::{check_ledger, import_ledger};
use crate::records::load_records;
use crate::survey::{select_file, Category, DistanceMetric, Selection, MONTPELLIER};
use crate::ui::{run_app, App};

pub const DEFAULT_EXPORT_FILE: &str = "validation_batiments.csv";
pub const DEFAULT_SELECTION_FILE: &str = "batiments_agricoles_kepler.csv";

#[derive(Parser, Debug)]
#[command(
    name = "agri-review",
    version,
    about = "Review agricultural buildings and keep a ledger of decisions"
)]
pub struct Cli {
    /// SQLite ledger file. Falls back to DATABASE_URL, then ~/.agri-review.
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Step through buildings and validate or reject each one.
    Review {
        /// Building CSV (cleabs, lat, lon, google_maps, usage_1, nature, etat_de_l_objet).
        records: PathBuf,
        /// Where the `x` shortcut writes the export.
        #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
        export: PathBuf,
    },
    /// Write every building with its decision and comment.
    Export {
        records: PathBuf,
        #[arg(short, long, default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },
    /// Verify the ledger can be opened, written and read.
    Check,
    /// Copy all decisions from another ledger file into this one.
    Import {
        /// Ledger to read from.
        source: PathBuf,
    },
    /// Select agricultural buildings from a BD TOPO building table.
    Select {
        /// CSV with cleabs, lat, lon, usage_1, nature, etat_de_l_objet.
        buildings: PathBuf,
        #[arg(long, value_enum, default_value_t = Category::Usage)]
        category: Category,
        /// Keep buildings within this many km of the reference point.
        #[arg(long, default_value_t = 100.0, conflicts_with = "no_radius")]
        max_distance_km: f64,
        /// Disable the distance filter.
        #[arg(long)]
        no_radius: bool,
        /// `mercator` reproduces selections made with Web Mercator distances.
        #[arg(long, value_enum, default_value_t = DistanceMetric::Geodesic)]
        metric: DistanceMetric,
        #[arg(long, default_value_t = MONTPELLIER.0, allow_negative_numbers = true)]
        center_lat: f64,
        #[arg(long, default_value_t = MONTPELLIER.1, allow_negative_numbers = true)]
        center_lon: f64,
        #[arg(short, long, default_value = DEFAULT_SELECTION_FILE)]
        output: PathBuf,
    },
}

/// Set up logging for the chosen command and run it.
pub fn run(cli: Cli) -> Result<()> {
    let level = logging::level_for(cli.verbose, cli.quiet);
    let database = cli.database.as_deref();

    if let Commands::Review { .. } = cli.command {
        let log_path = log_file_path(&resolve_database_path(database)?);
        logging::init(level, LogSink::File(&log_path))?;
    } else {
        logging::init(level, LogSink::Stderr)?;
    }

    match cli.command {
        Commands::Review { records, export } => review(database, &records, export)?,
        Commands::Export { records, output } => {
            let ledger = open_ledger(database)?;
            let records = load_records(&records)?;
            let rows = export_to_path(&records, &ledger, &output)?;
            println!("{rows} rows written to {}", output.display());
        }
        Commands::Check => {
            let mut ledger = open_ledger(database)?;
            let report = check_ledger(&mut ledger)?;
            println!(
                "Ledger OK: {} decision(s) stored in {}",
                report.rows,
                display_path(&ledger)
            );
        }
        Commands::Import { source } => {
            let from = SqliteLedger::open_existing(&source)
                .with_context(|| format!("failed to open source ledger {}", source.display()))?;
            let mut into = open_ledger(database)?;
            let copied = import_ledger(&from, &mut into)?;
            println!("{copied} decision(s) imported into {}", display_path(&into));
        }
        Commands::Select {
            buildings,
            category,
            max_distance_km,
            no_radius,
            metric,
            center_lat,
            center_lon,
            output,
        } => {
            let selection = Selection {
                category,
                center: (center_lat, center_lon),
                max_distance_km: (!no_radius).then_some(max_distance_km),
                metric,
            };
            let (read, kept) = select_file(&selection, &buildings, &output)?;
            println!(
                "{kept} of {read} buildings selected into {}",
                output.display()
            );
        }
    }
    Ok(())
}

fn review(database: Option<&Path>, records: &Path, export: PathBuf) -> Result<()> {
    let ledger = open_ledger(database)?;
    let records = load_records(records)?;
    info!(
        database = %display_path(&ledger),
        records = records.len(),
        "starting review session"
    );

    let mut app = App::new(ledger, records, export)?;
    run_app(&mut app)
}

fn open_ledger(flag: Option<&Path>) -> Result<SqliteLedger> {
    let path = resolve_database_path(flag)?;
    Ok(SqliteLedger::open(&path)?)
}

fn display_path(ledger: &SqliteLedger) -> String {
    ledger
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn select_defaults_to_montpellier_radius() {
        let cli = Cli::parse_from(["agri-review", "select", "bdtopo.csv"]);
        match cli.command {
            Commands::Select {
                category,
                max_distance_km,
                no_radius,
                metric,
                center_lat,
                output,
                ..
            } => {
                assert_eq!(category, Category::Usage);
                assert_eq!(max_distance_km, 100.0);
                assert!(!no_radius);
                assert_eq!(metric, DistanceMetric::Geodesic);
                assert_eq!(center_lat, MONTPELLIER.0);
                assert_eq!(output, PathBuf::from(DEFAULT_SELECTION_FILE));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["agri-review", "check", "--database", "x.sqlite", "-vv"]);
        assert_eq!(cli.database, Some(PathBuf::from("x.sqlite")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check));
    }
}
