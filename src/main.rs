//! Binary entry point: parse the command line, then hand off to the selected
//! command (interactive review, export, ledger maintenance, or selection).
use agri_review::cli::{run, Cli};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    run(Cli::parse())
}
