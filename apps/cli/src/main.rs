//! nbcontent CLI: compile `.ipynb` notebooks into document trees.
//!
//! Prints the record a content pipeline would receive, as JSON or as
//! rendered HTML.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
