#![warn(missing_docs)]

//! Entry point for the `mailfmt` binary.

mod cli;
mod error;
mod fixture;
mod msgid;
mod rc;
mod render;
mod search;

use std::process;

use clap::Parser;
use tracing::error;

use crate::{
    cli::{Cli, Commands},
    error::Result,
};

fn main() {
    match run() {
        Ok(out) => print!("{out}"),
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<String> {
    let Cli { log, command } = Cli::parse();
    logging::init(&log);

    match command {
        Commands::Render(args) => render::run(&args),
        Commands::Search(args) => search::run(&args),
        Commands::Hooks(args) => rc::run(&args),
        Commands::MessageId(args) => msgid::run(&args),
    }
}
