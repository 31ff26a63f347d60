//! # Orbis CLI Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Parse arguments
//! 3. Resolve configuration, open the database, run migrations
//! 4. Run one command
//! 5. Print JSON: result on stdout, `{code, message}` on stderr

use std::process::ExitCode;

use clap::Parser;

use orbis_cli::{render, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    orbis_cli::init_tracing();

    let cli = Cli::parse();
    let pretty = cli.pretty;

    match orbis_cli::run(cli).await {
        Ok(output) => {
            println!("{}", render(&output, pretty));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", render(&err.to_json(), pretty));
            ExitCode::from(err.exit_code())
        }
    }
}
