//! glean CLI entry point
//!
//! Parses the command line, runs the fetch/build (or export) and turns any
//! fatal error into a colored message with a suggestion.

use anyhow::Result;
use clap::Parser;
use glean::cli;
use glean::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
