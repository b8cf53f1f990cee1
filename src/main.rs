mod cli;
mod console;
mod error;
mod logging;
mod model;
mod orchestrator;
mod remote;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.is_headless() || cfg!(not(feature = "tui"));

    if let Err(e) = logging::init(!is_non_tui) {
        eprintln!("logging disabled: {e:#}");
    }

    match cli::run(args).await {
        Ok(true) => {
            // Explicitly exit with code 0 on success, especially for non-TUI modes
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        // The failure was already shown to the user.
        Ok(false) => std::process::exit(1),
        Err(e) => Err(e),
    }
}
