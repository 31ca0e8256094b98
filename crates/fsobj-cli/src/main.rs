//! fso entry point.
//!
//! ```bash
//! fso ancestors --marker Cargo.toml
//! fso search TODO unsafe --dir src
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fsobj_cli::Cli;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v raises the default from warn to debug.
    let default = if cli.verbose { "fsobj=debug" } else { "fsobj=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut stdout = std::io::stdout().lock();
    let ok = fsobj_cli::run(&cli, &mut stdout)?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(1) })
}
