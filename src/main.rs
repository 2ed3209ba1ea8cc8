use anyhow::Result;
use clap::Parser;
use tracing::error;

use execmail::{utils, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.verbose);
    utils::validate_args(&args)?;

    if let Err(e) = execmail::run(&args) {
        error!(action = "exit", component = "main", error = %e, "Run failed");
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
