use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "execmail",
    about = "Find executive contact emails for a list of company domains",
    version,
    long_about = None
)]
pub struct Args {
    /// Domain list, one domain or URL per line, grouped with `## Label` headers
    #[arg(short, long, default_value = "companies.txt")]
    pub input: PathBuf,

    /// Output file; results are merged into it if it already exists
    #[arg(short, long, default_value = "executive_emails.csv")]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Auto)]
    pub format: ExportFormat,

    /// Keep every contact, not only executive positions
    #[arg(long)]
    pub all_contacts: bool,

    /// Role filter passed to the lookup service (e.g. executive)
    #[arg(long)]
    pub role: Option<String>,

    /// API key, overriding HUNTER_API_KEY
    #[arg(long)]
    pub api_key: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up one person's email address at a domain
    Find {
        /// Company domain or URL
        #[arg(long)]
        domain: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,
    },
}
