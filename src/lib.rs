pub mod args;
pub mod classify;
pub mod config;
pub mod domain;
pub mod export;
pub mod input;
pub mod lookup;
pub mod pipeline;
pub mod records;
pub mod utils;

pub use args::{Args, Command};
pub use lookup::{ContactLookup, HunterClient};
pub use pipeline::{run, run_search};
pub use records::{ContactRecord, NoResultRecord, RecordSet};
