//! Optimum command line client library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (list, create, commit, remove, upload, stream, query, status)
//! - `scanner`: Text input format for vectors

pub mod cli;
pub mod commands;
pub mod scanner;

pub use cli::{Cli, Commands};
pub use commands::{
    commit, create, init, list, query, remove, status, stream, stream_bags, upload, Context,
};
pub use scanner::{ScanError, Scanner};
