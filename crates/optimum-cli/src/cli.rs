//! CLI argument parsing for the optimum client.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Optimum client
///
/// Manage casks, upload vectors in batches and query them.
#[derive(Parser, Debug)]
#[command(name = "optimum")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/optimum/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Service base URL
    #[arg(short = 'u', long, global = true)]
    pub host: Option<String>,

    /// Bearer token for the service (prefer OPTIMUM_TOKEN in the environment)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Client commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all instances of a data structure class
    List {
        /// Data structure class
        #[arg(long, default_value = "hnsw")]
        class: String,
    },

    /// Create a new cask and wait for the job to finish
    Create {
        /// Cask as class:name
        #[arg(long)]
        cask: String,

        /// JSON file with creation options (service defaults if omitted)
        #[arg(short, long)]
        json: Option<String>,
    },

    /// Publish uploaded data and wait for the job to finish
    Commit {
        /// Cask as class:name
        #[arg(long)]
        cask: String,
    },

    /// Remove a cask and all of its data
    Remove {
        /// Cask as class:name
        #[arg(long)]
        cask: String,
    },

    /// Upload vectors from a text file, one `key v1 v2 ...` per line
    Upload {
        /// Cask as class:name
        #[arg(long)]
        cask: String,

        /// Approximate segment flush threshold in compressed bytes; segments
        /// may overshoot it by up to the compressor's window
        #[arg(long)]
        chunk: Option<usize>,

        /// Input file
        file: String,
    },

    /// Send vectors from a text file in small uncompressed bags
    Stream {
        /// Cask as class:name
        #[arg(long)]
        cask: String,

        /// Records per bag
        #[arg(long, default_value = "100")]
        chunk: usize,

        /// Input file
        file: String,
    },

    /// Run one query per line of a text file
    Query {
        /// Cask as class:name
        #[arg(long)]
        cask: String,

        /// Number of neighbors to return
        #[arg(short, long)]
        k: Option<u32>,

        /// Size of the candidate list used during search
        #[arg(long)]
        ef_search: Option<u32>,

        /// Maximum distance of accepted neighbors
        #[arg(long)]
        distance: Option<f32>,

        /// File mapping `0x<hex key> <text>` per line, to print the text
        /// behind the query and every hit
        #[arg(short, long)]
        text: Option<String>,

        /// Query file
        file: String,
    },

    /// Show the status of a job
    Status {
        /// Job handle returned by create or commit
        job: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_list_default_class() {
        let cli = Cli::parse_from(["optimum", "list"]);
        match cli.command {
            Commands::List { class } => assert_eq!(class, "hnsw"),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_global_host_after_subcommand() {
        let cli = Cli::parse_from(["optimum", "commit", "--cask", "hnsw:a", "-u", "https://x.io"]);
        assert_eq!(cli.host, Some("https://x.io".to_string()));
        assert!(matches!(cli.command, Commands::Commit { .. }));
    }

    #[test]
    fn test_cli_create_with_opts() {
        let cli = Cli::parse_from(["optimum", "create", "--cask", "hnsw:a", "-j", "opts.json"]);
        match cli.command {
            Commands::Create { cask, json } => {
                assert_eq!(cask, "hnsw:a");
                assert_eq!(json, Some("opts.json".to_string()));
            }
            _ => panic!("Expected Create command"),
        }
    }

    #[test]
    fn test_cli_upload() {
        let cli = Cli::parse_from([
            "optimum", "upload", "--cask", "hnsw:a", "--chunk", "1024", "data.txt",
        ]);
        match cli.command {
            Commands::Upload { cask, chunk, file } => {
                assert_eq!(cask, "hnsw:a");
                assert_eq!(chunk, Some(1024));
                assert_eq!(file, "data.txt");
            }
            _ => panic!("Expected Upload command"),
        }
    }

    #[test]
    fn test_cli_query() {
        let cli = Cli::parse_from([
            "optimum", "query", "--cask", "hnsw:a", "-k", "5", "--ef-search", "100", "q.txt",
        ]);
        match cli.command {
            Commands::Query { k, ef_search, file, .. } => {
                assert_eq!(k, Some(5));
                assert_eq!(ef_search, Some(100));
                assert_eq!(file, "q.txt");
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_stream_default_chunk() {
        let cli = Cli::parse_from(["optimum", "stream", "--cask", "hnsw:a", "data.txt"]);
        match cli.command {
            Commands::Stream { cask, chunk, file } => {
                assert_eq!(cask, "hnsw:a");
                assert_eq!(chunk, 100);
                assert_eq!(file, "data.txt");
            }
            _ => panic!("Expected Stream command"),
        }
    }

    #[test]
    fn test_cli_stream_with_chunk() {
        let cli = Cli::parse_from([
            "optimum", "stream", "--cask", "hnsw:a", "--chunk", "10", "data.txt",
        ]);
        assert!(matches!(cli.command, Commands::Stream { chunk: 10, .. }));
    }

    #[test]
    fn test_cli_query_text_and_distance() {
        let cli = Cli::parse_from([
            "optimum", "query", "--cask", "hnsw:a", "-t", "texts.txt", "--distance", "0.5",
            "q.txt",
        ]);
        match cli.command {
            Commands::Query { text, distance, .. } => {
                assert_eq!(text, Some("texts.txt".to_string()));
                assert_eq!(distance, Some(0.5));
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_status() {
        let cli = Cli::parse_from(["optimum", "--config", "/tmp/c.toml", "status", "/jobs/1"]);
        assert_eq!(cli.config, Some("/tmp/c.toml".to_string()));
        match cli.command {
            Commands::Status { job } => assert_eq!(job, "/jobs/1"),
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_cli_upload_requires_file() {
        assert!(Cli::try_parse_from(["optimum", "upload", "--cask", "hnsw:a"]).is_err());
    }
}
