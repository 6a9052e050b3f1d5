//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "photon")]
#[command(about = "Photon agent runtime core - demonstration CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(long, default_value = "photon_config.json", global = true)]
    pub config_file: String,

    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true)]
    pub working_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Invoke a single tool through the gateway and print its result
    ///
    /// Examples:
    ///   photon call grep_search '{"pattern": "TODO"}'
    ///   photon call read '{"path": "src/lib.rs", "start_line": 1, "end_line": 20}'
    #[command(verbatim_doc_comment)]
    Call {
        /// Registered tool name
        tool: String,

        /// JSON object of arguments for the tool (default: `{}`)
        #[arg(default_value = "{}")]
        args: String,
    },

    /// List every tool registered with the gateway
    Tools,

    /// Inspect the symbol index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
}

#[derive(Subcommand)]
pub enum IndexAction {
    /// Run (or wait for) a full scan and report the resulting symbol count
    Scan,

    /// Search the symbol index by substring
    Search {
        /// Substring to match against symbol names
        query: String,
    },
}
