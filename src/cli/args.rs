//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Inspect, check and normalize prefix-notation filter domains
#[derive(Parser, Debug)]
#[command(name = "domtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Model catalog file (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Model the domain filters (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a domain as a tree
    Tree {
        /// Domain text, `-` reads stdin
        domain: String,
    },

    /// Check whether a domain can be edited as a tree
    Check {
        /// Domain text, `-` reads stdin
        domain: String,
    },

    /// Print a domain in canonical form
    Normalize {
        /// Domain text, `-` reads stdin
        domain: String,
    },

    /// List operators of a field type
    Operators {
        /// Field type, e.g. char, many2one
        field_type: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
