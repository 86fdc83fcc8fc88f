//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the absim simulator.

use clap::{Parser, Subcommand};

/// absim - Persona-driven A/B testing simulator
///
/// Describes two marketing image variants, fans them out to a panel of
/// consumer personas, and reports which variant wins with confidence and
/// per-persona recommendations.
#[derive(Parser, Debug)]
#[command(name = "absim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an A/B test over two image variants
    Run {
        /// Image variant A (http(s) URL or local file path)
        image_a: String,

        /// Image variant B (http(s) URL or local file path)
        image_b: String,

        /// Comma-separated persona names (default: all built-in personas)
        #[arg(short, long, env = "ABSIM_PERSONAS")]
        personas: Option<String>,

        /// Path to configuration file
        #[arg(short, long, env = "ABSIM_CONFIG")]
        config: Option<String>,

        /// Directory for the JSON report (overrides config)
        #[arg(short, long)]
        output: Option<String>,

        /// Print per-persona rationales in the summary
        #[arg(long)]
        detailed: bool,

        /// Do not write the JSON report to disk
        #[arg(long)]
        no_save: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Persona management
    Persona {
        #[command(subcommand)]
        subcommand: PersonaSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Persona subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PersonaSubcommand {
    /// List all built-in personas
    List,

    /// Show one persona's profile in detail
    Show {
        /// Persona name: sarah, jake, robert
        name: String,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
