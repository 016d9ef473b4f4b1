use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ndc340b")]
#[command(about = "MCP server for NDC lookups, RxNorm details and 340B eligibility checks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to an extra configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format for one-off lookups
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server (stdio, or HTTP when a port is configured)
    Serve {
        /// Serve streamable HTTP on this port instead of stdio
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check 340B eligibility for an NDC, RxCUI or drug name
    Check {
        #[arg(long)]
        ndc: Option<String>,

        #[arg(long)]
        rxcui: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Show related NDCs for an NDC, RxCUI or drug name
    Related {
        #[arg(long)]
        ndc: Option<String>,

        #[arg(long)]
        rxcui: Option<String>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Show RxTerms details for an RxCUI
    Info {
        rxcui: String,
    },

    /// Find approximate RxNorm matches for a drug name
    Match {
        term: String,

        /// Maximum number of candidates
        #[arg(short, long, default_value = "1")]
        max_entries: u32,
    },

    /// Best RxNorm match for each of several drug names
    BatchMatch {
        names: Vec<String>,
    },

    /// 340B eligibility for each of several NDCs
    BatchCheck {
        ndcs: Vec<String>,
    },

    /// Download and parse the 340B spreadsheet, then report what it holds
    Ingest,
}

impl Commands {
    /// Whether the command needs the eligibility table loaded first
    pub fn needs_cache(&self) -> bool {
        matches!(
            self,
            Commands::Serve { .. } | Commands::Check { .. } | Commands::BatchCheck { .. }
        )
    }
}
