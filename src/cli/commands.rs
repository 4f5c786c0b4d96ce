//! CLI commands and argument parsing

use crate::types::DumpFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RightScale API authentication CLI
#[derive(Parser, Debug)]
#[command(name = "rsapi-auth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API host, e.g. us-4.rightscale.com
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Login email, used with --pwd
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// Login password, used with --email
    #[arg(long, global = true)]
    pub pwd: Option<String>,

    /// Account id
    #[arg(short, long, global = true)]
    pub account: Option<u64>,

    /// OAuth refresh token
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// OAuth access token
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Instance API token
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// Proxy requests through the local RightLink agent
    #[arg(long, global = true)]
    pub rl10: bool,

    /// Target Self-Service instead of the core API
    #[arg(long, global = true)]
    pub ss: bool,

    /// Dump requests and responses
    #[arg(long, global = true)]
    pub dump: Option<DumpArg>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the credentials are accepted
    Check,

    /// Send a signed GET request and print the response
    Get {
        /// Resource path, e.g. /api/clouds
        path: String,
    },
}

/// Dump format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DumpArg {
    /// Human-readable request/response text
    Debug,
    /// Request/response JSON document
    Json,
}

impl From<DumpArg> for DumpFormat {
    fn from(arg: DumpArg) -> Self {
        match arg {
            DumpArg::Debug => DumpFormat::Debug,
            DumpArg::Json => DumpFormat::Json,
        }
    }
}
