//! Command-line interface

use clap::{Parser, Subcommand};

/// KonterHP inventory API server
#[derive(Parser)]
#[command(name = "api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create a superadmin account regardless of how many accounts exist
    SeedSuperadmin {
        #[arg(long, default_value = "superadmin")]
        username: String,

        /// Falls back to SUPERADMIN_PASSWORD
        #[arg(long, env = "SUPERADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}
