//! Command-line interface for concert-hub.

mod commands;

use clap::{Parser, Subcommand};

/// concert-hub - concert catalogue with API-key access
#[derive(Parser)]
#[command(name = "concert-hub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create an admin account, or promote an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        password: String,
    },

    /// Issue a new API key for an account and print it
    RotateKey {
        #[arg(long)]
        email: String,
    },

    /// Write the default config file
    #[command(alias = "init")]
    InitConfig,
}

pub use commands::*;
