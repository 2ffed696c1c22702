//! CLI module - Command-line interface for SupportSync
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::domain::Role;

/// SupportSync - IT helpdesk ticketing backend
#[derive(Parser)]
#[command(name = "supportsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve,

    /// Create default config file with a fresh signing secret
    Init,

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Provision a new account
    Add {
        /// Login name
        username: String,
        /// Account role
        #[arg(long, value_parser = parse_role)]
        role: Role,
        /// Password; read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// List all accounts
    #[command(alias = "ls")]
    List,
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse().map_err(|e| format!("{e}"))
}

pub use commands::*;
