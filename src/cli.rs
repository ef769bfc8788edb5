// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cliniq",
    about = "Diagnostic support assistant for mental health clinicians",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// List saved sessions, most recent first
    Chats {
        /// Maximum number of sessions to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },
    /// Print a saved session
    Show {
        /// Session id (see `cliniq chats`)
        id: String,
        /// Print message text as stored instead of rendering it
        #[arg(long)]
        raw: bool,
    },
    /// Write a saved session to a plain-text file
    Export {
        id: String,
        /// Output path.  Defaults to `session_<title>_<timestamp>.txt` in the
        /// current directory; `-` writes to stdout.
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Delete a saved session
    Delete { id: String },
    /// Generate a SOAP note for a saved session
    Note { id: String },
    /// Start an interactive consultation (the default)
    Chat {
        /// Resume a saved session
        #[arg(long, value_name = "ID")]
        resume: Option<String>,
        /// Fill in a new-patient form first and send it as the opening message
        #[arg(long, conflicts_with = "resume")]
        intake: bool,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cliniq", &mut std::io::stdout());
}
