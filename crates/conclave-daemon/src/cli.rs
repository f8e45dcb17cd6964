//! Command-line flags for `conclaved`.

use std::path::PathBuf;

use clap::Parser;

/// Multiplayer agent session coordination daemon.
#[derive(Parser)]
#[command(name = "conclaved")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a `conclave.toml` file. Falls back to the platform config
    /// directory, then built-in defaults, if omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP/WebSocket listener to, overriding both the
    /// config file and `CONCLAVE_BIND_ADDR`.
    #[arg(short, long)]
    pub bind: Option<String>,
}
