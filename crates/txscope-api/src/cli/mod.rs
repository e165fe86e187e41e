//! CLI command definitions for the `txscope` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod check;
pub mod units;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use txscope_infra::config::{resolve_config_path, APP_CONFIG_FILE, PERSISTENCE_FILE};

/// Serve an HTTP app with a request-scoped unit of work over SQLite.
#[derive(Parser)]
#[command(name = "txscope", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true, env = "TXSCOPE_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// List declared persistence units.
    Units {
        /// Persistence unit declarations (default: persistence.toml).
        #[arg(long, env = "TXSCOPE_UNITS")]
        units: Option<PathBuf>,
    },

    /// Initialize the plugin and run one empty unit of work.
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Where to find configuration, and which plugin section to read.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Application properties file (default: txscope.toml).
    #[arg(long, env = "TXSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Persistence unit declarations (default: persistence.toml).
    #[arg(long, env = "TXSCOPE_UNITS")]
    pub units: Option<PathBuf>,

    /// Plugin name: settings are read from `plugin.<name>.config.*`.
    #[arg(long, default_value = "db")]
    pub plugin: String,
}

impl ConfigArgs {
    pub fn config_path(&self) -> PathBuf {
        resolve_config_path(self.config.as_deref(), APP_CONFIG_FILE)
    }

    pub fn units_path(&self) -> PathBuf {
        resolve_config_path(self.units.as_deref(), PERSISTENCE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["txscope", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { port, host, config } => {
                assert_eq!(port, 8080);
                assert_eq!(host, "127.0.0.1");
                assert_eq!(config.plugin, "db");
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn check_accepts_explicit_paths() {
        let cli = Cli::try_parse_from([
            "txscope",
            "check",
            "--config",
            "/tmp/app.toml",
            "--units",
            "/tmp/units.toml",
            "--plugin",
            "jpa",
        ])
        .unwrap();
        match cli.command {
            Commands::Check { config } => {
                assert_eq!(config.config_path(), PathBuf::from("/tmp/app.toml"));
                assert_eq!(config.units_path(), PathBuf::from("/tmp/units.toml"));
                assert_eq!(config.plugin, "jpa");
            }
            _ => panic!("expected check"),
        }
    }
}
