//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use probe_domain::export::ExportFormat;

/// Probe - import, export, run and monitor API collections.
#[derive(Debug, Parser)]
#[command(name = "probe", version, about)]
pub struct Cli {
    /// Configuration file (defaults to `probe.toml`/`probe.yaml` if present)
    #[arg(short, long, global = true, env = "PROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate an `OpenAPI` or Swagger document and print its findings
    Validate {
        /// Document to validate (JSON or YAML)
        file: PathBuf,
    },

    /// Convert any supported document into native collections
    Import {
        /// Document to import (native, Postman, Insomnia, `OpenAPI`, Swagger)
        file: PathBuf,
        /// Write the collections here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Convert native collections into another format
    Export {
        /// Native collections file
        file: PathBuf,
        /// Target format
        #[arg(short, long, default_value = "postman", value_parser = parse_export_format)]
        format: ExportFormat,
        /// Write the document here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run a collection (or one of its folders) once
    Run {
        /// Native collections file
        file: PathBuf,
        /// Collection id
        #[arg(long)]
        collection: String,
        /// Folder id to restrict the run to
        #[arg(long)]
        folder: Option<String>,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Schedule monitors and run them until interrupted
    Monitor {
        /// Native collections file
        file: PathBuf,
        /// Monitors file (JSON array)
        #[arg(long)]
        monitors: PathBuf,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Fire every enabled monitor once and exit
        #[arg(long)]
        once: bool,
    },
}

/// Variable sources shared by `run` and `monitor`.
#[derive(Debug, Args)]
pub struct ScopeArgs {
    /// Environments file (JSON array)
    #[arg(long)]
    pub environments: Option<PathBuf>,
    /// Active environment id
    #[arg(long)]
    pub environment: Option<String>,
    /// Globals file (JSON array of key/value pairs)
    #[arg(long)]
    pub globals: Option<PathBuf>,
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    value.parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_format_parsed() {
        let cli = Cli::parse_from(["probe", "export", "c.json", "--format", "openapi-yaml"]);
        let Command::Export { format, out, .. } = cli.command else {
            panic!("expected export");
        };
        assert_eq!(format, ExportFormat::OpenApiYaml);
        assert!(out.is_none());
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "probe", "run", "c.json", "--collection", "c1", "--folder", "f1", "--environment", "dev",
        ]);
        let Command::Run { collection, folder, scope, json, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(collection, "c1");
        assert_eq!(folder.as_deref(), Some("f1"));
        assert_eq!(scope.environment.as_deref(), Some("dev"));
        assert!(!json);
    }

    #[test]
    fn test_unknown_export_format_rejected() {
        assert!(Cli::try_parse_from(["probe", "export", "c.json", "--format", "har"]).is_err());
    }
}
