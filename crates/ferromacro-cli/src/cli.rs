//! CLI argument definitions for ferromacro.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `list` | List registered indicators |
//! | `series` | Fetch one or more indicator series |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--ttl-secs` | env / `3600` | Cache freshness window |
//! | `--timeout-ms` | env / `30000` | Upper bound for one source call |
//! | `--log-level` | `warn` | Log level when `RUST_LOG` is unset |
//!
//! # Examples
//!
//! ```bash
//! ferromacro list
//! ferromacro series "Taxa Selic" Ibovespa --tail 5
//! ferromacro series "IPCA Mensal" --format json --pretty
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Brazilian economic indicators from Yahoo Finance and the Banco Central do Brasil.
#[derive(Debug, Parser)]
#[command(
    name = "ferromacro",
    author,
    version,
    about = "Brazilian economic indicator CLI",
    long_about = "ferromacro fetches Brazilian economic indicators (Ibovespa, Selic, IPCA, \
GDP, USD/BRL, unemployment) from Yahoo Finance and the Banco Central do Brasil SGS API.\n\
\n\
Settings are read from FERROMACRO_* environment variables (a .env file is honored) \
and may be overridden by the global flags below."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Seconds a fetched series stays fresh.
    #[arg(long, global = true)]
    pub ttl_secs: Option<u64>,

    /// Upper bound for one source call in milliseconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text blocks for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered indicators with their source and unit.
    List,

    /// Fetch one or more indicator series.
    ///
    /// Indicators are fetched concurrently. An indicator whose source has no
    /// data right now is reported as "data unavailable".
    ///
    /// # Examples
    ///
    ///   ferromacro series "Taxa Selic"
    ///   ferromacro series Ibovespa "Câmbio USD/BRL" --tail 10
    Series(SeriesArgs),
}

/// Arguments for the `series` command.
#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Indicator names as shown by `ferromacro list`.
    #[arg(required = true, num_args = 1..)]
    pub names: Vec<String>,

    /// Print only the last N points.
    #[arg(long)]
    pub tail: Option<usize>,

    /// Ignore cached entries and fetch again.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}
