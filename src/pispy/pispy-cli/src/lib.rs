//! CLI for pispy: look up PyPI packages from the terminal.
//!
//! The lookup pipeline runs registry fetch, normalization, field
//! classification and section assembly, all behind a single-flight
//! [`LookupController`]. The [`tui`] module and the plain-text [`render`]
//! functions are the two ways of showing its output.

pub mod assemble;
pub mod display;
pub mod lookup;
pub mod registry;
pub mod render;
pub mod requires;
pub mod tui;

pub use assemble::{LookupView, assemble};
pub use display::{DisplayRow, DisplaySection, RowKind};
pub use lookup::{LookupController, LookupState};
pub use registry::{FetchError, PypiClient, RawPayload, Registry, RegistryConfig};
pub use requires::{CrossReferences, resolve_requires};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pispy")]
#[command(version, about = "Look up Python packages on PyPI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Package to look up when the TUI starts
    pub package: Option<String>,

    /// Registry to query
    #[arg(long, global = true, env = "PISPY_REGISTRY_URL", default_value = registry::DEFAULT_REGISTRY_URL, value_parser = parse_registry_url)]
    pub registry_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "PISPY_TIMEOUT", default_value_t = registry::DEFAULT_TIMEOUT.as_secs(), value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Write logs to this file
    #[arg(long, global = true, env = "PISPY_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive lookup screen
    Lookup {
        /// Package to look up right away
        package: Option<String>,
    },

    /// Print a package's details and exit
    Show {
        /// Name of the package
        package: String,

        /// Print the sections as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the largest packages on the registry
    Top {
        /// How many packages to list
        #[arg(long, short = 'n', default_value_t = 100)]
        limit: usize,
    },
}

fn parse_registry_url(s: &str) -> Result<String, String> {
    let url = url::Url::parse(s).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(s.trim_end_matches('/').to_string()),
        scheme => Err(format!("unsupported scheme `{scheme}`, expected http or https")),
    }
}

/// Main entry point for the CLI.
pub fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Lookup { .. }));
    init_logging(cli.verbose, cli.log_file.as_deref(), interactive)?;

    let config = RegistryConfig {
        base_url: cli.registry_url,
        timeout: Duration::from_secs(cli.timeout),
    };
    info!(registry = %config.base_url, timeout = ?config.timeout, "starting pispy");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let client = PypiClient::new(config).context("Failed to build the HTTP client")?;

    match cli.command {
        None => run_tui(client, &runtime, cli.package),
        Some(Commands::Lookup { package }) => run_tui(client, &runtime, package.or(cli.package)),
        Some(Commands::Show { package, json }) => show(client, &runtime, &package, json),
        Some(Commands::Top { limit }) => top(&client, &runtime, limit),
    }
}

/// Install the global subscriber.
///
/// The TUI owns the terminal, so interactive sessions only log when a log
/// file was asked for.
fn init_logging(verbose: bool, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let default_directive = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None if interactive => return Ok(()),
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| anyhow::anyhow!(e).context("Failed to initialise logging"))
}

// ============================================================================
// Commands
// ============================================================================

fn run_tui(client: PypiClient, runtime: &Runtime, package: Option<String>) -> Result<ExitCode> {
    tui::run(client, runtime.handle().clone(), package)?;
    Ok(ExitCode::SUCCESS)
}

fn show(client: PypiClient, runtime: &Runtime, package: &str, json: bool) -> Result<ExitCode> {
    let mut controller = LookupController::new(client, runtime.handle().clone());
    if !controller.request(package) {
        bail!("Package name must not be blank");
    }

    let view = runtime
        .block_on(controller.settle())
        .cloned()
        .context("Lookup finished without a result")?;

    if json {
        let out = serde_json::to_string_pretty(&view).context("Failed to serialize sections")?;
        println!("{out}");
    } else {
        print!("{}", render::render_view(&view));
    }

    Ok(if view.found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn top(client: &PypiClient, runtime: &Runtime, limit: usize) -> Result<ExitCode> {
    let stats = runtime
        .block_on(client.top_packages())
        .with_context(|| format!("Failed to fetch stats from {}", client.config().stats_url()))?;
    print!("{}", render::render_top_packages(&stats, limit));
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_name_is_a_tui_lookup() {
        let cli = Cli::try_parse_from(["pispy", "requests"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.package.as_deref(), Some("requests"));
    }

    #[test]
    fn subcommands_take_precedence() {
        let cli = Cli::try_parse_from(["pispy", "show", "six", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Show { ref package, json: true }) if package == "six"
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pispy",
            "top",
            "--limit",
            "5",
            "--registry-url",
            "http://localhost:8080/",
            "--timeout",
            "3",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Top { limit: 5 })));
        assert_eq!(cli.registry_url, "http://localhost:8080");
        assert_eq!(cli.timeout, 3);
    }

    #[test]
    fn timeout_must_be_positive() {
        let err = Cli::try_parse_from(["pispy", "--timeout", "0", "top"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(Cli::try_parse_from(["pispy", "--timeout", "1", "top"]).is_ok());
    }

    #[test]
    fn registry_url_must_be_http() {
        assert!(parse_registry_url("ftp://example.com").is_err());
        assert!(parse_registry_url("not a url").is_err());
        assert_eq!(parse_registry_url("https://pypi.org/").unwrap(), "https://pypi.org");
    }
}
