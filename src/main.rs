//! CLI entry point and command dispatch for datree-validator.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the log filter, e.g. `debug`
const LOG_ENV: &str = "DATREE_VALIDATOR_LOG";

#[derive(Parser)]
#[command(name = "datree-validator")]
#[command(version)]
#[command(about = "Check generated Kubernetes manifests against Datree policies", long_about = None)]
#[command(
    after_help = "GETTING STARTED:\n    datree-validator install              Download the datree binary into ./bin\n    datree-validator validate dist/       Check every manifest in dist/"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the datree release for this platform
    Install {
        /// Release tag to install (default: tool.version from config, or latest)
        #[arg(long, value_name = "TAG")]
        version: Option<String>,
        /// Directory to install into (default: tool.bin_dir from config)
        #[arg(long, value_name = "DIR")]
        bin_dir: Option<PathBuf>,
    },
    /// Validate manifests and report violations per rule
    Validate {
        /// Manifest files, directories or glob patterns
        #[arg(required = true, value_name = "MANIFEST")]
        manifests: Vec<String>,
        /// Datree policy to evaluate (default: validate.policy from config)
        #[arg(short, long)]
        policy: Option<String>,
        /// Path to the datree executable (default: <bin_dir>/datree)
        #[arg(long, value_name = "PATH")]
        binary: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Treat unexpected datree exit statuses as errors
        #[arg(long)]
        strict: bool,
        /// Also report YAML and schema errors, not only policy rules
        #[arg(long)]
        with_schema: bool,
    },
    /// Show the effective configuration
    Config {
        /// Validate configuration and report issues
        #[arg(long)]
        validate: bool,
    },
    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Install { version, bin_dir } => cmd::install::cmd_install(version, bin_dir),
        Commands::Validate {
            manifests,
            policy,
            binary,
            format,
            strict,
            with_schema,
        } => {
            let report_format = match format.to_lowercase().as_str() {
                "json" => cmd::validate::ReportFormat::Json,
                "text" => cmd::validate::ReportFormat::Text,
                _ => {
                    eprintln!("Error: Invalid format '{}'. Use 'text' or 'json'.", format);
                    std::process::exit(1);
                }
            };
            cmd::validate::cmd_validate(cmd::validate::ValidateArgs {
                manifests,
                policy,
                binary,
                format: report_format,
                strict,
                with_schema,
            })
        }
        Commands::Config { validate } => {
            if validate {
                cmd::config::cmd_config_validate()
            } else {
                cmd::config::cmd_config_show()
            }
        }
        Commands::Version => cmd_version(cli.verbose > 0),
    }
}

/// Logs go to stderr so JSON reports on stdout stay machine-readable.
fn init_logging(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_version(verbose: bool) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("datree-validator {}", VERSION);

    if verbose {
        const GIT_SHA: &str = env!("GIT_SHA");
        const BUILD_DATE: &str = env!("BUILD_DATE");
        println!("commit: {}", GIT_SHA);
        println!("built: {}", BUILD_DATE);
    }

    Ok(())
}
