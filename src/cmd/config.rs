//! Config command for showing and validating datree-validator configuration

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use datree_validator::config::{global_config_path, Config};
use datree_validator::paths::PROJECT_CONFIG;

/// Print the effective configuration as YAML
pub fn cmd_config_show() -> Result<()> {
    let config = Config::load()?;
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize config")?;
    print!("{}", yaml);
    Ok(())
}

/// Validate config semantically and report issues
pub fn cmd_config_validate() -> Result<()> {
    println!("{}", "Validating datree-validator configuration...".bold());
    println!();

    show_sources();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            println!("{} {:#}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    let warnings = check_binary(&config);

    println!();
    if warnings == 0 {
        println!("{} Configuration is valid", "✓".green());
    } else {
        println!(
            "{} Configuration valid with {} warning(s)",
            "✓".green(),
            warnings
        );
    }

    Ok(())
}

/// List which config files were found
fn show_sources() {
    let global = global_config_path();
    let sources = [
        ("global", global.as_deref()),
        ("project", Some(Path::new(PROJECT_CONFIG))),
    ];

    for (label, path) in sources {
        match path {
            Some(path) if path.exists() => {
                println!("  {} {} config: {}", "•".cyan(), label, path.display());
            }
            Some(path) => {
                println!(
                    "  {} {} config: {} {}",
                    "•".dimmed(),
                    label,
                    path.display(),
                    "(not found, using defaults)".dimmed()
                );
            }
            None => {}
        }
    }
}

/// Warn when the configured binary has not been installed yet
fn check_binary(config: &Config) -> usize {
    let binary = config.tool.binary_path();
    match datree_validator::runner::ensure_executable(&binary) {
        Ok(()) => {
            println!("  {} datree binary: {}", "✓".green(), binary.display());
            0
        }
        Err(e) => {
            println!("  {} {}", "⚠".yellow(), e);
            println!(
                "      {} Run: datree-validator install",
                "→".cyan()
            );
            1
        }
    }
}
