//! Install command: fetch the datree executable for this platform.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use datree_validator::config::Config;
use datree_validator::install::{install, InstallOptions};

pub fn cmd_install(version: Option<String>, bin_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;

    let opts = InstallOptions {
        api_base: config.tool.api_base,
        repo: config.tool.repo,
        version: version.unwrap_or(config.tool.version),
        bin_dir: bin_dir.unwrap_or(config.tool.bin_dir),
    };

    println!(
        "{} Installing {} {} into {}",
        "→".cyan(),
        opts.repo,
        opts.version,
        opts.bin_dir.display()
    );

    let installed = install(&opts).context("Failed to install datree")?;

    println!(
        "{} Installed datree {} at {}",
        "✓".green(),
        installed.tag.cyan(),
        installed.binary.display()
    );
    Ok(())
}
