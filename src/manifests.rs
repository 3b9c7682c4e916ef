//! Expansion of manifest arguments into concrete file paths.
//!
//! An argument may be a file, a directory (every `.yaml`/`.yml` directly
//! inside it) or a glob pattern such as `dist/*.k8s.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Resolve manifest arguments in order, dropping duplicates.
pub fn resolve(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut resolved: Vec<PathBuf> = Vec::new();

    for input in inputs {
        for path in expand(input)? {
            if !resolved.contains(&path) {
                resolved.push(path);
            }
        }
    }

    Ok(resolved)
}

fn expand(input: &str) -> Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        let files = manifests_in_dir(path)?;
        if files.is_empty() {
            bail!("No .yaml or .yml manifests found in {}", path.display());
        }
        return Ok(files);
    }
    if !is_pattern(input) {
        bail!("Manifest not found: {}", input);
    }

    let mut files: Vec<PathBuf> = glob::glob(input)
        .with_context(|| format!("Invalid manifest pattern: {}", input))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("No manifests match pattern: {}", input);
    }
    Ok(files)
}

fn manifests_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && has_manifest_extension(p))
        .collect();
    files.sort();
    Ok(files)
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
