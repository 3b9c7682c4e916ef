//! Provisioning of the Datree executable.
//!
//! Downloads the release archive for the host platform, extracts it and keeps
//! only the executable. All work happens in a staging directory beside the
//! binary directory. Only the finished executable is moved into the binary
//! directory; other files already there are left alone, and a failed run
//! leaves the previous executable in place.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tempfile::Builder;
use tracing::{debug, info};
use url::Url;
use zip::read::ZipArchive;

use crate::error::SetupError;
use crate::platform;
use crate::release::{self, Release};

const ARCHIVE_FILE: &str = "datree.zip";

/// Where and what to install.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Base URL of the releases API, e.g. `https://api.github.com`
    pub api_base: String,
    /// Repository in `owner/name` form
    pub repo: String,
    /// Release tag or `latest`
    pub version: String,
    /// Directory the executable is moved into
    pub bin_dir: PathBuf,
}

/// Outcome of a successful install.
#[derive(Debug, Clone)]
pub struct Installed {
    pub tag: String,
    pub download_url: String,
    pub binary: PathBuf,
}

/// Resolve, download and unpack the tool for the host platform.
pub fn install(opts: &InstallOptions) -> Result<Installed, SetupError> {
    let asset_name = platform::host_asset_name()?;
    info!(
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        asset = asset_name,
        "resolved platform asset"
    );

    let release = release::fetch_release(&opts.api_base, &opts.repo, &opts.version)?;
    install_release_asset(&release, asset_name, &opts.bin_dir)
}

/// Install the asset matching `asset_name` from an already fetched release.
pub fn install_release_asset(
    release: &Release,
    asset_name: &str,
    bin_dir: &Path,
) -> Result<Installed, SetupError> {
    let asset = release.asset_for(asset_name)?;
    let download_url = Url::parse(&asset.browser_download_url)
        .map_err(|e| SetupError::InvalidUrl(format!("{}: {}", asset.browser_download_url, e)))?;

    let parent = match bin_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let staging = Builder::new()
        .prefix(".datree-install-")
        .tempdir_in(&parent)?;
    let archive_path = staging.path().join(ARCHIVE_FILE);
    let unpack_dir = staging.path().join("bin");

    info!(url = %download_url, "downloading release archive");
    let bytes = download(&download_url, &archive_path)?;
    debug!(bytes, path = %archive_path.display(), "archive downloaded");

    extract_zip(&archive_path, &unpack_dir)?;
    let exe_name = platform::executable_name();
    prune_except(&unpack_dir, &exe_name)?;

    let staged_binary = unpack_dir.join(&exe_name);
    if !staged_binary.is_file() {
        return Err(SetupError::MissingExecutable(exe_name));
    }
    mark_executable(&staged_binary)?;

    fs::create_dir_all(bin_dir)?;
    let binary = bin_dir.join(&exe_name);
    fs::rename(&staged_binary, &binary)?;

    info!(tag = %release.tag_name, binary = %binary.display(), "datree installed");

    Ok(Installed {
        tag: release.tag_name.clone(),
        download_url: download_url.to_string(),
        binary,
    })
}

fn download(url: &Url, dest: &Path) -> Result<u64, SetupError> {
    let mut reader = release::open_url(url).map_err(|reason| SetupError::Download {
        url: url.to_string(),
        reason,
    })?;
    let mut output = File::create(dest)?;
    io::copy(&mut reader, &mut output).map_err(|e| SetupError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<(), SetupError> {
    let archive_name = archive_path.display().to_string();
    let extract_err = |reason: String| SetupError::Extract {
        archive: archive_name.clone(),
        reason,
    };

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| extract_err(e.to_string()))?;
    fs::create_dir_all(dest)?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| extract_err(e.to_string()))?;

        let is_symlink = entry
            .unix_mode()
            .map(|mode| (mode & 0o170000) == 0o120000)
            .unwrap_or(false);
        if is_symlink {
            return Err(extract_err(format!(
                "symlink entries are not supported: {}",
                entry.name()
            )));
        }

        let normalized = entry.name().replace('\\', "/");
        let relative = safe_relative_path(Path::new(&normalized))
            .ok_or_else(|| extract_err(format!("invalid entry path: {}", entry.name())))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let out_path = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut output = File::create(&out_path)?;
            io::copy(&mut entry, &mut output).map_err(|e| extract_err(e.to_string()))?;
        }
    }

    Ok(())
}

/// Reject absolute paths and parent traversal; drop `.` components.
fn safe_relative_path(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

/// Remove every entry in `dir` whose name is not `keep`.
fn prune_except(dir: &Path, keep: &str) -> Result<(), SetupError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == keep {
            continue;
        }
        let path = entry.path();
        debug!(path = %path.display(), "removing extracted file");
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn mark_executable(path: &Path) -> Result<(), SetupError> {
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
