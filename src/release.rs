//! GitHub release metadata lookup.
//!
//! Resolves the release for a tag (or `latest`) and picks the asset built for
//! a given platform. `file://` URLs are served from disk so offline mirrors
//! can stand in for the GitHub API.

use std::fs::{self, File};
use std::io::Read;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::SetupError;

/// Version identifier that selects the newest published release.
pub const LATEST: &str = "latest";

const USER_AGENT: &str = concat!("datree-validator/", env!("CARGO_PKG_VERSION"));
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Release metadata as returned by `GET /repos/<owner>/<name>/releases/...`.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    #[serde(default)]
    pub name: Option<String>,
    pub browser_download_url: String,
}

impl Release {
    /// Find the first asset whose download URL contains `asset_name`,
    /// ignoring case.
    pub fn find_asset(&self, asset_name: &str) -> Option<&ReleaseAsset> {
        let needle = asset_name.to_lowercase();
        self.assets.iter().find(|asset| {
            let url = asset.browser_download_url.to_lowercase();
            debug!(asset = %url, "checking release asset");
            url.contains(&needle)
        })
    }

    /// Like [`Release::find_asset`], but fails with a descriptive error.
    pub fn asset_for(&self, asset_name: &str) -> Result<&ReleaseAsset, SetupError> {
        self.find_asset(asset_name)
            .ok_or_else(|| SetupError::AssetNotFound {
                tag: self.tag_name.clone(),
                asset: asset_name.to_string(),
            })
    }
}

/// Build the metadata URL for `version` in `repo` (`owner/name`).
pub fn release_url(api_base: &str, repo: &str, version: &str) -> Result<Url, SetupError> {
    let suffix = if version == LATEST {
        LATEST.to_string()
    } else {
        format!("tags/{}", version)
    };
    let raw = format!(
        "{}/repos/{}/releases/{}",
        api_base.trim_end_matches('/'),
        repo,
        suffix
    );
    Url::parse(&raw).map_err(|e| SetupError::InvalidUrl(format!("{}: {}", raw, e)))
}

/// Fetch release metadata for `version`.
pub fn fetch_release(api_base: &str, repo: &str, version: &str) -> Result<Release, SetupError> {
    let url = release_url(api_base, repo, version)?;
    info!(url = %url, "fetching release metadata");

    let mut reader = open_url(&url).map_err(|reason| SetupError::MetadataFetch {
        url: url.to_string(),
        reason,
    })?;
    let mut body = Vec::new();
    reader
        .read_to_end(&mut body)
        .map_err(|e| SetupError::MetadataFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let release: Release =
        serde_json::from_slice(&body).map_err(|e| SetupError::MetadataParse(e.to_string()))?;
    if release.tag_name.trim().is_empty() {
        return Err(SetupError::MetadataParse(
            "release tag_name must be non-empty".to_string(),
        ));
    }

    info!(tag = %release.tag_name, assets = release.assets.len(), "resolved release");
    Ok(release)
}

/// Open a reader over the body at `url`.
///
/// HTTP responses other than 2xx are errors. The error is a plain reason
/// string; callers wrap it in the variant matching their stage.
pub(crate) fn open_url(url: &Url) -> Result<Box<dyn Read + Send>, String> {
    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| format!("invalid file url: {}", url))?;
            if fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false) {
                return Err(format!("{} is a directory", path.display()));
            }
            let file = File::open(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
            Ok(Box::new(file))
        }
        "http" | "https" => {
            let agent = ureq::AgentBuilder::new().redirects(5).build();
            let mut request = agent
                .get(url.as_str())
                .set("User-Agent", USER_AGENT)
                .set("Accept", GITHUB_ACCEPT);
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                if !token.trim().is_empty() && is_github_host(url) {
                    request = request.set("Authorization", &format!("Bearer {}", token.trim()));
                }
            }

            match request.call() {
                Ok(response) => Ok(Box::new(response.into_reader())),
                Err(ureq::Error::Status(code, response)) => {
                    Err(format!("HTTP {} {}", code, response.status_text()))
                }
                Err(e) => Err(e.to_string()),
            }
        }
        other => Err(format!("unsupported scheme: {}", other)),
    }
}

fn is_github_host(url: &Url) -> bool {
    matches!(url.host_str(), Some("api.github.com") | Some("github.com"))
}
