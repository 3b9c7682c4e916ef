//! Release asset lookup for the host operating system and CPU architecture.

use crate::error::SetupError;

/// Name of the tool executable inside a release archive, without extension.
pub const EXECUTABLE_BASE: &str = "datree";

/// Map an operating system and architecture pair to the substring Datree
/// uses in its release asset names.
///
/// Both Rust (`std::env::consts`) and Node-style names are accepted, so
/// `("macos", "aarch64")` and `("darwin", "arm64")` resolve the same way.
pub fn asset_name(os: &str, arch: &str) -> Option<&'static str> {
    let os = match os {
        "macos" | "darwin" => "darwin",
        "linux" => "linux",
        "windows" | "win32" => "windows",
        _ => return None,
    };

    let arch = match arch {
        "x86_64" | "x64" | "amd64" => "x86_64",
        "aarch64" | "arm64" => "arm64",
        "x86" | "386" | "ia32" => "386",
        _ => return None,
    };

    match (os, arch) {
        ("darwin", "arm64") => Some("darwin_arm64"),
        ("darwin", "x86_64") => Some("darwin_x86_64"),
        ("linux", "arm64") => Some("linux_arm64"),
        ("linux", "x86_64") => Some("linux_x86_64"),
        ("linux", "386") => Some("linux_386"),
        ("windows", "386") => Some("windows_386"),
        ("windows", "x86_64") => Some("windows_x86_64"),
        _ => None,
    }
}

/// Resolve the asset name for the platform this binary was built for.
pub fn host_asset_name() -> Result<&'static str, SetupError> {
    let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
    asset_name(os, arch).ok_or_else(|| SetupError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    })
}

pub fn is_windows() -> bool {
    std::env::consts::OS == "windows"
}

/// File name of the tool executable on this host.
pub fn executable_name() -> String {
    if is_windows() {
        format!("{EXECUTABLE_BASE}.exe")
    } else {
        EXECUTABLE_BASE.to_string()
    }
}
