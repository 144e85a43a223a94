//! Host platform names as they appear in artifact URLs and file names.

use serde::{Deserialize, Serialize};

use crate::BinaryPlatform;

/// Operating system and CPU architecture, normalised to the artifact naming
/// scheme (`darwin` rather than `macos`, `x64` rather than `x86_64`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    name: String,
    arch: String,
}

impl Platform {
    /// Returns the platform this binary was compiled for.
    pub fn detect() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Creates a platform from raw OS / architecture names.
    ///
    /// Unknown names are kept as given.
    pub fn new(os: &str, arch: &str) -> Self {
        let name = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" | "amd64" => "x64",
            "aarch64" => "arm64",
            other => other,
        };
        Self {
            name: name.to_string(),
            arch: arch.to_string(),
        }
    }

    /// Returns the operating system name (e.g. `"linux"`, `"darwin"`, `"windows"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the architecture name (e.g. `"x64"`, `"arm64"`).
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Returns the statically linked engine build for this platform.
    pub fn binary_platform(&self) -> BinaryPlatform {
        let name = match self.name.as_str() {
            "darwin" if self.arch == "arm64" => "darwin-arm64".to_string(),
            "darwin" => "darwin".to_string(),
            "windows" => "windows".to_string(),
            _ => format!("linux-static-{}", self.arch),
        };
        BinaryPlatform(name)
    }

    /// Applies [`check_for_extension`] using this platform's name.
    pub fn with_extension(&self, path: &str) -> String {
        check_for_extension(&self.name, path)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.arch)
    }
}

/// Adds the Windows executable suffix when `platform` is `windows`.
///
/// A compressed artifact name keeps `.gz` last (`engine.gz` becomes
/// `engine.exe.gz`); anything else gets `.exe` appended. Other platforms are
/// returned unchanged.
pub fn check_for_extension(platform: &str, path: &str) -> String {
    if platform != "windows" {
        return path.to_string();
    }
    match path.strip_suffix(".gz") {
        Some(stem) => format!("{stem}.exe.gz"),
        None => format!("{path}.exe"),
    }
}
