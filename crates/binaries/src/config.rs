//! Immutable provisioning configuration.
//!
//! All ambient process state (URL overrides, per-engine binary overrides,
//! temp and cache roots) is captured once by [`ProvisionerConfig::from_env`]
//! and never re-read. Changing the environment afterwards has no effect on a
//! config that already exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use types::{Platform, VersionIdentifiers, ENGINES};

use crate::ProvisionError;

/// Environment variable replacing the CLI download URL template.
pub const CLI_URL_ENV: &str = "PRISMA_CLI_URL";

/// Environment variable replacing the engine download URL template.
pub const ENGINE_URL_ENV: &str = "PRISMA_ENGINE_URL";

/// Default CLI download location.
pub const DEFAULT_CLI_URL: &str =
    "https://packaged-cli.prisma.sh/{name}-{version}-{platform}-{arch}.gz";

/// Default engine download location.
pub const DEFAULT_ENGINE_URL: &str =
    "https://binaries.prisma.sh/all_commits/{commit}/{binary_platform}/{engine}.gz";

const CLI_URL_PATH: &str = "/{name}-{version}-{platform}-{arch}.gz";
const ENGINE_URL_PATH: &str = "/{commit}/{binary_platform}/{engine}.gz";

// ---------------------------------------------------------------------------
// URL templates
// ---------------------------------------------------------------------------

/// A download URL with placeholders for version and platform identifiers.
///
/// Named placeholders (`{version}`, `{engine}`, ...) are substituted by name.
/// The legacy `%s` form is also accepted and substituted positionally, in the
/// order the values are supplied to [`render`](Self::render).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Wraps a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Interprets an override value.
    ///
    /// A value containing placeholders is a complete template. Anything else is
    /// a base URL, and `path` (the default placeholder suffix) is appended.
    fn from_override(value: &str, path: &str) -> Self {
        if value.contains('{') || value.contains("%s") {
            Self::new(value)
        } else {
            Self(format!("{}{path}", value.trim_end_matches('/')))
        }
    }

    /// Returns the raw template.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitutes `values` into the template.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = self.0.clone();
        for (key, value) in values {
            out = out.replace(&format!("{{{key}}}"), value);
        }
        for (_, value) in values {
            match out.find("%s") {
                Some(at) => out.replace_range(at..at + 2, value),
                None => break,
            }
        }
        out
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything the provisioner needs to know about its environment.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Where the CLI is downloaded from.
    pub cli_url: UrlTemplate,
    /// Where engines are downloaded from.
    pub engine_url: UrlTemplate,
    /// Prebuilt engine binaries keyed by engine name; these are never downloaded.
    pub engine_overrides: HashMap<String, PathBuf>,
    /// Shared temp root; engines are cached beneath it.
    pub temp_root: PathBuf,
    /// Per-user cache root; the CLI is cached beneath it.
    pub cache_root: PathBuf,
    /// Platform used for artifact names and URLs.
    pub platform: Platform,
    /// Pinned CLI and engine versions.
    pub versions: VersionIdentifiers,
}

impl ProvisionerConfig {
    /// Creates a config with default URLs, no overrides, and the detected
    /// platform, rooted at the given directories.
    pub fn new(temp_root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cli_url: UrlTemplate::new(DEFAULT_CLI_URL),
            engine_url: UrlTemplate::new(DEFAULT_ENGINE_URL),
            engine_overrides: HashMap::new(),
            temp_root: temp_root.into(),
            cache_root: cache_root.into(),
            platform: Platform::detect(),
            versions: VersionIdentifiers::pinned(),
        }
    }

    /// Captures the process environment.
    ///
    /// Reads `PRISMA_CLI_URL`, `PRISMA_ENGINE_URL`, and each engine's
    /// binary override variable; empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::CacheDirUnavailable`] if the host has no
    /// per-user cache directory.
    pub fn from_env() -> Result<Self, ProvisionError> {
        let cache_root = dirs::cache_dir().ok_or(ProvisionError::CacheDirUnavailable)?;
        let mut config = Self::new(std::env::temp_dir(), cache_root);

        if let Some(url) = non_empty_var(CLI_URL_ENV) {
            config.cli_url = UrlTemplate::from_override(&url, CLI_URL_PATH);
        }
        if let Some(url) = non_empty_var(ENGINE_URL_ENV) {
            config.engine_url = UrlTemplate::from_override(&url, ENGINE_URL_PATH);
        }
        for entry in ENGINES {
            if let Some(path) = non_empty_var(entry.env) {
                config
                    .engine_overrides
                    .insert(entry.name.to_string(), PathBuf::from(path));
            }
        }

        Ok(config)
    }

    /// Points engine downloads at `base` using the default path layout.
    pub fn with_engine_base(mut self, base: &str) -> Self {
        self.engine_url = UrlTemplate::from_override(base, ENGINE_URL_PATH);
        self
    }

    /// Points CLI downloads at `base` using the default file naming.
    pub fn with_cli_base(mut self, base: &str) -> Self {
        self.cli_url = UrlTemplate::from_override(base, CLI_URL_PATH);
        self
    }

    /// Replaces the platform used for names and URLs.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Replaces the pinned versions.
    pub fn with_versions(mut self, versions: VersionIdentifiers) -> Self {
        self.versions = versions;
        self
    }

    /// Registers a prebuilt binary for one engine.
    pub fn with_engine_override(mut self, engine: &str, path: impl AsRef<Path>) -> Self {
        self.engine_overrides
            .insert(engine.to_string(), path.as_ref().to_path_buf());
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
