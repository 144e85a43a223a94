//! Idempotent provisioning of the CLI and engine binaries.
//!
//! Every `ensure_*` call first checks whether the resolved final path exists.
//! A hit returns immediately with no network activity; a miss downloads and
//! installs the artifact through a temp file and an atomic rename.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use types::{BinaryPlatform, EngineCatalogEntry, EngineName, ENGINES};

use crate::download::download;
use crate::{paths, ProvisionError, ProvisionerConfig};

/// Name substituted for `{name}` in the CLI URL template.
const CLI_ARTIFACT: &str = "prisma-cli";

/// Resolves, caches, and downloads the binaries a client needs.
#[derive(Debug, Clone)]
pub struct Provisioner {
    config: ProvisionerConfig,
    client: reqwest::Client,
}

impl Provisioner {
    /// Creates a provisioner with a default HTTP client.
    pub fn new(config: ProvisionerConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Creates a provisioner sharing an existing HTTP client.
    pub fn with_client(config: ProvisionerConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Returns the configuration this provisioner was built with.
    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Path resolution (pure)
    // -----------------------------------------------------------------------

    /// Returns where the CLI lives in the per-user cache.
    pub fn resolve_cli_path(&self) -> PathBuf {
        paths::cli_path(&self.global_cache_dir(), &self.config.platform)
    }

    /// Returns where `engine` for `binary` lives inside `dir`.
    pub fn resolve_engine_path(
        &self,
        dir: &Path,
        engine: &EngineName,
        binary: &BinaryPlatform,
    ) -> PathBuf {
        paths::engine_path(dir, &self.config.versions.engine, engine, binary)
    }

    /// Returns the shared directory engines of the pinned build live under.
    pub fn global_temp_dir(&self) -> PathBuf {
        paths::global_temp_dir(&self.config.temp_root, &self.config.versions.engine)
    }

    /// Returns the directory unpacked engine assets live under.
    pub fn global_unpack_dir(&self) -> PathBuf {
        paths::global_unpack_dir(&self.config.temp_root, &self.config.versions.engine)
    }

    /// Returns the per-user directory the pinned CLI lives under.
    pub fn global_cache_dir(&self) -> PathBuf {
        paths::global_cache_dir(&self.config.cache_root, &self.config.versions.cli)
    }

    /// Returns the binary to launch for `entry`.
    ///
    /// A configured override wins; otherwise this is the cached engine path for
    /// the host's binary platform inside `dir`. Nothing is checked on disk.
    pub fn locate_engine(&self, dir: &Path, entry: &EngineCatalogEntry) -> PathBuf {
        if let Some(path) = self.config.engine_overrides.get(entry.name) {
            debug!(engine = entry.name, path = %path.display(), "using engine override");
            return path.clone();
        }
        self.resolve_engine_path(
            dir,
            &entry.engine_name(),
            &self.config.platform.binary_platform(),
        )
    }

    // -----------------------------------------------------------------------
    // Provisioning
    // -----------------------------------------------------------------------

    /// Ensures the CLI is installed inside `dir`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] if the artifact is missing and could not be
    /// downloaded or installed.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn ensure_cli(&self, dir: &Path) -> Result<PathBuf, ProvisionError> {
        let platform = &self.config.platform;
        let to = paths::cli_path(dir, platform);
        let url = platform.with_extension(&self.config.cli_url.render(&[
            ("name", CLI_ARTIFACT),
            ("version", self.config.versions.cli.as_str()),
            ("platform", platform.name()),
            ("arch", platform.arch()),
        ]));

        debug!(%url, to = %to.display(), "ensuring CLI");

        if is_installed(&to).await? {
            debug!("CLI is cached");
            return Ok(to);
        }

        info!("CLI doesn't exist, fetching... (this might take a few minutes)");
        download(&self.client, &url, &to).await?;
        info!("CLI fetched successfully");

        Ok(to)
    }

    /// Ensures `engine` for `binary` is installed inside `dir`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns a [`ProvisionError`] if the artifact is missing and could not be
    /// downloaded or installed.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn ensure_engine(
        &self,
        dir: &Path,
        engine: &EngineName,
        binary: &BinaryPlatform,
    ) -> Result<PathBuf, ProvisionError> {
        let to = self.resolve_engine_path(dir, engine, binary);

        if is_installed(&to).await? {
            debug!(path = %to.display(), "engine is cached");
            return Ok(to);
        }

        let url = types::check_for_extension(
            binary.as_str(),
            &self.config.engine_url.render(&[
                ("commit", self.config.versions.engine.as_str()),
                ("binary_platform", binary.as_str()),
                ("engine", engine.as_str()),
            ]),
        );

        info!(%url, to = %to.display(), "engine is missing, downloading");
        download(&self.client, &url, &to).await?;
        info!(path = %to.display(), "engine downloaded");

        Ok(to)
    }

    /// Ensures the CLI and every catalog engine are installed inside `dir`.
    ///
    /// Engines whose binary is supplied by an override are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidTargetDir`] before any I/O if `dir` is
    /// empty or relative, or the first provisioning failure otherwise.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn fetch_all(&self, dir: &Path) -> Result<(), ProvisionError> {
        if dir.as_os_str().is_empty() {
            return Err(ProvisionError::InvalidTargetDir {
                dir: dir.to_path_buf(),
                reason: "target directory must be provided",
            });
        }
        if !dir.is_absolute() {
            return Err(ProvisionError::InvalidTargetDir {
                dir: dir.to_path_buf(),
                reason: "target directory must be absolute",
            });
        }

        self.ensure_cli(dir).await?;

        let binary = self.config.platform.binary_platform();
        for entry in ENGINES {
            if self.config.engine_overrides.contains_key(entry.name) {
                debug!(engine = entry.name, "engine overridden, skipping download");
                continue;
            }
            self.ensure_engine(dir, &entry.engine_name(), &binary).await?;
        }

        Ok(())
    }
}

async fn is_installed(path: &Path) -> Result<bool, ProvisionError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| ProvisionError::Stat {
            path: path.to_path_buf(),
            source,
        })
}
