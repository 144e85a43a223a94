//! Error type for binary provisioning.
//!
//! Every variant carries the path or URL it concerns. Nothing here is retried
//! internally; callers that need resilience retry at a higher layer.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while resolving, downloading, or installing an artifact.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The target directory handed to a full fetch was empty or relative.
    ///
    /// Raised before any I/O takes place.
    #[error("invalid target directory {dir:?}: {reason}")]
    InvalidTargetDir {
        /// The directory as given by the caller.
        dir: PathBuf,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The per-user cache directory could not be determined for this host.
    #[error("could not read user cache dir")]
    CacheDirUnavailable,

    /// Checking whether an artifact is already installed failed.
    #[error("could not stat {}: {source}", .path.display())]
    Stat {
        /// Artifact path being checked.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The directory that will hold the artifact could not be created.
    #[error("could not create directory {}: {source}", .path.display())]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request failed before or while transferring the body.
    #[error("could not get {url}: {source}")]
    Request {
        /// URL being downloaded.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with anything other than `200 OK`.
    #[error("received code {status} from {url}: {body}")]
    UnexpectedStatus {
        /// URL being downloaded.
        url: String,
        /// HTTP status code returned.
        status: u16,
        /// Raw response body, for diagnostics.
        body: String,
    },

    /// The response body is not a valid single-member gzip stream.
    #[error("could not decompress {url} into {}: {source}", .path.display())]
    Decompress {
        /// URL being downloaded.
        url: String,
        /// Final artifact path.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: std::io::Error,
    },

    /// The decompressed artifact could not be written to its temporary file.
    #[error("could not write {}: {source}", .path.display())]
    Write {
        /// Temporary file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be marked executable.
    #[error("could not chmod +x {}: {source}", .path.display())]
    Permissions {
        /// Temporary file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The temporary file could not be moved onto the final path.
    #[error("could not install {} as {}: {source}", .from.display(), .to.display())]
    Install {
        /// Temporary file path.
        from: PathBuf,
        /// Final artifact path.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
