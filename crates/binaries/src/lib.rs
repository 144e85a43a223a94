//! Query engine and CLI provisioning.
//!
//! Guarantees that the external binaries a generated client needs are present
//! on the local machine, downloading them only on a cache miss.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, gzip decoding, and filesystem layout all
//! live here. Names, versions, and platforms come from the [`types`] crate.
//!
//! ## Configuration
//!
//! A [`ProvisionerConfig`] is built once (usually via
//! [`ProvisionerConfig::from_env`]) and handed to the [`Provisioner`]. URL
//! templates and per-engine overrides never change after construction.
//!
//! ## Concurrency
//!
//! The cache directories are shared by every process on the host. Installs
//! write a uniquely named temp file and rename it into place, so concurrent
//! first-time provisioning ends with one complete artifact; the loser's
//! download is discarded.

mod download;

pub mod config;
pub mod errors;
pub mod paths;
pub mod provisioner;

pub use config::{ProvisionerConfig, UrlTemplate, CLI_URL_ENV, ENGINE_URL_ENV};
pub use errors::ProvisionError;
pub use provisioner::Provisioner;
