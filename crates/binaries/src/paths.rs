//! On-disk cache layout.
//!
//! Every function here is a pure function of its inputs and performs no I/O.
//!
//! | Artifact | Location |
//! |----------|----------|
//! | Engines | `<temp_root>/prisma/binaries/engines/<engine build>/` |
//! | CLI | `<cache_root>/prisma/binaries/cli/<cli version>/` |

use std::path::{Path, PathBuf};

use types::{check_for_extension, BinaryPlatform, EngineName, Platform};

const PRODUCT_DIR: &str = "prisma";
const BINARIES_DIR: &str = "binaries";

/// Returns the shared directory engines of `engine_version` live under.
pub fn global_temp_dir(temp_root: &Path, engine_version: &str) -> PathBuf {
    temp_root
        .join(PRODUCT_DIR)
        .join(BINARIES_DIR)
        .join("engines")
        .join(engine_version)
}

/// Returns the directory unpacked engine assets live under.
pub fn global_unpack_dir(temp_root: &Path, engine_version: &str) -> PathBuf {
    global_temp_dir(temp_root, engine_version)
        .join("unpacked")
        .join("v2")
}

/// Returns the per-user directory the CLI of `cli_version` lives under.
pub fn global_cache_dir(cache_root: &Path, cli_version: &str) -> PathBuf {
    cache_root
        .join(PRODUCT_DIR)
        .join(BINARIES_DIR)
        .join("cli")
        .join(cli_version)
}

/// Returns the CLI file name for `platform`, without extension.
pub fn cli_file_name(platform: &Platform) -> String {
    format!("prisma-cli-{}-{}", platform.name(), platform.arch())
}

/// Returns where the CLI lives inside `dir`.
pub fn cli_path(dir: &Path, platform: &Platform) -> PathBuf {
    let path = dir.join(cli_file_name(platform));
    PathBuf::from(platform.with_extension(&path.to_string_lossy()))
}

/// Returns where an engine lives inside `dir`, nested under its build identifier.
pub fn engine_path(
    dir: &Path,
    engine_version: &str,
    engine: &EngineName,
    binary: &BinaryPlatform,
) -> PathBuf {
    let path = dir
        .join(engine_version)
        .join(format!("prisma-{engine}-{binary}"));
    PathBuf::from(check_for_extension(binary.as_str(), &path.to_string_lossy()))
}

/// Returns the temporary sibling an install writes before moving into `to`.
///
/// The `tag` keeps concurrent installers from sharing a temp file.
pub fn temp_path(to: &Path, tag: &str) -> PathBuf {
    let mut name = to.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{tag}.tmp"));
    to.with_file_name(name)
}
