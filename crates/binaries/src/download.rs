//! Download and install of a single gzip-compressed artifact.
//!
//! An install never exposes a partial file at the final path: the response is
//! decompressed chunk by chunk into a uniquely named sibling temp file, marked
//! executable, and then atomically renamed into place. A crash can leave an
//! orphaned `*.tmp` file behind, but never a truncated artifact that a later
//! existence check would mistake for a valid one.

use std::io::{self, Write};
use std::path::Path;

use flate2::write::GzDecoder;
use reqwest::StatusCode;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::paths::temp_path;
use crate::ProvisionError;

/// Fetches `url`, decompresses it, and installs the result at `to`.
///
/// If another installer finishes first, its artifact is kept and this
/// download is discarded.
pub(crate) async fn download(
    client: &reqwest::Client,
    url: &str,
    to: &Path,
) -> Result<(), ProvisionError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| ProvisionError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|source| ProvisionError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(ProvisionError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let tmp = temp_path(to, &Uuid::new_v4().simple().to_string());
    debug!(tmp = %tmp.display(), "streaming decompressed artifact");

    let installed = install(&mut response, url, &tmp, to).await;
    if installed.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    installed
}

fn decompress_error(url: &str, to: &Path, source: io::Error) -> ProvisionError {
    ProvisionError::Decompress {
        url: url.to_string(),
        path: to.to_path_buf(),
        source,
    }
}

async fn install(
    response: &mut reqwest::Response,
    url: &str,
    tmp: &Path,
    to: &Path,
) -> Result<(), ProvisionError> {
    let write_error = |source: io::Error| ProvisionError::Write {
        path: tmp.to_path_buf(),
        source,
    };

    let mut file = File::create(tmp).await.map_err(write_error)?;
    let mut decoder = GzDecoder::new(Vec::new());
    let mut written = 0usize;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| ProvisionError::Request {
            url: url.to_string(),
            source,
        })?
    {
        feed(&mut decoder, &chunk).map_err(|source| decompress_error(url, to, source))?;
        written += drain(&mut decoder, &mut file).await.map_err(write_error)?;
    }
    decoder
        .try_finish()
        .map_err(|source| decompress_error(url, to, source))?;
    written += drain(&mut decoder, &mut file).await.map_err(write_error)?;
    file.flush().await.map_err(write_error)?;
    drop(file);
    debug!(bytes = written, "artifact written");

    make_executable(tmp).await?;

    if tokio::fs::try_exists(to).await.unwrap_or(false) {
        warn!(path = %to.display(), "artifact installed concurrently; discarding this download");
        let _ = tokio::fs::remove_file(tmp).await;
        return Ok(());
    }

    tokio::fs::rename(tmp, to)
        .await
        .map_err(|source| ProvisionError::Install {
            from: tmp.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}

/// Pushes one compressed chunk through the decoder.
///
/// Artifacts are a single gzip member; bytes left over once that member has
/// ended are rejected rather than silently dropped.
fn feed(decoder: &mut GzDecoder<Vec<u8>>, mut chunk: &[u8]) -> io::Result<()> {
    while !chunk.is_empty() {
        match decoder.write(chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "trailing data after the gzip member",
                ))
            }
            Ok(n) => chunk = &chunk[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Moves decoded bytes buffered in the decoder out to the temp file.
async fn drain(decoder: &mut GzDecoder<Vec<u8>>, file: &mut File) -> io::Result<usize> {
    let decoded = std::mem::take(decoder.get_mut());
    file.write_all(&decoded).await?;
    Ok(decoded.len())
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| ProvisionError::Permissions {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}
