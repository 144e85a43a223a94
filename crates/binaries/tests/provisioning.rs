//! End-to-end provisioning against a local artifact server.

mod common;

use std::path::Path;

use binaries::{ProvisionError, Provisioner, ProvisionerConfig};
use common::{gzip, ArtifactServer};
use tempfile::TempDir;
use types::{BinaryPlatform, EngineName, Platform, ENGINE_VERSION};

const BINARY: &str = "linux-static-x64";

fn engine_route(engine: &str) -> String {
    format!("/{ENGINE_VERSION}/{BINARY}/{engine}.gz")
}

fn provisioner(server: &ArtifactServer, root: &Path) -> Provisioner {
    let config = ProvisionerConfig::new(root, root)
        .with_platform(Platform::new("linux", "x86_64"))
        .with_engine_base(&server.base_url())
        .with_cli_base(&server.base_url());
    Provisioner::with_client(config, local_client())
}

fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn query_engine() -> (EngineName, BinaryPlatform) {
    (
        EngineName::new("query-engine").unwrap(),
        BinaryPlatform::new(BINARY).unwrap(),
    )
}

#[cfg(unix)]
fn assert_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0, "{} is not executable", path.display());
}

#[cfg(not(unix))]
fn assert_executable(_path: &Path) {}

fn leftover_temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".tmp"))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn ensure_engine_installs_decompressed_executable() {
    let server = ArtifactServer::start().await;
    server.route(&engine_route("query-engine"), 200, gzip(b"ENGINE_BYTES"));
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let path = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap();

    assert_eq!(path, p.resolve_engine_path(tmp.path(), &engine, &binary));
    assert_eq!(std::fs::read(&path).unwrap(), b"ENGINE_BYTES");
    assert_executable(&path);
    assert!(leftover_temp_files(path.parent().unwrap()).is_empty());
}

#[tokio::test]
async fn second_ensure_engine_is_served_from_cache() {
    let server = ArtifactServer::start().await;
    server.route(&engine_route("query-engine"), 200, gzip(b"ENGINE_BYTES"));
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap();
    p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap();

    assert_eq!(server.total_hits(), 1);
}

#[tokio::test]
async fn existing_file_counts_as_installed() {
    let server = ArtifactServer::start().await;
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let path = p.resolve_engine_path(tmp.path(), &engine, &binary);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"prebuilt").unwrap();

    p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap();

    assert_eq!(server.total_hits(), 0);
    assert_eq!(std::fs::read(&path).unwrap(), b"prebuilt");
}

#[tokio::test]
async fn non_200_response_fails_without_creating_file() {
    let server = ArtifactServer::start().await;
    server.route(&engine_route("query-engine"), 403, b"access denied".to_vec());
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let err = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap_err();

    match &err {
        ProvisionError::UnexpectedStatus { url, status, body } => {
            assert_eq!(*status, 403);
            assert_eq!(body, "access denied");
            assert!(url.ends_with("/query-engine.gz"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("403"));
    assert!(!p.resolve_engine_path(tmp.path(), &engine, &binary).exists());
}

#[tokio::test]
async fn corrupt_payload_is_a_decompression_error() {
    let server = ArtifactServer::start().await;
    server.route(&engine_route("query-engine"), 200, b"definitely not gzip".to_vec());
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let err = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap_err();

    assert!(matches!(err, ProvisionError::Decompress { .. }), "{err:?}");
    let path = p.resolve_engine_path(tmp.path(), &engine, &binary);
    assert!(!path.exists());
    assert!(leftover_temp_files(path.parent().unwrap()).is_empty());
}

#[tokio::test]
async fn trailing_gzip_member_is_a_decompression_error() {
    let server = ArtifactServer::start().await;
    let payload = [gzip(b"ENGINE_BYTES"), gzip(b"SMUGGLED")].concat();
    server.route(&engine_route("query-engine"), 200, payload);
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let err = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap_err();

    assert!(matches!(err, ProvisionError::Decompress { .. }), "{err:?}");
    let path = p.resolve_engine_path(tmp.path(), &engine, &binary);
    assert!(!path.exists());
    assert!(leftover_temp_files(path.parent().unwrap()).is_empty());
}

#[tokio::test]
async fn truncated_gzip_member_is_a_decompression_error() {
    let server = ArtifactServer::start().await;
    let mut payload = gzip(b"ENGINE_BYTES");
    payload.truncate(payload.len() - 4);
    server.route(&engine_route("query-engine"), 200, payload);
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let err = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap_err();

    assert!(matches!(err, ProvisionError::Decompress { .. }), "{err:?}");
    let path = p.resolve_engine_path(tmp.path(), &engine, &binary);
    assert!(!path.exists());
    assert!(leftover_temp_files(path.parent().unwrap()).is_empty());
}

#[tokio::test]
async fn large_artifact_is_streamed_intact() {
    let server = ArtifactServer::start().await;
    let artifact: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    server.route(&engine_route("query-engine"), 200, gzip(&artifact));
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let path = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), artifact);
    assert!(leftover_temp_files(path.parent().unwrap()).is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let tmp = TempDir::new().unwrap();
    let config = ProvisionerConfig::new(tmp.path(), tmp.path())
        .with_platform(Platform::new("linux", "x86_64"))
        .with_engine_base("http://127.0.0.1:1");
    let p = Provisioner::with_client(config, local_client());
    let (engine, binary) = query_engine();

    let err = p.ensure_engine(tmp.path(), &engine, &binary).await.unwrap_err();

    assert!(matches!(err, ProvisionError::Request { .. }), "{err:?}");
}

#[tokio::test]
async fn concurrent_installs_leave_one_complete_artifact() {
    let server = ArtifactServer::start().await;
    server.route(&engine_route("query-engine"), 200, gzip(b"ENGINE_BYTES"));
    let tmp = TempDir::new().unwrap();
    let first = provisioner(&server, tmp.path());
    let second = provisioner(&server, tmp.path());
    let (engine, binary) = query_engine();

    let (a, b) = tokio::join!(
        first.ensure_engine(tmp.path(), &engine, &binary),
        second.ensure_engine(tmp.path(), &engine, &binary),
    );

    let path = a.unwrap();
    assert_eq!(path, b.unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), b"ENGINE_BYTES");
    assert!(leftover_temp_files(path.parent().unwrap()).is_empty());
}

#[tokio::test]
async fn fetch_all_provisions_cli_and_every_engine() {
    let server = ArtifactServer::start().await;
    let cli_route = format!("/prisma-cli-{}-linux-x64.gz", types::CLI_VERSION);
    server.route(&cli_route, 200, gzip(b"CLI_BYTES"));
    server.route(&engine_route("query-engine"), 200, gzip(b"ENGINE_BYTES"));
    server.route(&engine_route("migration-engine"), 200, gzip(b"MIGRATE_BYTES"));
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());

    p.fetch_all(tmp.path()).await.unwrap();

    let cli = tmp.path().join("prisma-cli-linux-x64");
    assert_eq!(std::fs::read(&cli).unwrap(), b"CLI_BYTES");
    assert_executable(&cli);

    let engine = p.locate_engine(tmp.path(), &types::QUERY_ENGINE);
    assert_eq!(std::fs::read(&engine).unwrap(), b"ENGINE_BYTES");
    assert_executable(&engine);

    let migrate = p.locate_engine(tmp.path(), &types::MIGRATION_ENGINE);
    assert_eq!(std::fs::read(&migrate).unwrap(), b"MIGRATE_BYTES");

    p.fetch_all(tmp.path()).await.unwrap();
    assert_eq!(server.total_hits(), 3);
}

#[tokio::test]
async fn fetch_all_skips_overridden_engines() {
    let server = ArtifactServer::start().await;
    let cli_route = format!("/prisma-cli-{}-linux-x64.gz", types::CLI_VERSION);
    server.route(&cli_route, 200, gzip(b"CLI_BYTES"));
    server.route(&engine_route("query-engine"), 200, gzip(b"ENGINE_BYTES"));
    let tmp = TempDir::new().unwrap();
    let config = provisioner(&server, tmp.path())
        .config()
        .clone()
        .with_engine_override("migration-engine", "/opt/migrate");
    let p = Provisioner::with_client(config, local_client());

    p.fetch_all(tmp.path()).await.unwrap();

    assert_eq!(server.hits(&engine_route("migration-engine")), 0);
    assert_eq!(
        p.locate_engine(tmp.path(), &types::MIGRATION_ENGINE),
        Path::new("/opt/migrate")
    );
}

#[tokio::test]
async fn fetch_all_rejects_relative_dir_before_any_request() {
    let server = ArtifactServer::start().await;
    let tmp = TempDir::new().unwrap();
    let p = provisioner(&server, tmp.path());

    let err = p.fetch_all(Path::new("engines")).await.unwrap_err();

    assert!(matches!(err, ProvisionError::InvalidTargetDir { .. }));
    assert_eq!(server.total_hits(), 0);
}
