//! In-process HTTP fixture serving canned artifact responses.

use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Compresses `data` as a single gzip member.
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[derive(Default)]
struct Routes {
    responses: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    hits: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

/// A minimal HTTP/1.1 server answering GET requests from a route table.
pub struct ArtifactServer {
    addr: SocketAddr,
    routes: Arc<Routes>,
}

impl ArtifactServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = Arc::new(Routes::default());

        let shared = Arc::clone(&routes);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&shared)));
            }
        });

        Self { addr, routes }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn route(&self, path: &str, status: u16, body: Vec<u8>) {
        self.routes
            .responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body));
    }

    pub fn hits(&self, path: &str) -> usize {
        self.routes
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.routes.total.load(Ordering::SeqCst)
    }
}

async fn serve(mut stream: TcpStream, routes: Arc<Routes>) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&request);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    routes.total.fetch_add(1, Ordering::SeqCst);
    *routes.hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let (status, body) = routes
        .responses
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((404, b"no route".to_vec()));

    let head = format!(
        "HTTP/1.1 {status} Fixture\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}
