//! Shared test utilities for integration tests
//!
//! Oracle wrappers for observing workers, a tiny HTTP oracle server and environment
//! isolation for configuration tests.

use async_trait::async_trait;
use prefix_probe::oracle::{Oracle, SecretSetOracle};
use prefix_probe::OracleError;
use reqwest::Url;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn secret_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Tracks how many oracle calls are in flight at once.
pub struct InFlightOracle {
    inner: SecretSetOracle,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InFlightOracle {
    pub fn new(inner: SecretSetOracle, latency: Duration) -> Self {
        Self {
            inner,
            latency,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for InFlightOracle {
    async fn test(&self, pattern: &str) -> Result<bool, OracleError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let result = self.inner.test(pattern).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "in-flight"
    }
}

/// Panics when asked about `pattern`, answers from the secret set otherwise.
pub struct PanickingOracle {
    pub inner: SecretSetOracle,
    pub pattern: String,
}

#[async_trait]
impl Oracle for PanickingOracle {
    async fn test(&self, pattern: &str) -> Result<bool, OracleError> {
        if pattern == self.pattern {
            panic!("oracle blew up on {}", pattern);
        }
        self.inner.test(pattern).await
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// How the test server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// 200 with "Welcome" on a match, 200 with "Article not found!" otherwise
    Body,
    /// 200 on a match, 404 otherwise
    Status,
    /// Always 500
    Broken,
}

/// A running HTTP oracle backed by a secret set.
pub struct TestServer {
    pub url: String,
    pub requests: Arc<AtomicUsize>,
}

/// Serve the `q` query parameter (or form field) as a LIKE pattern over `secrets`.
pub async fn spawn_oracle_server(secrets: &[&str], mode: ServerMode) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let oracle = Arc::new(SecretSetOracle::new(secrets));
    let requests = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&requests);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let oracle = Arc::clone(&oracle);
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                counter.fetch_add(1, Ordering::SeqCst);

                let matched = request_param(&request, "q")
                    .map(|pattern| oracle.matches(&pattern))
                    .unwrap_or(false);
                let (status, body) = match (mode, matched) {
                    (ServerMode::Broken, _) => ("500 Internal Server Error", "boom"),
                    (ServerMode::Body, true) => ("200 OK", "Welcome"),
                    (ServerMode::Body, false) => ("200 OK", "Article not found!"),
                    (ServerMode::Status, true) => ("200 OK", "ok"),
                    (ServerMode::Status, false) => ("404 Not Found", "missing"),
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    TestServer {
        url: format!("http://{}/article.php", addr),
        requests,
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let length = content_length(&buf[..end]);
            if buf.len() >= end + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

/// Find `name` in the query string of the request line or in a form body.
fn request_param(request: &str, name: &str) -> Option<String> {
    let target = request.split_whitespace().nth(1).unwrap_or("/");
    let body = request.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("");

    let query_url = Url::parse(&format!("http://localhost{}", target)).ok()?;
    let form_url = Url::parse(&format!("http://localhost/?{}", body)).ok()?;

    query_url
        .query_pairs()
        .chain(form_url.query_pairs())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Environment variable state restored on drop. Holds the global env lock.
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let saved = vars
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect();
        for (key, value) in vars {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
        Self { saved, _lock: lock }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}
