//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use ssl_proxy::config::{ProxyConfig, UpstreamConfig, INTERNAL_ARTIFACTORY, PRODUCT, PUBLIC_ARTIFACTORY};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A mock upstream that records each request head and answers with its name.
#[allow(dead_code)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub name: &'static str,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Raw request heads received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Value of a header in the n-th recorded request, matched case-insensitively.
    pub fn header(&self, n: usize, name: &str) -> Option<String> {
        let requests = self.requests();
        let head = requests.get(n)?;
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Start a mock upstream on an ephemeral port.
pub async fn start_mock_upstream(name: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 4096];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let text = String::from_utf8_lossy(&head).to_string();
                        let head_only = text.split("\r\n\r\n").next().unwrap_or_default().to_string();
                        recorded.lock().unwrap().push(head_only);

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nX-Upstream: {}\r\nAccess-Control-Allow-Origin: https://upstream.example\r\nConnection: close\r\n\r\n{}",
                            name.len(),
                            name,
                            name
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream {
        addr,
        name,
        requests,
    }
}

/// A mock upstream that reads one request head and never answers.
#[allow(dead_code)]
pub struct SilentUpstream {
    pub addr: SocketAddr,
    /// Fires once the request head has arrived.
    pub received: oneshot::Receiver<()>,
    /// Fires once the proxy closes the connection.
    pub closed: oneshot::Receiver<()>,
}

#[allow(dead_code)]
pub async fn start_silent_upstream() -> SilentUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = oneshot::channel();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut head = Vec::new();
            let mut buf = [0u8; 4096];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let _ = received_tx.send(());

            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            let _ = closed_tx.send(());
        }
    });

    SilentUpstream {
        addr,
        received,
        closed,
    }
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Default deployment with the three upstreams replaced by the given base URLs.
#[allow(dead_code)]
pub fn config_for(product: &str, internal: &str, public: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstreams = vec![
        UpstreamConfig::new(PRODUCT, product),
        UpstreamConfig::new(INTERNAL_ARTIFACTORY, internal),
        UpstreamConfig::new(PUBLIC_ARTIFACTORY, public),
    ];
    config
}

/// Three live mock upstreams plus a config pointing at them.
#[allow(dead_code)]
pub async fn mock_deployment() -> (ProxyConfig, [MockUpstream; 3]) {
    let product = start_mock_upstream("product").await;
    let internal = start_mock_upstream("internal").await;
    let public = start_mock_upstream("public").await;
    let config = config_for(&product.url(), &internal.url(), &public.url());
    (config, [product, internal, public])
}

/// Write a self-signed certificate and key for `localhost`/127.0.0.1.
#[allow(dead_code)]
pub fn write_self_signed(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let certified =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, certified.cert.pem()).unwrap();
    std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}
