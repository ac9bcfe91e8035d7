//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use country_info_api::lifecycle::Shutdown;
use country_info_api::observability::push::PushDispatcher;
use country_info_api::{AppConfig, HttpServer, Telemetry};

/// A request seen by the capturing backend.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Everything the capturing backend has received so far.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<CapturedRequest>>>);

impl Captured {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.0.lock().unwrap().clone()
    }

    /// Poll until at least `n` requests matching `filter` arrived.
    pub async fn wait_for<F>(&self, n: usize, filter: F) -> Vec<CapturedRequest>
    where
        F: Fn(&CapturedRequest) -> bool,
    {
        for _ in 0..100 {
            let matching: Vec<_> = self.requests().into_iter().filter(|r| filter(r)).collect();
            if matching.len() >= n {
                return matching;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("timed out waiting for {n} captured requests");
    }
}

/// Start a backend that records every request and answers with a fixed status.
pub async fn start_capturing_backend(addr: SocketAddr, status: u16) -> Captured {
    let listener = TcpListener::bind(addr).await.unwrap();
    let captured = Captured::default();
    let store = captured.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let store = store.clone();
                    tokio::spawn(async move {
                        handle_connection(socket, status, store).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    captured
}

async fn handle_connection(mut socket: TcpStream, status: u16, store: Captured) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();

    store.0.lock().unwrap().push(CapturedRequest {
        method,
        path,
        headers,
        body,
    });

    let status_text = match status {
        200 => "200 OK",
        204 => "204 No Content",
        401 => "401 Unauthorized",
        500 => "500 Internal Server Error",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        status_text
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend(addr: SocketAddr) {
    let listener = TcpListener::bind(addr).await.unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
}

/// Config bound to `addr` with remote push disabled.
pub fn test_config(addr: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = addr.to_string();
    config
}

/// Run the full server (push worker included) until the returned handle fires.
pub async fn start_server(config: AppConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let (push, _worker) = PushDispatcher::spawn(&config, shutdown.subscribe()).unwrap();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let server = HttpServer::new(config, Telemetry::new(push)).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
