//! In-process HTTP server for exercising the API clients in tests.
//!
//! Routes match on the exact request target first, then on the path with
//! the query string stripped. `{base}` in bodies and headers is replaced
//! with the server's base URL so fixtures can link back to it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_next(mut self, next_target: &str) -> Self {
        self.headers.push((
            "Link".to_string(),
            format!("<{{base}}{}>; rel=\"next\"", next_target),
        ));
        self
    }
}

pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    pub async fn start(routes: Vec<(&str, MockResponse)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: Arc<HashMap<String, MockResponse>> = Arc::new(
            routes
                .into_iter()
                .map(|(target, response)| (target.to_string(), response))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));

        let base = base_url.clone();
        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                let base = base.clone();

                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 4096];
                    loop {
                        let n = socket.read(&mut chunk).await.unwrap_or(0);
                        if n == 0 {
                            break;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let request = String::from_utf8_lossy(&buf).to_string();
                    let target = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    seen.lock().unwrap().push(request);

                    let path = target.split('?').next().unwrap_or("/");
                    let response = routes
                        .get(&target)
                        .or_else(|| routes.get(path))
                        .cloned()
                        .unwrap_or_else(|| MockResponse::status(404, r#"{"message":"Not Found"}"#));

                    let body = response.body.replace("{base}", &base);
                    let mut head = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                        response.status,
                        if response.status < 400 { "OK" } else { "Error" },
                        body.len()
                    );
                    for (name, value) in &response.headers {
                        head.push_str(&format!("{}: {}\r\n", name, value.replace("{base}", &base)));
                    }
                    head.push_str("\r\n");

                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(body.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { base_url, requests }
    }

    /// Raw request heads received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// A client that never routes through a system proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .user_agent("githouse-tests")
        .build()
        .unwrap()
}
