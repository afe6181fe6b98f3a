#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What the mock server saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub struct MockServer {
    pub addr: SocketAddr,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Routes:
/// - `/ok`           200 `{"x":1}`
/// - `/create`       201, echoes the request body
/// - `/text`         200 `plain text response`
/// - `/missing`      404
/// - `/slow/<ms>`    200 `{"delay":<ms>}` after sleeping
/// - `/close`        drops the connection without answering
/// - `/fishing`      404 with the reason phrase `Gone Fishing`
/// - `/cut/<code>`   `<code>` announcing 100 body bytes, sends 5, then closes
pub async fn spawn_mock_server() -> Result<MockServer, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("Failed to bind HTTP server: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("Failed to read HTTP addr: {}", err))?;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let recorder = seen.clone();
    let task = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let recorder = recorder.clone();
            tokio::spawn(async move {
                let _ = handle_connection(stream, recorder).await;
            });
        }
    });

    Ok(MockServer { addr, seen, task })
}

/// An address nothing listens on.
pub async fn closed_port_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("Failed to bind probe: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("Failed to read probe addr: {}", err))?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

async fn read_request(stream: &mut TcpStream) -> Result<SeenRequest, String> {
    let mut buf = Vec::with_capacity(1024);
    let header_end = loop {
        let mut chunk = [0_u8; 1024];
        let read = timeout(TEST_TIMEOUT, stream.read(&mut chunk))
            .await
            .map_err(|_err| "HTTP read timed out".to_owned())?
            .map_err(|err| format!("HTTP read failed: {}", err))?;
        if read == 0 {
            return Err("connection closed before headers".to_owned());
        }
        buf.extend_from_slice(&chunk[..read]);
        if let Some(pos) = buf.windows(4).position(|bytes| bytes == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_owned()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = [0_u8; 1024];
        let read = timeout(TEST_TIMEOUT, stream.read(&mut chunk))
            .await
            .map_err(|_err| "HTTP body read timed out".to_owned())?
            .map_err(|err| format!("HTTP body read failed: {}", err))?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(SeenRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

async fn handle_connection(mut stream: TcpStream, recorder: Arc<Mutex<Vec<SeenRequest>>>) -> Result<(), String> {
    let request = read_request(&mut stream).await?;
    if let Ok(mut seen) = recorder.lock() {
        seen.push(request.clone());
    }

    let reply = match request.path.as_str() {
        "/ok" => response("200 OK", "application/json", r#"{"x":1}"#),
        "/create" => response("201 Created", "application/json", &request.body),
        "/text" => response("200 OK", "text/plain", "plain text response"),
        "/close" => return Ok(()),
        "/fishing" => response("404 Gone Fishing", "text/plain", "back later"),
        path if path.starts_with("/cut/") => {
            let code = path.trim_start_matches("/cut/");
            format!(
                "HTTP/1.1 {} Cut Short\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort",
                code
            )
        }
        path if path.starts_with("/slow/") => {
            let ms: u64 = path.trim_start_matches("/slow/").parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            response("200 OK", "application/json", &format!(r#"{{"delay":{}}}"#, ms))
        }
        _ => response("404 Not Found", "text/plain", "nope"),
    };

    timeout(TEST_TIMEOUT, stream.write_all(reply.as_bytes()))
        .await
        .map_err(|_err| "HTTP write timed out".to_owned())?
        .map_err(|err| format!("HTTP write failed: {}", err))?;
    let _ = stream.shutdown().await;
    Ok(())
}
