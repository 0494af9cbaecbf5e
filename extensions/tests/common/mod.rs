#![allow(dead_code)]

use std::{env, future::Future, io};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::oneshot,
};

pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

// Helper function to get a setting or skip the test
pub fn get_env_or_skip(var_name: &str, test_name: &str) -> Option<String> {
    dotenv::dotenv().ok(); // Load .env file if present

    match env::var(var_name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => {
            println!(
                "Skipping integration test {} - {} environment variable not set.",
                test_name, var_name
            );
            None
        }
    }
}

pub fn get_api_key_or_skip(var_name: &str, test_name: &str) -> Option<String> {
    get_env_or_skip(var_name, test_name)
}

/// Local HTTP/1.1 server that accepts one connection, reads the full request and hands the
/// socket to `respond`.
///
/// Returns the base URL and a receiver for the raw request text.
pub async fn serve_once<F, Fut>(respond: F) -> (String, oneshot::Receiver<String>)
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
    let addr = listener.local_addr().expect("stub server address");
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        if let Ok(request) = read_request(&mut stream).await {
            let _ = request_tx.send(request);
            respond(stream).await;
        }
    });

    (format!("http://{}", addr), request_rx)
}

async fn read_request(stream: &mut TcpStream) -> io::Result<String> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let Some(head_end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&raw[..head_end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if raw.len() >= head_end + 4 + body_len {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// Writes a complete response with a fixed-length body.
pub async fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &str) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await
}

/// Starts a `200 OK` response with a chunked body.
pub async fn start_chunked(stream: &mut TcpStream, content_type: &str) -> io::Result<()> {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
        content_type
    );
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await
}

pub async fn send_chunk(stream: &mut TcpStream, data: &str) -> io::Result<()> {
    let chunk = format!("{:x}\r\n{}\r\n", data.len(), data);
    stream.write_all(chunk.as_bytes()).await?;
    stream.flush().await
}

/// Terminates a chunked body. Dropping the socket without this is a broken response.
pub async fn end_chunked(stream: &mut TcpStream) -> io::Result<()> {
    stream.write_all(b"0\r\n\r\n").await?;
    stream.flush().await
}

pub fn sse_delta(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": text } }] })
    )
}
