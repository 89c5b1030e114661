//! The real client against a local HTTP server.

use pispy_cli::{FetchError, PypiClient, Registry, RegistryConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SIX: &str = r#"{"info": {"name": "six", "version": "1.16.0"}, "urls": []}"#;
const STATS: &str =
    r#"{"top_packages": {"small": {"size": 10}, "big": {"size": 900}}, "total_packages_size": 1000}"#;

fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));
    out
}

/// What the server sends for a path; `None` means never answer.
fn route(path: &str) -> Option<String> {
    let json = [("Content-Type", "application/json")];
    match path {
        "/pypi/six/json" => Some(response(
            "301 Moved Permanently",
            &[("Location", "/pypi/Six/json")],
            "",
        )),
        "/pypi/Six/json" => Some(response("200 OK", &json, SIX)),
        "/pypi/broken/json" => Some(response("200 OK", &[], "<html>maintenance</html>")),
        "/pypi/hang/json" => None,
        "/stats/" => Some(response("200 OK", &json, STATS)),
        _ => Some(response("404 Not Found", &json, r#"{"message": "Not Found"}"#)),
    }
}

async fn handle(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    match route(&path) {
        Some(reply) => {
            let _ = stream.write_all(reply.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        // Keep the connection open without answering.
        None => std::future::pending::<()>().await,
    }
}

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream));
        }
    });
    addr
}

async fn client(timeout: Duration) -> PypiClient {
    let addr = start_server().await;
    PypiClient::new(RegistryConfig {
        base_url: format!("http://{addr}"),
        timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn follows_redirects() {
    let client = client(Duration::from_secs(5)).await;
    let payload = client.fetch("six").await.unwrap();
    assert_eq!(payload.status, 200);
    assert_eq!(payload.body["info"]["version"], "1.16.0");
}

#[tokio::test]
async fn missing_package_is_not_found() {
    let client = client(Duration::from_secs(5)).await;
    let err = client.fetch("nope").await.unwrap_err();
    assert!(matches!(err, FetchError::NotFound { status: 404 }), "{err:?}");
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let client = client(Duration::from_secs(5)).await;
    let err = client.fetch("broken").await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{err:?}");
}

#[tokio::test]
async fn silent_registry_times_out() {
    let timeout = Duration::from_millis(500);
    let client = client(timeout).await;
    let err = client.fetch("hang").await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(t) if t == timeout), "{err:?}");
    assert!(err.is_transport());
}

#[tokio::test]
async fn top_packages_are_ranked() {
    let client = client(Duration::from_secs(5)).await;
    let stats = client.top_packages().await.unwrap();
    assert_eq!(stats.total_size, 1000);
    let names: Vec<&str> = stats.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["big", "small"]);
}
