//! The chain over a real socket.

mod common;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rcgen::CertifiedKey;
use rustls::pki_types::{CertificateDer, ServerName};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;

use item_pdp::{Error, Server, tls};

/// A server on an ephemeral port. Dropping `stop` shuts it down.
struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), Error>>,
}

async fn start(tls: Option<Arc<rustls::ServerConfig>>) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (router, _) = common::app();
    let (stop, stopped) = oneshot::channel::<()>();

    let mut server = Server::from_listener(listener).drain_timeout(Duration::from_secs(30));
    if let Some(config) = tls {
        server = server.with_tls(config);
    }
    let handle = tokio::spawn(server.serve_with_shutdown(router, async move {
        let _ = stopped.await;
    }));

    Running { addr, stop, handle }
}

/// Reads until the peer closes. A TLS peer that skips close_notify shows up
/// as `UnexpectedEof`, which still means the response is complete.
async fn read_all(stream: &mut (impl AsyncRead + Unpin)) -> String {
    let mut response = Vec::new();
    match stream.read_to_end(&mut response).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {}
        Err(e) => panic!("read failed: {e}"),
    }
    String::from_utf8(response).unwrap().to_ascii_lowercase()
}

async fn roundtrip(raw: &str) -> String {
    let server = start(None).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    read_all(&mut stream).await
}

fn create_item_request(body: &str) -> String {
    format!(
        "POST /api/v1/items HTTP/1.1\r\nhost: localhost\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Self-signed `localhost` certificate loaded through the PEM path the
/// binary uses.
fn self_signed() -> (Arc<rustls::ServerConfig>, CertificateDer<'static>) {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_owned()]).unwrap();

    let dir = std::env::temp_dir().join(format!("item-pdp-server-tls-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();

    let config = tls::load_server_config(&cert_path, &key_path).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();

    (config, cert.der().clone())
}

#[tokio::test]
async fn plaintext_health_has_no_hsts() {
    let response = roundtrip("GET /health HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n").await;

    assert!(response.starts_with("http/1.1 200 ok"), "{response}");
    assert!(response.contains("x-frame-options: deny"));
    assert!(response.contains("x-ratelimit-limit: 100"));
    assert!(response.contains("x-input-validation: enabled"));
    assert!(!response.contains("strict-transport-security"));
    assert!(!response.contains("x-csrf-protection"));
    assert!(response.contains(r#""status":"healthy""#));
}

#[tokio::test]
async fn plaintext_post_gets_csrf_header() {
    let response = roundtrip(&create_item_request(r#"{"sku":"LAMP-01"}"#)).await;

    assert!(response.starts_with("http/1.1 201 created"), "{response}");
    assert!(response.contains("x-csrf-protection: enabled"));
    assert!(!response.contains("strict-transport-security"));
}

#[tokio::test]
async fn tls_connection_marks_requests_secure() {
    let (config, cert) = self_signed();
    let server = start(Some(config)).await;

    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert).unwrap();
    let mut client = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    client.alpn_protocols = vec![b"http/1.1".to_vec()];

    let tcp = TcpStream::connect(server.addr).await.unwrap();
    let mut stream = TlsConnector::from(Arc::new(client))
        .connect(ServerName::try_from("localhost").unwrap(), tcp)
        .await
        .unwrap();
    assert_eq!(stream.get_ref().1.alpn_protocol(), Some(&b"http/1.1"[..]));

    stream
        .write_all(create_item_request(r#"{"sku":"LAMP-01"}"#).as_bytes())
        .await
        .unwrap();
    let response = read_all(&mut stream).await;

    assert!(response.starts_with("http/1.1 201 created"), "{response}");
    assert!(response.contains("strict-transport-security: max-age=31536000; includesubdomains; preload"));
    assert!(response.contains("x-csrf-protection: enabled"));
    assert!(response.contains(r#""operation":"create_item""#));
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let server = start(None).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"GET /health HTTP/1.1\r\nhost: localhost\r\n\r\n").await.unwrap();

    // Read one full response and leave the connection open and idle.
    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    while !response.ends_with(b"}") {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before the response was complete");
        response.extend_from_slice(&buf[..n]);
    }

    server.stop.send(()).unwrap();
    let finished = tokio::time::timeout(Duration::from_secs(5), server.handle).await;
    assert!(matches!(finished, Ok(Ok(Ok(())))), "server did not stop: {finished:?}");

    let after = stream.read(&mut buf).await;
    assert!(!matches!(after, Ok(n) if n > 0), "idle connection left open");
}
