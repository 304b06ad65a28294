//! TLS termination.
//!
//! Most deployments terminate TLS at the proxy and run this service over
//! plaintext. When the service terminates TLS itself, requests on those
//! connections report [`Request::is_secure`](crate::Request::is_secure) and
//! receive `Strict-Transport-Security`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;

use crate::error::Error;

/// Builds a rustls server config from a PEM certificate chain and a PEM
/// private key (PKCS#8, PKCS#1 or SEC1). Advertises `h2` and `http/1.1`.
pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<Arc<ServerConfig>, Error> {
    let mut cert_reader = BufReader::new(File::open(cert_path)?);
    let certs = rustls_pemfile::certs(&mut cert_reader).collect::<Result<Vec<_>, _>>()?;

    let mut key_reader = BufReader::new(File::open(key_path)?);
    let key = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| Error::MissingKey(key_path.display().to_string()))?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_are_io_errors() {
        let err = load_server_config(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn pem_without_key_is_reported() {
        let dir = std::env::temp_dir().join(format!("item-pdp-tls-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let cert = dir.join("cert.pem");
        let key = dir.join("key.pem");
        std::fs::write(&cert, "").unwrap();
        std::fs::write(&key, "no pem blocks here\n").unwrap();

        let err = load_server_config(&cert, &key).unwrap_err();
        assert!(matches!(err, Error::MissingKey(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
