//! Unified error type.

use std::net::AddrParseError;

/// The error type returned by item-pdp's fallible operations.
///
/// Application-level failures (404, 500, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding a port, loading TLS material, or building
/// the interceptor chain from an invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("tls: {0}")]
    Tls(#[from] rustls::Error),

    #[error("tls: no private key found in `{0}`")]
    MissingKey(String),

    #[error("invalid middleware configuration: {0}")]
    Config(String),
}
