//! item-pdp service binary.
//!
//! Run with:
//!   RUST_LOG=info cargo run -- --addr 127.0.0.1:8080
//!
//! Try:
//!   curl -i http://localhost:8080/health
//!   curl -i -X POST http://localhost:8080/api/v1/items -d '{"sku":"A-1"}'

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use item_pdp::middleware::{self, MiddlewareConfig};
use item_pdp::routes::{self, UnimplementedItems};
use item_pdp::{Error, Router, Server, tls};

#[derive(Debug, Parser)]
#[command(name = "item-pdp", about = "Item PDP HTTP service")]
struct Cli {
    /// Socket address to listen on.
    #[arg(long, env = "ITEM_PDP_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// PEM certificate chain; enables TLS together with --tls-key.
    #[arg(long, env = "ITEM_PDP_TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,

    /// PEM private key.
    #[arg(long, env = "ITEM_PDP_TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let app = middleware::compose(Router::new(), &MiddlewareConfig::default())?;
    let app = routes::setup_routes(app, Arc::new(UnimplementedItems));

    let mut server = Server::bind(&cli.addr)?;
    if let (Some(cert), Some(key)) = (&cli.tls_cert, &cli.tls_key) {
        server = server.with_tls(tls::load_server_config(cert, key)?);
    }

    server.serve(app).await
}
