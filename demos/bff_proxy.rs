//! BFF Proxy Example
//!
//! Serves the proxy configured from the environment until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! CBPAAS_EP=https://backend.example/shop \
//! BFF_API_PATH=/bff/api \
//! CBPAAS_AUTH_COOKIE_NAME=SESSION \
//! LISTEN_ADDR=127.0.0.1:3000 \
//! cargo run --example bff_proxy
//! ```
//!
//! Set `CBPAAS_SETTINGS` to a JSON file to load settings from it instead.

use anyhow::Result;
use cbpaas_proxy::proxy::http_server::serve;
use cbpaas_proxy::{ProxyConfig, ProxySettings, ReverseProxy};
use log::{LevelFilter, info};
use std::net::{SocketAddr, TcpListener};

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::env_logger::builder().format_timestamp(None).filter_level(LevelFilter::Info).parse_default_env().init();

    let settings = match std::env::var("CBPAAS_SETTINGS") {
        Ok(path) => ProxySettings::try_load(path).await?,
        Err(_) => ProxySettings::from_env()?,
    };
    let proxy = ReverseProxy::new(ProxyConfig::from_settings(settings)?)?;

    let addr: SocketAddr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()).parse()?;
    let listener = TcpListener::bind(addr)?;
    info!("Forwarding to {}", proxy.config().get_origin());

    serve(listener, proxy, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    })
    .await
}
