use anyhow::{Context, Result};
use real_ip::{config::DEFAULT_CONFIG_FILE, load_config, load_tls_acceptor, router, serve};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = load_config(&config_file)?;
    let real_ip = config.real_ip.build()?;

    info!(
        config_file = %config_file,
        listen_ip = %config.listen.ip,
        listen_port = config.listen.port,
        tls_enabled = config.listen.tls.is_some(),
        headers = ?real_ip.headers(),
        trusted_networks = ?real_ip.networks(),
        "Configuration loaded"
    );

    let tls_acceptor = config
        .listen
        .tls
        .as_ref()
        .map(load_tls_acceptor)
        .transpose()?;

    let addr = format!("{}:{}", config.listen.ip, config.listen.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {addr}"))?;

    info!(
        listen_addr = %addr,
        "Real IP server listening"
    );

    serve(listener, tls_acceptor, router(real_ip)).await
}
