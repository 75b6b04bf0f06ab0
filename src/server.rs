use anyhow::{Context, Result, anyhow};
use axum::{Router, extract::ConnectInfo};
use http::Request;
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use std::net::SocketAddr;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tokio_rustls::TlsAcceptor;
use tower::ServiceExt;
use tracing::{debug, error};

use crate::security::RealIp;

/// Answers every request with the peer address it was attributed to.
pub async fn hello(ConnectInfo(addr): ConnectInfo<SocketAddr>) -> String {
    format!("Hello: {addr}\n")
}

#[must_use]
pub fn router(real_ip: RealIp) -> Router {
    Router::new().fallback(hello).layer(real_ip.layer())
}

/// Accepts connections until the listener fails, serving each one on its own task.
pub async fn serve(
    listener: TcpListener,
    tls_acceptor: Option<TlsAcceptor>,
    app: Router,
) -> Result<()> {
    while let Ok((stream, addr)) = listener.accept().await {
        let tls_acceptor = tls_acceptor.clone();
        let app = app.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, tls_acceptor, app).await {
                error!(client_addr = %addr, error = %e, "Connection failed");
            }
        });
    }

    Ok(())
}

#[tracing::instrument(skip(stream, tls_acceptor, app))]
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    tls_acceptor: Option<TlsAcceptor>,
    app: Router,
) -> Result<()> {
    if let Some(acceptor) = tls_acceptor {
        let tls_stream = acceptor
            .accept(stream)
            .await
            .context("Failed to perform TLS handshake")?;
        debug!("TLS handshake completed");
        serve_connection(tls_stream, peer_addr, app).await
    } else {
        serve_connection(stream, peer_addr, app).await
    }
}

/// Serves HTTP/1 or HTTP/2 on `io`, attaching `peer_addr` to every request as `ConnectInfo`.
pub async fn serve_connection<I>(io: I, peer_addr: SocketAddr, app: Router) -> Result<()>
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = ServiceExt::<Request<Incoming>>::map_request(app, move |mut req: Request<Incoming>| {
        req.extensions_mut().insert(ConnectInfo(peer_addr));
        req
    });

    Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(io), TowerToHyperService::new(service))
        .await
        .map_err(|e| anyhow!("Failed to serve HTTP connection: {e}"))
}
