use axum::extract::ConnectInfo;
use axum::response::{IntoResponse, Response};
use futures_util::future::{Either, Ready, ready};
use http::Request;
use std::{
    net::SocketAddr,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::security::RealIp;

/// Layer that rewrites `ConnectInfo<SocketAddr>` for requests arriving through a trusted proxy.
#[derive(Debug, Clone)]
pub struct RealIpLayer {
    real_ip: Arc<RealIp>,
}

impl RealIpLayer {
    #[must_use]
    pub fn new(real_ip: RealIp) -> Self {
        Self {
            real_ip: Arc::new(real_ip),
        }
    }
}

impl<S> Layer<S> for RealIpLayer {
    type Service = RealIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RealIpService {
            inner,
            real_ip: Arc::clone(&self.real_ip),
        }
    }
}

/// Service produced by [`RealIpLayer`].
///
/// Requests without a `ConnectInfo<SocketAddr>` extension are answered with
/// `400 Bad Request` and never reach the inner service.
#[derive(Debug, Clone)]
pub struct RealIpService<S> {
    inner: S,
    real_ip: Arc<RealIp>,
}

impl<S, B> Service<Request<B>> for RealIpService<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let Some(&ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>() else {
            warn!(uri = %req.uri(), "Rejecting request without remote address");
            return Either::Left(ready(Ok(Error::InvalidRemoteAddress.into_response())));
        };

        let client_addr = self.real_ip.resolve(peer, req.headers());
        if client_addr == peer {
            trace!(peer_addr = %peer, "Keeping peer address");
        } else {
            debug!(
                client_addr = %client_addr,
                direct_addr = %peer,
                "Rewriting peer address from trusted proxy"
            );
            req.extensions_mut().insert(ConnectInfo(client_addr));
        }

        Either::Right(self.inner.call(req))
    }
}
