use axum::response::{IntoResponse, Response};
use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A trusted network could not be parsed as a CIDR block.
    #[error("invalid network: {network}")]
    InvalidNetwork {
        network: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    /// The request carries no usable `ip:port` peer address.
    #[error("invalid remote address")]
    InvalidRemoteAddress,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidNetwork { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRemoteAddress => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}
