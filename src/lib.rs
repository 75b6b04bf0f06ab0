//! Real IP Middleware
//!
//! Rewrites the peer address of HTTP requests that arrive through a trusted proxy or load balancer,
//! using the client address the proxy reports in a header such as X-Forwarded-For.
//! Requests from untrusted peers are passed through untouched.

pub mod config;
pub mod error;
pub mod middleware;
pub mod security;
pub mod server;
pub mod tls;

// Re-export commonly used types and functions
pub use config::{Config, ListenConfig, RealIpConfig, TlsConfig, load_config};
pub use error::Error;
pub use middleware::{RealIpLayer, RealIpService};
pub use security::{RealIp, parse_client_ip, parse_peer_addr};
pub use server::{handle_connection, router, serve};
pub use tls::load_tls_acceptor;
