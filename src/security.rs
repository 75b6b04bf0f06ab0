use http::{HeaderMap, HeaderValue};
use ipnet::IpNet;
use std::net::{IpAddr, SocketAddr};

use crate::error::Error;
use crate::middleware::RealIpLayer;

/// Parses the client IP from a forwarding header value.
/// Format: "client, proxy1, proxy2, ..." - returns the leftmost entry that is a valid IP
#[must_use]
pub fn parse_client_ip(value: &[u8]) -> Option<IpAddr> {
    value
        .split(|&byte| byte == b',')
        .filter_map(|token| std::str::from_utf8(token).ok())
        .find_map(|token| token.trim().parse().ok())
}

/// Parses a textual peer address of the form `ip:port` or `[ipv6]:port`.
pub fn parse_peer_addr(addr: &str) -> Result<SocketAddr, Error> {
    addr.parse().map_err(|_| Error::InvalidRemoteAddress)
}

/// Trusted proxy networks and the headers they may use to report a client address.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct RealIp {
    networks: Vec<IpNet>,
    headers: Vec<String>,
}

impl RealIp {
    /// Creates a `RealIp` from header names in priority order and CIDR blocks.
    ///
    /// Fails on the first network that is not valid CIDR notation.
    pub fn new<H, N>(headers: H, networks: N) -> Result<Self, Error>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let networks = networks
            .into_iter()
            .map(|network| {
                let network = network.as_ref();
                network
                    .parse::<IpNet>()
                    .map_err(|source| Error::InvalidNetwork {
                        network: network.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            networks,
            headers: headers.into_iter().map(Into::into).collect(),
        })
    }

    #[must_use]
    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Wraps a service so that requests from trusted peers get their client address rewritten.
    #[must_use]
    pub fn layer(self) -> RealIpLayer {
        RealIpLayer::new(self)
    }

    /// Checks if a peer address belongs to one of the trusted networks.
    /// IPv4-mapped IPv6 peers are matched as plain IPv4.
    #[must_use]
    pub fn is_trusted(&self, peer_ip: IpAddr) -> bool {
        let peer_ip = peer_ip.to_canonical();
        self.networks.iter().any(|network| network.contains(&peer_ip))
    }

    /// Returns the value of the first configured header that is present and non-empty.
    #[must_use]
    pub fn header_value<'a>(&self, headers: &'a HeaderMap) -> Option<&'a HeaderValue> {
        self.headers
            .iter()
            .filter_map(|name| headers.get(name.as_str()))
            .find(|value| !value.is_empty())
    }

    /// Extracts the client IP reported by a proxy, without checking the peer.
    #[must_use]
    pub fn client_ip(&self, headers: &HeaderMap) -> Option<IpAddr> {
        self.header_value(headers)
            .and_then(|value| parse_client_ip(value.as_bytes()))
    }

    /// Computes the address downstream handlers should see for this request.
    ///
    /// Only the IP is taken from the header; the port is always the peer's.
    #[must_use]
    pub fn resolve(&self, peer: SocketAddr, headers: &HeaderMap) -> SocketAddr {
        if !self.is_trusted(peer.ip()) {
            return peer;
        }

        self.client_ip(headers)
            .map_or(peer, |client_ip| SocketAddr::new(client_ip, peer.port()))
    }
}
