//! Transport endpoints
//!
//! An endpoint is written `tcp://host:port`. A bare `host:port` is accepted
//! and normalised. `*` as host means every interface, which only makes sense
//! for binding.

use crate::{Result, TransportError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Address of a process-level listener
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub const SCHEME: &'static str = "tcp";

    /// Build an endpoint from parts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `tcp://host:port` (or `host:port`)
    pub fn parse(input: &str) -> Result<Self> {
        let rest = match input.split_once("://") {
            Some((scheme, rest)) if scheme == Self::SCHEME => rest,
            Some((scheme, _)) => {
                return Err(TransportError::configuration(
                    format!("Unsupported endpoint scheme '{scheme}' in '{input}'"),
                    Some("endpoint"),
                ))
            }
            None => input,
        };

        let (host, port) = rest.rsplit_once(':').ok_or_else(|| {
            TransportError::configuration(
                format!("Endpoint '{input}' is missing a port"),
                Some("endpoint"),
            )
        })?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(TransportError::configuration(
                format!("Endpoint '{input}' is missing a host"),
                Some("endpoint"),
            ));
        }

        let port = port.parse::<u16>().map_err(|_| {
            TransportError::configuration(
                format!("Endpoint '{input}' has an invalid port '{port}'"),
                Some("endpoint"),
            )
        })?;

        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` as accepted by socket APIs
    pub fn authority(&self) -> String {
        let host = if self.host == "*" { "0.0.0.0" } else { &self.host };
        if host.contains(':') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// True for `*` and unspecified addresses such as `0.0.0.0` or `::`.
    /// Such an endpoint can be bound but never reached by a peer.
    pub fn is_wildcard(&self) -> bool {
        self.host == "*"
            || self
                .host
                .parse::<IpAddr>()
                .map(|ip| ip.is_unspecified())
                .unwrap_or(false)
    }

    /// Endpoint naming a bound socket address
    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", Self::SCHEME, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", Self::SCHEME, self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = TransportError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}
