//! Connectivity gate
//!
//! Advisory online/offline signal consulted before direct network writes.
//! Callers still fall back to the offline queue when a request fails.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TellmyError;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub trait Connectivity {
    fn is_offline(&self) -> bool;

    fn is_online(&self) -> bool {
        !self.is_offline()
    }
}

/// How connectivity is decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Probe the API host.
    #[default]
    Auto,
    Online,
    Offline,
}

impl FromStr for NetworkMode {
    type Err = TellmyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            other => Err(TellmyError::Config(format!(
                "unknown network mode: {other} (use auto|online|offline)"
            ))),
        }
    }
}

/// Constant answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConnectivity {
    pub offline: bool,
}

impl FixedConnectivity {
    pub const ONLINE: Self = Self { offline: false };
    pub const OFFLINE: Self = Self { offline: true };
}

impl Connectivity for FixedConnectivity {
    fn is_offline(&self) -> bool {
        self.offline
    }
}

/// Offline when a TCP connection to the API host cannot be opened in time.
#[derive(Debug, Clone)]
pub struct ProbeConnectivity {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ProbeConnectivity {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probe the host and port that `url` points at.
    pub fn for_url(url: &Url, timeout: Duration) -> Option<Self> {
        let host = url.host_str()?;
        let port = url.port_or_known_default()?;
        Some(Self::new(host, port, timeout))
    }

    fn addresses(&self) -> Vec<SocketAddr> {
        match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs.collect(),
            Err(err) => {
                debug!(host = %self.host, error = %err, "connectivity probe: lookup failed");
                Vec::new()
            }
        }
    }
}

impl Connectivity for ProbeConnectivity {
    fn is_offline(&self) -> bool {
        let reachable = self
            .addresses()
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok());
        debug!(host = %self.host, port = self.port, reachable, "connectivity probe");
        !reachable
    }
}

/// Build the gate for `mode`, probing `api_base` in auto mode.
pub fn gate(mode: NetworkMode, api_base: &Url, timeout: Duration) -> Box<dyn Connectivity> {
    match mode {
        NetworkMode::Online => Box::new(FixedConnectivity::ONLINE),
        NetworkMode::Offline => Box::new(FixedConnectivity::OFFLINE),
        NetworkMode::Auto => match ProbeConnectivity::for_url(api_base, timeout) {
            Some(probe) => Box::new(probe),
            None => Box::new(FixedConnectivity::OFFLINE),
        },
    }
}
