//! Peer notification and link readiness.
//!
//! The peer is a small HTTP server that switches its own output on `GET /on`
//! and `GET /off`. A notification counts as delivered once the peer answers
//! with any HTTP response; the body is read and discarded.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONNECTION;
use sonar_traits::{Network, Notifier};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

#[derive(Debug, Clone)]
pub struct PeerAddr {
    pub host: String,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolve to the first socket address.
    pub fn resolve(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| HwError::Resolve(format!("{}:{} ({e})", self.host, self.port)))?
            .next()
            .ok_or_else(|| HwError::Resolve(format!("{}:{}", self.host, self.port)))
    }

    /// `http://host:port` followed by `path`; IPv6 literals are bracketed.
    pub fn url(&self, path: &str) -> String {
        if self.host.contains(':') {
            format!("http://[{}]:{}{path}", self.host, self.port)
        } else {
            format!("http://{}:{}{path}", self.host, self.port)
        }
    }
}

impl core::fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Sends `GET <on_path>` / `GET <off_path>` to the peer.
#[derive(Debug)]
pub struct HttpNotifier {
    peer: PeerAddr,
    on_path: String,
    off_path: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    client: Option<Client>,
}

impl HttpNotifier {
    pub fn new(peer: PeerAddr, on_path: impl Into<String>, off_path: impl Into<String>) -> Self {
        Self {
            peer,
            on_path: on_path.into(),
            off_path: off_path.into(),
            connect_timeout: Duration::from_millis(1500),
            io_timeout: Duration::from_millis(1500),
            client: None,
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, io: Duration) -> Self {
        self.connect_timeout = connect;
        self.io_timeout = io;
        self.client = None;
        self
    }

    pub fn peer(&self) -> &PeerAddr {
        &self.peer
    }

    fn client(&mut self) -> Result<&Client> {
        let client = match self.client.take() {
            Some(c) => c,
            None => Client::builder()
                .connect_timeout(self.connect_timeout)
                .timeout(self.io_timeout)
                .no_proxy()
                .build()?,
        };
        Ok(self.client.insert(client))
    }

    /// Issue one request and return the response status.
    ///
    /// A body that fails to arrive after the status line does not fail the call.
    pub fn get(&mut self, path: &str) -> Result<reqwest::StatusCode> {
        let url = self.peer.url(path);
        let resp = self.client()?.get(&url).header(CONNECTION, "close").send()?;
        let status = resp.status();
        if let Err(e) = resp.bytes() {
            trace!(peer = %self.peer, error = %e, "response body not drained");
        }
        Ok(status)
    }
}

impl Notifier for HttpNotifier {
    fn notify(&mut self, is_near: bool) -> bool {
        let path = if is_near {
            self.on_path.clone()
        } else {
            self.off_path.clone()
        };
        match self.get(&path) {
            Ok(status) => {
                debug!(peer = %self.peer, %path, status = status.as_u16(), "peer notified");
                true
            }
            Err(e) => {
                debug!(peer = %self.peer, %path, error = %e, "peer request failed");
                false
            }
        }
    }
}

/// Link is ready once a TCP connection to the peer can be opened.
///
/// Only reachability matters here; no request is sent, so the peer never
/// sees a spurious `/on` or `/off`.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    peer: PeerAddr,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(peer: PeerAddr, connect_timeout: Duration) -> Self {
        Self {
            peer,
            connect_timeout,
        }
    }
}

impl Network for TcpProbe {
    fn is_ready(&mut self) -> bool {
        let ok = self
            .peer
            .resolve()
            .and_then(|addr| Ok(TcpStream::connect_timeout(&addr, self.connect_timeout)?))
            .is_ok();
        trace!(peer = %self.peer, ok, "link check");
        ok
    }
}
