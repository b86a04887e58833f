//! TCP connectivity probe for forwarded local ports.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::time::Duration;

use tracing::debug;

/// Per-attempt connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Reports whether a local TCP endpoint currently accepts connections.
pub trait Probe: Send + Sync {
    /// Attempts a single connect against `127.0.0.1:<port>`.
    ///
    /// Never fails: "connection refused" and transient OS errors both report
    /// not-ready so the caller can retry.
    fn is_ready(&self, port: u16) -> bool;
}

/// Probe backed by a real TCP connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl TcpProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Probe for TcpProbe {
    fn is_ready(&self, port: u16) -> bool {
        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                drop(stream);
                true
            }
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => false,
            Err(e) => {
                debug!(port, error = %e, "connectivity probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_probe_reports_ready_for_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = TcpProbe::new();
        assert!(probe.is_ready(port));
    }

    #[test]
    fn test_probe_is_idempotent_against_closed_port() {
        // Bind then drop to get a port that is very likely closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let probe = TcpProbe::new();
        for _ in 0..5 {
            assert!(!probe.is_ready(port));
        }
    }
}
