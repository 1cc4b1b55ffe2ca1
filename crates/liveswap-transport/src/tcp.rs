use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LiveStream;

/// Port the producer listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 6000;

/// Default producer address: loopback, [`DEFAULT_PORT`].
pub const DEFAULT_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT);

/// TCP listener for the producer side.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr`.
    ///
    /// Port 0 asks the OS for a free port; [`TcpTransport::local_addr`]
    /// reports the one actually bound.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(addr = %bound, "listening for consumers");

        Ok(Self {
            listener,
            addr: bound,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<LiveStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(LiveStream::from_tcp(stream))
    }

    /// Connect to a listening producer (blocking).
    pub fn connect(addr: SocketAddr) -> Result<LiveStream> {
        let stream =
            TcpStream::connect(addr).map_err(|source| TransportError::Connect { addr, source })?;
        debug!(%addr, "connected to producer");
        Ok(LiveStream::from_tcp(stream))
    }

    /// Connect with an upper bound on how long the attempt may take.
    pub fn connect_timeout(addr: SocketAddr, timeout: Duration) -> Result<LiveStream> {
        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|source| TransportError::Connect { addr, source })?;
        debug!(%addr, ?timeout, "connected to producer");
        Ok(LiveStream::from_tcp(stream))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("addr", &self.addr)
            .finish()
    }
}
