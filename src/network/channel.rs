//! Transport Channel
//!
//! TCP/IPv4 primitives with the framing assumptions of the protocol:
//! a frame is sent with exactly one write and received with exactly one read.
//! Neither side loops to push out a partial write or to reassemble a frame
//! from several reads, which is why frames are bounded by `MAX_FRAME_SIZE`.

use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{Result, SrpcfError};

/// Pending connection queue length of the listening socket
pub const LISTEN_BACKLOG: i32 = 5;

/// Resolve an optional dotted-decimal address
///
/// `None` is the wildcard address. Anything else must parse as IPv4; this is
/// checked before a socket is created.
pub fn parse_address(addr: Option<&str>) -> Result<Ipv4Addr> {
    match addr {
        None => Ok(Ipv4Addr::UNSPECIFIED),
        Some(text) => text
            .parse::<Ipv4Addr>()
            .map_err(|_| SrpcfError::InvalidAddress(text.to_string())),
    }
}

// =============================================================================
// One-shot I/O
// =============================================================================

/// Send `buf` with a single write call
///
/// A write that transfers fewer bytes than requested is a failure; nothing is
/// retried.
pub fn send_exact<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let written = writer.write(buf)?;
    if written != buf.len() {
        return Err(SrpcfError::ShortWrite {
            written,
            expected: buf.len(),
        });
    }
    writer.flush()?;
    Ok(())
}

/// Receive with a single read call of at most `max_size` bytes
///
/// Returns whatever that one read delivered. A zero-byte read means the peer
/// closed the connection.
pub fn receive_once<R: Read + ?Sized>(reader: &mut R, max_size: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; max_size];
    let received = reader.read(&mut buf)?;
    if received == 0 {
        return Err(SrpcfError::Disconnected);
    }
    buf.truncate(received);
    Ok(buf)
}

// =============================================================================
// Listener
// =============================================================================

/// Listening TCP socket
///
/// The socket is non-blocking: `accept` returns `None` when no connection is
/// pending so the caller can check for shutdown between polls.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

/// Bind and listen on `addr:port`
pub fn listen(addr: Option<&str>, port: u16) -> Result<Listener> {
    let ip = parse_address(addr)?;
    let bind_addr = SocketAddr::from((ip, port));

    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&bind_addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;

    let inner: TcpListener = socket.into();
    inner.set_nonblocking(true)?;
    let local_addr = inner.local_addr()?;

    tracing::debug!("Listening on {}", local_addr);
    Ok(Listener { inner, local_addr })
}

impl Listener {
    /// Accept a pending connection, if any
    pub fn accept(&self) -> Result<Option<Channel>> {
        match self.inner.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(Channel::from_stream(stream, peer.to_string())))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

// =============================================================================
// Channel
// =============================================================================

/// Connect to `addr:port`
///
/// With no address the wildcard address is used, which the kernel routes to
/// the local host.
pub fn connect(addr: Option<&str>, port: u16) -> Result<Channel> {
    let ip = parse_address(addr)?;
    let stream = TcpStream::connect(SocketAddr::from((ip, port)))?;
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    tracing::debug!("Connected to {}", peer);
    Ok(Channel::from_stream(stream, peer))
}

/// Connected byte-stream endpoint
#[derive(Debug)]
pub struct Channel {
    stream: TcpStream,
    peer_addr: String,
}

impl Channel {
    fn from_stream(stream: TcpStream, peer_addr: String) -> Self {
        // Frames are written whole; don't hold them back
        let _ = stream.set_nodelay(true);
        Self { stream, peer_addr }
    }

    /// Send a whole buffer in one write
    pub fn send_exact(&mut self, buf: &[u8]) -> Result<()> {
        send_exact(&mut self.stream, buf)
    }

    /// Receive up to `max_size` bytes in one read
    pub fn receive_once(&mut self, max_size: usize) -> Result<Vec<u8>> {
        receive_once(&mut self.stream, max_size)
    }

    /// Bound blocking reads; `None` blocks indefinitely
    pub fn set_receive_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Close both directions
    pub fn close(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Read for Channel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Channel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
