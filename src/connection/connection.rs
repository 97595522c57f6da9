use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

use crate::close::CloseCode;
use crate::connection::ConnectionState;
use crate::error::Result;
use crate::protocol::HandshakeResponse;

/// An upgraded WebSocket connection.
///
/// Produced only by a successful handshake; it owns the transport from that
/// point on. Message framing is left to the layer built on top, which reads
/// and writes through the `AsyncRead`/`AsyncWrite` impls (or takes the stream
/// back with [`Connection::into_parts`]) and reports a peer-initiated close
/// with [`Connection::mark_closed`].
///
/// ## Example
///
/// ```rust,ignore
/// let mut conn = wsdial::open("ws://127.0.0.1:9001/chat").await?;
/// assert!(conn.is_open());
///
/// conn.close(CloseCode::Normal).await?;
/// assert_eq!(conn.close_code(), Some(CloseCode::Normal));
/// ```
#[derive(Debug)]
pub struct Connection<S> {
    io: S,
    read_buf: BytesMut,
    state: ConnectionState,
    close_code: Option<CloseCode>,
    // Code to record once an in-flight shutdown completes.
    pending_code: Option<CloseCode>,
    protocol: Option<String>,
    response: HandshakeResponse,
}

impl<S> Connection<S> {
    /// Wrap a stream whose handshake has been fully validated.
    ///
    /// `read_buf` holds whatever arrived after the response head.
    pub(crate) fn new(
        io: S,
        read_buf: BytesMut,
        response: HandshakeResponse,
        protocol: Option<String>,
    ) -> Self {
        Self {
            io,
            read_buf,
            state: ConnectionState::Open,
            close_code: None,
            pending_code: None,
            protocol,
            response,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if the connection is in an open state.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// The terminal close code, or `None` while the connection is open.
    pub fn close_code(&self) -> Option<CloseCode> {
        self.close_code
    }

    /// Subprotocol selected by the server, if any.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// The server's handshake response.
    pub fn response(&self) -> &HandshakeResponse {
        &self.response
    }

    /// Bytes received after the handshake that have not been read yet.
    pub fn buffered(&self) -> &[u8] {
        &self.read_buf
    }

    /// Record that the connection has closed with `code`.
    ///
    /// Used by the framing layer when the peer closes; a raw status code
    /// read off the wire converts directly. The first recorded code wins;
    /// later calls are ignored.
    pub fn mark_closed(&mut self, code: impl Into<CloseCode>) {
        if self.state == ConnectionState::Closed {
            return;
        }
        let code = code.into();
        log::debug!("connection closed with code {}", code);
        self.state = ConnectionState::Closed;
        self.close_code = Some(code);
    }

    /// Get a shared reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.io
    }

    /// Get a mutable reference to the underlying stream.
    ///
    /// Reading directly from the stream skips any [`buffered`](Self::buffered) bytes.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.io
    }

    /// Take the stream and any bytes already read past the handshake.
    pub fn into_parts(self) -> (S, Bytes) {
        (self.io, self.read_buf.freeze())
    }
}

impl<S: AsyncWrite + Unpin> Connection<S> {
    /// Close the connection, recording `code` and shutting the transport down.
    ///
    /// No close frame is sent; that belongs to the framing layer. Closing an
    /// already closed connection is a no-op and keeps the original code.
    /// Shutting down through [`AsyncWriteExt::shutdown`] instead records
    /// [`CloseCode::Normal`].
    ///
    /// ## Errors
    ///
    /// I/O errors from shutting down the stream. The connection is marked
    /// closed either way.
    pub async fn close(&mut self, code: CloseCode) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }

        self.pending_code.get_or_insert(code);
        self.shutdown().await?;
        Ok(())
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for Connection<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if !this.state.can_receive() {
            return Poll::Ready(Ok(()));
        }

        if !this.read_buf.is_empty() {
            let n = this.read_buf.len().min(buf.remaining());
            buf.put_slice(&this.read_buf[..n]);
            this.read_buf.advance(n);
            return Poll::Ready(Ok(()));
        }

        Pin::new(&mut this.io).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Connection<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if !this.state.can_send() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed",
            )));
        }
        Pin::new(&mut this.io).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.state == ConnectionState::Open {
            this.state = ConnectionState::Closing;
        }

        let result = ready!(Pin::new(&mut this.io).poll_shutdown(cx));
        let code = this.pending_code.take().unwrap_or(CloseCode::Normal);
        this.mark_closed(code);
        Poll::Ready(result)
    }
}
