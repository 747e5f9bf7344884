//! Line-oriented transport abstraction so the session loops can run over a
//! serial port, an in-memory pipe in tests, or anything else that moves bytes.

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::wire::protocol::FRAME_TERMINATOR;

/// Longest line kept while waiting for a terminator; anything longer is noise
pub const MAX_LINE_LEN: usize = 256;

/// Trait for newline-delimited packet exchange with the peer
#[async_trait]
pub trait LineTransport: Send {
    /// Send one packet, appending the line terminator
    async fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Receive the next packet without its terminator.
    ///
    /// Returns `Ok(None)` once the peer has gone away. Must be cancel safe:
    /// dropping the future loses no bytes already read.
    async fn recv_line(&mut self) -> io::Result<Option<String>>;
}

/// Newline framing over any async byte stream
pub struct LineStream<S> {
    stream: S,
    buf: BytesMut,
}

impl<S> LineStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(64),
        }
    }

    /// Pop one complete line off the buffer, if there is one
    fn take_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let raw = self.buf.split_to(pos + 1);
        let line = String::from_utf8_lossy(&raw[..pos]);
        Some(line.trim_end_matches('\r').to_string())
    }
}

#[async_trait]
impl<S> LineTransport for LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_line(&mut self, line: &str) -> io::Result<()> {
        let mut packet = String::with_capacity(line.len() + 1);
        packet.push_str(line);
        packet.push(FRAME_TERMINATOR);

        self.stream.write_all(packet.as_bytes()).await?;
        self.stream.flush().await?;
        trace!("Sent packet {:?}", line);
        Ok(())
    }

    async fn recv_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line() {
                trace!("Received packet {:?}", line);
                return Ok(Some(line));
            }

            if self.buf.len() > MAX_LINE_LEN {
                // No terminator in sight; resynchronize on the next one
                self.buf.advance(self.buf.len());
            }

            if self.stream.read_buf(&mut self.buf).await? == 0 {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted transport: hands out queued lines, then reports disconnect
    #[derive(Clone, Default)]
    pub struct MockTransport {
        pub incoming: Arc<Mutex<VecDeque<String>>>,
        pub sent: Arc<Mutex<Vec<String>>>,
        pub send_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MockTransport {
        pub fn with_lines(lines: &[&str]) -> Self {
            let mock = Self::default();
            mock.incoming
                .lock()
                .unwrap()
                .extend(lines.iter().map(|l| l.to_string()));
            mock
        }

        pub fn sent_lines(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }

        pub fn set_send_error(&self, error: io::ErrorKind) {
            *self.send_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl LineTransport for MockTransport {
        async fn send_line(&mut self, line: &str) -> io::Result<()> {
            if let Some(error) = *self.send_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock send error"));
            }
            self.sent.lock().unwrap().push(line.to_string());
            Ok(())
        }

        async fn recv_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.incoming.lock().unwrap().pop_front())
        }
    }
}
