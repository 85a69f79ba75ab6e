// ABOUTME: Frame transport abstraction for chat sessions
// ABOUTME: Separate send and receive halves so sends never wait on the receive loop

/// In-process channel transport
pub mod memory;
/// tokio-tungstenite WebSocket transport
pub mod websocket;

use crate::error::Error;
use async_trait::async_trait;

/// Outbound half of a transport
#[async_trait]
pub trait FrameSink: Send {
    /// Write one text frame
    async fn send(&mut self, frame: String) -> Result<(), Error>;

    /// Close the outbound direction
    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Inbound half of a transport
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next text frame. Fails with [`Error::ConnectionClosed`]
    /// once the peer has gone away.
    async fn receive(&mut self) -> Result<String, Error>;
}

/// An open bidirectional frame channel
pub struct Transport {
    pub(crate) sink: Box<dyn FrameSink>,
    pub(crate) source: Box<dyn FrameSource>,
}

impl Transport {
    /// Pair a sink and a source of the same connection
    pub fn new(sink: impl FrameSink + 'static, source: impl FrameSource + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            source: Box::new(source),
        }
    }

    /// Split into owned halves
    pub fn into_parts(self) -> (Box<dyn FrameSink>, Box<dyn FrameSource>) {
        (self.sink, self.source)
    }
}
