// ABOUTME: In-memory transport backed by tokio channels
// ABOUTME: Pairs a client Transport with a MemoryPeer that plays the server

use crate::error::Error;
use crate::transport::{FrameSink, FrameSource, Transport};
use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Create a connected client transport and its server-side peer
pub fn pair() -> (Transport, MemoryPeer) {
    let (to_server, from_client) = unbounded_channel();
    let (to_client, from_server) = unbounded_channel();

    let transport = Transport::new(
        ChannelSink { tx: Some(to_server) },
        ChannelSource { rx: from_server },
    );
    let peer = MemoryPeer {
        tx: Some(to_client),
        rx: from_client,
    };

    (transport, peer)
}

/// Server end of an in-memory transport
pub struct MemoryPeer {
    tx: Option<UnboundedSender<String>>,
    rx: UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Deliver a frame to the client
    pub fn send(&self, frame: impl Into<String>) -> Result<(), Error> {
        self.tx
            .as_ref()
            .ok_or(Error::ConnectionClosed)?
            .send(frame.into())
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Next frame written by the client; `None` once the client side is closed
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Close the server-to-client direction, unblocking a pending receive
    pub fn close(&mut self) {
        self.tx = None;
    }
}

struct ChannelSink {
    tx: Option<UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: String) -> Result<(), Error> {
        self.tx
            .as_ref()
            .ok_or(Error::ConnectionClosed)?
            .send(frame)
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.tx = None;
        Ok(())
    }
}

struct ChannelSource {
    rx: UnboundedReceiver<String>,
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn receive(&mut self) -> Result<String, Error> {
        self.rx.recv().await.ok_or(Error::ConnectionClosed)
    }
}
