// ABOUTME: WebSocket transport built on tokio-tungstenite
// ABOUTME: Text frames in both directions, control frames handled transparently

use crate::error::Error;
use crate::transport::{FrameSink, FrameSource, Transport};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a WebSocket connection to `endpoint`
pub async fn connect(endpoint: &str) -> Result<Transport, Error> {
    let (ws_stream, _) = connect_async(endpoint)
        .await
        .map_err(|e| Error::Connection(e.to_string()))?;

    log::debug!("WebSocket connected to {}", endpoint);

    let (write, read) = ws_stream.split();
    Ok(Transport::new(WsSink { write }, WsSource { read }))
}

struct WsSink {
    write: SplitSink<WsStream, WsMessage>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<(), Error> {
        self.write
            .send(WsMessage::Text(frame))
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.write
            .close()
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))
    }
}

struct WsSource {
    read: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn receive(&mut self) -> Result<String, Error> {
        while let Some(msg) = self.read.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => return Ok(text),
                Ok(WsMessage::Binary(data)) => {
                    return String::from_utf8(data).map_err(|_| Error::IncorrectFormat);
                }
                Ok(WsMessage::Close(_)) => return Err(Error::ConnectionClosed),
                // Ping/pong are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Err(Error::WebSocket(e.to_string())),
            }
        }
        Err(Error::ConnectionClosed)
    }
}
