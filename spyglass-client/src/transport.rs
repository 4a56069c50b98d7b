//! Transport channel
//!
//! Owns exactly one WebSocket connection to a job's progress endpoint. The
//! channel only knows how to open, send, receive and close; it never retries
//! or reconnects. Close reasons surface to the session, which owns policy.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One live duplex connection, split into its two directions
///
/// The halves are separate so the session can wait on incoming frames while
/// still writing commands from the same select loop.
pub struct Transport {
    pub writer: TransportWriter,
    pub reader: TransportReader,
}

impl Transport {
    /// Open a connection to `url`, attaching `bearer` as an Authorization
    /// header when present.
    pub async fn open(url: &str, bearer: Option<&str>) -> Result<Self> {
        let mut request = url.into_client_request()?;
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                SessionError::InvalidConfig("bearer token is not a valid header value".to_string())
            })?;
            request.headers_mut().insert("Authorization", value);
        }

        let (stream, _) = tokio_tungstenite::connect_async(request).await?;
        debug!("channel open: {url}");

        let (sink, stream) = stream.split();
        Ok(Self {
            writer: TransportWriter { sink },
            reader: TransportReader { stream },
        })
    }
}

/// Outgoing half of the channel
pub struct TransportWriter {
    sink: SplitSink<WsStream, Message>,
}

impl TransportWriter {
    /// Send one text frame
    pub async fn send_text(&mut self, frame: String) -> Result<()> {
        self.sink.send(Message::Text(frame)).await?;
        Ok(())
    }

    /// Close the connection gracefully
    pub async fn close(mut self) {
        if let Err(e) = self.sink.close().await {
            debug!("error while closing channel: {e}");
        }
    }
}

/// Incoming half of the channel
pub struct TransportReader {
    stream: SplitStream<WsStream>,
}

impl TransportReader {
    /// Next text frame from the server
    ///
    /// `Ok(None)` means the server closed the connection cleanly; an error
    /// means the transport failed underneath us. Non-text frames are skipped
    /// (protocol-level ping/pong is answered by the library itself).
    pub async fn next_text(&mut self) -> Result<Option<String>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Ok(Some(text)),
                Ok(Message::Close(frame)) => {
                    debug!("channel closed by server: {frame:?}");
                    return Ok(None);
                }
                Ok(other) => {
                    debug!("skipping non-text frame: {}", frame_kind(&other));
                }
                Err(e) => {
                    warn!("channel error: {e}");
                    return Err(e.into());
                }
            }
        }
        Ok(None)
    }
}

fn frame_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "frame",
    }
}
