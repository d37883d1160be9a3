use std::time::Duration;

use frames::{Frame, Status};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use pixel_canvas::error::CanvasError;
use pixel_canvas::sync::SyncTransport;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::CliError;

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of a session: frames queued here are written by the
/// session's writer task.
#[derive(Debug, Clone)]
pub struct ChannelTransport(mpsc::UnboundedSender<Frame>);

impl ChannelTransport {
    pub fn new(tx: mpsc::UnboundedSender<Frame>) -> Self {
        Self(tx)
    }
}

impl SyncTransport for ChannelTransport {
    fn send_frame(&mut self, frame: Frame) -> Result<(), CanvasError> {
        self.0
            .send(frame)
            .map_err(|e| CanvasError::Transport(format!("writer closed before {}", e.0.syscall)))
    }
}

/// An open realtime connection.
pub struct Session {
    incoming: SplitStream<WsStream>,
    writer: JoinHandle<()>,
}

impl Session {
    /// Connect and wait for the server's `session:connected` greeting.
    pub async fn connect(url: &str) -> Result<(Self, ChannelTransport), CliError> {
        let (stream, _) = connect_async(url).await.map_err(|error| CliError::WsConnect(Box::new(error)))?;
        let (mut sink, incoming) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let bytes = frames::encode_frame(&frame);
                if let Err(error) = sink.send(Message::Binary(bytes.into())).await {
                    tracing::warn!(%error, syscall = %frame.syscall, "websocket write failed");
                    break;
                }
            }
        });

        let mut session = Self { incoming, writer };
        loop {
            let frame = session.recv(CONNECT_TIMEOUT).await?;
            if frame.syscall == "session:connected" {
                tracing::debug!(url, "session connected");
                break;
            }
        }
        Ok((session, ChannelTransport::new(tx)))
    }

    /// Next binary frame, however long it takes.
    pub async fn next_frame(&mut self) -> Result<Frame, CliError> {
        loop {
            let Some(message) = self.incoming.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
                Message::Binary(bytes) => return frames::decode_frame(&bytes).map_err(CliError::from),
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    }

    pub async fn recv(&mut self, timeout: Duration) -> Result<Frame, CliError> {
        tokio::time::timeout(timeout, self.next_frame())
            .await
            .map_err(|_| CliError::Timeout)?
    }

    /// Wait for the terminal reply to `request_id`. Every other frame that
    /// arrives meanwhile is handed to `on_other`.
    pub async fn wait_for_reply(
        &mut self,
        request_id: &str,
        timeout: Duration,
        mut on_other: impl FnMut(&Frame),
    ) -> Result<Frame, CliError> {
        loop {
            let frame = self.recv(timeout).await?;
            if is_reply(&frame, request_id) {
                return Ok(frame);
            }
            on_other(&frame);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.writer.abort();
    }
}

/// Terminal response to the request with `request_id`.
pub fn is_reply(frame: &Frame, request_id: &str) -> bool {
    frame.parent_id.as_deref() == Some(request_id) && frame.status.is_terminal()
}

/// Turn an error reply into [`CliError::ServerError`].
pub fn ensure_ok(frame: Frame) -> Result<Frame, CliError> {
    if frame.status != Status::Error {
        return Ok(frame);
    }
    Err(CliError::ServerError {
        message: frame.error_message().unwrap_or("unknown websocket error").to_owned(),
        syscall: frame.syscall,
    })
}
