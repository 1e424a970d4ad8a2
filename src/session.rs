//! One websocket session against the kernel.
//!
//! DESIGN
//! ======
//! The session owns nothing but the socket. The engine outlives it so the
//! tile cache survives a reconnect; on every session after the first the
//! engine is told to resynchronize instead of starting fresh.
//!
//! A single `select!` loop multiplexes:
//! - inbound frames → `Engine::handle_text` / `Engine::handle_binary`
//! - a 16 ms frame ticker, polled only while the engine wants frames
//! - the prefetch interval
//! - a receive deadline, pushed forward by every inbound frame
//!
//! Each socket first asks the kernel to load the document; nothing streams
//! until it does.
//!
//! Every engine turn yields an `Output`; its requests are written to the
//! socket in order and its events are logged as JSON.
//!
//! ERRORS
//! ======
//! A close frame ends the session cleanly. Everything else (socket error,
//! stream end, silence past the deadline) is a `RunnerError` and the caller
//! reconnects with backoff.

use std::time::Duration;

use engine::coords::{Pane, PixelRect};
use engine::{Engine, Output, RenderSurface};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use wire::Request;

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

const FRAME_INTERVAL_MS: u64 = 16;
const BACKOFF_BASE_MS: u64 = 1000;
const BACKOFF_MAX_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("timed out waiting for websocket frame")]
    Timeout,
    #[error("invalid kernel URL: {0}")]
    InvalidUrl(String),
}

/// Connection parameters shared by every session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    /// Document URL handed to the kernel's `load` command.
    pub document: String,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub recv_timeout: Duration,
    pub prefetch_interval: Duration,
}

impl SessionConfig {
    /// Reject anything that is not a `ws://` or `wss://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidUrl`] for other schemes.
    pub fn validate(&self) -> Result<(), RunnerError> {
        let url = self.url.trim();
        if url.starts_with("ws://") || url.starts_with("wss://") {
            Ok(())
        } else {
            Err(RunnerError::InvalidUrl(self.url.clone()))
        }
    }

    /// Requests sent ahead of the engine's own output on every new socket.
    #[must_use]
    pub fn opening_requests(&self) -> Vec<Request> {
        vec![Request::Load { url: self.document.clone() }]
    }

    #[must_use]
    pub fn panes(&self) -> Vec<Pane> {
        vec![Pane::new(PixelRect::new(0.0, 0.0, self.viewport_width, self.viewport_height))]
    }
}

/// Delay before reconnect attempt `attempt` (zero-based): doubling from
/// [`BACKOFF_BASE_MS`], capped at [`BACKOFF_MAX_MS`], plus `jitter_ms`.
#[must_use]
pub fn backoff_delay(attempt: u32, jitter_ms: u64) -> Duration {
    let base = BACKOFF_BASE_MS.saturating_mul(1_u64 << attempt.min(16));
    Duration::from_millis(base.min(BACKOFF_MAX_MS) + jitter_ms)
}

/// Wire text for each request, in send order.
#[must_use]
pub fn encode_requests(requests: &[Request]) -> Vec<String> {
    requests.iter().map(Request::encode).collect()
}

pub type KernelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the kernel socket.
///
/// # Errors
///
/// Returns [`RunnerError::WsConnect`] when the handshake fails.
pub async fn connect(config: &SessionConfig) -> Result<KernelStream, RunnerError> {
    let (stream, _) = connect_async(config.url.as_str())
        .await
        .map_err(|error| RunnerError::WsConnect(Box::new(error)))?;
    Ok(stream)
}

/// Run one session until the kernel closes it or the transport fails.
/// `resume` is set for every session after the first, so the engine
/// resynchronizes its cache instead of starting fresh.
///
/// # Errors
///
/// Returns a [`RunnerError`] on socket error, unexpected stream end or
/// receive timeout.
pub async fn run<S: RenderSurface>(
    engine: &mut Engine<S>,
    stream: KernelStream,
    config: &SessionConfig,
    resume: bool,
) -> Result<(), RunnerError> {
    info!(url = %config.url, document = %config.document, resume, "connected to kernel");
    let (mut sink, mut stream) = stream.split();

    let load = Output { requests: config.opening_requests(), ..Output::default() };
    flush(&mut sink, load).await?;
    let opening = if resume { engine.on_reconnect() } else { engine.set_viewport(config.panes()) };
    let mut wants_frame = opening.wants_frame;
    flush(&mut sink, opening).await?;

    let mut frames = tokio::time::interval(Duration::from_millis(FRAME_INTERVAL_MS));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut prefetch = tokio::time::interval(config.prefetch_interval.max(Duration::from_millis(1)));
    prefetch.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut deadline = Instant::now() + config.recv_timeout;

    loop {
        let output = tokio::select! {
            message = stream.next() => {
                let Some(message) = message else {
                    return Err(RunnerError::WsClosed);
                };
                deadline = Instant::now() + config.recv_timeout;
                match message.map_err(|error| RunnerError::WsConnect(Box::new(error)))? {
                    Message::Text(text) => engine.handle_text(text.as_str()),
                    Message::Binary(bytes) => engine.handle_binary(&bytes),
                    Message::Close(frame) => {
                        info!(reason = ?frame.map(|f| f.reason.to_string()), "kernel closed the session");
                        return Ok(());
                    }
                    _ => continue,
                }
            }
            _ = frames.tick(), if wants_frame => engine.frame(),
            _ = prefetch.tick() => engine.tick(),
            () = tokio::time::sleep_until(deadline) => return Err(RunnerError::Timeout),
        };
        wants_frame = output.wants_frame || engine.state().zoom.is_active();
        flush(&mut sink, output).await?;
    }
}

async fn flush<K>(sink: &mut K, output: Output) -> Result<(), RunnerError>
where
    K: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    for event in &output.events {
        match serde_json::to_string(event) {
            Ok(json) => info!(event = %json, "engine event"),
            Err(error) => warn!(%error, "event not serializable"),
        }
    }
    for text in encode_requests(&output.requests) {
        debug!(request = %text, "send");
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|error| RunnerError::WsConnect(Box::new(error)))?;
    }
    Ok(())
}
