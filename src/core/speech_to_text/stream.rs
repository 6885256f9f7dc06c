//! Duplex WebSocket adapter for streaming recognition.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌───────────────────┐     ┌─────────────────┐
//! │ send_audio() /   │────▶│ command_tx (mpsc) │────▶│ Connection Task │◀───▶ WebSocket
//! │ finish()         │     └───────────────────┘     └────────┬────────┘
//! └──────────────────┘                                        │
//!                          ┌───────────────────┐              │
//!    Stream::poll_next ◀───│ event_tx (unbnd.) │◀─────────────┘
//!                          └───────────────────┘
//! ```
//!
//! The connection task sends the start message, waits for the first
//! `listening` state and only then forwards audio as binary frames. After
//! [`RecognizeStream::finish`] sends the stop message, the service flushes the
//! remaining results and reports `listening` again; that second `listening`
//! ends the session and the task closes the socket.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};
use url::Url;

use super::messages::{ErrorMessage, RecognizeMessage, ResultsMessage, STOP_ACTION, SpeakerLabel};
use crate::errors::{WatsonError, WatsonResult};

// =============================================================================
// Constants
// =============================================================================

/// Default time allowed for the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed between the start message and the first `listening` state.
pub const DEFAULT_LISTENING_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded audio queue; `send_audio` waits when the socket falls behind.
///
/// Events are unbounded: the connection task must never wait on the reader,
/// or a caller that uploads everything before polling would stall the upload.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

// =============================================================================
// Events
// =============================================================================

/// Item produced by a [`RecognizeStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizeEvent {
    /// The service accepted the start message and is waiting for audio.
    Listening,
    /// Interim or final recognition results.
    Results(ResultsMessage),
    /// Speaker diarization results.
    SpeakerLabels(Vec<SpeakerLabel>),
    /// The connection is closed; no further events follow.
    Closed { code: Option<u16>, reason: String },
}

#[derive(Debug)]
enum StreamCommand {
    Audio(Bytes),
    Stop,
}

/// Everything needed to open the socket.
#[derive(Debug, Clone)]
pub(crate) struct StreamConnection {
    pub url: Url,
    pub basic_credentials: Option<(String, String)>,
    pub start_message: Value,
    pub connect_timeout: Duration,
    pub listening_timeout: Duration,
}

impl StreamConnection {
    fn client_request(&self) -> WatsonResult<tokio_tungstenite::tungstenite::handshake::client::Request> {
        let mut request = self.url.as_str().into_client_request()?;

        if let Some((username, password)) = &self.basic_credentials {
            let encoded = STANDARD.encode(format!("{username}:{password}"));
            let value = HeaderValue::from_str(&format!("Basic {encoded}"))
                .map_err(|e| WatsonError::Configuration(format!("Invalid credentials: {e}")))?;
            request.headers_mut().insert("Authorization", value);
        }

        request
            .headers_mut()
            .insert("User-Agent", HeaderValue::from_static(crate::core::service::USER_AGENT));

        Ok(request)
    }
}

// =============================================================================
// RecognizeStream
// =============================================================================

/// Live recognition over the Watson WebSocket interface.
///
/// Audio goes in through [`send_audio`](Self::send_audio); results come out
/// by polling the stream. Dropping the stream closes the connection.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use watson_sdk::core::speech_to_text::{RecognizeEvent, RecognizeStreamParams, SpeechToText};
/// use watson_sdk::config::ServiceConfig;
///
/// # async fn run() -> watson_sdk::WatsonResult<()> {
/// let stt = SpeechToText::new(ServiceConfig::new("https://stream.watsonplatform.net/speech-to-text/api")
///     .with_basic_auth("username", "password"))?;
///
/// let mut stream = stt.recognize_stream(RecognizeStreamParams::new("audio/l16;rate=16000")).await?;
/// stream.send_audio(vec![0u8; 3200]).await?;
/// stream.finish().await?;
///
/// while let Some(event) = stream.next().await {
///     if let RecognizeEvent::Results(results) = event? {
///         for transcript in results.final_transcripts() {
///             println!("{transcript}");
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct RecognizeStream {
    /// Audio and stop commands for the connection task.
    command_tx: Option<mpsc::Sender<StreamCommand>>,

    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Events produced by the connection task.
    event_rx: mpsc::UnboundedReceiver<WatsonResult<RecognizeEvent>>,

    /// Set once the first `listening` state arrived.
    listening: Arc<AtomicBool>,

    /// Connection task handle.
    connection_handle: Option<tokio::task::JoinHandle<()>>,
}

impl std::fmt::Debug for RecognizeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizeStream")
            .field("finished", &self.command_tx.is_none())
            .field("listening", &self.is_listening())
            .finish()
    }
}

impl RecognizeStream {
    /// Connect, send the start message and spawn the connection task.
    pub(crate) async fn connect(connection: StreamConnection) -> WatsonResult<Self> {
        let request = connection.client_request()?;

        debug!(url = %connection.url, "Connecting to Watson recognize WebSocket");

        let (ws_stream, _response) = match timeout(connection.connect_timeout, connect_async(request)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                let err = classify_handshake_error(e);
                error!("{}", err);
                return Err(err);
            }
            Err(_) => {
                let err = WatsonError::Timeout(format!(
                    "Connection to Watson timed out after {} seconds",
                    connection.connect_timeout.as_secs()
                ));
                error!("{}", err);
                return Err(err);
            }
        };

        info!("Connected to Watson Speech-to-Text WebSocket");

        let (mut ws_sink, ws_stream) = ws_stream.split();

        let start_json = serde_json::to_string(&connection.start_message)?;
        ws_sink.send(Message::Text(start_json.into())).await?;
        debug!("Sent start message");

        let (command_tx, command_rx) = mpsc::channel::<StreamCommand>(COMMAND_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let listening = Arc::new(AtomicBool::new(false));

        let connection_handle = tokio::spawn(run_connection(
            ws_sink,
            ws_stream,
            command_rx,
            shutdown_rx,
            event_tx,
            listening.clone(),
            connection.listening_timeout,
        ));

        Ok(Self {
            command_tx: Some(command_tx),
            shutdown_tx: Some(shutdown_tx),
            event_rx,
            listening,
            connection_handle: Some(connection_handle),
        })
    }

    /// Queue an audio chunk. Chunks are sent as binary frames once the
    /// service is listening.
    pub async fn send_audio(&self, chunk: impl Into<Bytes>) -> WatsonResult<()> {
        let sender = self.command_tx.as_ref().ok_or(WatsonError::StreamClosed)?;
        sender
            .send(StreamCommand::Audio(chunk.into()))
            .await
            .map_err(|_| WatsonError::StreamClosed)
    }

    /// Signal the end of audio. Remaining results are still delivered.
    pub async fn finish(&mut self) -> WatsonResult<()> {
        let sender = self.command_tx.take().ok_or(WatsonError::StreamClosed)?;
        sender
            .send(StreamCommand::Stop)
            .await
            .map_err(|_| WatsonError::StreamClosed)
    }

    /// Close the connection immediately without waiting for results.
    pub fn close(&mut self) {
        self.command_tx = None;
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Whether the service has reported it is listening.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }

    /// Whether `finish` or `close` was called.
    pub fn is_finished(&self) -> bool {
        self.command_tx.is_none()
    }

    /// Adapt the stream to final transcripts, one item per final result.
    pub fn transcripts(mut self) -> impl Stream<Item = WatsonResult<String>> + Send {
        async_stream::stream! {
            while let Some(event) = self.next().await {
                match event {
                    Ok(RecognizeEvent::Results(results)) => {
                        for transcript in results.final_transcripts() {
                            yield Ok(transcript);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => yield Err(e),
                }
            }
        }
    }
}

impl Stream for RecognizeStream {
    type Item = WatsonResult<RecognizeEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.event_rx.poll_recv(cx)
    }
}

impl Drop for RecognizeStream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // The task exits on its own after the shutdown signal
        self.connection_handle.take();
    }
}

// =============================================================================
// Connection Task
// =============================================================================

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn run_connection(
    mut ws_sink: futures::stream::SplitSink<WsStream, Message>,
    mut ws_stream: futures::stream::SplitStream<WsStream>,
    mut command_rx: mpsc::Receiver<StreamCommand>,
    mut shutdown_rx: oneshot::Receiver<()>,
    event_tx: mpsc::UnboundedSender<WatsonResult<RecognizeEvent>>,
    listening: Arc<AtomicBool>,
    listening_timeout: Duration,
) {
    // Wait for "listening" state message
    let first = timeout(listening_timeout, async {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match RecognizeMessage::parse(&text) {
                    Ok(parsed) if parsed.is_listening() => return Ok(()),
                    Ok(RecognizeMessage::Error(err)) => return Err(service_error(&err)),
                    _ => debug!("Ignoring frame before listening: {}", text),
                },
                Ok(Message::Close(frame)) => {
                    return Err(WatsonError::WebSocket(format!(
                        "Connection closed before listening: {frame:?}"
                    )));
                }
                Ok(_) => {}
                Err(e) => return Err(WatsonError::from(e)),
            }
        }
        Err(WatsonError::StreamClosed)
    })
    .await;

    match first {
        Ok(Ok(())) => {
            info!("Watson is listening and ready for audio");
            listening.store(true, Ordering::Release);
            let _ = event_tx.send(Ok(RecognizeEvent::Listening));
        }
        Ok(Err(e)) => {
            error!("{}", e);
            let _ = event_tx.send(Err(e));
            let _ = ws_sink.send(Message::Close(None)).await;
            return;
        }
        Err(_) => {
            let e = WatsonError::Timeout("Did not receive listening state from Watson".to_string());
            error!("{}", e);
            let _ = event_tx.send(Err(e));
            let _ = ws_sink.send(Message::Close(None)).await;
            return;
        }
    }

    let mut stop_sent = false;
    let mut commands_open = true;

    // Main event loop
    loop {
        tokio::select! {
            command = command_rx.recv(), if commands_open => {
                match command {
                    Some(StreamCommand::Audio(audio)) => {
                        if let Err(e) = ws_sink.send(Message::Binary(audio)).await {
                            let err = WatsonError::WebSocket(format!("Failed to send audio: {e}"));
                            error!("{}", err);
                            let _ = event_tx.send(Err(err));
                            break;
                        }
                    }
                    Some(StreamCommand::Stop) => {
                        if let Err(e) = ws_sink.send(Message::Text(STOP_ACTION.into())).await {
                            let err = WatsonError::WebSocket(format!("Failed to send stop message: {e}"));
                            error!("{}", err);
                            let _ = event_tx.send(Err(err));
                            break;
                        }
                        debug!("Sent stop message");
                        stop_sent = true;
                        commands_open = false;
                    }
                    None => commands_open = false,
                }
            }

            message = ws_stream.next() => {
                match message {
                    Some(Ok(msg)) => {
                        match handle_websocket_message(msg, &event_tx, stop_sent) {
                            MessageOutcome::Continue => {}
                            MessageOutcome::Finished => {
                                info!("Recognition finished, closing WebSocket");
                                let _ = ws_sink.send(Message::Close(None)).await;
                                let _ = event_tx.send(Ok(RecognizeEvent::Closed {
                                    code: Some(1000),
                                    reason: "recognition finished".to_string(),
                                }));
                                break;
                            }
                            MessageOutcome::Closed => break,
                        }
                    }
                    Some(Err(e)) => {
                        let err = WatsonError::from(e);
                        error!("{}", err);
                        let _ = event_tx.send(Err(err));
                        break;
                    }
                    None => {
                        info!("Watson WebSocket stream ended");
                        let _ = event_tx.send(Ok(RecognizeEvent::Closed {
                            code: None,
                            reason: "stream ended".to_string(),
                        }));
                        break;
                    }
                }
            }

            // Handle shutdown signal
            _ = &mut shutdown_rx => {
                info!("Received shutdown signal for recognize stream");
                if !stop_sent {
                    let _ = ws_sink.send(Message::Text(STOP_ACTION.into())).await;
                }
                let _ = ws_sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    listening.store(false, Ordering::Release);
    info!("Watson recognize WebSocket connection closed");
}

enum MessageOutcome {
    Continue,
    /// A `listening` state after the stop message: all results delivered.
    Finished,
    /// The server closed the connection.
    Closed,
}

/// Demultiplex one incoming frame into stream events.
fn handle_websocket_message(
    message: Message,
    event_tx: &mpsc::UnboundedSender<WatsonResult<RecognizeEvent>>,
    stop_sent: bool,
) -> MessageOutcome {
    match message {
        Message::Text(text) => {
            debug!("Received Watson message: {}", text);

            match RecognizeMessage::parse(&text) {
                Ok(RecognizeMessage::Results(results)) => {
                    let labels = results.speaker_labels.clone();
                    let _ = event_tx.send(Ok(RecognizeEvent::Results(results)));
                    if let Some(labels) = labels {
                        let _ = event_tx.send(Ok(RecognizeEvent::SpeakerLabels(labels)));
                    }
                }
                Ok(RecognizeMessage::SpeakerLabels(labels)) => {
                    debug!("Received speaker labels: {} entries", labels.speaker_labels.len());
                    let _ = event_tx.send(Ok(RecognizeEvent::SpeakerLabels(labels.speaker_labels)));
                }
                Ok(RecognizeMessage::State(state)) => {
                    if state.is_listening() {
                        if stop_sent {
                            return MessageOutcome::Finished;
                        }
                        debug!("Duplicate listening state before stop");
                    } else {
                        debug!("Watson state change: {}", state.state);
                    }
                }
                Ok(RecognizeMessage::Error(error_msg)) => {
                    error!("Watson error: {}", error_msg.error);
                    if error_msg.is_inactivity() {
                        warn!("Watson inactivity timeout");
                    }
                    let _ = event_tx.send(Err(service_error(&error_msg)));
                }
                Err(e) => {
                    warn!("Failed to parse Watson message: {} - raw: {}", e, text);
                }
            }
        }

        Message::Close(close_frame) => {
            info!("Watson WebSocket closed: {:?}", close_frame);
            let (code, reason) = match close_frame {
                Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                None => (None, String::new()),
            };
            let _ = event_tx.send(Ok(RecognizeEvent::Closed { code, reason }));
            return MessageOutcome::Closed;
        }

        Message::Binary(data) => {
            debug!("Received binary message from Watson: {} bytes", data.len());
        }

        _ => {}
    }

    MessageOutcome::Continue
}

fn service_error(message: &ErrorMessage) -> WatsonError {
    WatsonError::Service {
        code: message.code.unwrap_or(400),
        error: message.error.clone(),
        description: message.warnings.as_ref().map(|w| w.join("; ")),
        body: serde_json::to_value(message).ok(),
    }
}

fn classify_handshake_error(e: tokio_tungstenite::tungstenite::Error) -> WatsonError {
    use tokio_tungstenite::tungstenite::Error as WsError;

    match e {
        WsError::Http(response) => {
            let status = response.status();
            let body = response
                .body()
                .as_ref()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default();
            WatsonError::from_response(status, &body)
        }
        other => WatsonError::WebSocket(format!("Failed to connect to Watson: {other}")),
    }
}
