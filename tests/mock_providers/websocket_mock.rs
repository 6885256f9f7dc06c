//! WebSocket mock for the Watson recognize endpoint.
//!
//! Protocol: the client sends a `start` action, the server answers
//! `{"state": "listening"}`, binary frames carry audio, and a `stop` action
//! makes the server flush its results followed by a second `listening`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http;

/// How the mock answers a connection.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Listen, send one interim result on the first audio frame, and on
    /// `stop` send one final result per transcript.
    Transcribe(Vec<String>),
    /// Answer the start message with an error frame and close.
    RejectStart { error: String, code: u16 },
    /// Fail the HTTP upgrade with this status.
    RejectHandshake(u16),
    /// Accept the start message but never report `listening`.
    NeverListen,
    /// Answer every audio frame with an interim result.
    InterimPerFrame,
}

/// What the mock observed on its last connection.
#[derive(Debug, Default, Clone)]
pub struct Captured {
    pub uri: String,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub start_message: Option<Value>,
    pub audio: Vec<u8>,
    pub binary_frames: usize,
    pub stop_received: bool,
    pub closed_by_client: bool,
}

pub struct WatsonWebSocketMock {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Captured>>,
    handle: JoinHandle<()>,
}

impl WatsonWebSocketMock {
    pub async fn start(behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Captured::default()));

        let state = captured.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = state.clone();
                let behavior = behavior.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, behavior, state).await {
                        eprintln!("Mock WebSocket error: {e}");
                    }
                });
            }
        });

        Self { addr, captured, handle }
    }

    /// Service URL for the client config; `/v1/recognize` is appended by the SDK.
    pub fn url(&self) -> String {
        format!("http://{}/speech-to-text/api", self.addr)
    }

    pub fn captured(&self) -> Captured {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for WatsonWebSocketMock {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn results_frame(transcript: &str, is_final: bool, index: usize) -> Message {
    let frame = json!({
        "results": [{
            "alternatives": [{"transcript": transcript, "confidence": 0.92}],
            "final": is_final
        }],
        "result_index": index
    });
    Message::Text(frame.to_string().into())
}

fn listening_frame() -> Message {
    Message::Text(json!({"state": "listening"}).to_string().into())
}

async fn handle_connection(
    stream: TcpStream,
    behavior: MockBehavior,
    state: Arc<Mutex<Captured>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handshake_state = state.clone();
    let reject = match &behavior {
        MockBehavior::RejectHandshake(status) => Some(*status),
        _ => None,
    };

    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        {
            let mut captured = handshake_state.lock().unwrap();
            captured.uri = request.uri().to_string();
            captured.authorization = header("authorization");
            captured.user_agent = header("user-agent");
        }

        match reject {
            Some(status) => Err(http::Response::builder()
                .status(status)
                .body(Some(json!({"error": "Not Authorized", "code": status}).to_string()))
                .unwrap()),
            None => Ok(response),
        }
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    let transcripts = match &behavior {
        MockBehavior::Transcribe(transcripts) => transcripts.clone(),
        _ => Vec::new(),
    };

    while let Some(msg) = read.next().await {
        match msg? {
            Message::Text(text) => {
                let action: Value = serde_json::from_str(&text)?;
                match action.get("action").and_then(Value::as_str) {
                    Some("start") => {
                        state.lock().unwrap().start_message = Some(action.clone());
                        match &behavior {
                            MockBehavior::RejectStart { error, code } => {
                                let frame = json!({"error": error, "code": code});
                                write.send(Message::Text(frame.to_string().into())).await?;
                                write.send(Message::Close(None)).await?;
                                return Ok(());
                            }
                            MockBehavior::NeverListen => {}
                            _ => write.send(listening_frame()).await?,
                        }
                    }
                    Some("stop") => {
                        state.lock().unwrap().stop_received = true;
                        // The client may already be closing; keep reading for its Close frame
                        for (index, transcript) in transcripts.iter().enumerate() {
                            let _ = write.send(results_frame(transcript, true, index)).await;
                        }
                        let _ = write.send(listening_frame()).await;
                    }
                    _ => {}
                }
            }
            Message::Binary(data) => {
                let first = {
                    let mut captured = state.lock().unwrap();
                    captured.audio.extend_from_slice(&data);
                    captured.binary_frames += 1;
                    captured.binary_frames == 1
                };
                if matches!(behavior, MockBehavior::InterimPerFrame) {
                    let frames = state.lock().unwrap().binary_frames;
                    let _ = write.send(results_frame(&format!("chunk {frames}"), false, 0)).await;
                } else if first && let Some(transcript) = transcripts.first() {
                    let interim = transcript.split_whitespace().next().unwrap_or_default();
                    let _ = write.send(results_frame(interim, false, 0)).await;
                }
            }
            Message::Close(_) => {
                state.lock().unwrap().closed_by_client = true;
                break;
            }
            _ => {}
        }
    }

    Ok(())
}
