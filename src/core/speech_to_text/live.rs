//! Chunked uploads into a session and incremental result parsing.

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::{WatsonError, WatsonResult};

/// Buffered chunks before `write` waits for the upload to catch up.
pub(crate) const LIVE_CHANNEL_CAPACITY: usize = 32;

/// In-flight chunked `recognize` request on a session.
///
/// Chunks written with [`write`](Self::write) are forwarded as the request
/// body while it is being sent; [`finish`](Self::finish) ends the body and
/// returns the recognition results.
#[derive(Debug)]
pub struct LiveRecognition {
    sender: Option<mpsc::Sender<Bytes>>,
    handle: JoinHandle<WatsonResult<Value>>,
}

impl LiveRecognition {
    pub(crate) fn new(sender: mpsc::Sender<Bytes>, handle: JoinHandle<WatsonResult<Value>>) -> Self {
        Self {
            sender: Some(sender),
            handle,
        }
    }

    /// Append a chunk of audio to the request body.
    pub async fn write(&self, chunk: impl Into<Bytes>) -> WatsonResult<()> {
        let sender = self.sender.as_ref().ok_or(WatsonError::StreamClosed)?;
        sender
            .send(chunk.into())
            .await
            .map_err(|_| WatsonError::StreamClosed)
    }

    /// End the upload and wait for the recognition results.
    pub async fn finish(mut self) -> WatsonResult<Value> {
        self.sender.take();
        debug!("Live recognition upload finished");
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(e) => Err(WatsonError::Network(format!("Live recognition task failed: {e}"))),
        }
    }
}

/// Values split off the front of a buffer, and the parse error that stopped
/// the split, if any.
#[derive(Debug, Default)]
pub(crate) struct Drained {
    pub values: Vec<Value>,
    pub error: Option<WatsonError>,
}

/// Split complete JSON values off the front of `buffer`.
///
/// The observe endpoint streams concatenated JSON objects with no framing, so
/// a chunk may end in the middle of a value. Incomplete trailing bytes stay in
/// the buffer for the next chunk. Values parsed before malformed input are
/// still returned alongside the error.
pub(crate) fn drain_json_values(buffer: &mut Vec<u8>) -> Drained {
    let mut drained = Drained::default();
    let mut consumed = 0;

    {
        let mut iter = serde_json::Deserializer::from_slice(buffer).into_iter::<Value>();
        loop {
            match iter.next() {
                Some(Ok(value)) => {
                    drained.values.push(value);
                    consumed = iter.byte_offset();
                }
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => {
                    drained.error = Some(e.into());
                    break;
                }
                None => {
                    consumed = iter.byte_offset();
                    break;
                }
            }
        }
    }

    buffer.drain(..consumed);
    drained
}
