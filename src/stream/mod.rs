//! Streaming source
//!
//! A source turns a scan request into a stream of progressively more
//! complete JSON snapshots. The bundled `ReplaySource` replays a finished
//! document in small character chunks, repairing each prefix the same way a
//! live token stream would be repaired.

pub mod demo;

use crate::app::messages::BackgroundMessage;
use crate::schema::repair::parse_partial_json;
use crate::schema::UserProfile;
use crate::session::{ScanId, StreamEvent, StreamMessage};
use futures::stream::{self, BoxStream};
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Transport-level failure reported by a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{name}: {message}")]
pub struct StreamError {
    pub message: String,
    pub name: String,
}

impl StreamError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: name.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new("TransportError", message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    /// Free text describing the product (or pasted label text)
    Text(String),
    /// A label photo; capture is out of scope, only the path is forwarded
    Image(PathBuf),
}

impl ScanInput {
    /// Short description for logs and the header
    pub fn describe(&self) -> String {
        match self {
            ScanInput::Text(text) => text.clone(),
            ScanInput::Image(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub id: Uuid,
    pub input: ScanInput,
    pub profile: UserProfile,
}

impl ScanRequest {
    pub fn new(input: ScanInput, profile: UserProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            profile,
        }
    }
}

pub type SnapshotStream = BoxStream<'static, Result<Value, StreamError>>;

/// Anything that can answer a scan with a stream of partial snapshots. The
/// stream ends when the analysis is complete.
pub trait SnapshotSource: Send + Sync {
    fn submit(&self, request: ScanRequest) -> SnapshotStream;
}

/// Replays a complete document as a token stream
#[derive(Debug, Clone)]
pub struct ReplaySource {
    document: Option<String>,
    chunk_chars: usize,
    delay: Duration,
    fail_after: Option<usize>,
}

impl ReplaySource {
    /// Replays the demo document matching each request's input.
    pub fn new(chunk_chars: usize, delay: Duration) -> Self {
        Self {
            document: None,
            chunk_chars: chunk_chars.max(1),
            delay,
            fail_after: None,
        }
    }

    /// Replay this document for every request instead of a demo.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }

    /// Fail with a transport error after `chunks` chunks.
    pub fn with_failure_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    fn document_for(&self, request: &ScanRequest) -> String {
        self.document
            .clone()
            .unwrap_or_else(|| demo::document_for(&request.input, request.profile))
    }
}

struct Replay {
    text: String,
    cursor: usize,
    chunks_sent: usize,
    chunk_chars: usize,
    delay: Duration,
    fail_after: Option<usize>,
    last: Option<Value>,
    done: bool,
}

impl Replay {
    /// Byte offset `chunk_chars` characters past the cursor
    fn advance(&self) -> usize {
        self.text[self.cursor..]
            .char_indices()
            .nth(self.chunk_chars)
            .map(|(offset, _)| self.cursor + offset)
            .unwrap_or(self.text.len())
    }
}

impl SnapshotSource for ReplaySource {
    fn submit(&self, request: ScanRequest) -> SnapshotStream {
        let state = Replay {
            text: self.document_for(&request),
            cursor: 0,
            chunks_sent: 0,
            chunk_chars: self.chunk_chars,
            delay: self.delay,
            fail_after: self.fail_after,
            last: None,
            done: false,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if state.done || state.cursor >= state.text.len() {
                    return None;
                }
                if !state.delay.is_zero() {
                    tokio::time::sleep(state.delay).await;
                }
                if state.fail_after == Some(state.chunks_sent) {
                    state.done = true;
                    let err = StreamError::transport(format!(
                        "connection dropped after {} chunks",
                        state.chunks_sent
                    ));
                    return Some((Err(err), state));
                }

                state.cursor = state.advance();
                state.chunks_sent += 1;

                let Some(value) = parse_partial_json(&state.text[..state.cursor]) else {
                    continue;
                };
                if state.last.as_ref() == Some(&value) {
                    continue;
                }
                state.last = Some(value.clone());
                return Some((Ok(value), state));
            }
        })
        .boxed()
    }
}

/// Run `source` for one scan on the tokio runtime, stamping every snapshot
/// with the scan id and a sequence number. A panic inside the source is
/// reported as a stream failure. Aborting the returned handle stops pulling
/// from the source.
pub fn spawn_scan(
    source: Arc<dyn SnapshotSource>,
    request: ScanRequest,
    scan: ScanId,
    tx: mpsc::Sender<BackgroundMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let panic_tx = tx.clone();
        let run = async move {
            let mut snapshots = source.submit(request);
            let mut seq = 0u64;
            while let Some(item) = snapshots.next().await {
                let event = match item {
                    Ok(value) => {
                        seq += 1;
                        StreamEvent::Snapshot { seq, value }
                    }
                    Err(err) => StreamEvent::Failed(err),
                };
                let failed = matches!(event, StreamEvent::Failed(_));
                if tx
                    .send(BackgroundMessage::Stream(StreamMessage { scan, event }))
                    .is_err()
                {
                    // UI is gone
                    return;
                }
                if failed {
                    return;
                }
            }
            let _ = tx.send(BackgroundMessage::Stream(StreamMessage {
                scan,
                event: StreamEvent::Completed,
            }));
        };

        if let Err(panic) = AssertUnwindSafe(run).catch_unwind().await {
            let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            tracing::error!(%scan, %detail, "stream task panicked");
            let _ = panic_tx.send(BackgroundMessage::Stream(StreamMessage {
                scan,
                event: StreamEvent::Failed(StreamError::new("Panic", detail)),
            }));
        }
    })
}
