use crate::session::StreamMessage;

/// Messages from background tasks to the main UI thread
#[derive(Debug)]
pub enum BackgroundMessage {
    /// One event from a scan stream, stamped with its scan id
    Stream(StreamMessage),
}
