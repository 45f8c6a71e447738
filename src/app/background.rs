//! Background message handling
//!
//! Channel sends from the stream task use `let _ =`: the send only fails
//! when the UI has already shut down and nobody is listening.

use crate::app::messages::BackgroundMessage;
use crate::session::Applied;
use crate::ui::App;
use std::sync::mpsc;

/// Apply every message waiting on the channel. Returns how many changed the
/// view.
pub fn drain_messages(app: &mut App, rx: &mpsc::Receiver<BackgroundMessage>) -> usize {
    let mut changed = 0;
    while let Ok(msg) = rx.try_recv() {
        match msg {
            BackgroundMessage::Stream(message) => match app.handle_stream(message) {
                Applied::Stale | Applied::OutOfOrder | Applied::Rejected(_) => {}
                Applied::Updated(_) | Applied::Completed { .. } | Applied::Failed(_) => {
                    changed += 1
                }
            },
        }
    }
    changed
}
