pub mod background;
pub mod input;
pub mod messages;
pub mod runtime;

pub use crate::ui::{App, ScanHooks};
pub use messages::BackgroundMessage;
pub use runtime::run_tui;

use crate::stream::{spawn_scan, SnapshotSource};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

/// What input handlers need to start background work
pub struct RuntimeContext<'a> {
    pub tx: &'a mpsc::Sender<BackgroundMessage>,
    pub source: Arc<dyn SnapshotSource>,
}

impl RuntimeContext<'_> {
    /// Start a new scan in `app` and stream it in the background.
    pub fn launch_scan(&self, app: &mut App) {
        if app.static_tree.is_some() {
            return;
        }
        let (scan, request) = app.start_scan(Instant::now());
        let task = spawn_scan(Arc::clone(&self.source), request, scan, self.tx.clone());
        app.attach_stream(task);
    }
}
