//! TUI runtime for Scanwise
//!
//! The scan stream runs as a tokio task and reports over an mpsc channel;
//! everything else happens on this loop.

use crate::app::messages::BackgroundMessage;
use crate::app::{background, input, RuntimeContext};
use crate::stream::SnapshotSource;
use crate::ui;
use crate::ui::App;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Run the TUI, starting a scan right away unless `app` shows a fixed tree.
pub async fn run_tui(mut app: App, source: Arc<dyn SnapshotSource>) -> Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel::<BackgroundMessage>();
    let ctx = RuntimeContext { tx: &tx, source };
    ctx.launch_scan(&mut app);

    let result = run_loop(&mut terminal, &mut app, rx, &ctx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Main event loop with background message handling
fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<BackgroundMessage>,
    ctx: &RuntimeContext,
) -> Result<()> {
    loop {
        // Timers, spinner, toast expiry
        app.tick(Instant::now());

        // Check for background messages (non-blocking)
        background::drain_messages(app, &rx);

        // Render
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for events with fast timeout (snappy animations)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                input::handle_key_event(app, key, ctx)?;
            }
        }

        if app.should_quit {
            tracing::info!("quit requested");
            return Ok(());
        }
    }
}
