//! Key handling

use crate::app::RuntimeContext;
use crate::ui::App;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Main key event handler
pub fn handle_key_event(app: &mut App, key: KeyEvent, ctx: &RuntimeContext) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Char('n') => ctx.launch_scan(app),
        KeyCode::Char('r') => app.reset(),
        KeyCode::Char(c @ ('1' | '2')) => {
            let index = if c == '1' { 0 } else { 1 };
            if !app.choose_option(index) {
                tracing::debug!(option = index + 1, "option not available yet");
            }
        }
        KeyCode::Esc => {
            app.dismiss_toast();
        }
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        _ => {}
    }
    Ok(())
}
