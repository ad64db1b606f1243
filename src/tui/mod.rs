// TUI module - Terminal User Interface
//
// Sets up the terminal, runs the event loop (keyboard input and redraw
// ticks), and restores the terminal on the way out. Datagrams reach the
// shared dispatcher from the listener task; the loop only reads it.

pub mod app;
pub mod clipboard;
pub mod components;
pub mod layout;
pub mod scroll;
pub mod theme;
pub mod ui;

use anyhow::{Context, Result};
use app::{App, AppAction};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// Run the TUI until the user quits
pub async fn run_tui(app: &mut App) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_event_loop(&mut terminal, app).await;

    // Restore even if the loop failed
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    // Redraw at least 5 times a second so new datagrams show up
    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        let action = tokio::select! {
            action = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => return handle_key_event(app, key),
                        Ok(Event::Mouse(mouse)) => handle_mouse_event(app, mouse),
                        _ => {}
                    }
                }
                None
            } => action,

            _ = tick_interval.tick() => {
                app.tick();
                None
            }
        };

        if let Some(AppAction::ReloadConfig) = action {
            app.reload_config().await;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle a key press; returns work the loop has to await
fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<AppAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return None;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Channels
        KeyCode::Right => app.next_channel(),
        KeyCode::Left => app.prev_channel(),
        KeyCode::Char(c @ '1'..='9') => app.select_channel(c as usize - '1' as usize),

        // Focus
        KeyCode::Tab | KeyCode::BackTab => app.focus_next(),
        KeyCode::Char('l') => app.toggle_logs(),
        KeyCode::Char('?') => app.show_help = !app.show_help,

        // Scrolling (focused panel)
        KeyCode::Up | KeyCode::Char('k') => scroll_focused(app, |s| s.scroll_up()),
        KeyCode::Down | KeyCode::Char('j') => scroll_focused(app, |s| s.scroll_down()),
        KeyCode::PageUp => scroll_focused(app, |s| s.page_up()),
        KeyCode::PageDown => scroll_focused(app, |s| s.page_down()),
        KeyCode::Home | KeyCode::Char('g') => scroll_focused(app, |s| s.scroll_to_top()),
        KeyCode::End | KeyCode::Char('G') => scroll_focused(app, |s| s.scroll_to_bottom()),

        // Channel state
        KeyCode::Char('c') => app.clear_channels(),
        KeyCode::Char('t') => app.toggle_timeout(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_timeout(1),
        KeyCode::Char('-') => app.adjust_timeout(-1),

        KeyCode::Char('y') => copy_active_channel(app),
        KeyCode::Char('R') => return Some(AppAction::ReloadConfig),
        _ => {}
    }
    None
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => scroll_focused(app, |s| s.scroll_up()),
        MouseEventKind::ScrollDown => scroll_focused(app, |s| s.scroll_down()),
        _ => {}
    }
}

fn scroll_focused(app: &mut App, f: impl FnOnce(&mut scroll::ScrollState)) {
    if let Some(state) = app.focused_scroll() {
        f(state);
    }
}

fn copy_active_channel(app: &mut App) {
    let Some(text) = app.copy_channel_plain() else {
        app.show_toast("Nothing to copy");
        return;
    };
    match clipboard::copy_to_clipboard(&text) {
        Ok(()) => app.show_toast("✓ Copied to clipboard"),
        Err(e) => {
            tracing::warn!("Clipboard copy failed: {:#}", e);
            app.show_toast("✗ Failed to copy");
        }
    }
}
