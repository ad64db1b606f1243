// Frame layout
//
//   ┌ tabs ───────────────────────────┐
//   │ channel body        │ logs (wide)│
//   │ logs (narrow, bottom)            │
//   ├ status ─────────────────────────┤
//   └ help ───────────────────────────┘

use super::app::App;
use super::components::{channel_panel, channel_tabs, logs_panel, status_bar};
use super::layout::Breakpoint;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

/// Height of the bottom-docked logs pane
const LOGS_HEIGHT: u16 = 10;

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let help_height = if app.show_help { 1 } else { 0 };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(help_height),
        ])
        .split(area);

    channel_tabs::render(f, rows[0], app);
    draw_body(f, rows[1], app);
    status_bar::render(f, rows[2], app);
    if app.show_help {
        status_bar::render_help(f, rows[3], app);
    }

    if let Some(toast) = &app.toast {
        toast.render(f, area, &app.theme);
    }
}

fn draw_body(f: &mut Frame, area: Rect, app: &mut App) {
    if !app.show_logs {
        channel_panel::render(f, area, app);
        return;
    }

    let split = if Breakpoint::from_width(area.width).at_least(Breakpoint::Wide) {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(LOGS_HEIGHT)])
            .split(area)
    };

    channel_panel::render(f, split[0], app);
    logs_panel::render(f, split[1], app);
}
