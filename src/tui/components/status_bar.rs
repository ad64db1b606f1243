// Status bar component
//
// Bottom line: listener state, idle timeout, unread total and uptime, with
// the key help underneath when enabled.

use crate::engine::idle::IdleState;
use crate::listener::ListenerStatus;
use crate::startup::timeout_label;
use crate::tui::app::App;
use crate::tui::layout::Breakpoint;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::time::Instant;

const HELP_FULL: &str =
    " ←/→ 1-9 channel │ ↑↓ PgUp/PgDn scroll │ c clear │ t timeout │ +/- seconds │ y copy │ l logs │ R reload │ ? help │ q quit";
const HELP_SHORT: &str = " ←→ ch │ c clear │ t timeout │ l logs │ q quit";

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let bp = Breakpoint::from_width(area.width);

    let (icon, listener_color) = match app.listener_status() {
        ListenerStatus::Listening(_) => ("●", theme.status_ok),
        _ => ("✗", theme.status_error),
    };

    let (unread, idle) = {
        let d = crate::engine::dispatcher::lock(&app.dispatcher);
        let idle = idle_label(d.idle().state(), d.idle().is_pending(), Instant::now());
        (d.channels().total_unread(), idle)
    };

    let timeout = if bp.at_least(Breakpoint::Normal) {
        format!("Timeout: {}", timeout_label(&app.config))
    } else if app.config.timeout.enabled {
        format!("⏱ {}s", app.config.timeout.seconds)
    } else {
        "⏱ off".to_string()
    };

    let sep = Span::styled(" │ ", Style::default().fg(theme.border));
    let mut spans = vec![
        Span::styled(
            format!(" {} {}", icon, app.listener_status().label()),
            Style::default()
                .fg(listener_color)
                .add_modifier(Modifier::BOLD),
        ),
        sep.clone(),
        Span::raw(timeout),
    ];
    if let Some(idle) = idle {
        spans.push(Span::styled(format!(" ({})", idle), Style::default().fg(theme.help)));
    }
    spans.extend([
        sep.clone(),
        Span::styled(
            format!("✉ {}", unread),
            Style::default().fg(if unread > 0 { theme.badge } else { theme.status_bar }),
        ),
    ]);
    if bp.at_least(Breakpoint::Normal) {
        spans.push(sep);
        spans.push(Span::raw(format!("⏲ {}", app.uptime())));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().fg(theme.status_bar));
    f.render_widget(status, area);
}

/// Key help line
pub fn render_help(f: &mut Frame, area: Rect, app: &App) {
    let text = if Breakpoint::from_width(area.width).at_least(Breakpoint::Wide) {
        HELP_FULL
    } else {
        HELP_SHORT
    };
    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(app.theme.help)),
        area,
    );
}

/// Countdown to the idle deadline, or a note that the next payload clears
fn idle_label(state: IdleState, pending: bool, now: Instant) -> Option<String> {
    if pending {
        return Some("clears on next message".to_string());
    }
    match state {
        IdleState::Armed { deadline } => {
            let left = deadline.saturating_duration_since(now);
            Some(format!("idle in {:.1}s", left.as_secs_f32()))
        }
        IdleState::Idle => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_idle_label() {
        let now = Instant::now();
        assert_eq!(idle_label(IdleState::Idle, false, now), None);

        let armed = IdleState::Armed {
            deadline: now + Duration::from_millis(1500),
        };
        assert_eq!(idle_label(armed, false, now).as_deref(), Some("idle in 1.5s"));
        assert_eq!(
            idle_label(IdleState::Idle, true, now).as_deref(),
            Some("clears on next message")
        );
    }
}
