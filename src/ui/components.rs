//! Shared UI components (status bar, help, modal helpers).
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ToastLevel};

/// Render the bottom status bar: mode, counts, filters, and the latest notice.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Panel => "PANEL",
        InputMode::Help => "HELP",
    };
    let filters = if app.view.roles.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = app.view.roles.iter().map(|r| r.name()).collect();
        format!("  filters:[{}]", names.join(","))
    };
    let pending = if app.is_fetching() || app.panel.as_ref().is_some_and(|p| p.is_pending()) {
        "  ⟳"
    } else {
        ""
    };
    let mut spans = vec![Span::raw(format!(
        "mode: {mode}  cached:{}  visible:{}{filters}{pending}",
        app.store.len(),
        app.visible().len(),
    ))];
    if let Some(toast) = app.current_toast() {
        let color = match toast.level {
            ToastLevel::Info => app.theme.success,
            ToastLevel::Error => app.theme.error,
        };
        spans.push(Span::raw("  │ "));
        spans.push(Span::styled(toast.message.clone(), Style::default().fg(color)));
    }
    let p = Paragraph::new(Line::from(spans)).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Help modal listing the bindings of the table view and the fixed panel keys.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 72u16.min(area.width.saturating_sub(4)).max(50);
    let height = 26u16.min(area.height.saturating_sub(4)).max(12);
    let rect = centered_rect(width, height, area);

    let entries: [(&str, KeyAction); 20] = [
        ("Fetch / refresh", KeyAction::Fetch),
        ("Create user", KeyAction::OpenCreate),
        ("Update user", KeyAction::OpenUpdate),
        ("Update selected row", KeyAction::EditSelected),
        ("Delete user by ID", KeyAction::OpenDelete),
        ("Find user by ID", KeyAction::OpenFindById),
        ("Find users by role", KeyAction::OpenFindByRole),
        ("Search username", KeyAction::StartSearch),
        ("Clear search", KeyAction::ClearSearch),
        ("Toggle role filter 1", KeyAction::ToggleRole(0)),
        ("Toggle role filter 2", KeyAction::ToggleRole(1)),
        ("Toggle role filter 3", KeyAction::ToggleRole(2)),
        ("Toggle role filter 4", KeyAction::ToggleRole(3)),
        ("Toggle role filter 5", KeyAction::ToggleRole(4)),
        ("Clear filters", KeyAction::ClearFilters),
        ("Sort by ID", KeyAction::SortById),
        ("Sort by username", KeyAction::SortByUsername),
        ("Show / hide passwords", KeyAction::TogglePasswords),
        ("Move up / down", KeyAction::MoveUp),
        ("Quit", KeyAction::Quit),
    ];

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("Table", Style::default().add_modifier(Modifier::BOLD))),
    ];
    for (label, action) in entries {
        let mut keys = app.keymap.keys_for(action);
        if action == KeyAction::MoveUp {
            keys.extend(app.keymap.keys_for(KeyAction::MoveDown));
        }
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:<24}")),
            Span::styled(keys.join(", "), Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Panels", Style::default().add_modifier(Modifier::BOLD))));
    for (label, keys) in [
        ("Submit", "Enter"),
        ("Cancel / close", "Esc"),
        ("Next / previous field", "Tab, Shift+Tab, Up, Down"),
        ("Choose role", "Left, Right, Space"),
        ("Load user data (update)", "Ctrl+L"),
    ] {
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:<24}")),
            Span::styled(keys, Style::default().add_modifier(Modifier::ITALIC)),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::raw("Close help: Esc / Enter"));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
