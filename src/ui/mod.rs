pub mod components;
pub mod panels;
pub mod users;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let filter_height = if app.store.has_fetched() { 4 } else { 0 };
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(filter_height),
                Constraint::Min(5),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let fetch = if app.is_fetching() {
        format!("[{}…]", app.fetch_label())
    } else {
        format!("[{}]", app.fetch_label())
    };
    let p = Paragraph::new(format!(
        "{}  {fetch}  r: fetch; c: create; u: update; d: delete; i: find id; o: find role; ?: help; q: quit",
        app.api_url
    ))
    .block(
        Block::default()
            .title("user-admin-tui")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    if app.store.has_fetched() {
        users::render_filter_bar(f, root[1], app);
    }
    users::render_users_table(f, root[2], app);
    components::render_status_bar(f, root[3], app);

    let area = f.area();
    if app.panel.is_some() {
        panels::render_panel(f, area, app);
    }
    if app.input_mode == InputMode::Help {
        components::render_help_modal(f, area, app, app.help_scroll);
    }
}
