use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::api::{ROLE_TAGS, Role};
use crate::app::{AppState, InputMode};
use crate::search::{SortColumn, SortOrder};

/// Fixed mask shown instead of a password while passwords are hidden.
pub const PASSWORD_MASK: &str = "••••••••";

/// Role rendered as a colored chip when it is in the catalog, plain otherwise.
pub fn role_span(role: &Role) -> Span<'static> {
    match role.tag() {
        Some(tag) => Span::styled(
            format!(" {} ", role.name()),
            Style::default().fg(Color::Black).bg(tag.rgb()),
        ),
        None => Span::raw(role.name().to_string()),
    }
}

fn sort_marker(app: &AppState, column: SortColumn) -> &'static str {
    if app.view.sort.column != column {
        return "";
    }
    match app.view.sort.order {
        SortOrder::Ascending => " ▲",
        SortOrder::Descending => " ▼",
    }
}

pub fn render_users_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let visible = app.visible();
    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(visible.len());
    let slice = visible.get(start..end).unwrap_or(&[]);

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let style = if start + i == app.selected_index {
            Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        let password = if app.show_passwords { u.password.clone() } else { PASSWORD_MASK.to_string() };
        Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.username.clone()),
            Cell::from(u.email.clone()),
            Cell::from(Line::from(role_span(&u.role))),
            Cell::from(password),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(8),
        Constraint::Percentage(22),
        Constraint::Percentage(32),
        Constraint::Length(18),
        Constraint::Min(10),
    ];

    let header = Row::new(vec![
        format!("ID{}", sort_marker(app, SortColumn::Id)),
        format!("Username{}", sort_marker(app, SortColumn::Username)),
        "Email".to_string(),
        "Role".to_string(),
        format!("Password ({})", if app.show_passwords { "p: hide" } else { "p: show" }),
    ])
    .style(Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD));

    let pages = visible.len().div_ceil(app.rows_per_page.max(1)).max(1);
    let title = if app.is_fetching() && !app.store.has_fetched() {
        "Users (loading…)".to_string()
    } else {
        format!(
            "Users {}/{}  page {}/{}",
            visible.len(),
            app.store.len(),
            start / app.rows_per_page.max(1) + 1,
            pages
        )
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

/// Quick filters: role chips and the username search prompt.
pub fn render_filter_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mut chips: Vec<Span> = Vec::new();
    for (i, tag) in ROLE_TAGS.iter().enumerate() {
        let selected = app.view.roles.contains(&tag.role());
        let style = if selected {
            Style::default().fg(Color::Black).bg(tag.rgb()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.muted)
        };
        chips.push(Span::styled(format!(" {}:{} ", i + 1, tag.name), style));
        chips.push(Span::raw(" "));
    }
    chips.push(Span::styled("0: clear filters", Style::default().fg(app.theme.muted)));

    let cursor = if app.input_mode == InputMode::Search { "_" } else { "" };
    let search = Line::from(vec![
        Span::styled("Search username: ", Style::default().fg(app.theme.title)),
        Span::raw(format!("{}{}", app.view.query, cursor)),
        Span::styled("   (/ to edit, x to clear)", Style::default().fg(app.theme.muted)),
    ]);

    let p = Paragraph::new(vec![Line::from(chips), search]).block(
        Block::default()
            .title("Quick Filters")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, area);
}
