//! Modal rendering for the action panels.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::api::ROLE_TAGS;
use crate::app::AppState;
use crate::app::panels::{Panel, PanelForm, PanelKind};
use crate::ui::components::centered_rect;
use crate::ui::users::{PASSWORD_MASK, role_span};

fn role_choice(index: Option<usize>) -> Span<'static> {
    match index.and_then(|i| ROLE_TAGS.get(i)) {
        Some(tag) => role_span(&tag.role()),
        None => Span::raw("< select role >"),
    }
}

fn field_values(panel: &Panel) -> Vec<Span<'static>> {
    match &panel.form {
        PanelForm::Create(f) => vec![
            Span::raw(f.username.clone()),
            Span::raw(f.email.clone()),
            role_choice(f.role),
            Span::raw("*".repeat(f.password.chars().count())),
        ],
        PanelForm::Update(f) => vec![Span::raw(f.id.clone()), Span::raw(f.username.clone())],
        PanelForm::Delete(f) => vec![Span::raw(f.id.clone())],
        PanelForm::FindById(f) => vec![Span::raw(f.id.clone())],
        PanelForm::FindByRole(f) => vec![role_choice(f.role)],
    }
}

fn result_lines(panel: &Panel, app: &AppState) -> Vec<Line<'static>> {
    match &panel.form {
        PanelForm::FindById(f) => match &f.found {
            Some(u) => {
                let password = if app.show_passwords { u.password.clone() } else { PASSWORD_MASK.to_string() };
                vec![
                    Line::raw(format!("ID: {}", u.id)),
                    Line::raw(format!("Username: {}", u.username)),
                    Line::raw(format!("Email: {}", u.email)),
                    Line::from(vec![Span::raw("Role: "), role_span(&u.role)]),
                    Line::raw(format!("Password: {password}")),
                ]
            }
            None => Vec::new(),
        },
        PanelForm::FindByRole(f) => match &f.found {
            Some((role, names)) => {
                let mut lines = vec![Line::from(Span::styled(
                    format!("Users with Role: {role}"),
                    Style::default().add_modifier(Modifier::BOLD),
                ))];
                if names.is_empty() {
                    lines.push(Line::raw("(none)"));
                }
                lines.extend(names.iter().map(|n| Line::raw(format!("Username: {n}"))));
                lines
            }
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn hints(panel: &Panel) -> String {
    let mut parts = vec!["Enter: ".to_string() + panel.kind().submit_label(), "Esc: cancel".into()];
    if panel.field_labels().len() > 1 {
        parts.push("Tab: next field".into());
    }
    if panel.focus_is_role() {
        parts.push("←/→: choose role".into());
    }
    if panel.kind() == PanelKind::Update {
        parts.push("Ctrl+L: load user data".into());
    }
    parts.join("  ")
}

pub fn render_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(panel) = app.panel.as_ref() else {
        return;
    };

    let mut lines: Vec<Line> = Vec::new();
    for (idx, (label, value)) in panel.field_labels().iter().zip(field_values(panel)).enumerate() {
        let focused = idx == panel.focus;
        let marker = if focused { "▶ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{label:<9} "), label_style),
            value,
        ]));
    }
    lines.push(Line::raw(""));

    if panel.is_pending() {
        lines.push(Line::from(Span::styled("Working…", Style::default().fg(app.theme.muted))));
    } else {
        let submit = format!("[ {} ]", panel.kind().submit_label());
        let style = if panel.can_submit() {
            Style::default().fg(app.theme.success).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.muted).add_modifier(Modifier::DIM)
        };
        lines.push(Line::from(Span::styled(submit, style)));
    }

    if let Some(err) = &panel.error {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(app.theme.error))));
    }

    let results = result_lines(panel, app);
    if !results.is_empty() {
        lines.push(Line::raw(""));
        lines.extend(results);
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(hints(panel), Style::default().fg(app.theme.muted))));

    let width = 70u16.min(area.width.saturating_sub(4)).max(40);
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2)).max(7);
    let rect = centered_rect(width, height, area);
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(panel.kind().title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
