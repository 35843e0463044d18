use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::dispatch::{ApiEvent, Dispatcher};
use crate::app::keymap::KeyAction;
use crate::app::panels::PanelKind;
use crate::app::{Action, AppState, InputMode};
use crate::search::SortColumn;
use crate::ui;

/// What a key press asks the loop to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Quit,
    Act(Action),
}

/// Translate a key press into a step, according to the current input mode.
pub fn key_to_step(app: &AppState, key: &KeyEvent) -> Option<Step> {
    let act = |a| Some(Step::Act(a));
    match app.input_mode {
        InputMode::Normal => match app.keymap.resolve(key)? {
            KeyAction::Quit => Some(Step::Quit),
            KeyAction::Fetch => act(Action::Fetch),
            KeyAction::OpenCreate => act(Action::OpenPanel(PanelKind::Create)),
            KeyAction::OpenUpdate => act(Action::OpenPanel(PanelKind::Update)),
            KeyAction::EditSelected => act(Action::EditSelected),
            KeyAction::OpenDelete => act(Action::OpenPanel(PanelKind::Delete)),
            KeyAction::OpenFindById => act(Action::OpenPanel(PanelKind::FindById)),
            KeyAction::OpenFindByRole => act(Action::OpenPanel(PanelKind::FindByRole)),
            KeyAction::StartSearch => act(Action::StartSearch),
            KeyAction::ClearSearch => act(Action::ClearSearch),
            KeyAction::ToggleRole(n) => act(Action::ToggleRole(n as usize)),
            KeyAction::ClearFilters => act(Action::ClearFilters),
            KeyAction::SortById => act(Action::SortBy(SortColumn::Id)),
            KeyAction::SortByUsername => act(Action::SortBy(SortColumn::Username)),
            KeyAction::TogglePasswords => act(Action::TogglePasswords),
            KeyAction::OpenHelp => act(Action::OpenHelp),
            KeyAction::MoveUp => act(Action::MoveUp),
            KeyAction::MoveDown => act(Action::MoveDown),
            KeyAction::PageUp => act(Action::PageUp),
            KeyAction::PageDown => act(Action::PageDown),
            KeyAction::Ignore => None,
        },
        InputMode::Search => match key.code {
            KeyCode::Enter => act(Action::EndSearch),
            KeyCode::Esc => act(Action::ClearSearch),
            KeyCode::Backspace => act(Action::SearchBackspace),
            KeyCode::Char(c) => act(Action::SearchInput(c)),
            _ => None,
        },
        InputMode::Panel => {
            let role_field = app.panel.as_ref().is_some_and(|p| p.focus_is_role());
            match key.code {
                KeyCode::Esc => act(Action::ClosePanel),
                KeyCode::Enter => act(Action::Submit),
                KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    act(Action::LoadUserData)
                }
                KeyCode::Tab | KeyCode::Down => act(Action::PanelFocusNext),
                KeyCode::BackTab | KeyCode::Up => act(Action::PanelFocusPrev),
                KeyCode::Left if role_field => act(Action::PanelCycle { forward: false }),
                KeyCode::Right | KeyCode::Char(' ') if role_field => {
                    act(Action::PanelCycle { forward: true })
                }
                KeyCode::Backspace => act(Action::PanelBackspace),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    act(Action::PanelInput(c))
                }
                _ => None,
            }
        }
        InputMode::Help => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::Char('q') => {
                act(Action::CloseHelp)
            }
            KeyCode::Up | KeyCode::Char('k') => act(Action::ScrollHelp(-1)),
            KeyCode::Down | KeyCode::Char('j') => act(Action::ScrollHelp(1)),
            _ => None,
        },
    }
}

/// Drain every reply that has arrived, dispatching any follow-up requests.
pub fn drain_events(app: &mut AppState, rx: &mut UnboundedReceiver<ApiEvent>, dispatcher: &Dispatcher) {
    while let Ok(event) = rx.try_recv() {
        if let Some(follow_up) = app.apply(event) {
            dispatcher.dispatch(follow_up);
        }
    }
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut AppState,
    dispatcher: &Dispatcher,
    mut rx: UnboundedReceiver<ApiEvent>,
) -> Result<()> {
    loop {
        drain_events(app, &mut rx, dispatcher);

        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key_to_step(app, &key) {
                    Some(Step::Quit) => break,
                    Some(Step::Act(action)) => {
                        if let Some(request) = app.update(action) {
                            dispatcher.dispatch(request);
                        }
                    }
                    None => {}
                }
            }
        }
    }

    tracing::info!(uptime = ?app.started_at.elapsed(), "exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Theme;
    use crate::app::keymap::Keymap;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> AppState {
        AppState::new("http://localhost:8080", Theme::dark(), Keymap::default())
    }

    #[test]
    fn normal_mode_uses_keymap() {
        let a = app();
        assert_eq!(key_to_step(&a, &press(KeyCode::Char('q'))), Some(Step::Quit));
        assert_eq!(
            key_to_step(&a, &press(KeyCode::Char('d'))),
            Some(Step::Act(Action::OpenPanel(PanelKind::Delete)))
        );
        assert_eq!(key_to_step(&a, &press(KeyCode::Esc)), None);
    }

    #[test]
    fn search_mode_types_into_query() {
        let mut a = app();
        a.input_mode = InputMode::Search;
        assert_eq!(
            key_to_step(&a, &press(KeyCode::Char('q'))),
            Some(Step::Act(Action::SearchInput('q')))
        );
        assert_eq!(key_to_step(&a, &press(KeyCode::Esc)), Some(Step::Act(Action::ClearSearch)));
    }

    #[test]
    fn panel_mode_routes_role_fields_to_cycle() {
        let mut a = app();
        a.input_mode = InputMode::Panel;
        a.panel = Some(crate::app::panels::Panel::new(PanelKind::FindByRole));
        assert_eq!(
            key_to_step(&a, &press(KeyCode::Right)),
            Some(Step::Act(Action::PanelCycle { forward: true }))
        );
        a.panel = Some(crate::app::panels::Panel::new(PanelKind::Delete));
        assert_eq!(key_to_step(&a, &press(KeyCode::Right)), None);
        assert_eq!(
            key_to_step(&a, &press(KeyCode::Char(' '))),
            Some(Step::Act(Action::PanelInput(' ')))
        );
        let ctrl_l = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert_eq!(key_to_step(&a, &ctrl_l), Some(Step::Act(Action::LoadUserData)));
    }
}
