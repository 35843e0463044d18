//! Application state and the transitions that drive it.
//!
//! `AppState` is the single store behind the UI. User intents arrive as
//! [`Action`]s through [`AppState::update`]; service outcomes arrive as
//! [`ApiEvent`]s through [`AppState::apply`]. Both may hand back a
//! [`Request`] for the dispatcher to run. Rendering only reads the state.
//!
pub mod config;
pub mod dispatch;
pub mod keymap;
pub mod panels;
pub mod update;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::style::Color;

use crate::api::{ROLE_TAGS, User};
use crate::search::{self, SortColumn, ViewParams};
use crate::store::UserStore;

use dispatch::{ApiCall, ApiEvent, ApiReply, Request, Ticket};
use keymap::Keymap;
use panels::{Panel, PanelForm, PanelKind};

/// How long a notification stays in the status bar.
pub const TOAST_TTL: Duration = Duration::from_secs(4);
const TOAST_HISTORY: usize = 32;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Panel,
    Help,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub success: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::LightRed,
            success: Color::LightGreen,
        }
    }

    /// Catppuccin Mocha.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
        }
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    pub fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

/// A transient user-facing notification.
#[derive(Clone, Debug)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub raised_at: Instant,
}

/// User intents, already resolved from keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Fetch,
    OpenPanel(PanelKind),
    EditSelected,
    ClosePanel,
    Submit,
    LoadUserData,
    PanelInput(char),
    PanelBackspace,
    PanelFocusNext,
    PanelFocusPrev,
    PanelCycle { forward: bool },
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    EndSearch,
    ClearSearch,
    ToggleRole(usize),
    ClearFilters,
    SortBy(SortColumn),
    TogglePasswords,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    OpenHelp,
    CloseHelp,
    ScrollHelp(i16),
}

pub struct AppState {
    pub started_at: Instant,
    pub api_url: String,
    pub store: UserStore,
    pub view: ViewParams,
    /// Ticket of the newest list fetch still in flight.
    pub list_pending: Option<Ticket>,
    pub panel: Option<Panel>,
    pub toasts: VecDeque<Toast>,
    pub show_passwords: bool,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub help_scroll: u16,
    pub theme: Theme,
    pub keymap: Keymap,
    next_ticket: u64,
}

impl AppState {
    pub fn new(api_url: impl Into<String>, theme: Theme, keymap: Keymap) -> Self {
        Self {
            started_at: Instant::now(),
            api_url: api_url.into(),
            store: UserStore::new(),
            view: ViewParams::default(),
            list_pending: None,
            panel: None,
            toasts: VecDeque::new(),
            show_passwords: false,
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            help_scroll: 0,
            theme,
            keymap,
            next_ticket: 1,
        }
    }

    /// Rows currently shown: the cache narrowed by role filter and search, sorted.
    pub fn visible(&self) -> Vec<&User> {
        search::visible(self.store.records(), &self.view)
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.visible().get(self.selected_index).copied()
    }

    pub fn is_fetching(&self) -> bool {
        self.list_pending.is_some()
    }

    /// Label of the fetch control.
    pub fn fetch_label(&self) -> &'static str {
        if self.store.has_fetched() { "Refresh" } else { "Fetch Users" }
    }

    /// Most recent notification that has not yet expired.
    pub fn current_toast(&self) -> Option<&Toast> {
        self.toasts
            .back()
            .filter(|t| t.raised_at.elapsed() < TOAST_TTL)
    }

    pub fn notify(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Info => tracing::info!(%message, "notice"),
            ToastLevel::Error => tracing::warn!(%message, "notice"),
        }
        self.toasts.push_back(Toast {
            message,
            level,
            raised_at: Instant::now(),
        });
        while self.toasts.len() > TOAST_HISTORY {
            self.toasts.pop_front();
        }
    }

    fn issue(&mut self, call: ApiCall) -> Request {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        Request { ticket, call }
    }

    fn fetch(&mut self) -> Request {
        let request = self.issue(ApiCall::ListAll);
        // A newer fetch supersedes any still in flight.
        self.list_pending = Some(request.ticket);
        request
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        self.selected_index = self.selected_index.min(len.saturating_sub(1));
    }

    fn open_panel(&mut self, panel: Panel) {
        if !self.store.has_fetched() {
            self.notify(ToastLevel::Error, "Fetch users first.");
            return;
        }
        tracing::debug!(kind = ?panel.kind(), "panel opened");
        self.panel = Some(panel);
        self.input_mode = InputMode::Panel;
    }

    fn close_panel(&mut self) {
        if let Some(p) = self.panel.take() {
            tracing::debug!(kind = ?p.kind(), pending = p.is_pending(), "panel closed");
        }
        self.input_mode = InputMode::Normal;
    }

    /// Apply a user intent. Returns the request to dispatch, if any.
    pub fn update(&mut self, action: Action) -> Option<Request> {
        match action {
            Action::Fetch => return Some(self.fetch()),
            Action::OpenPanel(kind) => self.open_panel(Panel::new(kind)),
            Action::EditSelected => {
                if let Some(user) = self.selected_user() {
                    let panel = Panel::update_for(user);
                    self.open_panel(panel);
                }
            }
            Action::ClosePanel => self.close_panel(),
            Action::Submit => return self.submit(),
            Action::LoadUserData => return self.load_user_data(),
            Action::PanelInput(c) => {
                if let Some(p) = self.panel.as_mut() {
                    p.input_char(c);
                }
            }
            Action::PanelBackspace => {
                if let Some(p) = self.panel.as_mut() {
                    p.backspace();
                }
            }
            Action::PanelFocusNext => {
                if let Some(p) = self.panel.as_mut() {
                    p.focus_next();
                }
            }
            Action::PanelFocusPrev => {
                if let Some(p) = self.panel.as_mut() {
                    p.focus_prev();
                }
            }
            Action::PanelCycle { forward } => {
                if let Some(p) = self.panel.as_mut() {
                    p.cycle_role(forward);
                }
            }
            Action::StartSearch => {
                if self.store.has_fetched() {
                    self.input_mode = InputMode::Search;
                }
            }
            Action::SearchInput(c) => {
                self.view.query.push(c);
                self.selected_index = 0;
            }
            Action::SearchBackspace => {
                self.view.query.pop();
                self.clamp_selection();
            }
            Action::EndSearch => self.input_mode = InputMode::Normal,
            Action::ClearSearch => {
                self.view.clear_query();
                self.input_mode = InputMode::Normal;
                self.clamp_selection();
            }
            Action::ToggleRole(n) => {
                if let Some(tag) = ROLE_TAGS.get(n) {
                    self.view.toggle_role(tag.role());
                    self.selected_index = 0;
                }
            }
            Action::ClearFilters => {
                self.view.clear_roles();
                self.clamp_selection();
            }
            Action::SortBy(column) => self.view.sort.click(column),
            Action::TogglePasswords => self.show_passwords = !self.show_passwords,
            Action::MoveUp => self.selected_index = self.selected_index.saturating_sub(1),
            Action::MoveDown => {
                if self.selected_index + 1 < self.visible().len() {
                    self.selected_index += 1;
                }
            }
            Action::PageUp => {
                let rpp = self.rows_per_page.max(1);
                self.selected_index = self.selected_index.saturating_sub(rpp);
            }
            Action::PageDown => {
                let rpp = self.rows_per_page.max(1);
                self.selected_index = self.selected_index.saturating_add(rpp);
                self.clamp_selection();
            }
            Action::OpenHelp => {
                self.help_scroll = 0;
                self.input_mode = InputMode::Help;
            }
            Action::CloseHelp => self.input_mode = InputMode::Normal,
            Action::ScrollHelp(delta) => {
                self.help_scroll = self.help_scroll.saturating_add_signed(delta);
            }
        }
        None
    }

    fn submit(&mut self) -> Option<Request> {
        let panel = self.panel.as_ref()?;
        if panel.is_pending() {
            return None;
        }
        let call = match panel.submission() {
            Ok(call) => call,
            Err(err) => {
                tracing::debug!(kind = ?panel.kind(), %err, "submit blocked by validation");
                if let Some(p) = self.panel.as_mut() {
                    p.error = Some(err.to_string());
                }
                return None;
            }
        };
        let request = self.issue(call);
        if let Some(p) = self.panel.as_mut() {
            p.begin(request.ticket);
        }
        Some(request)
    }

    fn load_user_data(&mut self) -> Option<Request> {
        let panel = self.panel.as_ref()?;
        if panel.is_pending() {
            return None;
        }
        let call = match panel.load_request()? {
            Ok(call) => call,
            Err(_) => {
                self.notify(ToastLevel::Error, "Please enter a user ID to update.");
                return None;
            }
        };
        let request = self.issue(call);
        if let Some(p) = self.panel.as_mut() {
            p.begin(request.ticket);
        }
        Some(request)
    }

    /// The open panel, if `ticket` is the request it is waiting on.
    fn panel_for(&mut self, ticket: Ticket) -> Option<&mut Panel> {
        match self.panel.as_mut() {
            Some(p) => {
                if p.settle(ticket) {
                    Some(p)
                } else {
                    tracing::debug!(ticket = ticket.0, "stale reply; panel state left alone");
                    None
                }
            }
            None => {
                tracing::debug!(ticket = ticket.0, "stale reply; panel state left alone");
                None
            }
        }
    }

    /// Apply a service outcome. Returns a follow-up request (a refetch after
    /// a confirmed create or update).
    pub fn apply(&mut self, event: ApiEvent) -> Option<Request> {
        let ApiEvent { ticket, reply } = event;
        match reply {
            ApiReply::Listed(result) => {
                if self.list_pending != Some(ticket) {
                    tracing::debug!(ticket = ticket.0, "superseded list reply ignored");
                    return None;
                }
                self.list_pending = None;
                match result {
                    Ok(users) => {
                        let first = !self.store.has_fetched();
                        self.store.replace_all(users);
                        self.clamp_selection();
                        if first {
                            self.notify(ToastLevel::Info, "Fetch successful.");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "list fetch failed");
                        self.notify(ToastLevel::Error, err.user_message());
                    }
                }
                None
            }
            ApiReply::Found(result) => {
                let msg = match (&result, self.panel_for(ticket)) {
                    (Ok(user), Some(panel)) => match &mut panel.form {
                        PanelForm::FindById(form) => {
                            form.found = Some(user.clone());
                            Some((ToastLevel::Info, format!("User with ID {} has been found.", user.id)))
                        }
                        PanelForm::Update(form) => {
                            form.id = user.id.to_string();
                            form.username = user.username.clone();
                            Some((ToastLevel::Info, "User data loaded.".to_string()))
                        }
                        _ => None,
                    },
                    (Err(err), Some(panel)) => {
                        let text = match &mut panel.form {
                            PanelForm::Update(_) => "Failed to load user data.",
                            PanelForm::FindById(form) => {
                                form.found = None;
                                err.user_message()
                            }
                            _ => err.user_message(),
                        };
                        panel.error = Some(text.to_string());
                        Some((ToastLevel::Error, text.to_string()))
                    }
                    (_, None) => None,
                };
                if let Err(err) = &result {
                    tracing::warn!(%err, "lookup by id failed");
                }
                if let Some((level, text)) = msg {
                    self.notify(level, text);
                }
                None
            }
            ApiReply::RoleMembers { role, result } => {
                if let Err(err) = &result {
                    tracing::warn!(%err, "lookup by role failed");
                }
                let msg = match self.panel_for(ticket) {
                    Some(panel) => {
                        let PanelForm::FindByRole(form) = &mut panel.form else {
                            return None;
                        };
                        match result {
                            Ok(names) => {
                                form.found = Some((role.clone(), names));
                                Some((ToastLevel::Info, format!("Users with role {role} have been found.")))
                            }
                            Err(err) => {
                                form.found = None;
                                panel.error = Some(err.user_message().to_string());
                                Some((ToastLevel::Error, err.user_message().to_string()))
                            }
                        }
                    }
                    None => None,
                };
                if let Some((level, text)) = msg {
                    self.notify(level, text);
                }
                None
            }
            ApiReply::Created(result) => self.after_write(ticket, result, "User created successfully."),
            ApiReply::Updated(result) => self.after_write(ticket, result, "User updated successfully."),
            ApiReply::Deleted { id, result } => {
                match result {
                    Ok(()) => {
                        // The server has confirmed; the cache follows even if
                        // the panel was closed meanwhile.
                        self.store.remove_by_id(id);
                        self.clamp_selection();
                        if self.panel_for(ticket).is_some() {
                            self.close_panel();
                        }
                        self.notify(ToastLevel::Info, format!("User with id {id} has been deleted."));
                    }
                    Err(err) => {
                        tracing::warn!(%err, id, "delete failed");
                        if let Some(panel) = self.panel_for(ticket) {
                            panel.error = Some(err.user_message().to_string());
                        }
                        self.notify(ToastLevel::Error, err.user_message());
                    }
                }
                None
            }
        }
    }

    /// Shared tail of create and update: close on success and refetch.
    fn after_write(
        &mut self,
        ticket: Ticket,
        result: Result<(), crate::error::ApiError>,
        success: &'static str,
    ) -> Option<Request> {
        match result {
            Ok(()) => {
                if self.panel_for(ticket).is_some() {
                    self.close_panel();
                }
                self.notify(ToastLevel::Info, success);
                Some(self.fetch())
            }
            Err(err) => {
                tracing::warn!(%err, "write rejected");
                if let Some(panel) = self.panel_for(ticket) {
                    panel.error = Some(err.user_message().to_string());
                }
                self.notify(ToastLevel::Error, err.user_message());
                None
            }
        }
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
