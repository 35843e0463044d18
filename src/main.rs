//! user-admin-tui binary entry point.
//!
//! Parses configuration, sets up logging and the async runtime, runs the TUI
//! event loop, and restores the terminal state on exit.
//!
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use user_admin_tui::api::HttpUserService;
use user_admin_tui::app::config::Config;
use user_admin_tui::app::dispatch::Dispatcher;
use user_admin_tui::app::keymap::Keymap;
use user_admin_tui::app::{self, AppState};

/// Send tracing output to a file; the terminal belongs to the TUI.
fn init_logging(cfg: &Config) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_context(|| format!("open log file {}", cfg.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> anyhow::Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    init_logging(&cfg)?;

    let base_url = cfg.base_url()?;
    let service = HttpUserService::new(base_url.clone(), cfg.timeout())
        .context("build HTTP client")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let (dispatcher, rx) = Dispatcher::new(Arc::new(service), runtime.handle().clone());

    let keymap = Keymap::load_or_init(&cfg.keybinds.to_string_lossy());
    let mut state = AppState::new(base_url.as_str(), cfg.theme(), keymap);

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, &mut state, &dispatcher, rx);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        tracing::error!(%err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
