//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use super::Theme;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ThemeName {
    #[default]
    Mocha,
    Dark,
}

/// Manage user records on a remote REST API from the terminal.
#[derive(Clone, Debug, Parser)]
#[command(name = "user-admin-tui", version, about)]
pub struct Config {
    /// Base URL of the user service; endpoints live under `<base>/api/`.
    #[arg(long, env = "USER_ADMIN_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Per-request timeout in seconds. Requests wait indefinitely when unset.
    #[arg(long, env = "USER_ADMIN_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Keybindings file; created with the defaults when missing.
    #[arg(long, default_value = "keybinds.conf")]
    pub keybinds: PathBuf,

    /// Where log output goes while the terminal is in use.
    #[arg(long, env = "USER_ADMIN_LOG_FILE", default_value = "user-admin-tui.log")]
    pub log_file: PathBuf,

    #[arg(long, value_enum, default_value_t = ThemeName::Mocha)]
    pub theme: ThemeName,
}

impl Config {
    /// Parsed and checked base URL.
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.api_url.trim())
            .map_err(|e| anyhow::anyhow!("invalid API URL {:?}: {}", self.api_url, e))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => anyhow::bail!("unsupported API URL scheme {other:?}"),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn theme(&self) -> Theme {
        match self.theme {
            ThemeName::Mocha => Theme::mocha(),
            ThemeName::Dark => Theme::dark(),
        }
    }
}
