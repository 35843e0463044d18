//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Only the main table view is configurable. Keys inside panels and the
//! search prompt are fixed (typing, Enter, Esc, Tab).

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic actions available from the main table view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Fetch the user list (refresh once fetched).
    Fetch,
    OpenCreate,
    OpenUpdate,
    /// Open the update panel pre-filled from the selected row.
    EditSelected,
    OpenDelete,
    OpenFindById,
    OpenFindByRole,
    /// Start typing a username search.
    StartSearch,
    ClearSearch,
    /// Toggle the n-th role chip of the catalog (0-based).
    ToggleRole(u8),
    ClearFilters,
    SortById,
    SortByUsername,
    TogglePasswords,
    OpenHelp,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Ignore this key.
    Ignore,
}

/// Mapping from `(KeyModifiers, KeyCode)` to [`KeyAction`].
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('r')), KeyAction::Fetch);
        bindings.insert((M::NONE, F(5)), KeyAction::Fetch);
        bindings.insert((M::NONE, Char('c')), KeyAction::OpenCreate);
        bindings.insert((M::NONE, Char('u')), KeyAction::OpenUpdate);
        bindings.insert((M::NONE, Enter), KeyAction::EditSelected);
        bindings.insert((M::NONE, Char('d')), KeyAction::OpenDelete);
        bindings.insert((M::NONE, Delete), KeyAction::OpenDelete);
        bindings.insert((M::NONE, Char('i')), KeyAction::OpenFindById);
        bindings.insert((M::NONE, Char('o')), KeyAction::OpenFindByRole);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('x')), KeyAction::ClearSearch);
        for (n, ch) in ['1', '2', '3', '4', '5'].into_iter().enumerate() {
            bindings.insert((M::NONE, Char(ch)), KeyAction::ToggleRole(n as u8));
        }
        bindings.insert((M::NONE, Char('0')), KeyAction::ClearFilters);
        bindings.insert((M::NONE, Char('s')), KeyAction::SortById);
        // Terminals differ on whether Shift is reported alongside the capital.
        bindings.insert((M::NONE, Char('S')), KeyAction::SortByUsername);
        bindings.insert((M::SHIFT, Char('S')), KeyAction::SortByUsername);
        bindings.insert((M::NONE, Char('p')), KeyAction::TogglePasswords);
        bindings.insert((M::NONE, Char('?')), KeyAction::OpenHelp);
        bindings.insert((M::SHIFT, Char('?')), KeyAction::OpenHelp);
        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        bindings.insert((M::NONE, Left), KeyAction::PageUp);
        bindings.insert((M::NONE, Right), KeyAction::PageDown);
        Self { bindings }
    }

    /// Load a keymap from `path`, or write the defaults there if it does not exist.
    pub fn load_or_init(path: &str) -> Self {
        let p = std::path::Path::new(path);
        if p.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(err) = km.write_file(path) {
            tracing::warn!(path, %err, "could not write default keybindings");
        }
        km
    }

    /// Parse `<Action> = <KeySpec>` lines on top of the defaults.
    ///
    /// Returns `None` if the file cannot be read. Unknown lines are skipped.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::from_str_lossy(&contents))
    }

    /// Same as [`from_file`](Self::from_file) but on already-read contents.
    pub fn from_str_lossy(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if lhs.is_empty() || rhs.is_empty() {
                continue;
            }
            match (parse_action(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => {
                    map.bindings.insert(key, action);
                }
                _ => tracing::debug!(line, "skipping unrecognised keybinding"),
            }
        }
        map
    }

    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-admin-tui keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+r, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Delete, F5, /\n\n");

        let mut entries: Vec<(String, &'static str)> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a != KeyAction::Ignore)
            .map(|((m, c), a)| (format_key(*m, *c), format_action(*a)))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(&b.0)));
        for (key, action) in entries {
            let _ = writeln!(&mut buf, "{} = {}", action, key);
        }

        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Keys bound to `action`, formatted for display.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((m, c), _)| format_key(*m, *c))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

/// Format a key like "Ctrl+r", "PageUp", "F5".
pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
    use KeyCode::*;
    let base = match code {
        Enter => "Enter".to_string(),
        Delete => "Delete".to_string(),
        Esc => "Esc".to_string(),
        Up => "Up".to_string(),
        Down => "Down".to_string(),
        Left => "Left".to_string(),
        Right => "Right".to_string(),
        PageUp => "PageUp".to_string(),
        PageDown => "PageDown".to_string(),
        F(n) => format!("F{n}"),
        Char(c) => c.to_string(),
        _ => format!("{:?}", code),
    };
    if mods.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{}", base)
    } else {
        base
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            if let Some(n) = rest.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                F(n)
            } else {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Char(c),
                    _ => return None,
                }
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    if let Some(n) = s.strip_prefix("ToggleRole") {
        return n.parse::<u8>().ok().filter(|n| (1..=5).contains(n)).map(|n| KeyAction::ToggleRole(n - 1));
    }
    Some(match s {
        "Quit" => KeyAction::Quit,
        "Fetch" => KeyAction::Fetch,
        "OpenCreate" => KeyAction::OpenCreate,
        "OpenUpdate" => KeyAction::OpenUpdate,
        "EditSelected" => KeyAction::EditSelected,
        "OpenDelete" => KeyAction::OpenDelete,
        "OpenFindById" => KeyAction::OpenFindById,
        "OpenFindByRole" => KeyAction::OpenFindByRole,
        "StartSearch" => KeyAction::StartSearch,
        "ClearSearch" => KeyAction::ClearSearch,
        "ClearFilters" => KeyAction::ClearFilters,
        "SortById" => KeyAction::SortById,
        "SortByUsername" => KeyAction::SortByUsername,
        "TogglePasswords" => KeyAction::TogglePasswords,
        "OpenHelp" => KeyAction::OpenHelp,
        "MoveUp" => KeyAction::MoveUp,
        "MoveDown" => KeyAction::MoveDown,
        "PageUp" => KeyAction::PageUp,
        "PageDown" => KeyAction::PageDown,
        "Ignore" => KeyAction::Ignore,
        _ => return None,
    })
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::Fetch => "Fetch",
        KeyAction::OpenCreate => "OpenCreate",
        KeyAction::OpenUpdate => "OpenUpdate",
        KeyAction::EditSelected => "EditSelected",
        KeyAction::OpenDelete => "OpenDelete",
        KeyAction::OpenFindById => "OpenFindById",
        KeyAction::OpenFindByRole => "OpenFindByRole",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::ClearSearch => "ClearSearch",
        KeyAction::ToggleRole(0) => "ToggleRole1",
        KeyAction::ToggleRole(1) => "ToggleRole2",
        KeyAction::ToggleRole(2) => "ToggleRole3",
        KeyAction::ToggleRole(3) => "ToggleRole4",
        KeyAction::ToggleRole(_) => "ToggleRole5",
        KeyAction::ClearFilters => "ClearFilters",
        KeyAction::SortById => "SortById",
        KeyAction::SortByUsername => "SortByUsername",
        KeyAction::TogglePasswords => "TogglePasswords",
        KeyAction::OpenHelp => "OpenHelp",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PageUp => "PageUp",
        KeyAction::PageDown => "PageDown",
        KeyAction::Ignore => "Ignore",
    }
}
