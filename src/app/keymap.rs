//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Search input and open popups consume keys directly; the keymap only
//! applies while the table has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Semantic keyboard actions that can be bound to key combinations.
///
/// Several keys may map to the same action (e.g. `j` and Down).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Focus the phone search field.
    StartSearch,
    /// Re-run the active search from the first page.
    Refresh,
    /// Display the help/keybindings reference.
    OpenHelp,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Jump to the first row.
    First,
    /// Jump to the last row (and touch the bottom edge).
    Last,
    /// Focus the previous role toggle in the selected row.
    RoleLeft,
    /// Focus the next role toggle in the selected row.
    RoleRight,
    /// Flip the focused role toggle.
    ToggleRole,
    /// Ignore this key.
    Ignore,
}

const ALL_ACTIONS: [KeyAction; 14] = [
    KeyAction::Quit,
    KeyAction::StartSearch,
    KeyAction::Refresh,
    KeyAction::OpenHelp,
    KeyAction::MoveUp,
    KeyAction::MoveDown,
    KeyAction::PageUp,
    KeyAction::PageDown,
    KeyAction::First,
    KeyAction::Last,
    KeyAction::RoleLeft,
    KeyAction::RoleRight,
    KeyAction::ToggleRole,
    KeyAction::Ignore,
];

/// Maps `(KeyModifiers, KeyCode)` pairs to [`KeyAction`]s.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Arrow keys plus vim-style hjkl, `/` to search, Space to toggle a role.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refresh);
        bindings.insert((M::NONE, Char('?')), KeyAction::OpenHelp);

        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        bindings.insert((M::NONE, Home), KeyAction::First);
        bindings.insert((M::NONE, End), KeyAction::Last);
        bindings.insert((M::NONE, Char('g')), KeyAction::First);
        // Some terminals report uppercase letters with SHIFT, some without
        bindings.insert((M::NONE, Char('G')), KeyAction::Last);
        bindings.insert((M::SHIFT, Char('G')), KeyAction::Last);

        bindings.insert((M::NONE, Left), KeyAction::RoleLeft);
        bindings.insert((M::NONE, Right), KeyAction::RoleRight);
        bindings.insert((M::NONE, Char('h')), KeyAction::RoleLeft);
        bindings.insert((M::NONE, Char('l')), KeyAction::RoleRight);
        bindings.insert((M::NONE, Char(' ')), KeyAction::ToggleRole);
        bindings.insert((M::NONE, Enter), KeyAction::ToggleRole);

        Self { bindings }
    }

    /// Load a keymap from `path`, or write the defaults there if it doesn't exist.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(error = %e, "could not write default keybindings to {path}");
        }
        km
    }

    /// Load a keymap file of `<Action> = <KeySpec>` lines on top of the defaults.
    ///
    /// Returns `None` if the file can't be read.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            } else {
                tracing::debug!(line, "skipping unrecognised keybinding");
            }
        }
        map
    }

    /// Write every binding, grouped by action, in the format [`Keymap::from_file`] reads.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-admin keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+c, Enter, Esc, Space, /, ?,\n");
        buf.push_str("#   Up, Down, Left, Right, PageUp, PageDown, Home, End\n\n");
        for action in ALL_ACTIONS {
            for key in self.keys_for(action) {
                let _ = writeln!(&mut buf, "{} = {}", format_action(action), key);
            }
        }
        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    /// Human-readable keys bound to `action`, sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((mods, code), _)| Self::format_key(*mods, *code))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Format a key into a spec like "Ctrl+c", "Space", "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Esc => "Esc".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Home => "Home".to_string(),
            End => "End".to_string(),
            Char(' ') => "Space".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
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
        "Esc" | "Escape" => Esc,
        "Space" => Char(' '),
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Home" => Home,
        "End" => End,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let name = s.trim();
    ALL_ACTIONS.into_iter().find(|a| format_action(*a) == name)
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::Refresh => "Refresh",
        KeyAction::OpenHelp => "OpenHelp",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PageUp => "PageUp",
        KeyAction::PageDown => "PageDown",
        KeyAction::First => "First",
        KeyAction::Last => "Last",
        KeyAction::RoleLeft => "RoleLeft",
        KeyAction::RoleRight => "RoleRight",
        KeyAction::ToggleRole => "ToggleRole",
        KeyAction::Ignore => "Ignore",
    }
}
