//! Customizable keybindings for the reader.
//!
//! Keys map to navigation [`Command`]s. Several keys may trigger the same
//! command; a key bound to more than one command resolves to the first
//! match in the order next, previous, dezoom.

use serde::{Deserialize, Serialize};

use crate::message::Command;

/// Keys the reader can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Enter,
    Escape,
    Backspace,
    PageUp,
    PageDown,
    /// A printable character key, stored lowercase
    Char(char),
}

impl KeyCode {
    /// Parse a key name such as `"right"`, `"esc"` or `"n"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        let key = match lower.as_str() {
            "left" | "arrowleft" => KeyCode::ArrowLeft,
            "right" | "arrowright" => KeyCode::ArrowRight,
            "up" | "arrowup" => KeyCode::ArrowUp,
            "down" | "arrowdown" => KeyCode::ArrowDown,
            "space" => KeyCode::Space,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Escape,
            "backspace" => KeyCode::Backspace,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    /// Get the display name for this key.
    pub fn name(&self) -> String {
        match self {
            KeyCode::ArrowLeft => "Left".to_string(),
            KeyCode::ArrowRight => "Right".to_string(),
            KeyCode::ArrowUp => "Up".to_string(),
            KeyCode::ArrowDown => "Down".to_string(),
            KeyCode::Space => "Space".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Escape => "Esc".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Char(c) => c.to_uppercase().to_string(),
        }
    }
}

/// Keybinding configuration for the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Keys for the next panel
    #[serde(default = "default_next_panel")]
    pub next_panel: Vec<KeyCode>,
    /// Keys for the previous panel
    #[serde(default = "default_previous_panel")]
    pub previous_panel: Vec<KeyCode>,
    /// Keys for returning to the whole page
    #[serde(default = "default_dezoom")]
    pub dezoom: Vec<KeyCode>,
}

fn default_next_panel() -> Vec<KeyCode> {
    vec![KeyCode::ArrowRight, KeyCode::Space, KeyCode::Char('n')]
}

fn default_previous_panel() -> Vec<KeyCode> {
    vec![KeyCode::ArrowLeft, KeyCode::Backspace, KeyCode::Char('p')]
}

fn default_dezoom() -> Vec<KeyCode> {
    vec![KeyCode::Escape, KeyCode::Char('d')]
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            next_panel: default_next_panel(),
            previous_panel: default_previous_panel(),
            dezoom: default_dezoom(),
        }
    }
}

impl KeyBindings {
    /// Swap the arrow keys, for right-to-left reading where "next" is on the left.
    pub fn mirrored_arrows(mut self) -> Self {
        let swap = |k: &mut KeyCode| {
            *k = match *k {
                KeyCode::ArrowLeft => KeyCode::ArrowRight,
                KeyCode::ArrowRight => KeyCode::ArrowLeft,
                other => other,
            }
        };
        self.next_panel.iter_mut().for_each(swap);
        self.previous_panel.iter_mut().for_each(swap);
        self
    }

    /// Get the command that corresponds to a key press, if any.
    pub fn command_for_key(&self, key: KeyCode) -> Option<Command> {
        if self.next_panel.contains(&key) {
            Some(Command::NextPanel)
        } else if self.previous_panel.contains(&key) {
            Some(Command::PreviousPanel)
        } else if self.dezoom.contains(&key) {
            Some(Command::Dezoom)
        } else {
            None
        }
    }

    /// Keys bound to a command, for help text.
    pub fn keys_for(&self, command: Command) -> &[KeyCode] {
        match command {
            Command::NextPanel => &self.next_panel,
            Command::PreviousPanel => &self.previous_panel,
            Command::Dezoom => &self.dezoom,
            Command::LoadPage(_) | Command::ZoomTo(_) => &[],
        }
    }
}
