//! Device input events as delivered by the host UI.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Platform command key (Ctrl, or Cmd on macOS).
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Proportional-lock modifier for corner resizes.
    pub fn lock_aspect(&self) -> bool {
        self.shift
    }

    /// Modifier that duplicates an annotation when a drag starts.
    pub fn duplicate_drag(&self) -> bool {
        self.alt
    }
}

/// A pointer event with its position in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: PointerButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Pointer left the page surface.
    Leave,
}

impl PointerEvent {
    pub fn down(position: Point) -> Self {
        Self::Down {
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(position: Point) -> Self {
        Self::Move {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(position: Point) -> Self {
        Self::Up {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    /// Replace the modifier state carried by the event.
    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        match self {
            Self::Down { position, button, .. } => Self::Down {
                position,
                button,
                modifiers,
            },
            Self::Move { position, .. } => Self::Move { position, modifiers },
            Self::Up { position, .. } => Self::Up { position, modifiers },
            Self::Leave => Self::Leave,
        }
    }

    /// Screen position, if the event carries one.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::Down { position, .. } | Self::Move { position, .. } | Self::Up { position, .. } => {
                Some(*position)
            }
            Self::Leave => None,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match self {
            Self::Down { modifiers, .. } | Self::Move { modifiers, .. } | Self::Up { modifiers, .. } => {
                *modifiers
            }
            Self::Leave => Modifiers::NONE,
        }
    }
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Delete,
    Backspace,
    Escape,
    /// A printable key, lowercase.
    Char(char),
}

impl Key {
    /// Unit direction of an arrow key in screen axes.
    pub fn arrow_direction(&self) -> Option<(f64, f64)> {
        match self {
            Key::ArrowUp => Some((0.0, -1.0)),
            Key::ArrowDown => Some((0.0, 1.0)),
            Key::ArrowLeft => Some((-1.0, 0.0)),
            Key::ArrowRight => Some((1.0, 0.0)),
            _ => None,
        }
    }
}

/// A key press, including auto-repeats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Keyboard focus is inside a text input.
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
            in_text_input: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

/// Keyboard shortcut resolved from a [`KeyEvent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortcut {
    Cancel,
    Delete,
    Duplicate,
    Undo,
    Redo,
    /// Move the selection; `(dx, dy)` in screen pixels.
    Nudge { dx: f64, dy: f64 },
    /// Grow/shrink the selection; `(dx, dy)` in screen pixels.
    NudgeResize { dx: f64, dy: f64 },
}

impl Shortcut {
    /// Resolve a key press.
    ///
    /// Inside a text input only Escape is claimed. Arrow steps are `step`
    /// pixels, or `large_step` with Shift held.
    pub fn resolve(event: &KeyEvent, step: f64, large_step: f64) -> Option<Self> {
        let mods = event.modifiers;
        if event.in_text_input {
            return (event.key == Key::Escape).then_some(Shortcut::Cancel);
        }

        match event.key {
            Key::Escape => Some(Shortcut::Cancel),
            Key::Delete | Key::Backspace => Some(Shortcut::Delete),
            Key::Char('z') if mods.command() && mods.shift => Some(Shortcut::Redo),
            Key::Char('z') if mods.command() => Some(Shortcut::Undo),
            Key::Char('y') if mods.ctrl => Some(Shortcut::Redo),
            Key::Char('d') if mods.command() => Some(Shortcut::Duplicate),
            key => {
                let (ux, uy) = key.arrow_direction()?;
                if mods.command() {
                    return None;
                }
                let amount = if mods.shift { large_step } else { step };
                let (dx, dy) = (ux * amount, uy * amount);
                Some(if mods.alt {
                    Shortcut::NudgeResize { dx, dy }
                } else {
                    Shortcut::Nudge { dx, dy }
                })
            }
        }
    }
}
