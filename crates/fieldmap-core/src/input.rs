//! Pointer and keyboard input.

use crate::tools::ToolKind;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
    /// Wheel zoom. Positive `delta.y` scrolls towards the user (zoom out).
    Scroll { position: Point, delta: Vec2 },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}

/// Canvas command bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Drop the in-progress drawing buffer.
    Cancel,
    FinishPolygon,
    Undo,
    Redo,
    DeleteSelection,
    ZoomIn,
    ZoomOut,
    ResetView,
    FitToContent,
    SetTool(ToolKind),
}

impl KeyCommand {
    /// Map a key name (as reported by the windowing layer) to a command.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Option<Self> {
        if modifiers.command() {
            return match key.to_ascii_lowercase().as_str() {
                "z" if modifiers.shift => Some(KeyCommand::Redo),
                "z" => Some(KeyCommand::Undo),
                "y" => Some(KeyCommand::Redo),
                _ => None,
            };
        }

        match key {
            "Escape" => Some(KeyCommand::Cancel),
            "Enter" | "Return" => Some(KeyCommand::FinishPolygon),
            "Delete" | "Backspace" => Some(KeyCommand::DeleteSelection),
            "+" | "=" => Some(KeyCommand::ZoomIn),
            "-" | "_" => Some(KeyCommand::ZoomOut),
            "0" => Some(KeyCommand::ResetView),
            "f" | "F" => Some(KeyCommand::FitToContent),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !modifiers.alt => ToolKind::from_shortcut(c).map(KeyCommand::SetTool),
                    _ => None,
                }
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            KeyCommand::Cancel => "Cancel current drawing",
            KeyCommand::FinishPolygon => "Finish polygon",
            KeyCommand::Undo => "Undo",
            KeyCommand::Redo => "Redo",
            KeyCommand::DeleteSelection => "Delete selection",
            KeyCommand::ZoomIn => "Zoom in",
            KeyCommand::ZoomOut => "Zoom out",
            KeyCommand::ResetView => "Reset view",
            KeyCommand::FitToContent => "Fit to content",
            KeyCommand::SetTool(_) => "Switch tool",
        }
    }
}
