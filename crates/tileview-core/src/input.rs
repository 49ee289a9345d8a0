//! Pointer and wheel handling.

use serde::{Deserialize, Serialize};

use crate::config::ZoomLimits;
use crate::consts::{WHEEL_UNITS_PER_DEGREE, ZOOM_SENSITIVITY};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseMode {
    #[default]
    Zoom,
    Pan,
    Wipe,
    Select,
    Annotate,
}

impl MouseMode {
    pub const ALL: [MouseMode; 5] = [
        Self::Zoom,
        Self::Pan,
        Self::Wipe,
        Self::Select,
        Self::Annotate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Zoom => "Zoom",
            Self::Pan => "Pan",
            Self::Wipe => "Wipe",
            Self::Select => "Select",
            Self::Annotate => "Annotate",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { alt: false };
    pub const ALT: Self = Self { alt: true };
}

/// What an input event asks of the view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAction {
    None,
    /// Double the zoom about a window position.
    ZoomIn { at: [f32; 2] },
    /// Halve the zoom about a window position.
    ZoomOut { at: [f32; 2] },
    /// Move the centre by this many image pixels.
    Pan { dx: f32, dy: f32 },
    /// Replace the zoom, keeping the centre.
    SetZoom(f32),
}

/// Turns pointer events into view changes according to the mouse mode.
#[derive(Clone, Debug)]
pub struct InputController {
    mode: MouseMode,
    limits: ZoomLimits,
    drag_button: Option<PointerButton>,
    dragging: bool,
    last_pos: [f32; 2],
}

impl InputController {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            mode: MouseMode::Zoom,
            limits,
            drag_button: None,
            dragging: false,
            last_pos: [0.0, 0.0],
        }
    }

    pub fn mode(&self) -> MouseMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: MouseMode) {
        self.mode = mode;
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn drag_button(&self) -> Option<PointerButton> {
        self.drag_button
    }

    pub fn last_position(&self) -> [f32; 2] {
        self.last_pos
    }

    pub fn press(&mut self, pos: [f32; 2], button: PointerButton, mods: Modifiers) -> InputAction {
        self.last_pos = pos;
        self.drag_button = Some(button);
        match (self.mode, button) {
            (MouseMode::Zoom, PointerButton::Primary) if !mods.alt => InputAction::ZoomIn { at: pos },
            (MouseMode::Zoom, PointerButton::Secondary) if !mods.alt => {
                InputAction::ZoomOut { at: pos }
            }
            _ => {
                self.dragging = true;
                InputAction::None
            }
        }
    }

    pub fn release(&mut self, pos: [f32; 2]) -> InputAction {
        self.last_pos = pos;
        self.drag_button = None;
        self.dragging = false;
        InputAction::None
    }

    /// Pointer moved to `pos`; `zoom` is the current zoom.
    pub fn motion(&mut self, pos: [f32; 2], mods: Modifiers, zoom: f32) -> InputAction {
        let dx = pos[0] - self.last_pos[0];
        let dy = pos[1] - self.last_pos[1];
        self.last_pos = pos;

        let Some(button) = self.drag_button else {
            return InputAction::None;
        };
        let pan = InputAction::Pan {
            dx: -dx / zoom,
            dy: -dy / zoom,
        };
        match self.mode {
            MouseMode::Zoom => match button {
                PointerButton::Middle => pan,
                PointerButton::Primary if mods.alt => pan,
                PointerButton::Secondary if mods.alt => {
                    InputAction::SetZoom(self.limits.clamp(zoom * (1.0 + ZOOM_SENSITIVITY * (dx + dy))))
                }
                _ => InputAction::None,
            },
            MouseMode::Pan => pan,
            MouseMode::Wipe | MouseMode::Select | MouseMode::Annotate => InputAction::None,
        }
    }

    /// Wheel rotated by `delta` units (120 per notch).
    pub fn wheel(&mut self, delta: f32, zoom: f32) -> InputAction {
        let degrees = delta / WHEEL_UNITS_PER_DEGREE;
        InputAction::SetZoom(self.limits.clamp(zoom * (1.0 + ZOOM_SENSITIVITY * degrees)))
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}
