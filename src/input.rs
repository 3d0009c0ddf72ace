//! Translation from winit window events to engine input.
//!
//! The engine only understands [`InputEvent`]s in surface pixels. A
//! [`PointerTracker`] sits between the window and the engine. It remembers
//! the cursor position (winit button events carry none) and turns wheel
//! deltas into zoom notches.
//!
//! # Usage
//!
//! ```ignore
//! fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
//!     if let Some(input) = self.tracker.translate(&event) {
//!         swarm.handle_input(input);
//!     }
//! }
//! ```

use glam::DVec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Pixels of trackpad scroll that count as one wheel notch.
pub const PIXELS_PER_NOTCH: f64 = 100.0;

/// Keys the engine or demo host react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Cancels the active gesture.
    Escape,
    Space,
    Enter,
    Tab,
    C,
    G,
    M,
    R,
    S,
    T,
    Key0,
    Key1,
    Key2,
    Key3,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Enter => KeyCode::Enter,
            WinitKeyCode::Tab => KeyCode::Tab,
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyG => KeyCode::G,
            WinitKeyCode::KeyM => KeyCode::M,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyT => KeyCode::T,
            WinitKeyCode::Digit0 => KeyCode::Key0,
            WinitKeyCode::Digit1 => KeyCode::Key1,
            WinitKeyCode::Digit2 => KeyCode::Key2,
            WinitKeyCode::Digit3 => KeyCode::Key3,
            other => KeyCode::Other(other as u32),
        }
    }
}

/// Host-agnostic pointer and key input, positions in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(DVec2),
    PointerMove(DVec2),
    PointerUp(DVec2),
    PointerLeave,
    /// Zoom by `notches` around `position`. Positive zooms in.
    Wheel { position: DVec2, notches: f64 },
    /// A key went down (repeats are filtered out).
    Key(KeyCode),
}

/// Stateful winit → [`InputEvent`] translator.
#[derive(Debug, Default)]
pub struct PointerTracker {
    cursor: Option<DVec2>,
    button_down: bool,
    held_keys: Vec<KeyCode>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known cursor position, if the cursor is over the window.
    pub fn cursor(&self) -> Option<DVec2> {
        self.cursor
    }

    /// Translate one window event. Events the engine does not care about yield `None`.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => Some(self.cursor_moved(DVec2::new(position.x, position.y))),
            WindowEvent::CursorLeft { .. } => self.cursor_left(),
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.left_button(*state == ElementState::Pressed)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y as f64,
                    MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_NOTCH,
                };
                self.wheel(notches)
            }
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(code) => self.key(KeyCode::from(code), event.state == ElementState::Pressed),
                PhysicalKey::Unidentified(_) => None,
            },
            WindowEvent::Focused(false) => {
                self.held_keys.clear();
                None
            }
            _ => None,
        }
    }

    // ========== Internal Methods ==========

    fn cursor_moved(&mut self, position: DVec2) -> InputEvent {
        self.cursor = Some(position);
        InputEvent::PointerMove(position)
    }

    fn cursor_left(&mut self) -> Option<InputEvent> {
        self.button_down = false;
        self.cursor.take().map(|_| InputEvent::PointerLeave)
    }

    fn left_button(&mut self, pressed: bool) -> Option<InputEvent> {
        let position = self.cursor?;
        match (pressed, self.button_down) {
            (true, false) => {
                self.button_down = true;
                Some(InputEvent::PointerDown(position))
            }
            (false, true) => {
                self.button_down = false;
                Some(InputEvent::PointerUp(position))
            }
            _ => None,
        }
    }

    fn wheel(&mut self, notches: f64) -> Option<InputEvent> {
        let position = self.cursor?;
        (notches != 0.0 && notches.is_finite()).then_some(InputEvent::Wheel { position, notches })
    }

    fn key(&mut self, key: KeyCode, pressed: bool) -> Option<InputEvent> {
        let held = self.held_keys.contains(&key);
        if pressed {
            if held {
                return None;
            }
            self.held_keys.push(key);
            Some(InputEvent::Key(key))
        } else {
            self.held_keys.retain(|k| *k != key);
            None
        }
    }
}
