//! Polled input state
//!
//! The window layer records key, button and cursor events here; the viewer
//! reads the snapshot once per frame.

/// Mouse buttons the camera reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Priority order used when several buttons are held
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    fn slot(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }
}

/// Camera keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKey {
    /// Move towards the focus point
    Forward,
    /// Move away from the focus point
    Backward,
}

/// Snapshot of keyboard and pointer state
#[derive(Debug, Clone, Default)]
pub struct InputState {
    forward: bool,
    backward: bool,
    buttons: [bool; 3],
    cursor: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: CameraKey, pressed: bool) {
        match key {
            CameraKey::Forward => self.forward = pressed,
            CameraKey::Backward => self.backward = pressed,
        }
    }

    pub fn is_down(&self, key: CameraKey) -> bool {
        match key {
            CameraKey::Forward => self.forward,
            CameraKey::Backward => self.backward,
        }
    }

    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        self.buttons[button.slot()] = pressed;
    }

    /// First held button in Left, Right, Middle order.
    pub fn pressed_button(&self) -> Option<MouseButton> {
        MouseButton::ALL
            .into_iter()
            .find(|button| self.buttons[button.slot()])
    }

    pub fn set_cursor(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Clears held keys and buttons, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.forward = false;
        self.backward = false;
        self.buttons = [false; 3];
    }
}
