//! winit events to viewer input state

use meshview_core::{CameraKey, InputState, MouseButton};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// W / Up move the camera forward, S / Down move it back.
pub fn camera_key(code: KeyCode) -> Option<CameraKey> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(CameraKey::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(CameraKey::Backward),
        _ => None,
    }
}

pub fn mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Records a window event into `input`.
///
/// Presses the UI consumed are dropped; releases always get through so a
/// drag that ends over a panel does not leave a button stuck.
pub fn apply_window_event(input: &mut InputState, event: &WindowEvent, consumed: bool) {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            if let PhysicalKey::Code(code) = event.physical_key {
                apply_key(input, code, event.state, consumed);
            }
        }
        WindowEvent::MouseInput { state, button, .. } => {
            apply_button(input, *button, *state, consumed);
        }
        WindowEvent::CursorMoved { position, .. } => {
            input.set_cursor(position.x, position.y);
        }
        WindowEvent::Focused(false) => input.release_all(),
        _ => {}
    }
}

pub fn apply_key(input: &mut InputState, code: KeyCode, state: ElementState, consumed: bool) {
    let Some(key) = camera_key(code) else {
        return;
    };
    match state {
        ElementState::Pressed if !consumed => input.set_key(key, true),
        ElementState::Pressed => {}
        ElementState::Released => input.set_key(key, false),
    }
}

pub fn apply_button(
    input: &mut InputState,
    button: winit::event::MouseButton,
    state: ElementState,
    consumed: bool,
) {
    let Some(button) = mouse_button(button) else {
        return;
    };
    match state {
        ElementState::Pressed if !consumed => input.set_button(button, true),
        ElementState::Pressed => {}
        ElementState::Released => input.set_button(button, false),
    }
}
