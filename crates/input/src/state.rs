use crate::key::{Key, MouseButton};
use glam::Vec2;

/// Keyboard and mouse state with previous-frame snapshots for edge queries.
///
/// The platform layer calls [`Input::press`]/[`Input::release`] while
/// polling events, the game reads during its update, and the frame loop
/// calls [`Input::end_frame`] afterwards.
#[derive(Debug, Clone)]
pub struct Input {
    keys: [bool; Key::COUNT],
    keys_previous: [bool; Key::COUNT],
    mouse: [bool; MouseButton::COUNT],
    mouse_previous: [bool; MouseButton::COUNT],
    /// Cursor position in window pixels, origin top-left.
    mouse_position: Vec2,
    scroll_delta: Vec2,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            keys: [false; Key::COUNT],
            keys_previous: [false; Key::COUNT],
            mouse: [false; MouseButton::COUNT],
            mouse_previous: [false; MouseButton::COUNT],
            mouse_position: Vec2::ZERO,
            scroll_delta: Vec2::ZERO,
        }
    }
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.keys[key.index()] = true;
    }

    pub fn release(&mut self, key: Key) {
        self.keys[key.index()] = false;
    }

    /// Record a mouse button change. Buttons outside the tracked range are ignored.
    pub fn set_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        match self.mouse.get_mut(button.index()) {
            Some(slot) => *slot = pressed,
            None => tracing::trace!(?button, "ignoring untracked mouse button"),
        }
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    pub fn add_scroll(&mut self, delta: Vec2) {
        self.scroll_delta += delta;
    }

    /// Snapshot current state as the previous frame and reset per-frame deltas.
    pub fn end_frame(&mut self) {
        self.keys_previous = self.keys;
        self.mouse_previous = self.mouse;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Drop all held state, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        *self = Self {
            mouse_position: self.mouse_position,
            ..Self::default()
        };
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.keys[key.index()]
    }

    pub fn just_pressed(&self, key: Key) -> bool {
        let i = key.index();
        self.keys[i] && !self.keys_previous[i]
    }

    pub fn just_released(&self, key: Key) -> bool {
        let i = key.index();
        !self.keys[i] && self.keys_previous[i]
    }

    /// Query by raw table index; out-of-range indices answer `false`.
    pub fn is_index_down(&self, index: usize) -> bool {
        self.keys.get(index).copied().unwrap_or(false)
    }

    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        self.mouse.get(button.index()).copied().unwrap_or(false)
    }

    pub fn mouse_just_pressed(&self, button: MouseButton) -> bool {
        let i = button.index();
        match (self.mouse.get(i), self.mouse_previous.get(i)) {
            (Some(&now), Some(&before)) => now && !before,
            _ => false,
        }
    }

    pub fn mouse_just_released(&self, button: MouseButton) -> bool {
        let i = button.index();
        match (self.mouse.get(i), self.mouse_previous.get(i)) {
            (Some(&now), Some(&before)) => !now && before,
            _ => false,
        }
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }

    /// Signed axis from a pair of keys: `positive` gives +1, `negative` gives -1.
    pub fn axis(&self, negative: Key, positive: Key) -> f32 {
        let mut value = 0.0;
        if self.is_down(positive) {
            value += 1.0;
        }
        if self.is_down(negative) {
            value -= 1.0;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_is_edge_for_one_frame() {
        let mut input = Input::new();
        input.press(Key::Space);
        assert!(input.is_down(Key::Space));
        assert!(input.just_pressed(Key::Space));

        input.end_frame();
        assert!(input.is_down(Key::Space));
        assert!(!input.just_pressed(Key::Space));
    }

    #[test]
    fn release_is_edge_for_one_frame() {
        let mut input = Input::new();
        input.press(Key::A);
        input.end_frame();
        input.release(Key::A);
        assert!(input.just_released(Key::A));
        input.end_frame();
        assert!(!input.just_released(Key::A));
    }

    #[test]
    fn out_of_range_queries_are_false() {
        let mut input = Input::new();
        assert!(!input.is_index_down(Key::COUNT));
        assert!(!input.is_index_down(usize::MAX));

        let extra = MouseButton::Other(100);
        input.set_mouse_button(extra, true);
        assert!(!input.is_mouse_down(extra));
        assert!(!input.mouse_just_pressed(extra));
        assert!(!input.mouse_just_released(extra));
    }

    #[test]
    fn mouse_edges() {
        let mut input = Input::new();
        input.set_mouse_button(MouseButton::Left, true);
        assert!(input.mouse_just_pressed(MouseButton::Left));
        input.end_frame();
        input.set_mouse_button(MouseButton::Left, false);
        assert!(input.mouse_just_released(MouseButton::Left));
        assert!(!input.is_mouse_down(MouseButton::Left));
    }

    #[test]
    fn axis_cancels_opposite_keys() {
        let mut input = Input::new();
        input.press(Key::D);
        assert_eq!(input.axis(Key::A, Key::D), 1.0);
        input.press(Key::A);
        assert_eq!(input.axis(Key::A, Key::D), 0.0);
        input.release(Key::D);
        assert_eq!(input.axis(Key::A, Key::D), -1.0);
    }

    #[test]
    fn scroll_resets_each_frame() {
        let mut input = Input::new();
        input.add_scroll(Vec2::new(0.0, 1.0));
        input.add_scroll(Vec2::new(0.0, 2.0));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, 3.0));
        input.end_frame();
        assert_eq!(input.scroll_delta(), Vec2::ZERO);
    }

    #[test]
    fn reset_keeps_cursor() {
        let mut input = Input::new();
        input.set_mouse_position(Vec2::new(10.0, 20.0));
        input.press(Key::W);
        input.reset();
        assert!(!input.is_down(Key::W));
        assert_eq!(input.mouse_position(), Vec2::new(10.0, 20.0));
    }
}
