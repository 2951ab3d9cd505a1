/// Keys tracked by [`crate::Input`]. The discriminant is the state-table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl Key {
    /// Number of tracked keys.
    pub const COUNT: usize = Key::F12 as usize + 1;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Mouse buttons. `Other(n)` carries the platform's extra-button number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Number of tracked mouse buttons.
    pub const COUNT: usize = 8;

    /// State-table index. Extra buttons map after the five named ones.
    pub fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(n) => 5 + n as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_indices_are_dense() {
        assert_eq!(Key::A.index(), 0);
        assert_eq!(Key::Z.index(), 25);
        assert_eq!(Key::F12.index(), Key::COUNT - 1);
    }

    #[test]
    fn extra_mouse_buttons_follow_named_ones() {
        assert_eq!(MouseButton::Other(0).index(), 5);
        assert!(MouseButton::Other(40).index() >= MouseButton::COUNT);
    }
}
