//! Input state: keyboard and mouse buttons with frame-to-frame edge detection.
//!
//! # Invariants
//! - The platform layer feeds raw events; scenes only read.
//! - `just_pressed`/`just_released` hold for exactly one frame, until
//!   `Input::end_frame` is called.
//! - Out-of-range queries answer `false` and never panic.

pub mod key;
pub mod state;

pub use key::{Key, MouseButton};
pub use state::Input;

pub fn crate_info() -> &'static str {
    "ember-input v0.1.0"
}
