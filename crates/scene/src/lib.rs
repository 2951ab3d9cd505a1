//! Scene lifecycle and the frame runtime.
//!
//! # Invariants
//! - Only the top scene is updated and rendered.
//! - At most one transition is pending. Transitions commit exactly twice per
//!   update: before and after the active scene's own logic.
//! - The runtime owns renderer, camera, scenes and input; there is no global state.

mod runtime;
mod scene;
mod stack;

pub use runtime::{FramePacer, Runtime, RuntimeConfig, clamp_dt};
pub use scene::{PendingTransition, Scene, Transitions, UpdateContext};
pub use stack::SceneStack;

pub fn crate_info() -> &'static str {
    "ember-scene v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("scene"));
    }
}
