//! Shared types for the ember 2D runtime.
//!
//! # Invariants
//! - Colors are linear RGBA in `[0, 1]` per channel.
//! - `Aabb::min` is component-wise `<=` `Aabb::max` for boxes built through
//!   the constructors.

pub mod collision;
mod types;

pub use collision::{Aabb, CollisionInfo};
pub use types::Color;

pub fn crate_info() -> &'static str {
    "ember-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
