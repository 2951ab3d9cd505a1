use bytemuck::{Pod, Zeroable};
use ember_common::Color;
use glam::{Vec2, Vec4};

use crate::device::Texture;

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Per-vertex data for batched quads. Layout matches `QUAD_SHADER`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// World-space position after rotation and translation.
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
    /// Texture slot in `[0, 16)`, float-encoded for the vertex stream.
    pub tex_index: f32,
}

/// Normalized texture region `(min_u, min_v)..(max_u, max_v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: Self = Self {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    pub fn new(min_u: f32, min_v: f32, max_u: f32, max_v: f32) -> Self {
        Self {
            min: Vec2::new(min_u, min_v),
            max: Vec2::new(max_u, max_v),
        }
    }

    /// `(min_u, min_v, max_u, max_v)`.
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.min.x, self.min.y, self.max.x, self.max.y)
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// Mirroring applied by swapping UV min/max per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    pub fn from_axes(horizontal: bool, vertical: bool) -> Self {
        match (horizontal, vertical) {
            (false, false) => Flip::None,
            (true, false) => Flip::Horizontal,
            (false, true) => Flip::Vertical,
            (true, true) => Flip::Both,
        }
    }

    pub fn horizontal(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    pub fn vertical(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }

    /// Swap min/max of `uv` on each flipped axis.
    pub fn apply(self, uv: UvRect) -> UvRect {
        let mut out = uv;
        if self.horizontal() {
            std::mem::swap(&mut out.min.x, &mut out.max.x);
        }
        if self.vertical() {
            std::mem::swap(&mut out.min.y, &mut out.max.y);
        }
        out
    }
}

/// One quad draw request. Built per call and consumed by the batcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// Center in world units.
    pub position: Vec2,
    pub size: Vec2,
    /// Counter-clockwise rotation about the center, in radians.
    pub rotation: f32,
    pub uv: UvRect,
    pub flip: Flip,
    pub tint: Color,
    /// `None` samples the white default texture.
    pub texture: Option<Texture>,
}

impl Quad {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
            uv: UvRect::FULL,
            flip: Flip::None,
            tint: Color::WHITE,
            texture: None,
        }
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn uv(mut self, uv: UvRect) -> Self {
        self.uv = uv;
        self
    }

    pub fn flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    pub fn tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    /// World-space corners in order bottom-left, bottom-right, top-right, top-left.
    pub fn corners(&self) -> [Vec2; VERTICES_PER_QUAD] {
        let half = self.size * 0.5;
        let local = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];

        if self.rotation == 0.0 {
            return local.map(|offset| self.position + offset);
        }

        let (sin, cos) = self.rotation.sin_cos();
        local.map(|offset| {
            self.position
                + Vec2::new(
                    offset.x * cos - offset.y * sin,
                    offset.x * sin + offset.y * cos,
                )
        })
    }

    /// Texture coordinates for each corner, in [`Quad::corners`] order.
    pub fn tex_coords(&self) -> [Vec2; VERTICES_PER_QUAD] {
        let uv = self.flip.apply(self.uv);
        [
            Vec2::new(uv.min.x, uv.min.y),
            Vec2::new(uv.max.x, uv.min.y),
            Vec2::new(uv.max.x, uv.max.y),
            Vec2::new(uv.min.x, uv.max.y),
        ]
    }
}

/// Index pattern for `max_quads` quads: `0,1,2, 2,3,0` offset by 4 per quad.
/// Callers keep `max_quads` within [`crate::QUAD_CAPACITY_LIMIT`].
pub fn quad_indices(max_quads: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(max_quads * INDICES_PER_QUAD);
    for quad in 0..max_quads as u32 {
        let base = quad * VERTICES_PER_QUAD as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn unrotated_corners_are_exact() {
        let quad = Quad::new(Vec2::new(10.0, -4.0), Vec2::new(3.0, 5.0));
        assert_eq!(
            quad.corners(),
            [
                Vec2::new(8.5, -6.5),
                Vec2::new(11.5, -6.5),
                Vec2::new(11.5, -1.5),
                Vec2::new(8.5, -1.5),
            ]
        );
    }

    #[test]
    fn quarter_turn_rotates_counter_clockwise() {
        let quad = Quad::new(Vec2::ZERO, Vec2::new(2.0, 2.0)).rotation(FRAC_PI_2);
        let corners = quad.corners();
        // bottom-left (-1,-1) rotates to (1,-1)
        assert!(corners[0].abs_diff_eq(Vec2::new(1.0, -1.0), 1e-6));
        assert!(corners[2].abs_diff_eq(Vec2::new(-1.0, 1.0), 1e-6));
    }

    #[test]
    fn double_flip_is_identity() {
        let uv = UvRect::FULL;
        let once = Flip::Both.apply(uv);
        assert_eq!(once, UvRect::new(1.0, 1.0, 0.0, 0.0));
        assert_eq!(Flip::Both.apply(once), uv);

        let sub = UvRect::new(0.25, 0.5, 0.5, 0.75);
        for flip in [Flip::None, Flip::Horizontal, Flip::Vertical, Flip::Both] {
            assert_eq!(flip.apply(flip.apply(sub)), sub);
        }
    }

    #[test]
    fn horizontal_flip_mirrors_u_only() {
        let quad = Quad::new(Vec2::ZERO, Vec2::ONE)
            .uv(UvRect::new(0.0, 0.0, 0.5, 1.0))
            .flip(Flip::Horizontal);
        let uvs = quad.tex_coords();
        assert_eq!(uvs[0], Vec2::new(0.5, 0.0));
        assert_eq!(uvs[1], Vec2::new(0.0, 0.0));
        assert_eq!(uvs[2], Vec2::new(0.0, 1.0));
    }

    #[test]
    fn flip_from_axes() {
        assert_eq!(Flip::from_axes(true, true), Flip::Both);
        assert!(Flip::Vertical.vertical());
        assert!(!Flip::Vertical.horizontal());
    }

    #[test]
    fn index_pattern() {
        let indices = quad_indices(2);
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 9 * 4);
    }
}
