/// WGSL program for batched quads.
///
/// Bindings: 0 = view-projection uniform, 1..=16 = texture slots 0..15,
/// 17..=32 = the matching per-slot samplers. The slot is selected per
/// vertex; `textureSampleLevel` keeps the lookup valid under non-uniform
/// control flow.
pub const QUAD_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1) var slot0: texture_2d<f32>;
@group(0) @binding(2) var slot1: texture_2d<f32>;
@group(0) @binding(3) var slot2: texture_2d<f32>;
@group(0) @binding(4) var slot3: texture_2d<f32>;
@group(0) @binding(5) var slot4: texture_2d<f32>;
@group(0) @binding(6) var slot5: texture_2d<f32>;
@group(0) @binding(7) var slot6: texture_2d<f32>;
@group(0) @binding(8) var slot7: texture_2d<f32>;
@group(0) @binding(9) var slot8: texture_2d<f32>;
@group(0) @binding(10) var slot9: texture_2d<f32>;
@group(0) @binding(11) var slot10: texture_2d<f32>;
@group(0) @binding(12) var slot11: texture_2d<f32>;
@group(0) @binding(13) var slot12: texture_2d<f32>;
@group(0) @binding(14) var slot13: texture_2d<f32>;
@group(0) @binding(15) var slot14: texture_2d<f32>;
@group(0) @binding(16) var slot15: texture_2d<f32>;
@group(0) @binding(17) var sampler0: sampler;
@group(0) @binding(18) var sampler1: sampler;
@group(0) @binding(19) var sampler2: sampler;
@group(0) @binding(20) var sampler3: sampler;
@group(0) @binding(21) var sampler4: sampler;
@group(0) @binding(22) var sampler5: sampler;
@group(0) @binding(23) var sampler6: sampler;
@group(0) @binding(24) var sampler7: sampler;
@group(0) @binding(25) var sampler8: sampler;
@group(0) @binding(26) var sampler9: sampler;
@group(0) @binding(27) var sampler10: sampler;
@group(0) @binding(28) var sampler11: sampler;
@group(0) @binding(29) var sampler12: sampler;
@group(0) @binding(30) var sampler13: sampler;
@group(0) @binding(31) var sampler14: sampler;
@group(0) @binding(32) var sampler15: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
    @location(3) tex_index: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) @interpolate(flat) slot: u32,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 0.0, 1.0);
    out.uv = vertex.uv;
    out.color = vertex.color;
    out.slot = u32(vertex.tex_index + 0.5);
    return out;
}

fn sample_slot(slot: u32, uv: vec2<f32>) -> vec4<f32> {
    var texel = vec4<f32>(1.0, 1.0, 1.0, 1.0);
    switch slot {
        case 0u: { texel = textureSampleLevel(slot0, sampler0, uv, 0.0); }
        case 1u: { texel = textureSampleLevel(slot1, sampler1, uv, 0.0); }
        case 2u: { texel = textureSampleLevel(slot2, sampler2, uv, 0.0); }
        case 3u: { texel = textureSampleLevel(slot3, sampler3, uv, 0.0); }
        case 4u: { texel = textureSampleLevel(slot4, sampler4, uv, 0.0); }
        case 5u: { texel = textureSampleLevel(slot5, sampler5, uv, 0.0); }
        case 6u: { texel = textureSampleLevel(slot6, sampler6, uv, 0.0); }
        case 7u: { texel = textureSampleLevel(slot7, sampler7, uv, 0.0); }
        case 8u: { texel = textureSampleLevel(slot8, sampler8, uv, 0.0); }
        case 9u: { texel = textureSampleLevel(slot9, sampler9, uv, 0.0); }
        case 10u: { texel = textureSampleLevel(slot10, sampler10, uv, 0.0); }
        case 11u: { texel = textureSampleLevel(slot11, sampler11, uv, 0.0); }
        case 12u: { texel = textureSampleLevel(slot12, sampler12, uv, 0.0); }
        case 13u: { texel = textureSampleLevel(slot13, sampler13, uv, 0.0); }
        case 14u: { texel = textureSampleLevel(slot14, sampler14, uv, 0.0); }
        case 15u: { texel = textureSampleLevel(slot15, sampler15, uv, 0.0); }
        default: {}
    }
    return texel;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return sample_slot(in.slot, in.uv) * in.color;
}
"#;

pub const QUAD_VERTEX_ENTRY: &str = "vs_main";
pub const QUAD_FRAGMENT_ENTRY: &str = "fs_main";

/// Uniform name for the camera's view-projection matrix.
pub const VIEW_PROJ_UNIFORM: &str = "u_view_proj";

/// Binding index of texture slot `slot`.
pub const fn texture_binding(slot: u32) -> u32 {
    1 + slot
}

/// Binding index of the sampler paired with texture slot `slot`.
pub const fn sampler_binding(slot: u32) -> u32 {
    17 + slot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_every_slot() {
        for slot in 0..16u32 {
            let texture = format!("@binding({}) var slot{slot}:", texture_binding(slot));
            let sampler = format!("@binding({}) var sampler{slot}:", sampler_binding(slot));
            assert!(QUAD_SHADER.contains(&texture), "{texture}");
            assert!(QUAD_SHADER.contains(&sampler), "{sampler}");
        }
    }

    #[test]
    fn entry_points_exist() {
        assert!(QUAD_SHADER.contains(&format!("fn {QUAD_VERTEX_ENTRY}(")));
        assert!(QUAD_SHADER.contains(&format!("fn {QUAD_FRAGMENT_ENTRY}(")));
    }
}
