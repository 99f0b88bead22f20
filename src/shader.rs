//! WGSL vertex stages and the buffer layouts they expect.
//!
//! The CPU evaluators in [`animation`](crate::animation) and
//! [`flow`](crate::flow) are the reference; the vertex stages here compute the
//! same positions and sizes on the GPU from the same static attributes, so a
//! renderer can choose either path.
//!
//! Tunables are baked into each module as WGSL `const` declarations, ahead of
//! the shared [`FRAME_UNIFORMS_WGSL`] and [`NOISE_WGSL`] blocks:
//!
//! ```ignore
//! let source = shader::assembly_shader(&config.assembly);
//! let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
//!     label: Some("Assembly Shader"),
//!     source: wgpu::ShaderSource::Wgsl(source.into()),
//! });
//! let layout = shader::assembly_vertex_layout();
//! ```
//!
//! Every stage draws each particle as a 4-vertex triangle strip sized in
//! pixels, using `scene.viewport` to convert to clip space.

use crate::ambient::AmbientOutput;
use crate::animation::AssemblyParams;
use crate::flow::{FlowParams, GpuFlowParticle};
use crate::noise::NOISE_WGSL;
use crate::particles::GpuParticle;
use crate::uniforms::FRAME_UNIFORMS_WGSL;
use std::fmt::Write;

/// Entry point of the assembly vertex stage.
pub const ASSEMBLY_ENTRY: &str = "vs_assembly";
/// Entry point of the flow vertex stage.
pub const FLOW_ENTRY: &str = "vs_flow";
/// Entry point of the sprite vertex stage.
pub const SPRITE_ENTRY: &str = "vs_sprite";

/// Vertices per particle quad.
pub const QUAD_VERTICES: u32 = 4;

/// Helpers shared by every stage.
const COMMON_WGSL: &str = r#"
@group(0) @binding(0) var<uniform> scene: FrameUniforms;

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 4>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(-1.0, 1.0),
        vec2<f32>(1.0, 1.0),
    );
    return corners[index & 3u];
}

// Offset a clip-space center by a corner of a quad `size` pixels across.
fn expand_quad(center: vec4<f32>, corner: vec2<f32>, size: f32) -> vec4<f32> {
    let pixel = vec2<f32>(1.0) / max(scene.viewport, vec2<f32>(1.0));
    return center + vec4<f32>(corner * size * pixel * center.w, 0.0, 0.0);
}
"#;

/// Body of the assembly stage; mirrors [`crate::animation::evaluate`].
pub const ASSEMBLY_WGSL: &str = r#"
struct ParticleIn {
    @location(0) origin: vec3<f32>,
    @location(1) delay: f32,
    @location(2) target_pos: vec3<f32>,
    @location(3) noise_freq: f32,
    @location(4) size: f32,
    @location(5) subsystem: u32,
};

struct AssemblyVaryings {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local_progress: f32,
    @location(1) depth: f32,
    @location(2) @interpolate(flat) subsystem_id: u32,
    @location(3) height: f32,
    @location(4) point_size: f32,
    @location(5) uv: vec2<f32>,
};

fn ease(p: f32) -> f32 {
    let q = clamp(p, 0.0, 1.0);
    return q * q * (3.0 - 2.0 * q);
}

fn local_progress(build: f32, delay: f32) -> f32 {
    if (build <= delay) {
        return 0.0;
    }
    if (build >= delay + WINDOW) {
        return 1.0;
    }
    return ease(smoothstep(delay, delay + WINDOW, build));
}

fn drift(target_pos: vec3<f32>, freq: f32, progress: f32) -> vec3<f32> {
    if (freq <= 0.0) {
        return vec3<f32>(0.0);
    }
    let s = target_pos * freq + vec3<f32>(scene.time * NOISE_TIME_SCALE);
    let n = vec3<f32>(
        noise3(s),
        noise3(s + vec3<f32>(113.5, 0.0, 0.0)),
        noise3(s + vec3<f32>(0.0, 271.3, 0.0)),
    );
    let amplitude = (1.0 - progress) * DRIFT_AMPLITUDE + DRIFT_FLOOR;
    return n * vec3<f32>(1.0, VERTICAL_DRIFT, 1.0) * amplitude;
}

@vertex
fn vs_assembly(@builtin(vertex_index) vertex_index: u32, particle: ParticleIn) -> AssemblyVaryings {
    let build = clamp(scene.build_progress, 0.0, 1.0);
    let progress = local_progress(build, particle.delay);
    let position = mix(particle.origin, particle.target_pos, progress)
        + drift(particle.target_pos, particle.noise_freq, progress);

    let to_particle = position - scene.camera_position.xyz;
    let pulse = 1.0 + PULSE_AMPLITUDE * sin(scene.time * PULSE_RATE + particle.delay * 10.0);
    let attenuation = SIZE_ATTENUATION / max(length(to_particle), MIN_DISTANCE);
    let size = clamp(particle.size * attenuation * pulse, MIN_SIZE, MAX_SIZE);

    let corner = quad_corner(vertex_index);
    var out: AssemblyVaryings;
    out.clip_position = expand_quad(scene.view_proj * vec4<f32>(position, 1.0), corner, size);
    out.local_progress = progress;
    out.depth = dot(to_particle, scene.view_direction.xyz);
    out.subsystem_id = particle.subsystem;
    out.height = particle.target_pos.y;
    out.point_size = size;
    out.uv = corner * 0.5 + 0.5;
    return out;
}
"#;

/// Body of the energy flow stage; mirrors [`crate::flow::EnergyFlow::evaluate`].
pub const FLOW_WGSL: &str = r#"
struct FlowSegment {
    start: vec4<f32>,
    end: vec4<f32>,
};

struct FlowPathRange {
    first: u32,
    count: u32,
};

@group(0) @binding(1) var<storage, read> segments: array<FlowSegment>;
@group(0) @binding(2) var<storage, read> paths: array<FlowPathRange>;

struct FlowIn {
    @location(0) path_position: f32,
    @location(1) path: u32,
};

struct FlowVaryings {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) alpha: f32,
    @location(1) glow: f32,
    @location(2) point_size: f32,
    @location(3) uv: vec2<f32>,
};

const PI: f32 = 3.14159265358979;

@vertex
fn vs_flow(@builtin(vertex_index) vertex_index: u32, particle: FlowIn) -> FlowVaryings {
    let phase = fract(particle.path_position + scene.time * scene.flow_speed);

    let range = paths[particle.path];
    let n = max(range.count, 1u);
    let scaled = clamp(phase, 0.0, 1.0) * f32(n);
    let index = min(u32(floor(scaled)), n - 1u);
    let t = scaled - f32(index);
    let segment = segments[range.first + index];

    let w = scene.time * 3.0 + phase * 20.0;
    let position = mix(segment.start.xyz, segment.end.xyz, t)
        + vec3<f32>(sin(w), cos(w * 0.8), sin(w * 1.2)) * WOBBLE;

    let visibility = smoothstep(VISIBILITY_START, VISIBILITY_END, clamp(scene.build_progress, 0.0, 1.0));
    let trail = sin(phase * PI);
    let dist = max(distance(position, scene.camera_position.xyz), 0.001);
    let size = clamp((4.0 + trail * 6.0) * (SIZE_ATTENUATION / dist) * visibility, MIN_SIZE, MAX_SIZE);

    let corner = quad_corner(vertex_index);
    var out: FlowVaryings;
    out.clip_position = expand_quad(scene.view_proj * vec4<f32>(position, 1.0), corner, size);
    out.alpha = visibility * trail;
    out.glow = trail;
    out.point_size = size;
    out.uv = corner * 0.5 + 0.5;
    return out;
}
"#;

/// Stage for points already evaluated on the CPU ([`AmbientOutput`]).
pub const SPRITE_WGSL: &str = r#"
struct SpriteIn {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) alpha: f32,
};

struct SpriteVaryings {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) alpha: f32,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_sprite(@builtin(vertex_index) vertex_index: u32, sprite: SpriteIn) -> SpriteVaryings {
    let corner = quad_corner(vertex_index);
    var out: SpriteVaryings;
    out.clip_position = expand_quad(scene.view_proj * vec4<f32>(sprite.position, 1.0), corner, sprite.size);
    out.alpha = sprite.alpha;
    out.uv = corner * 0.5 + 0.5;
    return out;
}
"#;

/// Format a float as a WGSL literal. Non-finite values become `0.0`.
fn literal(value: f32) -> String {
    if value.is_finite() {
        format!("{:?}", value)
    } else {
        log::warn!("non-finite shader constant {}, using 0.0", value);
        "0.0".to_string()
    }
}

fn push_const(out: &mut String, name: &str, value: f32) {
    let _ = writeln!(out, "const {}: f32 = {};", name, literal(value));
}

fn compose(constants: String, body: &str, with_noise: bool) -> String {
    let mut source = String::with_capacity(constants.len() + body.len() + 4096);
    source.push_str(&constants);
    source.push_str(FRAME_UNIFORMS_WGSL);
    source.push_str(COMMON_WGSL);
    if with_noise {
        source.push_str(NOISE_WGSL);
    }
    source.push_str(body);
    source
}

/// Complete assembly shader for `params`.
pub fn assembly_shader(params: &AssemblyParams) -> String {
    let mut constants = String::new();
    push_const(&mut constants, "WINDOW", params.window.max(f32::EPSILON));
    push_const(&mut constants, "DRIFT_AMPLITUDE", params.drift_amplitude);
    push_const(&mut constants, "VERTICAL_DRIFT", params.vertical_drift);
    push_const(&mut constants, "DRIFT_FLOOR", params.drift_floor);
    push_const(&mut constants, "NOISE_TIME_SCALE", params.noise_time_scale);
    push_const(&mut constants, "SIZE_ATTENUATION", params.size_attenuation);
    push_const(&mut constants, "MIN_DISTANCE", params.min_distance);
    push_const(&mut constants, "MIN_SIZE", params.min_size);
    push_const(&mut constants, "MAX_SIZE", params.max_size);
    push_const(&mut constants, "PULSE_AMPLITUDE", params.pulse_amplitude);
    push_const(&mut constants, "PULSE_RATE", params.pulse_rate);
    compose(constants, ASSEMBLY_WGSL, true)
}

/// Complete energy flow shader for `params`.
pub fn flow_shader(params: &FlowParams) -> String {
    let mut constants = String::new();
    let [start, end] = params.visibility_edges;
    push_const(&mut constants, "VISIBILITY_START", start);
    push_const(&mut constants, "VISIBILITY_END", end);
    push_const(&mut constants, "SIZE_ATTENUATION", params.size_attenuation);
    push_const(&mut constants, "MIN_SIZE", params.min_size);
    push_const(&mut constants, "MAX_SIZE", params.max_size);
    let _ = writeln!(
        constants,
        "const WOBBLE: vec3<f32> = vec3<f32>({}, {}, {});",
        literal(params.wobble.x),
        literal(params.wobble.y),
        literal(params.wobble.z)
    );
    compose(constants, FLOW_WGSL, false)
}

/// Complete sprite shader.
pub fn sprite_shader() -> String {
    compose(String::new(), SPRITE_WGSL, false)
}

// ========== Buffer layouts ==========

const ASSEMBLY_ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
    0 => Float32x3, // origin
    1 => Float32,   // delay
    2 => Float32x3, // target
    3 => Float32,   // noise_freq
    4 => Float32,   // size
    5 => Uint32     // subsystem
];

const FLOW_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32, // path_position
    1 => Uint32   // path
];

const SPRITE_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32,   // size
    2 => Float32    // alpha
];

/// Per-instance layout of [`GpuParticle`].
pub fn assembly_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GpuParticle>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &ASSEMBLY_ATTRIBUTES,
    }
}

/// Per-instance layout of [`GpuFlowParticle`].
pub fn flow_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GpuFlowParticle>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &FLOW_ATTRIBUTES,
    }
}

/// Per-instance layout of [`AmbientOutput`].
pub fn sprite_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<AmbientOutput>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &SPRITE_ATTRIBUTES,
    }
}

fn uniform_entry() -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Bind group 0 for the assembly and sprite stages: the frame uniforms.
pub fn frame_bind_group_entries() -> [wgpu::BindGroupLayoutEntry; 1] {
    [uniform_entry()]
}

/// Bind group 0 for the flow stage: frame uniforms, segments, path ranges.
pub fn flow_bind_group_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [uniform_entry(), storage_entry(1), storage_entry(2)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_precede_body() {
        let source = assembly_shader(&AssemblyParams::default());
        let window = source.find("const WINDOW: f32 = 0.3;").unwrap();
        let entry = source.find("fn vs_assembly").unwrap();
        assert!(window < entry);
        assert!(source.contains("fn noise3("));
        assert!(source.contains("struct FrameUniforms"));
    }

    #[test]
    fn test_flow_shader_constants() {
        let source = flow_shader(&FlowParams::default());
        assert!(source.contains("const VISIBILITY_START: f32 = 0.85;"));
        assert!(source.contains("const WOBBLE: vec3<f32> = vec3<f32>(0.15, 0.1, 0.15);"));
        assert!(!source.contains("fn noise3("));
    }

    #[test]
    fn test_non_finite_literal() {
        assert_eq!(literal(f32::NAN), "0.0");
        assert_eq!(literal(2.0), "2.0");
    }

    #[test]
    fn test_layouts_match_structs() {
        let assembly = assembly_vertex_layout();
        assert_eq!(assembly.array_stride, 40);
        let offsets: Vec<u64> = assembly.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 16, 28, 32, 36]);

        let flow = flow_vertex_layout();
        assert_eq!(flow.array_stride, 8);
        assert_eq!(flow.attributes[1].offset, 4);

        let sprite = sprite_vertex_layout();
        assert_eq!(sprite.array_stride, 32);
        assert_eq!(sprite.attributes[2].offset, 16);
    }

    #[test]
    fn test_bind_group_entries() {
        let entries = flow_bind_group_entries();
        assert_eq!(entries.iter().map(|e| e.binding).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(frame_bind_group_entries()[0].binding, 0);
    }
}
