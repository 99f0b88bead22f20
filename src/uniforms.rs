//! Per-frame uniform block shared by every vertex stage.
//!
//! [`FrameUniforms`] is laid out to match the WGSL struct in
//! [`FRAME_UNIFORMS_WGSL`] byte for byte, so an external renderer can upload
//! it with `bytemuck::bytes_of` straight into a uniform buffer.
//!
//! ```ignore
//! let uniforms = FrameUniforms::new(&pose, [1280.0, 720.0], time, &state, flow_speed);
//! queue.write_buffer(&buffer, 0, uniforms.as_bytes());
//! ```

use crate::camera::CameraPose;
use crate::progress::SceneState;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// WGSL declaration of [`FrameUniforms`].
pub const FRAME_UNIFORMS_WGSL: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    view_direction: vec4<f32>,
    time: f32,
    build_progress: f32,
    glow_intensity: f32,
    flow_speed: f32,
    fog_density: f32,
    _pad0: f32,
    viewport: vec2<f32>,
};
"#;

/// GPU uniform block. 128 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera position, w = 1.
    pub camera_position: [f32; 4],
    /// xyz = unit forward axis, w = 0.
    pub view_direction: [f32; 4],
    pub time: f32,
    pub build_progress: f32,
    pub glow_intensity: f32,
    /// Path positions per second for the energy flow.
    pub flow_speed: f32,
    pub fog_density: f32,
    pub _padding: f32,
    /// Render target size in pixels.
    pub viewport: [f32; 2],
}

impl FrameUniforms {
    pub fn new(pose: &CameraPose, viewport: [f32; 2], time: f32, state: &SceneState, flow_speed: f32) -> Self {
        let [width, height] = viewport;
        let aspect = if height > 0.0 { width / height } else { 1.0 };
        Self {
            view_proj: pose.view_proj(aspect).to_cols_array_2d(),
            camera_position: pose.position.extend(1.0).to_array(),
            view_direction: pose.view_direction().extend(0.0).to_array(),
            time,
            build_progress: state.build_progress,
            glow_intensity: state.glow_intensity,
            flow_speed,
            fog_density: state.fog_density,
            _padding: 0.0,
            viewport,
        }
    }

    pub fn camera(&self) -> Vec3 {
        Vec3::new(self.camera_position[0], self.camera_position[1], self.camera_position[2])
    }

    pub fn view_proj(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            view_direction: [0.0, 0.0, -1.0, 0.0],
            time: 0.0,
            build_progress: 0.0,
            glow_intensity: 0.0,
            flow_speed: 0.0,
            fog_density: 1.0,
            _padding: 0.0,
            viewport: [1.0, 1.0],
        }
    }
}
