//! Integration tests for the generated WGSL.
//!
//! Every composed shader must parse and validate with naga, both with the
//! default tunables and with overrides.

use rigcloud::animation::AssemblyParams;
use rigcloud::flow::FlowParams;
use rigcloud::noise::NOISE_WGSL;
use rigcloud::shader::{self, ASSEMBLY_ENTRY, FLOW_ENTRY, SPRITE_ENTRY};
use rigcloud::uniforms::FRAME_UNIFORMS_WGSL;

fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {}", e.emit_to_string(code)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn has_vertex_entry(module: &naga::Module, name: &str) -> bool {
    module
        .entry_points
        .iter()
        .any(|ep| ep.name == name && ep.stage == naga::ShaderStage::Vertex)
}

// ============================================================================
// Building blocks
// ============================================================================

#[test]
fn test_noise_block_validates() {
    let code = format!(
        "{}\n@vertex\nfn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {{\n    return vec4<f32>(p, noise3(p));\n}}\n",
        NOISE_WGSL
    );
    validate_wgsl(&code).unwrap();
}

#[test]
fn test_uniform_block_validates() {
    let code = format!(
        "{}\n@group(0) @binding(0) var<uniform> scene: FrameUniforms;\n@vertex\nfn vs_main() -> @builtin(position) vec4<f32> {{\n    return scene.view_proj * scene.camera_position;\n}}\n",
        FRAME_UNIFORMS_WGSL
    );
    let module = validate_wgsl(&code).unwrap();
    let frame = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some("FrameUniforms"))
        .map(|(_, ty)| ty.inner.clone())
        .unwrap();
    match frame {
        naga::TypeInner::Struct { span, .. } => {
            assert_eq!(span as usize, std::mem::size_of::<rigcloud::FrameUniforms>())
        }
        other => panic!("unexpected type {:?}", other),
    }
}

// ============================================================================
// Composed shaders
// ============================================================================

#[test]
fn test_assembly_shader_validates() {
    let module = validate_wgsl(&shader::assembly_shader(&AssemblyParams::default())).unwrap();
    assert!(has_vertex_entry(&module, ASSEMBLY_ENTRY));
}

#[test]
fn test_assembly_shader_with_overrides() {
    let params = AssemblyParams {
        window: 0.25,
        drift_amplitude: 3.0,
        drift_floor: 0.0,
        max_size: 12.0,
        pulse_amplitude: 0.0,
        ..Default::default()
    };
    let source = shader::assembly_shader(&params);
    assert!(source.contains("const WINDOW: f32 = 0.25;"));
    validate_wgsl(&source).unwrap();
}

#[test]
fn test_non_finite_tunable_still_validates() {
    let params = AssemblyParams {
        drift_amplitude: f32::NAN,
        ..Default::default()
    };
    validate_wgsl(&shader::assembly_shader(&params)).unwrap();
}

#[test]
fn test_flow_shader_validates() {
    let module = validate_wgsl(&shader::flow_shader(&FlowParams::default())).unwrap();
    assert!(has_vertex_entry(&module, FLOW_ENTRY));
}

#[test]
fn test_sprite_shader_validates() {
    let module = validate_wgsl(&shader::sprite_shader()).unwrap();
    assert!(has_vertex_entry(&module, SPRITE_ENTRY));
}
