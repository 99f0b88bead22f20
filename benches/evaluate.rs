//! Benchmarks for generation and per-frame evaluation.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rigcloud::animation::{self, AssemblyParams, AssemblyUniforms};
use rigcloud::noise::noise3;
use rigcloud::shader;
use rigcloud::{Sampler, Scene, SceneConfig, StructureConfig, Vec3};

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    group.bench_function("structure", |b| {
        let config = StructureConfig::default();
        b.iter(|| {
            let mut sampler = Sampler::seeded(1);
            black_box(config.build_particles(&mut sampler))
        })
    });

    group.bench_function("scene", |b| {
        b.iter(|| black_box(Scene::new(SceneConfig::default())))
    });

    group.finish();
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    let params = AssemblyParams::default();
    let set = match StructureConfig::default().build_particles(&mut Sampler::seeded(1)) {
        Ok(set) => set,
        Err(e) => panic!("default structure failed: {}", e),
    };
    let mut out = Vec::with_capacity(set.len());

    for build in [0.0f32, 0.5, 1.0] {
        group.bench_with_input(BenchmarkId::new("evaluate_into", build), &build, |b, &build| {
            let uniforms = AssemblyUniforms {
                time: 3.0,
                build_progress: build,
                ..Default::default()
            };
            b.iter(|| {
                animation::evaluate_into(&set, &uniforms, &params, &mut out);
                black_box(out.len())
            })
        });
    }

    group.bench_function("noise3", |b| {
        b.iter(|| black_box(noise3(black_box(Vec3::new(1.3, 4.2, -0.7)))))
    });

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut scene = match Scene::new(SceneConfig::default()) {
        Ok(scene) => scene,
        Err(e) => panic!("default scene failed: {}", e),
    };
    let mut tick = 0u32;
    c.bench_function("scene_frame", |b| {
        b.iter(|| {
            tick = tick.wrapping_add(1);
            let progress = (tick % 600) as f32 / 600.0;
            let frame = scene.frame(progress, tick as f32 / 60.0);
            black_box(frame.assembly.len())
        })
    });
}

fn bench_shader_gen(c: &mut Criterion) {
    let params = AssemblyParams::default();
    c.bench_function("assembly_shader", |b| b.iter(|| black_box(shader::assembly_shader(&params))));
}

criterion_group!(benches, bench_generation, bench_assembly, bench_frame, bench_shader_gen,);
criterion_main!(benches);
