//! Benchmarks for the device render path.
//!
//! Run with: cargo bench
//!
//! The output stage sits inside the audio callback, so a full
//! device-plus-stage render must finish comfortably inside the block
//! deadline (1.33ms for 64 samples at 48kHz, scaling linearly).

use std::hint::black_box;
use std::sync::{Arc, Mutex};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use patchdeck::bootstrap::OutputStage;
use patchdeck::device::AudioConfig;
use patchdeck::patch::{ParameterSpec, PatchDescriptor, PatchMeta};
use patchdeck::runtime::{BuiltinLoader, RuntimeLoader, RuntimeVersion};

/// Common buffer sizes used in audio applications.
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

fn test_patch() -> PatchDescriptor {
    let param = |id: &str, min: f64, max: f64, initial: f64| ParameterSpec {
        id: id.to_owned(),
        name: None,
        min,
        max,
        steps: None,
        initial: Some(initial),
        tag: None,
    };
    PatchDescriptor {
        meta: PatchMeta {
            name: "bench".to_owned(),
            runtime_version: "1.0.0".to_owned(),
        },
        parameters: vec![
            param("frequency", 20.0, 2_000.0, 220.0),
            param("gain", 0.0, 1.0, 0.8),
            param("cutoff", 20.0, 20_000.0, 4_000.0),
        ],
        presets: Vec::new(),
    }
}

fn bench_device_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/device");
    let runtime = BuiltinLoader
        .load(&RuntimeVersion::parse("1.0.0").unwrap())
        .unwrap();
    let config = AudioConfig { sample_rate: 48_000.0 };
    let mut device = runtime.create_device(&config, &test_patch()).unwrap();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("builtin", size), &size, |b, _| {
            b.iter(|| {
                device.render_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

fn bench_output_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/output_stage");
    let runtime = BuiltinLoader
        .load(&RuntimeVersion::parse("1.0.0").unwrap())
        .unwrap();
    let config = AudioConfig { sample_rate: 48_000.0 };
    let device = runtime.create_device(&config, &test_patch()).unwrap();

    let mut stage = OutputStage::new();
    stage.connect(Arc::new(Mutex::new(device)));
    stage.set_master_gain(0.9);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("connected", size), &size, |b, _| {
            b.iter(|| {
                stage.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_device_render, bench_output_stage);
criterion_main!(benches);
