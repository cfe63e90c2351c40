//! End-to-end pipeline tests over real patch bundles on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use patchdeck::bind::BindingLayer;
use patchdeck::bootstrap::{BootstrapError, Bootstrapper, OutputStage};
use patchdeck::device::AudioConfig;
use patchdeck::patch::{DirSource, ASSET_DIR, DESCRIPTOR_FILE, MANIFEST_FILE};
use patchdeck::presets::PresetSelector;

const DESCRIPTOR: &str = r#"{
    "meta": { "patchername": "rig-test", "runtimeversion": "1.4.0" },
    "parameters": [
        { "id": "frequency", "min": 20.0, "max": 2000.0, "initial": 220.0 },
        { "id": "gain", "min": 0.0, "max": 1.0, "initial": 0.5 },
        { "id": "mode", "min": 0.0, "max": 3.0, "steps": 4 }
    ],
    "presets": [
        { "payload": { "gain": 0.1 } },
        { "payload": { "gain": 0.9, "frequency": 440.0 } }
    ]
}"#;

fn write_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 48_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..64 {
        writer.write_sample((i * 100) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn bootstrap(dir: &Path) -> (patchdeck::bootstrap::LiveRig, OutputStage) {
    let source = DirSource::new(dir);
    let mut output = OutputStage::new();
    let rig = Bootstrapper::new(&source)
        .run(&AudioConfig::default(), &mut output)
        .expect("bootstrap should succeed");
    (rig, output)
}

#[test]
fn every_parameter_ends_up_with_a_matching_control_pair() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();

    let (rig, _) = bootstrap(dir.path());
    let device = Arc::clone(&rig.device);
    let binding = BindingLayer::build(rig.device, rig.changes);

    let device = device.lock().unwrap();
    assert_eq!(binding.pairs().len(), device.num_parameters());
    for param in device.parameters() {
        let pair = binding.pair(&param.id).expect("pair exists for parameter");
        assert_eq!(pair.slider.min, param.min);
        assert_eq!(pair.slider.max, param.max);
    }
}

#[test]
fn missing_manifest_still_bootstraps_with_zero_buffers() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();

    let (rig, output) = bootstrap(dir.path());
    assert!(output.is_connected());
    assert_eq!(rig.device.lock().unwrap().num_buffers(), 0);
}

#[test]
fn manifest_buffers_are_attached_from_the_asset_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();
    fs::write(
        dir.path().join(MANIFEST_FILE),
        r#"[
            { "id": "wavetable", "file": "table.wav" },
            { "id": "missing", "file": "nope.wav" },
            { "id": "unbound" }
        ]"#,
    )
    .unwrap();
    let assets = dir.path().join(ASSET_DIR);
    fs::create_dir(&assets).unwrap();
    write_wav(&assets.join("table.wav"));

    let (rig, _) = bootstrap(dir.path());
    // the broken and file-less entries are skipped, never fatal
    assert_eq!(rig.device.lock().unwrap().num_buffers(), 1);
}

#[test]
fn missing_descriptor_fails_with_the_configured_path_in_the_message() {
    let dir = tempfile::tempdir().unwrap();
    let source = DirSource::new(dir.path());
    let mut output = OutputStage::new();

    let err = Bootstrapper::new(&source)
        .run(&AudioConfig::default(), &mut output)
        .unwrap_err();

    assert!(matches!(err, BootstrapError::DescriptorMissing { .. }));
    let message = err.to_string();
    assert!(message.contains(DESCRIPTOR_FILE), "hint missing from: {message}");
    assert!(!output.is_connected());
}

#[test]
fn preset_selector_mirrors_the_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();

    let (rig, _) = bootstrap(dir.path());
    let device = Arc::clone(&rig.device);
    let mut selector =
        PresetSelector::build(Arc::clone(&device), rig.presets).expect("two presets declared");
    assert_eq!(selector.len(), 2);

    assert!(selector.select(1));
    let locked = device.lock().unwrap();
    let gain = locked.param_index("gain").unwrap();
    let freq = locked.param_index("frequency").unwrap();
    assert_eq!(locked.parameters()[gain].value(), 0.9);
    assert_eq!(locked.parameters()[freq].value(), 440.0);
}

#[test]
fn patch_without_presets_builds_no_selector() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(DESCRIPTOR_FILE),
        r#"{ "meta": { "patchername": "bare", "runtimeversion": "1.0.0" } }"#,
    )
    .unwrap();

    let (rig, _) = bootstrap(dir.path());
    assert!(PresetSelector::build(rig.device, rig.presets).is_none());
}

#[test]
fn drag_gate_holds_the_slider_through_a_preset_change() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();

    let (rig, _) = bootstrap(dir.path());
    let device = Arc::clone(&rig.device);
    let mut binding = BindingLayer::build(Arc::clone(&rig.device), rig.changes);
    let mut selector = PresetSelector::build(device, rig.presets).unwrap();

    binding.gesture_start("gain");
    selector.select(0); // device-originated changes while dragging
    binding.poll_changes();

    let pair = binding.pair("gain").unwrap();
    assert_eq!(pair.text.content, "0.100");
    assert_eq!(pair.slider.position, 0.5, "slider must not move mid-drag");

    binding.gesture_end("gain");
    assert_eq!(binding.pair("gain").unwrap().slider.position, 0.1);
}

#[test]
fn connected_output_stage_renders_bounded_audio() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();

    let (_rig, mut output) = bootstrap(dir.path());
    let mut block = vec![0.0f32; 8_192];
    output.render(&mut block);

    assert!(block.iter().any(|s| s.abs() > 0.001));
    assert!(block.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn rebootstrapping_a_second_rig_is_independent() {
    // No partial-device state: a failed bootstrap leaves nothing behind,
    // and a later successful one starts clean.
    let dir = tempfile::tempdir().unwrap();
    let source = DirSource::new(dir.path());
    let mut output = OutputStage::new();

    assert!(Bootstrapper::new(&source)
        .run(&AudioConfig::default(), &mut output)
        .is_err());
    assert!(!output.is_connected());

    fs::write(dir.path().join(DESCRIPTOR_FILE), DESCRIPTOR).unwrap();
    let rig = Bootstrapper::new(&source)
        .run(&AudioConfig::default(), &mut output)
        .unwrap();
    assert!(output.is_connected());
    assert_eq!(rig.patch_name, "rig-test");
}
