#![allow(dead_code)]

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a two-joint rig (Armature -> Hips -> Spine) with a `walk` clip
/// whose hips travel one unit along +Z per second and a two second `idle`.
pub fn write_rig_fixture(dir: &Path) -> Result<PathBuf> {
    let [qx, qy, qz, qw] = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2).to_array();
    let [lx, ly, lz, lw] = Quat::from_rotation_y(0.2).to_array();
    let mut floats: Vec<f32> = Vec::new();
    let mut views: Vec<(usize, usize)> = Vec::new();
    let mut push = |values: &[f32]| {
        let start = floats.len() * 4;
        floats.extend_from_slice(values);
        views.push((start, values.len() * 4));
    };

    // 0: inverse bind matrices
    push(&[
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.0, 0.0, 1.0, //
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, -1.5, 0.0, 1.0,
    ]);
    // 1, 2: walk hips translation
    push(&[0.0, 0.5, 1.0]);
    push(&[0.0, 1.0, 0.0, 0.0, 1.1, 0.5, 0.0, 1.0, 1.0]);
    // 3, 4: walk spine rotation
    push(&[0.0, 1.0]);
    push(&[0.0, 0.0, 0.0, 1.0, qx, qy, qz, qw]);
    // 5, 6: idle spine rotation
    push(&[0.0, 2.0]);
    push(&[0.0, 0.0, 0.0, 1.0, lx, ly, lz, lw]);

    let bytes: &[u8] = bytemuck::cast_slice(&floats);
    fs::write(dir.join("rig.bin"), bytes).context("write rig.bin")?;

    let buffer_views: Vec<String> = views
        .iter()
        .map(|(offset, length)| format!(r#"{{ "buffer": 0, "byteOffset": {offset}, "byteLength": {length} }}"#))
        .collect();
    let accessor = |view: usize, count: usize, kind: &str, bounds: Option<(f32, f32)>| {
        let bounds = bounds.map(|(min, max)| format!(r#", "min": [{min:.1}], "max": [{max:.1}]"#)).unwrap_or_default();
        format!(r#"{{ "bufferView": {view}, "componentType": 5126, "count": {count}, "type": "{kind}"{bounds} }}"#)
    };
    let accessors = [
        accessor(0, 2, "MAT4", None),
        accessor(1, 3, "SCALAR", Some((0.0, 1.0))),
        accessor(2, 3, "VEC3", None),
        accessor(3, 2, "SCALAR", Some((0.0, 1.0))),
        accessor(4, 2, "VEC4", None),
        accessor(5, 2, "SCALAR", Some((0.0, 2.0))),
        accessor(6, 2, "VEC4", None),
    ];

    let json = format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [
    {{ "name": "Armature", "children": [1] }},
    {{ "name": "Hips", "translation": [0.0, 1.0, 0.0], "children": [2] }},
    {{ "name": "Spine", "translation": [0.0, 0.5, 0.0] }}
  ],
  "skins": [{{ "name": "rig", "joints": [1, 2], "inverseBindMatrices": 0, "skeleton": 1 }}],
  "animations": [
    {{
      "name": "walk",
      "samplers": [
        {{ "input": 1, "output": 2, "interpolation": "LINEAR" }},
        {{ "input": 3, "output": 4, "interpolation": "LINEAR" }}
      ],
      "channels": [
        {{ "sampler": 0, "target": {{ "node": 1, "path": "translation" }} }},
        {{ "sampler": 1, "target": {{ "node": 2, "path": "rotation" }} }}
      ]
    }},
    {{
      "name": "idle",
      "samplers": [{{ "input": 5, "output": 6, "interpolation": "LINEAR" }}],
      "channels": [{{ "sampler": 0, "target": {{ "node": 2, "path": "rotation" }} }}]
    }}
  ],
  "buffers": [{{ "uri": "rig.bin", "byteLength": {byte_length} }}],
  "bufferViews": [{views}],
  "accessors": [{accessors}]
}}"#,
        byte_length = bytes.len(),
        views = buffer_views.join(", "),
        accessors = accessors.join(", "),
    );
    let path = dir.join("rig.gltf");
    fs::write(&path, json).context("write rig.gltf")?;
    Ok(path)
}

pub fn approx_vec3(actual: Vec3, expected: Vec3) {
    assert!((actual - expected).length() < 1e-4, "expected {expected:?}, got {actual:?}");
}

pub fn approx_quat(actual: Quat, expected: Quat) {
    let dot = actual.normalize().dot(expected.normalize()).abs();
    assert!(dot > 1.0 - 1e-4, "expected {expected:?}, got {actual:?}");
}
