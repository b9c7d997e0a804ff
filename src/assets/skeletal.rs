use super::{build_keyframes, root_motion, ClipInterpolation, ClipKeyframe};
use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::{ReadOutputs, Rotations};
use gltf::animation::{Interpolation, Property};
use rayon::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct SkeletonJoint {
    pub name: Arc<str>,
    pub node_index: usize,
    pub parent: Option<u32>,
    pub rest_local: Mat4,
    pub rest_world: Mat4,
    pub rest_translation: Vec3,
    pub rest_rotation: Quat,
    pub rest_scale: Vec3,
    pub inverse_bind: Mat4,
}

#[derive(Clone, Debug)]
pub struct SkeletonAsset {
    pub name: Arc<str>,
    pub joints: Arc<[SkeletonJoint]>,
    pub roots: Arc<[u32]>,
    /// Joint indices ordered so every parent precedes its children.
    pub order: Arc<[u32]>,
}

impl SkeletonAsset {
    pub fn new(name: impl Into<Arc<str>>, joints: Vec<SkeletonJoint>) -> Self {
        let parents: Vec<Option<u32>> = joints.iter().map(|joint| joint.parent).collect();
        let roots: Vec<u32> =
            parents.iter().enumerate().filter(|(_, p)| p.is_none()).map(|(idx, _)| idx as u32).collect();
        let order = parent_first_order(&parents);
        Self {
            name: name.into(),
            joints: Arc::from(joints.into_boxed_slice()),
            roots: Arc::from(roots.into_boxed_slice()),
            order: Arc::from(order.into_boxed_slice()),
        }
    }

    pub fn joint_index(&self, name: &str) -> Option<u32> {
        self.joints.iter().position(|joint| joint.name.as_ref() == name).map(|idx| idx as u32)
    }

    pub fn joint(&self, index: u32) -> Option<&SkeletonJoint> {
        self.joints.get(index as usize)
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

#[derive(Clone, Debug)]
pub struct JointVec3Track {
    pub interpolation: ClipInterpolation,
    pub keyframes: Arc<[ClipKeyframe<Vec3>]>,
}

impl JointVec3Track {
    pub fn new(interpolation: ClipInterpolation, times: &[f32], values: Vec<Vec3>) -> Result<Self> {
        Ok(Self { interpolation, keyframes: build_keyframes(times, values)? })
    }

    pub fn linear(keys: &[(f32, Vec3)]) -> Result<Self> {
        let (times, values): (Vec<f32>, Vec<Vec3>) = keys.iter().copied().unzip();
        Self::new(ClipInterpolation::Linear, &times, values)
    }

    pub fn constant(value: Vec3) -> Self {
        Self {
            interpolation: ClipInterpolation::Step,
            keyframes: Arc::from(vec![ClipKeyframe { time: 0.0, value }].into_boxed_slice()),
        }
    }

    pub fn last_time(&self) -> f32 {
        self.keyframes.last().map(|kf| kf.time).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct JointQuatTrack {
    pub interpolation: ClipInterpolation,
    pub keyframes: Arc<[ClipKeyframe<Quat>]>,
}

impl JointQuatTrack {
    pub fn new(interpolation: ClipInterpolation, times: &[f32], values: Vec<Quat>) -> Result<Self> {
        Ok(Self { interpolation, keyframes: build_keyframes(times, values)? })
    }

    pub fn linear(keys: &[(f32, Quat)]) -> Result<Self> {
        let (times, values): (Vec<f32>, Vec<Quat>) = keys.iter().copied().unzip();
        Self::new(ClipInterpolation::Linear, &times, values)
    }

    pub fn constant(value: Quat) -> Self {
        Self {
            interpolation: ClipInterpolation::Step,
            keyframes: Arc::from(vec![ClipKeyframe { time: 0.0, value }].into_boxed_slice()),
        }
    }

    pub fn last_time(&self) -> f32 {
        self.keyframes.last().map(|kf| kf.time).unwrap_or(0.0)
    }
}

/// Channels of one joint. Each present property is one keyframe channel.
#[derive(Clone, Debug)]
pub struct JointCurve {
    pub joint_index: u32,
    pub translation: Option<JointVec3Track>,
    pub rotation: Option<JointQuatTrack>,
    pub scale: Option<JointVec3Track>,
}

impl JointCurve {
    pub fn new(joint_index: u32) -> Self {
        Self { joint_index, translation: None, rotation: None, scale: None }
    }

    pub fn with_translation(mut self, track: JointVec3Track) -> Self {
        self.translation = Some(track);
        self
    }

    pub fn with_rotation(mut self, track: JointQuatTrack) -> Self {
        self.rotation = Some(track);
        self
    }

    pub fn with_scale(mut self, track: JointVec3Track) -> Self {
        self.scale = Some(track);
        self
    }

    fn last_time(&self) -> f32 {
        let mut last = 0.0_f32;
        if let Some(track) = &self.translation {
            last = last.max(track.last_time());
        }
        if let Some(track) = &self.rotation {
            last = last.max(track.last_time());
        }
        if let Some(track) = &self.scale {
            last = last.max(track.last_time());
        }
        last
    }
}

#[derive(Clone, Debug)]
pub struct SkeletalClip {
    pub name: Arc<str>,
    pub skeleton: Arc<str>,
    pub duration: f32,
    pub channels: Arc<[JointCurve]>,
    pub looped: bool,
    /// Root displacement per second, extracted at import time.
    pub velocity: Vec3,
}

impl SkeletalClip {
    /// Builds a clip whose duration is the last keyframe time over all channels.
    pub fn new(
        name: impl Into<Arc<str>>,
        skeleton: impl Into<Arc<str>>,
        channels: Vec<JointCurve>,
        looped: bool,
    ) -> Self {
        let duration = channels.iter().map(JointCurve::last_time).fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            skeleton: skeleton.into(),
            duration,
            channels: Arc::from(channels.into_boxed_slice()),
            looped,
            velocity: Vec3::ZERO,
        }
    }

    pub fn curve(&self, joint_index: u32) -> Option<&JointCurve> {
        self.channels.iter().find(|curve| curve.joint_index == joint_index)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ImportOptions {
    /// Joint whose translation carries root motion.
    pub root_joint: Option<String>,
    /// Decode clips on the rayon thread pool.
    pub parallel: bool,
    /// Clips that play once and hold their last frame. Every other clip loops.
    pub one_shot: Vec<String>,
}

impl ImportOptions {
    pub fn is_one_shot(&self, clip_name: &str) -> bool {
        self.one_shot.iter().any(|name| name == clip_name)
    }
}

#[derive(Clone, Debug)]
pub struct SkeletonImport {
    pub skeleton: SkeletonAsset,
    pub clips: Vec<SkeletalClip>,
}

pub fn load_skeleton_from_gltf(path: impl AsRef<Path>, options: &ImportOptions) -> Result<SkeletonImport> {
    let path_ref = path.as_ref();
    let (document, buffers, _) = gltf::import(path_ref)
        .with_context(|| format!("Failed to import GLTF skeleton from {}", path_ref.display()))?;

    let mut skins = document.skins();
    let skin =
        skins.next().ok_or_else(|| anyhow!("GLTF '{}' does not contain a skin", path_ref.display()))?;
    if skins.next().is_some() {
        log::warn!("GLTF '{}' contains multiple skins; only the first will be imported.", path_ref.display());
    }

    let skeleton_name: Arc<str> = Arc::<str>::from(
        skin.name()
            .map(|s| s.to_string())
            .or_else(|| {
                path_ref.file_stem().and_then(|stem| stem.to_str()).map(|stem| format!("{stem}_skeleton"))
            })
            .unwrap_or_else(|| "skeleton".to_string()),
    );

    let joint_nodes: Vec<_> = skin.joints().collect();
    if joint_nodes.is_empty() {
        bail!("GLTF '{}' skin '{}' has no joints", path_ref.display(), skeleton_name);
    }

    let node_to_joint: HashMap<usize, u32> =
        joint_nodes.iter().enumerate().map(|(idx, node)| (node.index(), idx as u32)).collect();

    let mut node_local: HashMap<usize, Mat4> = HashMap::new();
    let mut node_trs: HashMap<usize, (Vec3, Quat, Vec3)> = HashMap::new();
    let mut parent_of_node: HashMap<usize, usize> = HashMap::new();
    for node in document.nodes() {
        let node_index = node.index();
        node_local.insert(node_index, mat4_from_gltf(node.transform().matrix()));
        let (t, r, s) = node.transform().decomposed();
        let translation = Vec3::from_array(t);
        let rotation = Quat::from_xyzw(r[0], r[1], r[2], r[3]).normalize();
        let scale = Vec3::from_array(s);
        node_trs.insert(node_index, (translation, rotation, scale));
        for child in node.children() {
            parent_of_node.insert(child.index(), node_index);
        }
    }

    let skin_reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    let mut inverse_bind = vec![Mat4::IDENTITY; joint_nodes.len()];
    if let Some(reader) = skin_reader.read_inverse_bind_matrices() {
        for (idx, matrix) in reader.enumerate() {
            if idx < inverse_bind.len() {
                inverse_bind[idx] = mat4_from_gltf(matrix);
            }
        }
    }

    let mut parent_by_joint: Vec<Option<u32>> = vec![None; joint_nodes.len()];
    for (parent_idx, node) in joint_nodes.iter().enumerate() {
        for child in node.children() {
            if let Some(&child_joint) = node_to_joint.get(&child.index()) {
                parent_by_joint[child_joint as usize] = Some(parent_idx as u32);
            }
        }
    }

    let mut world_cache: HashMap<usize, Mat4> = HashMap::new();
    let mut joints: Vec<SkeletonJoint> = Vec::with_capacity(joint_nodes.len());
    for (index, node) in joint_nodes.iter().enumerate() {
        let node_index = node.index();
        let rest_local = *node_local.get(&node_index).unwrap_or(&Mat4::IDENTITY);
        let rest_world = compute_world_matrix(node_index, &node_local, &parent_of_node, &mut world_cache);
        let joint_name = node.name().map(|n| n.to_string()).unwrap_or_else(|| format!("joint_{index}"));
        let (rest_translation, rest_rotation, rest_scale) =
            node_trs.get(&node_index).cloned().unwrap_or((Vec3::ZERO, Quat::IDENTITY, Vec3::ONE));
        joints.push(SkeletonJoint {
            name: Arc::<str>::from(joint_name),
            node_index,
            parent: parent_by_joint[index],
            rest_local,
            rest_world,
            rest_translation,
            rest_rotation,
            rest_scale,
            inverse_bind: inverse_bind[index],
        });
    }

    let skeleton_asset = SkeletonAsset::new(Arc::clone(&skeleton_name), joints);

    let context = ClipDecodeContext {
        buffers: &buffers,
        node_to_joint: &node_to_joint,
        skeleton: &skeleton_asset,
    };
    let animations: Vec<gltf::Animation<'_>> = document.animations().collect();
    let decoded: Vec<Option<SkeletalClip>> = if options.parallel && animations.len() > 1 {
        animations
            .par_iter()
            .enumerate()
            .map(|(anim_index, animation)| context.decode(anim_index, animation, options))
            .collect::<Result<Vec<_>>>()?
    } else {
        animations
            .iter()
            .enumerate()
            .map(|(anim_index, animation)| context.decode(anim_index, animation, options))
            .collect::<Result<Vec<_>>>()?
    };

    let root_joint = match options.root_joint.as_deref() {
        Some(name) => {
            let found = skeleton_asset.joint_index(name);
            if found.is_none() {
                log::warn!(
                    "Root joint '{name}' not found in skeleton '{skeleton_name}'; clips will report no root motion."
                );
            }
            found
        }
        None => None,
    };

    let mut clips: Vec<SkeletalClip> = Vec::with_capacity(decoded.len());
    for mut clip in decoded.into_iter().flatten() {
        if let Some(root) = root_joint {
            root_motion::neutralize_root_motion(&mut clip, &skeleton_asset, root);
        }
        log::debug!("Loaded clip '{}' ({:.3}s, {} curves)", clip.name, clip.duration, clip.channels.len());
        clips.push(clip);
    }

    Ok(SkeletonImport { skeleton: skeleton_asset, clips })
}

struct ClipDecodeContext<'a> {
    buffers: &'a [gltf::buffer::Data],
    node_to_joint: &'a HashMap<usize, u32>,
    skeleton: &'a SkeletonAsset,
}

impl ClipDecodeContext<'_> {
    fn decode(
        &self,
        anim_index: usize,
        animation: &gltf::Animation<'_>,
        options: &ImportOptions,
    ) -> Result<Option<SkeletalClip>> {
        let clip_name: Arc<str> = animation
            .name()
            .map(|n| Arc::<str>::from(n.to_string()))
            .unwrap_or_else(|| Arc::<str>::from(format!("animation_{anim_index}")));

        let mut curve_builders: HashMap<u32, JointCurveBuilder> = HashMap::new();

        for channel in animation.channels() {
            let target_node = channel.target().node();
            let Some(joint_index) = self.node_to_joint.get(&target_node.index()).copied() else {
                continue;
            };

            let interpolation = match channel.sampler().interpolation() {
                Interpolation::Linear => ClipInterpolation::Linear,
                Interpolation::Step => ClipInterpolation::Step,
                Interpolation::CubicSpline => {
                    log::warn!(
                        "Animation '{}' uses CubicSpline interpolation; skipping channel (node {}).",
                        clip_name,
                        target_node.index()
                    );
                    continue;
                }
            };

            let reader = channel.reader(|buffer| Some(&self.buffers[buffer.index()]));
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            if times.is_empty() {
                continue;
            }

            let Some(outputs) = reader.read_outputs() else {
                continue;
            };

            let builder = curve_builders.entry(joint_index).or_default();
            match (channel.target().property(), outputs) {
                (Property::Translation, ReadOutputs::Translations(values)) => {
                    let vec_values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                    let track = JointVec3Track::new(interpolation, &times, vec_values).with_context(|| {
                        format!("Animation '{}' translation channel (node {})", clip_name, target_node.index())
                    })?;
                    builder.translation = Some(track);
                }
                (Property::Scale, ReadOutputs::Scales(values)) => {
                    let vec_values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                    let track = JointVec3Track::new(interpolation, &times, vec_values).with_context(|| {
                        format!("Animation '{}' scale channel (node {})", clip_name, target_node.index())
                    })?;
                    builder.scale = Some(track);
                }
                (Property::Rotation, ReadOutputs::Rotations(rotations)) => {
                    let quat_values = convert_rotations(rotations);
                    let track = JointQuatTrack::new(interpolation, &times, quat_values).with_context(|| {
                        format!("Animation '{}' rotation channel (node {})", clip_name, target_node.index())
                    })?;
                    builder.rotation = Some(track);
                }
                (Property::MorphTargetWeights, _) => {
                    // Morph weights do not drive joints.
                }
                _ => {}
            }
        }

        let mut curves: Vec<JointCurve> = Vec::new();
        for (joint_index, builder) in curve_builders {
            let Some(joint) = self.skeleton.joint(joint_index) else {
                continue;
            };
            if let Some(curve) = builder.into_curve(joint_index, joint) {
                curves.push(curve);
            }
        }

        if curves.is_empty() {
            return Ok(None);
        }
        curves.sort_by_key(|curve| curve.joint_index);

        let looped = !options.is_one_shot(&clip_name);
        Ok(Some(SkeletalClip::new(clip_name, Arc::clone(&self.skeleton.name), curves, looped)))
    }
}

#[derive(Default)]
struct JointCurveBuilder {
    translation: Option<JointVec3Track>,
    rotation: Option<JointQuatTrack>,
    scale: Option<JointVec3Track>,
}

impl JointCurveBuilder {
    /// Properties the clip leaves unanimated hold the joint's rest value.
    fn into_curve(self, joint_index: u32, rest: &SkeletonJoint) -> Option<JointCurve> {
        if self.translation.is_none() && self.rotation.is_none() && self.scale.is_none() {
            return None;
        }
        Some(JointCurve {
            joint_index,
            translation: Some(self.translation.unwrap_or_else(|| JointVec3Track::constant(rest.rest_translation))),
            rotation: Some(self.rotation.unwrap_or_else(|| JointQuatTrack::constant(rest.rest_rotation))),
            scale: Some(self.scale.unwrap_or_else(|| JointVec3Track::constant(rest.rest_scale))),
        })
    }
}

fn parent_first_order(parents: &[Option<u32>]) -> Vec<u32> {
    let mut children: Vec<Vec<u32>> = vec![Vec::new(); parents.len()];
    let mut queue: VecDeque<u32> = VecDeque::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) if (*parent as usize) < parents.len() => children[*parent as usize].push(idx as u32),
            _ => queue.push_back(idx as u32),
        }
    }
    let mut order = Vec::with_capacity(parents.len());
    while let Some(idx) = queue.pop_front() {
        order.push(idx);
        queue.extend(children[idx as usize].iter().copied());
    }
    order
}

fn convert_rotations(rotations: Rotations) -> Vec<Quat> {
    rotations
        .into_f32()
        .map(|components| {
            let quat = Quat::from_xyzw(components[0], components[1], components[2], components[3]);
            if quat.length_squared() > 0.0 {
                quat.normalize()
            } else {
                Quat::IDENTITY
            }
        })
        .collect()
}

fn mat4_from_gltf(matrix: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&matrix)
}

fn compute_world_matrix(
    node_index: usize,
    node_local: &HashMap<usize, Mat4>,
    parent_map: &HashMap<usize, usize>,
    cache: &mut HashMap<usize, Mat4>,
) -> Mat4 {
    if let Some(world) = cache.get(&node_index) {
        return *world;
    }
    let local = *node_local.get(&node_index).unwrap_or(&Mat4::IDENTITY);
    let world = if let Some(parent_index) = parent_map.get(&node_index) {
        compute_world_matrix(*parent_index, node_local, parent_map, cache) * local
    } else {
        local
    };
    cache.insert(node_index, world);
    world
}
