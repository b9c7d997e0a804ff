use glam::{Mat4, Quat, Vec3};
use std::collections::BTreeMap;

/// Local transform written onto one joint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOffset {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl TransformOffset {
    pub const IDENTITY: Self = Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    /// Slerps rotation and lerps translation and scale toward `other`.
    pub fn blend(&self, other: &TransformOffset, factor: f32) -> TransformOffset {
        TransformOffset {
            translation: self.translation.lerp(other.translation, factor),
            rotation: self.rotation.slerp(other.rotation, factor),
            scale: self.scale.lerp(other.scale, factor),
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for TransformOffset {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Per-joint offsets for one instant, keyed by joint index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pose {
    joints: BTreeMap<u32, TransformOffset>,
}

impl Pose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, joint: u32) -> Option<&TransformOffset> {
        self.joints.get(&joint)
    }

    pub fn insert(&mut self, joint: u32, offset: TransformOffset) {
        self.joints.insert(joint, offset);
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &TransformOffset)> + '_ {
        self.joints.iter().map(|(joint, offset)| (*joint, offset))
    }

    /// Blends two poses joint by joint. Joints missing from either side are
    /// dropped from the result.
    pub fn blend(a: &Pose, b: &Pose, factor: f32) -> Pose {
        let joints = a
            .joints
            .iter()
            .filter_map(|(joint, offset)| b.joints.get(joint).map(|other| (*joint, offset.blend(other, factor))))
            .collect();
        Pose { joints }
    }
}

impl FromIterator<(u32, TransformOffset)> for Pose {
    fn from_iter<I: IntoIterator<Item = (u32, TransformOffset)>>(iter: I) -> Self {
        Pose { joints: iter.into_iter().collect() }
    }
}
