use crate::animation::{Pose, TransformOffset};
use crate::assets::skeletal::SkeletonAsset;
use glam::Mat4;
use std::sync::Arc;

/// Runtime joint hierarchy that receives published poses and produces the
/// skinning palette.
#[derive(Clone, Debug)]
pub struct SkeletonInstance {
    skeleton: Arc<SkeletonAsset>,
    locals: Vec<TransformOffset>,
    /// Transform above each root joint (non-joint ancestors); identity for
    /// non-root joints.
    root_bases: Vec<Mat4>,
    world: Vec<Mat4>,
    palette: Vec<Mat4>,
}

impl SkeletonInstance {
    pub fn new(skeleton: Arc<SkeletonAsset>) -> Self {
        let count = skeleton.joint_count();
        let locals = skeleton
            .joints
            .iter()
            .map(|joint| TransformOffset::new(joint.rest_translation, joint.rest_rotation, joint.rest_scale))
            .collect();
        let root_bases = skeleton
            .joints
            .iter()
            .map(|joint| match joint.parent {
                Some(_) => Mat4::IDENTITY,
                None => joint.rest_world * joint.rest_local.inverse(),
            })
            .collect();
        let mut instance = Self {
            skeleton,
            locals,
            root_bases,
            world: vec![Mat4::IDENTITY; count],
            palette: vec![Mat4::IDENTITY; count],
        };
        instance.update_world();
        instance
    }

    pub fn skeleton(&self) -> &Arc<SkeletonAsset> {
        &self.skeleton
    }

    pub fn joint_count(&self) -> usize {
        self.locals.len()
    }

    /// Writes every offset of `pose` onto its joint. Joints absent from the
    /// pose keep their previous transform.
    pub fn set_joints(&mut self, pose: &Pose) {
        for (joint, offset) in pose.iter() {
            match self.locals.get_mut(joint as usize) {
                Some(local) => *local = *offset,
                None => log::warn!("Pose joint {joint} outside skeleton '{}'", self.skeleton.name),
            }
        }
    }

    /// Recomputes world matrices parent-first and refreshes the palette.
    pub fn update_world(&mut self) {
        for &index in self.skeleton.order.iter() {
            let i = index as usize;
            let local = self.locals[i].to_mat4();
            let base = match self.skeleton.joints[i].parent {
                Some(parent) => self.world[parent as usize],
                None => self.root_bases[i],
            };
            self.world[i] = base * local;
            self.palette[i] = self.world[i] * self.skeleton.joints[i].inverse_bind;
        }
    }

    pub fn world_matrices(&self) -> &[Mat4] {
        &self.world
    }

    pub fn skin_matrices(&self) -> &[Mat4] {
        &self.palette
    }

    /// Palette as raw column-major `f32` bytes for upload.
    pub fn skin_matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.palette)
    }
}
