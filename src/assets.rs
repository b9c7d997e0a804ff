use anyhow::{anyhow, bail, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

pub mod root_motion;
pub mod skeletal;

use skeletal::{ImportOptions, SkeletalClip, SkeletonAsset, SkeletonImport};

/// Clips of one skeleton addressed by clip name.
pub type ClipTable = HashMap<Arc<str>, Arc<SkeletalClip>>;

/// Skeletons and their clip tables, shared by key and reference counted.
#[derive(Default)]
pub struct AssetManager {
    skeletons: HashMap<String, LoadedSkeleton>,
}

struct LoadedSkeleton {
    asset: Arc<SkeletonAsset>,
    clips: ClipTable,
    refs: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipKeyframe<T> {
    pub time: f32,
    pub value: T,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipInterpolation {
    Step,
    Linear,
}

/// Validates keyframe times and builds a time-ordered keyframe list.
/// Keys sharing a time collapse into the last one supplied.
pub(crate) fn build_keyframes<T>(times: &[f32], values: Vec<T>) -> Result<Arc<[ClipKeyframe<T>]>> {
    if times.len() != values.len() {
        bail!("Animation channel time/value count mismatch ({} vs {})", times.len(), values.len());
    }
    if times.is_empty() {
        bail!("Animation channel has no keyframes");
    }
    let mut frames: Vec<(usize, ClipKeyframe<T>)> = Vec::with_capacity(times.len());
    for (index, (time, value)) in times.iter().copied().zip(values).enumerate() {
        if !time.is_finite() {
            return Err(anyhow!("Animation channel contains non-finite time value"));
        }
        if time < 0.0 {
            return Err(anyhow!("Animation channel time cannot be negative"));
        }
        frames.push((index, ClipKeyframe { time, value }));
    }
    frames.sort_by(|a, b| {
        let time_order = a.1.time.partial_cmp(&b.1.time).unwrap_or(Ordering::Equal);
        if time_order == Ordering::Equal {
            a.0.cmp(&b.0)
        } else {
            time_order
        }
    });
    let mut deduped: Vec<ClipKeyframe<T>> = Vec::with_capacity(frames.len());
    for (_, frame) in frames {
        if let Some(last) = deduped.last_mut() {
            if (frame.time - last.time).abs() <= f32::EPSILON {
                *last = frame;
                continue;
            }
        }
        deduped.push(frame);
    }
    Ok(Arc::from(deduped.into_boxed_slice()))
}

impl AssetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already imported skeleton and its clips under `key`,
    /// replacing whatever was stored there before. The reference count is kept.
    pub fn insert_skeleton(&mut self, key: &str, import: SkeletonImport) {
        let SkeletonImport { skeleton, clips } = import;
        let clips: ClipTable = clips.into_iter().map(|clip| (Arc::clone(&clip.name), Arc::new(clip))).collect();
        log::debug!("Registered skeleton '{key}' with {} clips", clips.len());
        let refs = self.skeletons.get(key).map_or(0, |loaded| loaded.refs);
        self.skeletons.insert(key.to_string(), LoadedSkeleton { asset: Arc::new(skeleton), clips, refs });
    }

    /// Takes a reference to the skeleton under `key`, importing `gltf_path`
    /// on first use.
    pub fn retain_skeleton(&mut self, key: &str, gltf_path: &str, options: &ImportOptions) -> Result<()> {
        if !self.skeletons.contains_key(key) {
            let import = skeletal::load_skeleton_from_gltf(gltf_path, options)?;
            self.insert_skeleton(key, import);
        }
        if let Some(loaded) = self.skeletons.get_mut(key) {
            loaded.refs += 1;
        }
        Ok(())
    }

    /// Drops one reference. The skeleton and its clips are unloaded when the
    /// last reference goes. Returns false if `key` held no reference.
    pub fn release_skeleton(&mut self, key: &str) -> bool {
        let Some(loaded) = self.skeletons.get_mut(key) else {
            return false;
        };
        if loaded.refs == 0 {
            return false;
        }
        loaded.refs -= 1;
        if loaded.refs == 0 {
            self.skeletons.remove(key);
            log::debug!("Unloaded skeleton '{key}'");
        }
        true
    }

    pub fn skeleton(&self, key: &str) -> Option<Arc<SkeletonAsset>> {
        self.skeletons.get(key).map(|loaded| Arc::clone(&loaded.asset))
    }

    /// Clip table of one skeleton keyed by clip name, ready to hand to an
    /// animation controller.
    pub fn clips_for(&self, skeleton_key: &str) -> ClipTable {
        self.skeletons.get(skeleton_key).map(|loaded| loaded.clips.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_keyframes_sorts_and_collapses_duplicate_times() {
        let frames = build_keyframes(&[0.5, 0.0, 0.5], vec![1, 2, 3]).expect("valid keyframes");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], ClipKeyframe { time: 0.0, value: 2 });
        assert_eq!(frames[1], ClipKeyframe { time: 0.5, value: 3 });
    }

    #[test]
    fn build_keyframes_rejects_bad_input() {
        assert!(build_keyframes::<i32>(&[], vec![]).is_err());
        assert!(build_keyframes(&[0.0, 1.0], vec![1]).is_err());
        assert!(build_keyframes(&[-1.0], vec![1]).is_err());
        assert!(build_keyframes(&[f32::NAN], vec![1]).is_err());
    }

    #[test]
    fn release_without_retain_is_rejected() {
        let mut assets = AssetManager::new();
        assert!(!assets.release_skeleton("missing"));
        assert!(assets.clips_for("missing").is_empty());
    }

    #[test]
    fn inserted_skeleton_needs_a_retain_before_release() {
        let mut assets = AssetManager::new();
        let skeleton = SkeletonAsset::new("rig", Vec::new());
        let clip = SkeletalClip::new("walk", "rig", Vec::new(), true);
        assets.insert_skeleton("avatar", SkeletonImport { skeleton, clips: vec![clip] });

        assert!(assets.skeleton("avatar").is_some());
        assert!(assets.clips_for("avatar").contains_key("walk"));
        assert!(!assets.release_skeleton("avatar"));
        assert!(assets.skeleton("avatar").is_some());
    }
}
