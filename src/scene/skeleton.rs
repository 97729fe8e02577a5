//! Skeleton Container
//!
//! An ordered list of named bones with parent indices, rest transforms and
//! pose transforms.
//!
//! # Invariants
//!
//! - Bone names are unique, non-empty and contain neither `:` nor `/` (both
//!   are separators of the track path syntax).
//! - A parent index always refers to an existing bone. The importer only ever
//!   parents a bone to a lower index, but the container accepts any index so
//!   that cyclic graphs stay detectable instead of being unrepresentable.
//! - [`Skeleton::process_order`] terminates for every graph: the sort is
//!   bounded to `N²` passes, and a graph that does not stabilize is reported
//!   as cyclic and processed in declaration order.

use glam::Affine3A;

use crate::errors::{Result, RigError};
use crate::import::AnimNodeKey;
use crate::scene::Transform;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    pub name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) rest: Affine3A,
    pub(crate) pose: Affine3A,
    pub(crate) global_pose: Affine3A,
    /// Shadow tree node mirrored by this bone, kept in lockstep on pose writes.
    pub(crate) anim_node: Option<AnimNodeKey>,
    sort_index: usize,
}

impl Bone {
    fn new(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            rest: Affine3A::IDENTITY,
            pose: Affine3A::IDENTITY,
            global_pose: Affine3A::IDENTITY,
            anim_node: None,
            sort_index: index,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn rest(&self) -> Affine3A {
        self.rest
    }

    #[inline]
    #[must_use]
    pub fn pose(&self) -> Affine3A {
        self.pose
    }

    #[inline]
    #[must_use]
    pub fn anim_node(&self) -> Option<AnimNodeKey> {
        self.anim_node
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skeleton {
    pub name: String,
    bones: Vec<Bone>,
    process_order: Vec<usize>,
    process_order_dirty: bool,
    cyclic: bool,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    // ========================================================================
    // Bones
    // ========================================================================

    /// Appends a root bone with identity rest and pose and returns its index.
    pub fn add_bone(&mut self, name: &str) -> Result<usize> {
        if !Self::is_valid_bone_name(name) {
            return Err(RigError::InvalidBoneName(name.to_string()));
        }
        if self.find_bone(name).is_some() {
            return Err(RigError::DuplicateBoneName(name.to_string()));
        }
        let index = self.bones.len();
        self.bones.push(Bone::new(name, index));
        self.process_order_dirty = true;
        Ok(index)
    }

    #[must_use]
    pub fn is_valid_bone_name(name: &str) -> bool {
        !name.is_empty() && !name.contains(':') && !name.contains('/')
    }

    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    #[must_use]
    pub fn bone_name(&self, bone: usize) -> Option<&str> {
        self.bones.get(bone).map(|b| b.name.as_str())
    }

    #[must_use]
    pub fn bone(&self, bone: usize) -> Option<&Bone> {
        self.bones.get(bone)
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn clear_bones(&mut self) {
        self.bones.clear();
        self.process_order.clear();
        self.process_order_dirty = true;
        self.cyclic = false;
    }

    fn check_index(&self, bone: usize) -> Result<()> {
        if bone < self.bones.len() {
            Ok(())
        } else {
            Err(RigError::BoneIndexOutOfBounds {
                index: bone,
                count: self.bones.len(),
            })
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    pub fn set_bone_parent(&mut self, bone: usize, parent: Option<usize>) -> Result<()> {
        self.check_index(bone)?;
        if let Some(p) = parent
            && (p >= self.bones.len() || p == bone)
        {
            return Err(RigError::InvalidParent { bone, parent: p });
        }
        self.bones[bone].parent = parent;
        self.process_order_dirty = true;
        Ok(())
    }

    #[must_use]
    pub fn bone_parent(&self, bone: usize) -> Option<usize> {
        self.bones.get(bone).and_then(|b| b.parent)
    }

    /// True if `ancestor` appears anywhere on the parent chain of `bone`.
    #[must_use]
    pub fn is_bone_parent_of(&self, bone: usize, ancestor: usize) -> bool {
        let mut current = self.bone_parent(bone);
        // A cyclic chain never reaches a root, so stop after visiting every bone once.
        for _ in 0..self.bones.len() {
            match current {
                Some(p) if p == ancestor => return true,
                Some(p) => current = self.bone_parent(p),
                None => return false,
            }
        }
        false
    }

    /// Turns `bone` into a root while keeping its rest in skeleton space.
    pub fn unparent_bone_and_rest(&mut self, bone: usize) -> Result<()> {
        self.check_index(bone)?;
        let mut rest = self.bones[bone].rest;
        let mut parent = self.bones[bone].parent;
        let mut steps = 0;
        while let Some(p) = parent {
            if steps >= self.bones.len() {
                return Err(RigError::CyclicHierarchy(self.name.clone()));
            }
            rest = self.bones[p].rest * rest;
            parent = self.bones[p].parent;
            steps += 1;
        }
        self.bones[bone].rest = rest;
        self.bones[bone].parent = None;
        self.process_order_dirty = true;
        Ok(())
    }

    // ========================================================================
    // Rest / Pose
    // ========================================================================

    pub fn set_bone_rest(&mut self, bone: usize, rest: Affine3A) -> Result<()> {
        self.check_index(bone)?;
        self.bones[bone].rest = rest;
        Ok(())
    }

    #[must_use]
    pub fn bone_rest(&self, bone: usize) -> Option<Affine3A> {
        self.bones.get(bone).map(|b| b.rest)
    }

    /// Sets the local pose of one bone. Global poses are not touched; they are
    /// refreshed by [`update_global_poses`](Self::update_global_poses).
    pub fn set_bone_pose(&mut self, bone: usize, pose: Affine3A) -> Result<()> {
        self.check_index(bone)?;
        self.bones[bone].pose = pose;
        Ok(())
    }

    #[must_use]
    pub fn bone_pose(&self, bone: usize) -> Option<Affine3A> {
        self.bones.get(bone).map(|b| b.pose)
    }

    #[must_use]
    pub fn bone_global_pose(&self, bone: usize) -> Option<Affine3A> {
        self.bones.get(bone).map(|b| b.global_pose)
    }

    /// Writes a bind-relative keyframe: `pose = rest * key`.
    pub fn apply_track_key(&mut self, bone: usize, key: &Transform) -> Result<Affine3A> {
        self.check_index(bone)?;
        let pose = self.bones[bone].rest * key.to_affine();
        self.bones[bone].pose = pose;
        Ok(pose)
    }

    /// Resets every pose to its rest.
    pub fn reset_poses(&mut self) {
        for bone in &mut self.bones {
            bone.pose = bone.rest;
        }
    }

    pub(crate) fn set_bone_anim_node(&mut self, bone: usize, node: AnimNodeKey) -> Result<()> {
        self.check_index(bone)?;
        self.bones[bone].anim_node = Some(node);
        Ok(())
    }

    /// Converts skeleton-space rests into parent-relative rests.
    pub fn localize_rests(&mut self) -> Result<()> {
        let cycle = self.update_process_order();
        for i in (0..self.bones.len()).rev() {
            let idx = self.process_order[i];
            if let Some(parent) = self.bones[idx].parent {
                self.bones[idx].rest = self.bones[parent].rest.inverse() * self.bones[idx].rest;
            }
        }
        cycle
    }

    // ========================================================================
    // Process order
    // ========================================================================

    /// Order in which bones must be processed so that parents come first.
    pub fn process_order(&mut self) -> &[usize] {
        // A cycle is reported by `update_process_order`; the fallback order is still usable.
        let _ = self.update_process_order();
        &self.process_order
    }

    /// True if the last ordering pass found a cycle.
    #[inline]
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// Recomputes the process order if the hierarchy changed.
    ///
    /// Bubble-sorts parents in front of their children, bounded to `N²` passes.
    /// On a cycle the order falls back to declaration order and
    /// [`RigError::CyclicHierarchy`] is returned.
    pub fn update_process_order(&mut self) -> Result<()> {
        if !self.process_order_dirty && self.process_order.len() == self.bones.len() {
            return if self.cyclic {
                Err(RigError::CyclicHierarchy(self.name.clone()))
            } else {
                Ok(())
            };
        }

        let len = self.bones.len();
        let mut order: Vec<usize> = (0..len).collect();
        for (i, bone) in self.bones.iter_mut().enumerate() {
            bone.sort_index = i;
        }

        let max_passes = len * len;
        let mut pass_count = 0;
        let mut stable = false;
        while pass_count < max_passes {
            let mut swapped = false;
            for i in 0..len {
                let Some(parent) = self.bones[order[i]].parent else {
                    continue;
                };
                let parent_order = self.bones[parent].sort_index;
                if parent_order > i {
                    self.bones[order[i]].sort_index = parent_order;
                    self.bones[parent].sort_index = i;
                    order.swap(i, parent_order);
                    swapped = true;
                }
            }
            if !swapped {
                stable = true;
                break;
            }
            pass_count += 1;
        }

        self.process_order_dirty = false;
        // An empty or parentless skeleton never enters the loop.
        if stable || max_passes == 0 {
            self.process_order = order;
            self.cyclic = false;
            Ok(())
        } else {
            self.process_order = (0..len).collect();
            for (i, bone) in self.bones.iter_mut().enumerate() {
                bone.sort_index = i;
            }
            self.cyclic = true;
            Err(RigError::CyclicHierarchy(self.name.clone()))
        }
    }

    /// Recomputes `global_pose = parent.global_pose * pose` in process order.
    ///
    /// A cyclic skeleton is still updated in declaration order; the cycle is
    /// returned as an error afterwards.
    pub fn update_global_poses(&mut self) -> Result<()> {
        let ordering = self.update_process_order();
        for i in 0..self.process_order.len() {
            let idx = self.process_order[i];
            let pose = self.bones[idx].pose;
            self.bones[idx].global_pose = match self.bones[idx].parent {
                Some(parent) => self.bones[parent].global_pose * pose,
                None => pose,
            };
        }
        ordering
    }
}
