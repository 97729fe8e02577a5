//! Shadow Node Tree
//!
//! One [`AnimNode`] per source node, bones or not. The skeleton only knows
//! about bones, but a plain node parented under an animated bone still moves
//! with it; the shadow tree is what gives such nodes a correct world placement
//! during playback.
//!
//! Links are slotmap keys into the tree's own arena. Parents are plain
//! back-references and own nothing.
//!
//! Global transforms are never updated from a single local write. A pose write
//! only touches `local`; [`AnimNodeTree::update_world_transforms`] recomputes
//! every global afterwards, once all siblings and ancestors hold their new
//! values.

use bitflags::bitflags;
use glam::Affine3A;
use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::source::{SourceNodeKey, SourceScene};

new_key_type! {
    pub struct AnimNodeKey;
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct AnimNodeFlags: u8 {
        const IS_BONE = 1 << 0;
        const IS_MESH = 1 << 1;
    }
}

#[derive(Debug, Clone)]
pub struct AnimNode {
    pub name: String,
    pub(crate) parent: Option<AnimNodeKey>,
    pub(crate) children: Vec<AnimNodeKey>,
    pub local: Affine3A,
    pub global: Affine3A,
    pub flags: AnimNodeFlags,
    /// 1 for bones, bone count of the first mesh for mesh nodes, else 0.
    pub bone_num: usize,
    pub mesh_num: usize,
    /// Index of the channel of the first animation that targets this node.
    pub channel_id: Option<usize>,
}

impl AnimNode {
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<AnimNodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[AnimNodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_bone(&self) -> bool {
        self.flags.contains(AnimNodeFlags::IS_BONE)
    }

    #[inline]
    #[must_use]
    pub fn is_mesh(&self) -> bool {
        self.flags.contains(AnimNodeFlags::IS_MESH)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimNodeTree {
    nodes: SlotMap<AnimNodeKey, AnimNode>,
    root: Option<AnimNodeKey>,
    by_source: SecondaryMap<SourceNodeKey, AnimNodeKey>,
}

impl AnimNodeTree {
    /// Mirrors the whole source tree, synthesized armatures included.
    pub fn build(scene: &SourceScene, diagnostics: &mut Diagnostics) -> Self {
        let mut tree = Self::default();
        let Some(root) = scene.root() else {
            return tree;
        };

        if scene.animations.len() > 1 {
            diagnostics.push(Diagnostic::MultipleAnimations {
                count: scene.animations.len(),
            });
        }
        let channels = scene.animations.first();

        let mut stack: Vec<(SourceNodeKey, Option<AnimNodeKey>)> = vec![(root, None)];
        while let Some((source_key, parent)) = stack.pop() {
            let Some(source) = scene.node(source_key) else {
                continue;
            };

            let mut flags = AnimNodeFlags::empty();
            flags.set(AnimNodeFlags::IS_BONE, scene.has_bone_named(&source.name));
            flags.set(AnimNodeFlags::IS_MESH, source.has_meshes());

            let bone_num = if flags.contains(AnimNodeFlags::IS_BONE) {
                1
            } else {
                source
                    .meshes
                    .first()
                    .and_then(|&m| scene.mesh(m))
                    .map_or(0, |m| m.bones.len())
            };

            let key = tree.nodes.insert(AnimNode {
                name: source.name.clone(),
                parent,
                children: Vec::new(),
                local: source.transform,
                global: source.transform,
                flags,
                bone_num,
                mesh_num: source.meshes.len(),
                channel_id: channels.and_then(|a| a.channel_index(&source.name)),
            });
            tree.by_source.insert(source_key, key);

            match parent {
                Some(p) => tree.nodes[p].children.push(key),
                None => tree.root = Some(key),
            }
            stack.extend(source.children().iter().rev().map(|&c| (c, Some(key))));
        }

        tree.update_world_transforms();
        tree
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<AnimNodeKey> {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: AnimNodeKey) -> Option<&AnimNode> {
        self.nodes.get(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Shadow node mirroring a source node.
    #[must_use]
    pub fn for_source(&self, source: SourceNodeKey) -> Option<AnimNodeKey> {
        self.by_source.get(source).copied()
    }

    /// First node with this name in preorder.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<AnimNodeKey> {
        let mut stack: Vec<AnimNodeKey> = self.root.into_iter().collect();
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.name == name {
                return Some(key);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Renames the first node called `old`. Returns false if none exists.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.find_by_name(old) {
            Some(key) => {
                self.nodes[key].name = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Writes a local transform. The global is left stale on purpose.
    pub fn set_local_transform(&mut self, key: AnimNodeKey, local: Affine3A) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.local = local;
                true
            }
            None => false,
        }
    }

    /// Global transform from the current locals, walking parents upward.
    #[must_use]
    pub fn global_transform(&self, key: AnimNodeKey) -> Option<Affine3A> {
        let mut node = self.nodes.get(key)?;
        let mut global = node.local;
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            global = node.local * global;
        }
        Some(global)
    }

    /// Scene-wide pass: `global = parent.global * local`, top-down.
    pub fn update_world_transforms(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![(root, Affine3A::IDENTITY)];
        while let Some((key, parent_global)) = stack.pop() {
            let node = &mut self.nodes[key];
            node.global = parent_global * node.local;
            let global = node.global;
            stack.extend(node.children.iter().map(|&c| (c, global)));
        }
    }
}
