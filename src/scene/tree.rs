use glam::Affine3A;
use slotmap::SlotMap;

use crate::errors::{Result, RigError};
use crate::scene::{NodeHandle, SceneNode};

/// Arena-backed output node hierarchy.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: SlotMap<NodeHandle, SceneNode>,
    root: Option<NodeHandle>,
}

impl SceneTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_root(&mut self, node: SceneNode) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root = Some(handle);
        handle
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    pub fn add_child(&mut self, parent: NodeHandle, mut node: SceneNode) -> Result<NodeHandle> {
        if !self.nodes.contains_key(parent) {
            return Err(RigError::NodeNotFound(format!("parent of '{}'", node.name)));
        }
        node.parent = Some(parent);
        let handle = self.nodes.insert(node);
        self.nodes[parent].children.push(handle);
        Ok(handle)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.nodes.get_mut(handle)
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

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &SceneNode)> {
        self.nodes.iter()
    }

    /// First node with this name in preorder.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeHandle> {
        let mut stack: Vec<NodeHandle> = self.root.into_iter().collect();
        while let Some(handle) = stack.pop() {
            let node = &self.nodes[handle];
            if node.name == name {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Path of a node relative to the root: child names joined by `/`,
    /// `.` for the root itself.
    #[must_use]
    pub fn path_to(&self, handle: NodeHandle) -> Option<String> {
        let mut names = Vec::new();
        let mut current = handle;
        loop {
            let node = self.nodes.get(current)?;
            match node.parent {
                Some(parent) => {
                    names.push(node.name.as_str());
                    current = parent;
                }
                None => break,
            }
        }
        if names.is_empty() {
            return Some(".".to_string());
        }
        names.reverse();
        Some(names.join("/"))
    }

    /// Resolves a path produced by [`path_to`](Self::path_to).
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<NodeHandle> {
        let mut current = self.root?;
        if path == "." {
            return Some(current);
        }
        for segment in path.split('/') {
            current = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].name == segment)?;
        }
        Some(current)
    }

    /// World transform: local transforms concatenated from the root down.
    #[must_use]
    pub fn world_transform(&self, handle: NodeHandle) -> Option<Affine3A> {
        let mut node = self.nodes.get(handle)?;
        let mut world = node.transform;
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            world = node.transform * world;
        }
        Some(world)
    }
}
