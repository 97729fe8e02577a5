use glam::Affine3A;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::errors::{Result, RigError};
use crate::source::{SourceAnimation, SourceMesh, SourceNodeKey, SceneMetadata};

/// A node of the source scene graph.
///
/// Names are *not* unique: duplicate names are a tolerated quirk of the
/// source formats, so every lookup by name documents which match it takes.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub name: String,
    pub(crate) parent: Option<SourceNodeKey>,
    pub(crate) children: Vec<SourceNodeKey>,
    /// Local transform relative to the parent.
    pub transform: Affine3A,
    /// Indices into [`SourceScene::meshes`].
    pub meshes: SmallVec<[usize; 2]>,
    /// Set on armature nodes inserted by the importer.
    pub(crate) synthetic: bool,
}

impl SourceNode {
    #[must_use]
    pub fn new(name: &str, transform: Affine3A) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform,
            meshes: SmallVec::new(),
            synthetic: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<SourceNodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[SourceNodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn has_meshes(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// True for nodes the importer synthesized (armature roots).
    #[inline]
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

/// The parsed source scene consumed by the importer.
#[derive(Debug, Clone, Default)]
pub struct SourceScene {
    nodes: SlotMap<SourceNodeKey, SourceNode>,
    root: Option<SourceNodeKey>,
    pub meshes: Vec<SourceMesh>,
    pub animations: Vec<SourceAnimation>,
    /// Names of light sources; nodes carrying these names become lights.
    pub lights: Vec<String>,
    /// Names of cameras; nodes carrying these names become cameras.
    pub cameras: Vec<String>,
    pub metadata: SceneMetadata,
}

impl SourceScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) the root node.
    pub fn set_root(&mut self, name: &str, transform: Affine3A) -> SourceNodeKey {
        let key = self.nodes.insert(SourceNode::new(name, transform));
        self.root = Some(key);
        key
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<SourceNodeKey> {
        self.root
    }

    /// Appends a new child under `parent`.
    pub fn add_child(&mut self, parent: SourceNodeKey, name: &str, transform: Affine3A) -> Result<SourceNodeKey> {
        self.insert_child(parent, SourceNode::new(name, transform))
    }

    pub(crate) fn insert_child(&mut self, parent: SourceNodeKey, mut node: SourceNode) -> Result<SourceNodeKey> {
        if !self.nodes.contains_key(parent) {
            return Err(RigError::NodeNotFound(format!("parent of '{}'", node.name)));
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        Ok(key)
    }

    /// Registers a mesh and returns its index.
    pub fn add_mesh(&mut self, mesh: SourceMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Makes `node` reference the mesh at `mesh_index`.
    pub fn attach_mesh(&mut self, node: SourceNodeKey, mesh_index: usize) -> Result<()> {
        if mesh_index >= self.meshes.len() {
            return Err(RigError::MeshIndexOutOfBounds {
                index: mesh_index,
                count: self.meshes.len(),
            });
        }
        let node = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| RigError::NodeNotFound("mesh owner".into()))?;
        node.meshes.push(mesh_index);
        Ok(())
    }

    pub fn add_animation(&mut self, animation: SourceAnimation) -> usize {
        self.animations.push(animation);
        self.animations.len() - 1
    }

    #[inline]
    #[must_use]
    pub fn node(&self, key: SourceNodeKey) -> Option<&SourceNode> {
        self.nodes.get(key)
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn mesh(&self, index: usize) -> Option<&SourceMesh> {
        self.meshes.get(index)
    }

    /// Depth-first preorder of every node reachable from the root, root first,
    /// children in declaration order. This is the "flat node list" all
    /// deterministic passes iterate.
    #[must_use]
    pub fn preorder(&self) -> Vec<SourceNodeKey> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            order.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// First node with this name inside the subtree rooted at `scope`
    /// (including `scope` itself).
    #[must_use]
    pub fn find_node_in_subtree(&self, scope: SourceNodeKey, name: &str) -> Option<SourceNodeKey> {
        let mut stack = vec![scope];
        while let Some(key) = stack.pop() {
            let node = self.nodes.get(key)?;
            if node.name == name {
                return Some(key);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// True if any bone of any mesh carries this name.
    #[must_use]
    pub fn has_bone_named(&self, name: &str) -> bool {
        self.meshes
            .iter()
            .any(|mesh| mesh.bones.iter().any(|bone| bone.name == name))
    }
}
