//! Scene graph of a loaded asset.
//!
//! Nodes live in an arena ([`SceneAsset::nodes`]) and reference their
//! children by [`NodeId`]. Ids follow the document order of the source file,
//! which keeps animation channel targets stable. Traversal is depth-first,
//! parent before children, siblings in insertion order.

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use crate::data_structures::{bounds::Aabb, instance::Instance, material::Material};

pub type NodeId = usize;

/// Vertex data of a single primitive.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Fill in missing normals/texture coordinates and indices so every
    /// attribute has one entry per vertex.
    pub fn complete(mut self) -> Self {
        let count = self.positions.len();
        if self.normals.len() != count {
            self.normals = vec![[0.0, 1.0, 0.0]; count];
        }
        if self.tex_coords.len() != count {
            self.tex_coords = vec![[0.0, 0.0]; count];
        }
        if self.indices.is_empty() {
            self.indices = (0..count as u32).collect();
        }
        self
    }
}

/// A drawable part of a mesh with its own material slot.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub geometry: Geometry,
    /// Index into [`Mesh::materials`].
    pub material: usize,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    /// One slot per sub-material. `None` means the source had no material.
    pub materials: Vec<Option<Material>>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    /// A mesh whose primitives each get their own material slot.
    pub fn new(name: Option<String>, parts: Vec<(Geometry, Option<Material>)>) -> Self {
        let (primitives, materials) = parts
            .into_iter()
            .enumerate()
            .map(|(slot, (geometry, material))| {
                (
                    Primitive {
                        geometry,
                        material: slot,
                    },
                    material,
                )
            })
            .unzip();
        Self {
            name,
            primitives,
            materials,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub local: Instance,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn group(name: Option<String>) -> Self {
        Self {
            name,
            local: Instance::default(),
            children: Vec::new(),
            kind: NodeKind::Group,
        }
    }

    pub fn mesh(name: Option<String>, mesh: Mesh) -> Self {
        Self {
            name,
            local: Instance::default(),
            children: Vec::new(),
            kind: NodeKind::Mesh(mesh),
        }
    }

    pub fn with_local(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn as_mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group => None,
        }
    }
}

/// The loaded 3D content: a node arena, its roots and a transform applied above all roots.
#[derive(Clone, Debug, Default)]
pub struct SceneAsset {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
    pub root_transform: Instance,
}

impl SceneAsset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_root(&mut self, node: SceneNode) -> NodeId {
        let id = self.add_node(node);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = self.add_node(node);
        self.attach(parent, id);
        id
    }

    /// Make `child` the last child of `parent`. Ids out of range are ignored.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if child >= self.nodes.len() {
            log::warn!("Cannot attach unknown node {} to {}", child, parent);
            return;
        }
        match self.nodes.get_mut(parent) {
            Some(node) => node.children.push(child),
            None => log::warn!("Cannot attach node {} to unknown parent {}", child, parent),
        }
    }

    pub fn mark_root(&mut self, id: NodeId) {
        if id < self.nodes.len() && !self.roots.contains(&id) {
            self.roots.push(id);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first pre-order over every node reachable from the roots.
    ///
    /// A node reachable twice (malformed input) is only visited the first time.
    pub fn traversal_order(&self) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            match visited.get_mut(id) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            order.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        order
    }

    pub fn mesh_ids(&self) -> Vec<NodeId> {
        self.traversal_order()
            .into_iter()
            .filter(|&id| self.nodes[id].as_mesh().is_some())
            .collect()
    }

    /// World matrix of every reachable node, `None` for unreachable ones.
    pub fn world_matrices(&self) -> Vec<Option<Matrix4<f32>>> {
        let mut world = vec![None; self.nodes.len()];
        let root = self.root_transform.to_matrix();
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeId, Matrix4<f32>)> =
            self.roots.iter().rev().map(|&id| (id, root)).collect();
        while let Some((id, parent)) = stack.pop() {
            match visited.get_mut(id) {
                Some(seen) if !*seen => *seen = true,
                _ => continue,
            }
            let node = &self.nodes[id];
            let matrix = parent * node.local.to_matrix();
            world[id] = Some(matrix);
            stack.extend(node.children.iter().rev().map(|&child| (child, matrix)));
        }
        world
    }

    /// World-space box around every vertex of every reachable mesh.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let world = self.world_matrices();
        let points = self
            .nodes
            .iter()
            .zip(world.iter())
            .filter_map(|(node, matrix)| Some((node.as_mesh()?, (*matrix)?)))
            .flat_map(|(mesh, matrix)| {
                mesh.primitives.iter().flat_map(move |primitive| {
                    primitive.geometry.positions.iter().map(move |p| {
                        let point = matrix * Vector4::new(p[0], p[1], p[2], 1.0);
                        Vector3::new(point.x, point.y, point.z)
                    })
                })
            });
        Aabb::from_points(points)
    }

    /// Normal matrix (inverse transpose of the upper 3x3) for a world matrix.
    pub fn normal_matrix(world: &Matrix4<f32>) -> Matrix4<f32> {
        world
            .invert()
            .map(|inverse| {
                use cgmath::Matrix;
                let mut normal = inverse.transpose();
                normal.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
                normal.x.w = 0.0;
                normal.y.w = 0.0;
                normal.z.w = 0.0;
                normal
            })
            .unwrap_or_else(Matrix4::identity)
    }
}
