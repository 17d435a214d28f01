//! Loaded scene graph
//!
//! A flat, read-only view of the model the backend finished loading: named
//! nodes, their positions, and the material attached to each mesh. Handles
//! are allocated here the way a model loader would, with every mesh that
//! uses the same material name sharing one [`MaterialRef`].

use crate::foundation::math::Vec3;
use crate::render::{MaterialRef, ObjectRef};
use std::collections::HashMap;

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).magnitude()
    }

    /// Smallest box containing both
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

/// Mesh attached to a node
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding {
    /// Material handle, shared by every mesh using the same material
    pub material: MaterialRef,
    /// Material name as authored in the model
    pub material_name: String,
    /// Local-space bounds, centered on the node position
    pub bounds: AABB,
}

/// Named node of the loaded model
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name as authored in the model
    pub name: String,
    /// Backend handle
    pub object: ObjectRef,
    /// Position relative to the model root
    pub position: Vec3,
    /// Mesh, if the node has one
    pub mesh: Option<MeshBinding>,
}

/// The loaded model
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    materials: HashMap<String, MaterialRef>,
    next_object: u64,
}

impl SceneGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without geometry
    pub fn add_node(&mut self, name: impl Into<String>, position: Vec3) -> ObjectRef {
        let object = self.allocate_object();
        self.nodes.push(SceneNode {
            name: name.into(),
            object,
            position,
            mesh: None,
        });
        object
    }

    /// Add a mesh node using material `material_name`
    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        position: Vec3,
        material_name: &str,
        half_extents: Vec3,
    ) -> (ObjectRef, MaterialRef) {
        let object = self.allocate_object();
        let next_material = MaterialRef(self.materials.len() as u64);
        let material = *self
            .materials
            .entry(material_name.to_string())
            .or_insert(next_material);

        self.nodes.push(SceneNode {
            name: name.into(),
            object,
            position,
            mesh: Some(MeshBinding {
                material,
                material_name: material_name.to_string(),
                bounds: AABB::from_center_extents(position, half_extents),
            }),
        });
        (object, material)
    }

    /// All nodes in load order
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// First node named `name`
    pub fn find_by_name(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Nodes that carry a mesh, with the mesh
    pub fn meshes(&self) -> impl Iterator<Item = (&SceneNode, &MeshBinding)> {
        self.nodes
            .iter()
            .filter_map(|node| node.mesh.as_ref().map(|mesh| (node, mesh)))
    }

    /// Distinct materials, by name
    pub fn materials(&self) -> impl Iterator<Item = (&str, MaterialRef)> {
        self.materials.iter().map(|(name, material)| (name.as_str(), *material))
    }

    /// Bounds of all meshes, `None` for a model without geometry
    pub fn bounds(&self) -> Option<AABB> {
        self.meshes()
            .map(|(_, mesh)| mesh.bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
    }

    fn allocate_object(&mut self) -> ObjectRef {
        let object = ObjectRef(self.next_object);
        self.next_object += 1;
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_union_and_diagonal() {
        let a = AABB::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let b = AABB::new(Vec3::new(0.0, -2.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        let both = a.union(&b);

        assert_eq!(both.min, Vec3::new(-1.0, -2.0, -1.0));
        assert_eq!(both.max, Vec3::new(3.0, 2.0, 1.0));
        assert_eq!(both.center(), Vec3::new(1.0, 0.0, 0.0));
        assert!((both.diagonal() - (16.0f32 + 16.0 + 4.0).sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_meshes_share_material_handles() {
        let mut graph = SceneGraph::new();
        let (_, lamp_a) = graph.add_mesh("lamp_a", Vec3::zeros(), "neon_lamp", Vec3::repeat(0.5));
        let (_, lamp_b) = graph.add_mesh("lamp_b", Vec3::x(), "neon_lamp", Vec3::repeat(0.5));
        let (_, sign) = graph.add_mesh("sign", Vec3::y(), "BarNeon", Vec3::repeat(0.5));
        let car = graph.add_node("delorean_fly", Vec3::zeros());

        assert_eq!(lamp_a, lamp_b);
        assert_ne!(lamp_a, sign);
        assert_eq!(graph.materials().count(), 2);
        assert_eq!(graph.find_by_name("delorean_fly").map(|n| n.object), Some(car));
        assert_eq!(graph.meshes().count(), 3);
    }

    #[test]
    fn test_bounds_without_geometry() {
        let mut graph = SceneGraph::new();
        graph.add_node("empty", Vec3::zeros());
        assert!(graph.bounds().is_none());
    }
}
