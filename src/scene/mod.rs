//! The loaded-scene data model shared by every scene loader.
//!
//! A [`Scene`] owns flat mesh and material tables plus a tree of [`Node`]s
//! that reference meshes by index. Transforms live on the nodes; meshes keep
//! their vertex data untransformed, so one mesh can be instanced by several
//! nodes.

use cgmath::{Matrix4, Point3, SquareMatrix, Transform, Vector3};

use crate::res::loaders::texture::Texture;
use crate::utils::FastHashSet;
use crate::video::format::AttributeFormat;
use crate::video::vao::VertexArray;
use crate::video::GpuDevice;

/// An axis-aligned bounding box in the space of whoever owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl BoundingBox {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        BoundingBox { min, max }
    }

    /// Grows the box to cover `other`.
    pub fn union(&mut self, other: &BoundingBox) {
        self.min.x = self.min.x.min(other.min.x);
        self.min.y = self.min.y.min(other.min.y);
        self.min.z = self.min.z.min(other.min.z);
        self.max.x = self.max.x.max(other.max.x);
        self.max.y = self.max.y.max(other.max.y);
        self.max.z = self.max.z.max(other.max.z);
    }

    /// The box covering all eight transformed corners. Axis alignment is
    /// re-established in the target space, so the result may be looser than
    /// the source box.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> BoundingBox {
        let mut result: Option<BoundingBox> = None;

        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point(corner);
            let v = Vector3::new(p.x, p.y, p.z);

            match result {
                Some(ref mut bbox) => bbox.union(&BoundingBox::new(v, v)),
                None => result = Some(BoundingBox::new(v, v)),
            }
        }

        result.unwrap()
    }
}

/// One semantic vertex channel a mesh carries: the shader attribute name it
/// binds to and its buffer format.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub format: AttributeFormat,
}

/// Surface parameters of a mesh. The texture, when present, modulates the
/// base color.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: Option<String>,
    pub base_color: [f32; 4],
    pub texture: Option<Texture>,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            texture: None,
            double_sided: false,
        }
    }
}

/// One drawable: a vertex array, the channels it carries and an optional
/// material index into [`Scene::materials`].
pub struct Mesh {
    pub name: Option<String>,
    pub vao: VertexArray,
    pub material: Option<usize>,
    pub attributes: Vec<AttributeInfo>,
    /// Bounds in mesh-local space, when the source format provides or
    /// implies them.
    pub bbox: Option<BoundingBox>,
}

/// A node in the scene tree: a local transform, an optional mesh index and
/// child nodes.
pub struct Node {
    pub name: Option<String>,
    pub transform: Matrix4<f32>,
    pub mesh: Option<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new() -> Self {
        Node {
            name: None,
            transform: Matrix4::identity(),
            mesh: None,
            children: Vec::new(),
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}

pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            name: None,
            nodes: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// The world-space bounds of the whole scene: every mesh bbox pushed
    /// through its node's accumulated transform. `None` when no referenced
    /// mesh carries bounds.
    pub fn calc_bbox(&self) -> Option<BoundingBox> {
        let mut result: Option<BoundingBox> = None;
        for node in &self.nodes {
            self.node_bbox(node, &Matrix4::identity(), &mut result);
        }
        result
    }

    fn node_bbox(
        &self,
        node: &Node,
        parent: &Matrix4<f32>,
        result: &mut Option<BoundingBox>,
    ) {
        let world = parent * node.transform;

        if let Some(index) = node.mesh {
            if let Some(bbox) = self.meshes.get(index).and_then(|m| m.bbox) {
                let bbox = bbox.transformed(&world);
                match result {
                    Some(ref mut acc) => acc.union(&bbox),
                    None => *result = Some(bbox),
                }
            }
        }

        for child in &node.children {
            self.node_bbox(child, &world, result);
        }
    }

    /// Releases every GPU object the scene owns: cached vertex-array
    /// objects, the vertex and index buffers behind them, and material
    /// textures. Shared texture handles are deleted once.
    pub fn release<G: GpuDevice>(&mut self, device: &mut G) {
        for mesh in &mut self.meshes {
            mesh.vao.release(device, true);
        }

        let mut seen = FastHashSet::default();
        for material in &mut self.materials {
            if let Some(texture) = material.texture.take() {
                if seen.insert(texture.handle) {
                    device.delete_texture(texture.handle);
                }
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}
