pub mod demo;
pub mod mesh;
mod primitives;

use std::ops::Range;

use bon::Builder;
use index_vec::IndexVec;
use thiserror::Error;

use crate::{
    geometry::{FloatType, HitRecord, Ray, Transform, Triangle, WorldBox, WorldPoint, WorldVector},
    util::Rgb,
};

index_vec::define_index_type! {
    pub struct MaterialIdx = u32;
}

index_vec::define_index_type! {
    pub struct TriangleIdx = u32;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Specular {
    /// Phong exponent of the mirror lobe, 0 for a perfect mirror
    pub exponent: FloatType,
    pub color: Rgb,
}

/// Surface response. Emissive materials (emittance > 0) are lights and never scatter.
#[derive(Clone, Debug, PartialEq, Builder)]
pub struct Material {
    pub color: Rgb,
    #[builder(default)]
    pub emittance: FloatType,
    #[builder(default = Specular { exponent: 0.0, color: Rgb { r: 1.0, g: 1.0, b: 1.0 } })]
    pub specular: Specular,
    /// Probability of a mirror bounce instead of a diffuse one
    #[builder(default)]
    pub reflectivity: FloatType,
    /// Index of refraction of a dielectric
    pub refraction: Option<FloatType>,
}

impl Material {
    pub fn is_emissive(&self) -> bool {
        self.emittance > 0.0
    }
}

/// Object space shape of a geometry record.
/// Sphere has radius 0.5 and cube spans [-0.5, 0.5]^3, both centered at the origin.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Sphere,
    Cube,
    Mesh {
        triangles: Range<TriangleIdx>,
        /// Object space box around all the triangles
        bounds: WorldBox,
    },
}

#[derive(Clone, Debug, PartialEq, Builder)]
pub struct Geometry {
    pub shape: Shape,
    pub transform: Transform,
    pub material: MaterialIdx,
    /// Translation reached at the end of the shutter interval, for rigid motion blur
    pub motion_target: Option<WorldVector>,
}

impl Geometry {
    /// Offset of the moving geometry from its rest position at the given shutter time.
    pub fn displacement(&self, time: FloatType) -> WorldVector {
        match self.motion_target {
            Some(target) => (target - self.transform.translation()) * time,
            None => WorldVector::zeros(),
        }
    }
}

/// Mesh triangle in the object space of its mesh, with per vertex shading normals.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeshTriangle {
    pub positions: Triangle<WorldPoint>,
    pub normals: Triangle<WorldVector>,
}

impl MeshTriangle {
    /// Triangle with all vertex normals set to the geometric one.
    pub fn flat(positions: Triangle<WorldPoint>) -> Self {
        let normal = positions.normal().normalize();
        MeshTriangle {
            positions,
            normals: Triangle::new(normal, normal, normal),
        }
    }
}

/// Geometry, triangle and material tables. Read only while rendering.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub geometries: Vec<Geometry>,
    pub triangles: IndexVec<TriangleIdx, MeshTriangle>,
    pub materials: IndexVec<MaterialIdx, Material>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, material: Material) -> MaterialIdx {
        self.materials.push(material)
    }

    pub fn add_sphere(&mut self, transform: Transform, material: MaterialIdx) -> &mut Geometry {
        self.add_geometry(Shape::Sphere, transform, material)
    }

    pub fn add_cube(&mut self, transform: Transform, material: MaterialIdx) -> &mut Geometry {
        self.add_geometry(Shape::Cube, transform, material)
    }

    /// Appends the triangles to the triangle table and adds a mesh referencing them.
    pub fn add_mesh(
        &mut self,
        triangles: impl IntoIterator<Item = MeshTriangle>,
        transform: Transform,
        material: MaterialIdx,
    ) -> Result<&mut Geometry, SceneError> {
        let start = self.triangles.next_idx();
        self.triangles.extend(triangles);
        let end = self.triangles.next_idx();

        let bounds = WorldBox::from_points(
            self.triangles[start..end]
                .iter()
                .flat_map(|triangle| triangle.positions.iter()),
        )
        .ok_or(SceneError::EmptyMesh)?;

        Ok(self.add_geometry(
            Shape::Mesh {
                triangles: start..end,
                bounds,
            },
            transform,
            material,
        ))
    }

    fn add_geometry(
        &mut self,
        shape: Shape,
        transform: Transform,
        material: MaterialIdx,
    ) -> &mut Geometry {
        self.geometries.push(
            Geometry::builder()
                .shape(shape)
                .transform(transform)
                .material(material)
                .build(),
        );
        self.geometries
            .last_mut()
            .unwrap_or_else(|| unreachable!("Just pushed a geometry"))
    }

    pub fn material(&self, index: MaterialIdx) -> &Material {
        &self.materials[index]
    }

    /// Finds the nearest hit in front of the ray over all geometry records.
    /// `mesh_culling` enables the bounding box pre-test of meshes.
    pub fn intersect(&self, ray: &Ray, mesh_culling: bool) -> Option<HitRecord> {
        self.geometries
            .iter()
            .filter_map(|geometry| geometry.intersect(ray, &self.triangles, mesh_culling))
            .filter(|hit| hit.t > 0.0)
            .fold(None, |best: Option<HitRecord>, hit| match best {
                Some(best) if best.t <= hit.t => Some(best),
                _ => Some(hit),
            })
    }
}

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Transform with scale {scale:?} is not invertible")]
    SingularTransform { scale: WorldVector },

    #[error("Mesh has no triangles")]
    EmptyMesh,

    #[error("Failed to read file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseError(#[from] wavefront_obj::ParseError),
}
