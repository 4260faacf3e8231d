use std::{fs, path::Path};

use wavefront_obj::obj::{self, ObjSet, Primitive};

use crate::{
    geometry::{Triangle, WorldPoint, WorldVector},
    scene::{MeshTriangle, SceneError},
};

/// Loads all triangles of a Wavefront OBJ file, in the file's coordinates.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Vec<MeshTriangle>, SceneError> {
    let content = fs::read_to_string(path.as_ref())?;
    let triangles = parse_obj(content)?;
    log::info!(
        "Loaded {} triangles from {}",
        triangles.len(),
        path.as_ref().display()
    );
    Ok(triangles)
}

/// Parses OBJ source text into mesh triangles.
/// Faces without vertex normals get the flat geometric normal, other primitives are skipped.
pub fn parse_obj(content: impl AsRef<str>) -> Result<Vec<MeshTriangle>, SceneError> {
    let parsed = obj::parse(content.as_ref())?;
    Ok(collect_triangles(parsed))
}

fn collect_triangles(set: ObjSet) -> Vec<MeshTriangle> {
    let mut triangles = Vec::new();
    let mut skipped = 0usize;

    for o in set.objects.iter() {
        let position = |index: usize| {
            let v = &o.vertices[index];
            WorldPoint::new(v.x as f32, v.y as f32, v.z as f32)
        };
        let normal = |index: Option<usize>| {
            index.map(|i| {
                let n = &o.normals[i];
                WorldVector::new(n.x as f32, n.y as f32, n.z as f32).normalize()
            })
        };

        for geometry in &o.geometry {
            for shape in &geometry.shapes {
                let Primitive::Triangle(a, b, c) = shape.primitive else {
                    skipped += 1;
                    continue;
                };

                let positions = Triangle::new(position(a.0), position(b.0), position(c.0));
                let triangle = match (normal(a.2), normal(b.2), normal(c.2)) {
                    (Some(na), Some(nb), Some(nc)) => MeshTriangle {
                        positions,
                        normals: Triangle::new(na, nb, nc),
                    },
                    _ => MeshTriangle::flat(positions),
                };
                triangles.push(triangle);
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} non-triangle primitives");
    }

    triangles
}
