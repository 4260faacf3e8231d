use bon::bon;
use nalgebra::{Rotation3, Unit};

use crate::{
    geometry::{WorldMatrix, WorldPoint, WorldVector},
    scene::SceneError,
};

/// Object to world transformation, with the inverse matrices precomputed.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    translation: WorldVector,
    matrix: WorldMatrix,
    inverse: WorldMatrix,
    inverse_transpose: WorldMatrix,
}

#[bon]
impl Transform {
    /// Translation * rotation (Euler angles in degrees, applied Z first) * scale.
    #[builder]
    pub fn new(
        #[builder(default = WorldVector::zeros())] translation: WorldVector,
        #[builder(default = WorldVector::zeros())] rotation: WorldVector,
        #[builder(default = WorldVector::repeat(1.0))] scale: WorldVector,
    ) -> Result<Self, SceneError> {
        let rotation = Rotation3::from_axis_angle(&WorldVector::x_axis(), rotation.x.to_radians())
            * Rotation3::from_axis_angle(&WorldVector::y_axis(), rotation.y.to_radians())
            * Rotation3::from_axis_angle(&WorldVector::z_axis(), rotation.z.to_radians());
        let matrix = WorldMatrix::new_translation(&translation)
            * rotation.to_homogeneous()
            * WorldMatrix::new_nonuniform_scaling(&scale);
        let inverse = matrix
            .try_inverse()
            .ok_or(SceneError::SingularTransform { scale })?;

        Ok(Transform {
            translation,
            matrix,
            inverse,
            inverse_transpose: inverse.transpose(),
        })
    }
}

impl Transform {
    pub fn identity() -> Self {
        Transform {
            translation: WorldVector::zeros(),
            matrix: WorldMatrix::identity(),
            inverse: WorldMatrix::identity(),
            inverse_transpose: WorldMatrix::identity(),
        }
    }

    pub fn translation(&self) -> &WorldVector {
        &self.translation
    }

    pub fn point_to_world(&self, point: &WorldPoint) -> WorldPoint {
        self.matrix.transform_point(point)
    }

    pub fn point_to_object(&self, point: &WorldPoint) -> WorldPoint {
        self.inverse.transform_point(point)
    }

    pub fn vector_to_object(&self, vector: &WorldVector) -> WorldVector {
        self.inverse.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Transforms an object space normal using the inverse transpose, normalized.
    /// Only the linear part is used, the bottom row of the inverse transpose holds the
    /// translation.
    pub fn normal_to_world(&self, normal: &WorldVector) -> Unit<WorldVector> {
        Unit::new_normalize(self.inverse_transpose.fixed_view::<3, 3>(0, 0) * normal)
    }
}
