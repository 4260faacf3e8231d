//! Deterministic random streams and direction sampling.
//!
//! Every random decision of a path is drawn from a stream that is a pure function of
//! the iteration, the pixel owning the path and the stage consuming it. Paths can
//! therefore be reordered, compacted or processed by any thread without changing the image.

use nalgebra::{Matrix3, Unit};
use rand::{SeedableRng as _, rngs::SmallRng};
use rand_distr::Distribution as _;

use crate::geometry::{FloatType, WorldVector};

/// Integer hash used to derive stream seeds.
/// Thomas Wang style mixing, see http://burtleburtle.net/bob/hash/integer.html
pub fn hash(mut a: u32) -> u32 {
    a = a.wrapping_add(0x7ed55d16).wrapping_add(a << 12);
    a = (a ^ 0xc761c23c) ^ (a >> 19);
    a = a.wrapping_add(0x165667b1).wrapping_add(a << 5);
    a = a.wrapping_add(0xd3a2646c) ^ (a << 9);
    a = a.wrapping_add(0xfd7046c5).wrapping_add(a << 3);
    a = (a ^ 0xb55a4f09) ^ (a >> 16);
    a
}

/// Consumer of a random stream within one iteration of one path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stream {
    /// Primary ray generation
    Camera,
    /// Shading after the intersection at the given depth
    Bounce(u32),
}

impl Stream {
    fn key(self) -> u32 {
        match self {
            Stream::Camera => 0,
            Stream::Bounce(depth) => depth.wrapping_add(1),
        }
    }
}

/// Random source for one (iteration, pixel, stream) triple.
/// The same triple always produces the same sequence.
pub fn path_rng(iteration: u32, pixel_index: u32, stream: Stream) -> SmallRng {
    let high = hash(iteration ^ hash(stream.key()));
    let low = hash(pixel_index);
    SmallRng::seed_from_u64((u64::from(high) << 32) | u64::from(low))
}

/// Local frame with the normal as the Z axis.
pub struct OrthonormalBasis {
    world_from_local: Matrix3<FloatType>,
}

impl OrthonormalBasis {
    pub fn new(n: &Unit<WorldVector>) -> Self {
        // "Building an Orthonormal Basis, Revisited"
        // https://graphics.pixar.com/library/OrthonormalB/paper.pdf
        let sign = FloatType::copysign(1.0, n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        let t = WorldVector::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
        let b = WorldVector::new(b, sign + n.y * n.y * a, -n.y);

        OrthonormalBasis {
            world_from_local: Matrix3::from_columns(&[t, b, n.into_inner()]),
        }
    }

    pub fn to_world(&self, local: &WorldVector) -> WorldVector {
        self.world_from_local * local
    }
}

/// Cosine weighted direction in the hemisphere around `normal`.
pub fn cosine_hemisphere(
    normal: &Unit<WorldVector>,
    rng: &mut impl rand::Rng,
) -> Unit<WorldVector> {
    let [x, y]: [FloatType; 2] = rand_distr::UnitDisc.sample(rng);
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    Unit::new_normalize(OrthonormalBasis::new(normal).to_world(&WorldVector::new(x, y, z)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::test::UnitWorldVectorWrapper;
    use assert2::assert;
    use rand::Rng as _;
    use test_strategy::proptest;

    #[test]
    fn hash_is_not_identity() {
        assert!(hash(0) != 0);
        assert!(hash(1) != hash(2));
    }

    #[test]
    fn same_triple_same_stream() {
        let a: Vec<u64> = path_rng(7, 1234, Stream::Bounce(3))
            .random_iter()
            .take(8)
            .collect();
        let b: Vec<u64> = path_rng(7, 1234, Stream::Bounce(3))
            .random_iter()
            .take(8)
            .collect();
        assert!(a == b);
    }

    #[test]
    fn streams_differ() {
        let first = |iteration, pixel, stream| path_rng(iteration, pixel, stream).random::<u64>();
        let base = first(1, 10, Stream::Bounce(0));

        assert!(first(2, 10, Stream::Bounce(0)) != base);
        assert!(first(1, 11, Stream::Bounce(0)) != base);
        assert!(first(1, 10, Stream::Bounce(1)) != base);
        assert!(first(1, 10, Stream::Camera) != base);
    }

    #[proptest]
    fn basis_is_orthonormal(normal: UnitWorldVectorWrapper) {
        let basis = OrthonormalBasis::new(&normal);
        let m = basis.world_from_local;
        assert!((m.transpose() * m - Matrix3::identity()).norm() < 1e-4);
        assert!((basis.to_world(&WorldVector::z()) - normal.into_inner()).norm() < 1e-5);
    }

    #[proptest]
    fn hemisphere_samples_face_normal(normal: UnitWorldVectorWrapper, seed: u32) {
        let mut rng = path_rng(0, seed, Stream::Camera);
        for _ in 0..16 {
            let direction = cosine_hemisphere(&normal, &mut rng);
            assert!(direction.dot(normal.as_ref()) >= -1e-5);
        }
    }
}
