use std::ops::{Add, Index, Mul};

use crate::geometry::{FloatType, WorldPoint, WorldVector};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle<Point>([Point; 3]);

impl<Point> Triangle<Point> {
    pub fn new(a: Point, b: Point, c: Point) -> Triangle<Point> {
        Triangle([a, b, c])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.0.iter()
    }
}

impl<Point> Index<usize> for Triangle<Point> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Triangle<WorldPoint> {
    /// Returns edge vectors, coming from self[0]
    pub fn edges(&self) -> [WorldVector; 2] {
        [self[1] - self[0], self[2] - self[0]]
    }

    /// Returns a normal vector of the triangle, not normalized.
    /// Follows the counter clockwise winding.
    pub fn normal(&self) -> WorldVector {
        let [e1, e2] = self.edges();
        e1.cross(&e2)
    }
}

/// Barycentric coordinates of a point on a triangle, weights of vertices 1 and 2.
/// Weight of vertex 0 is the remainder to one.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BarycentricCoordinates {
    pub u: FloatType,
    pub v: FloatType,
}

impl BarycentricCoordinates {
    pub fn interpolate<T>(&self, a: &T, b: &T, c: &T) -> T
    where
        for<'a> &'a T: Mul<FloatType, Output = T>,
        T: Add<Output = T>,
    {
        let w = 1.0 - self.u - self.v;
        a * w + b * self.u + c * self.v
    }

    pub fn interpolate_triangle<T>(&self, triangle: &Triangle<T>) -> T
    where
        for<'a> &'a T: Mul<FloatType, Output = T>,
        T: Add<Output = T>,
    {
        self.interpolate(&triangle[0], &triangle[1], &triangle[2])
    }
}
