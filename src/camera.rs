use assert2::assert;
use bon::bon;
use nalgebra::{Unit, Vector2};
use rand_distr::Distribution as _;

use crate::{
    geometry::{EPSILON, FloatType, Ray, ScreenPoint, ScreenSize, WorldPoint, WorldVector},
    renderer::RenderSettings,
};

/// Pinhole camera with an optional thin lens.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    position: WorldPoint,

    resolution: ScreenSize,

    view: Unit<WorldVector>,
    up: Unit<WorldVector>,
    right: Unit<WorldVector>,

    /// Extent of a single pixel on the image plane at unit distance
    pixel_length: Vector2<FloatType>,

    lens_radius: FloatType,
    /// Distance of the plane in focus, measured along the view direction
    focal_distance: FloatType,
}

#[bon]
impl Camera {
    /// `fov_y` is the full vertical field of view in degrees.
    #[builder]
    pub fn new(
        position: WorldPoint,
        look_at: WorldPoint,
        up: WorldVector,
        resolution: ScreenSize,
        fov_y: FloatType,
        #[builder(default)] lens_radius: FloatType,
        #[builder(default = 1.0)] focal_distance: FloatType,
    ) -> Self {
        let view = Unit::try_new(look_at - position, EPSILON)
            .expect("Camera must not look at its own position");
        let up = Unit::try_new(up, EPSILON).expect("Up vector must be non-zero");
        let right = Unit::try_new(view.cross(&up), EPSILON)
            .expect("`up` and view direction must be linearly independent");
        let up = Unit::new_normalize(right.cross(&view));

        assert!(fov_y > 0.0 && fov_y < 180.0);
        assert!(lens_radius >= 0.0);
        assert!(focal_distance > 0.0);

        let y_scaled = (fov_y.to_radians() / 2.0).tan();
        let x_scaled = y_scaled * resolution.x as FloatType / resolution.y as FloatType;
        let pixel_length = Vector2::new(
            2.0 * x_scaled / resolution.x as FloatType,
            2.0 * y_scaled / resolution.y as FloatType,
        );

        Camera {
            position,
            resolution,
            view,
            up,
            right,
            pixel_length,
            lens_radius,
            focal_distance,
        }
    }
}

impl Camera {
    pub fn get_resolution(&self) -> ScreenSize {
        self.resolution
    }

    pub fn position(&self) -> WorldPoint {
        self.position
    }

    /// Generates the primary ray through the given pixel.
    ///
    /// With every sampling option disabled the random source is not touched and the
    /// ray goes through the pixel center. Antialiasing jitters the position inside the pixel,
    /// depth of field moves the origin over the lens disk while keeping the point on the
    /// focal plane fixed, motion blur stamps a shutter time in [0, 1).
    pub fn sample_ray(
        &self,
        point: &ScreenPoint,
        settings: &RenderSettings,
        rng: &mut impl rand::Rng,
    ) -> Ray {
        let (jitter_x, jitter_y) = if settings.antialiasing {
            (rng.random::<FloatType>(), rng.random::<FloatType>())
        } else {
            (0.5, 0.5)
        };
        let dx = (point.x as FloatType + jitter_x - self.resolution.x as FloatType / 2.0)
            * self.pixel_length.x;
        let dy = (point.y as FloatType + jitter_y - self.resolution.y as FloatType / 2.0)
            * self.pixel_length.y;

        let direction =
            self.view.as_ref() + self.right.as_ref() * dx - self.up.as_ref() * dy;

        let mut ray = if settings.depth_of_field && self.lens_radius > 0.0 {
            let focus_scale = self.focal_distance / direction.dot(self.view.as_ref());
            let focus = self.position + direction * focus_scale;
            let lens_uv: [FloatType; 2] = rand_distr::UnitDisc.sample(rng);
            let origin = self.position
                + self.right.as_ref() * (self.lens_radius * lens_uv[0])
                + self.up.as_ref() * (self.lens_radius * lens_uv[1]);
            Ray::new(origin, focus - origin)
        } else {
            Ray::new(self.position, direction)
        };

        if settings.motion_blur {
            ray = ray.with_time(rng.random_range(0.0..1.0));
        }

        ray
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert2::assert;
    use rand::{SeedableRng as _, rngs::SmallRng};

    // X goes right, Y goes up, camera looks down -Z
    fn test_camera() -> Camera {
        Camera::builder()
            .position(WorldPoint::new(0.0, 0.0, 0.0))
            .look_at(WorldPoint::new(0.0, 0.0, -1.0))
            .up(WorldVector::new(0.0, 1.0, 0.0))
            .resolution(ScreenSize::new(800, 600))
            .fov_y(45.0)
            .lens_radius(0.5)
            .focal_distance(4.0)
            .build()
    }

    fn plain() -> RenderSettings {
        RenderSettings::builder()
            .antialiasing(false)
            .depth_of_field(false)
            .motion_blur(false)
            .build()
    }

    #[test]
    fn left_right_up_down() {
        let camera = test_camera();
        let settings = plain();
        let mut rng = SmallRng::seed_from_u64(0);

        let ray_center = camera.sample_ray(&ScreenPoint::new(400, 300), &settings, &mut rng);
        let ray_left = camera.sample_ray(&ScreenPoint::new(0, 300), &settings, &mut rng);
        let ray_right = camera.sample_ray(&ScreenPoint::new(799, 300), &settings, &mut rng);
        let ray_up = camera.sample_ray(&ScreenPoint::new(400, 0), &settings, &mut rng);
        let ray_down = camera.sample_ray(&ScreenPoint::new(400, 599), &settings, &mut rng);

        assert!(ray_center.direction.x.abs() < 1e-2);
        assert!(ray_center.direction.y.abs() < 1e-2);
        assert!(ray_center.direction.z < 0.0);
        assert!(ray_left.direction.x < ray_center.direction.x);
        assert!(ray_right.direction.x > ray_center.direction.x);
        assert!(ray_up.direction.y > ray_center.direction.y);
        assert!(ray_down.direction.y < ray_center.direction.y);
    }

    #[test]
    fn vertical_field_of_view() {
        let camera = test_camera();
        let mut rng = SmallRng::seed_from_u64(0);
        // Pixel center of the top row sits half a pixel below the image edge
        let top = camera.sample_ray(&ScreenPoint::new(400, 0), &plain(), &mut rng);
        let expected = (22.5 as FloatType).to_radians().tan() * (1.0 - 1.0 / 600.0);

        assert!((top.direction.y / -top.direction.z - expected).abs() < 1e-4);
    }

    #[test]
    fn plain_rays_are_bit_identical() {
        let camera = test_camera();
        let settings = plain();
        let mut rng_a = SmallRng::seed_from_u64(1);
        let mut rng_b = SmallRng::seed_from_u64(2);

        for point in [
            ScreenPoint::new(0, 0),
            ScreenPoint::new(400, 300),
            ScreenPoint::new(799, 599),
        ] {
            let a = camera.sample_ray(&point, &settings, &mut rng_a);
            let b = camera.sample_ray(&point, &settings, &mut rng_b);
            assert!(a == b);
            assert!(a.origin == WorldPoint::origin());
            assert!(a.time == 0.0);
        }
    }

    #[test]
    fn antialiasing_stays_inside_pixel() {
        let camera = test_camera();
        let settings = RenderSettings::builder().antialiasing(true).build();
        let mut rng = SmallRng::seed_from_u64(3);
        let pixel = ScreenPoint::new(10, 20);
        let slope = |ray: &Ray| {
            (
                ray.direction.x / -ray.direction.z,
                ray.direction.y / -ray.direction.z,
            )
        };

        let center = slope(&camera.sample_ray(&pixel, &plain(), &mut rng));
        for _ in 0..100 {
            let jittered = slope(&camera.sample_ray(&pixel, &settings, &mut rng));
            assert!((jittered.0 - center.0).abs() <= camera.pixel_length.x * 0.5 + 1e-6);
            assert!((jittered.1 - center.1).abs() <= camera.pixel_length.y * 0.5 + 1e-6);
        }
    }

    #[test]
    fn depth_of_field_focuses_on_plane() {
        let camera = test_camera();
        let settings = RenderSettings::builder()
            .antialiasing(false)
            .depth_of_field(true)
            .build();
        let mut rng = SmallRng::seed_from_u64(4);
        let pixel = ScreenPoint::new(200, 500);

        let pinhole = camera.sample_ray(&pixel, &plain(), &mut rng);
        let focus = pinhole.point_at(4.0 / -pinhole.direction.z);

        for _ in 0..20 {
            let ray = camera.sample_ray(&pixel, &settings, &mut rng);
            assert!(ray.origin.z == 0.0);
            assert!((ray.origin - WorldPoint::origin()).norm() <= 0.5 + 1e-6);
            let on_plane = ray.point_at((ray.origin.z - focus.z) / -ray.direction.z);
            assert!((on_plane - focus).norm() < 1e-4);
        }
    }

    #[test]
    fn motion_blur_samples_shutter_time() {
        let camera = test_camera();
        let settings = RenderSettings::builder().motion_blur(true).build();
        let mut rng = SmallRng::seed_from_u64(5);

        let times: Vec<_> = (0..100)
            .map(|_| camera.sample_ray(&ScreenPoint::new(1, 1), &settings, &mut rng).time)
            .collect();
        assert!(times.iter().all(|t| (0.0..1.0).contains(t)));
        assert!(times.iter().any(|t| *t != times[0]));
    }
}
