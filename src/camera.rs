use glam::{Mat4, Vec3, Vec4};

/// How a [`Camera`] projects onto the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Perspective projection with a vertical field of view in radians.
    Perspective { fov: f32 },
    /// Orthographic projection covering `height` world units vertically.
    Orthographic { height: f32 },
}

/// A camera for a scene host.
///
/// Holds placement, projection parameters and the aspect ratio of the
/// viewport it renders into. The projection matrix is cached and refreshed
/// whenever the aspect or projection changes, so per-frame reads are free.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    projection_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 1000.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov: 45f32.to_radians(),
            },
            near: 0.1,
            far: 2000.0,
            aspect: 16.0 / 9.0,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.update_projection();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// An orthographic camera whose view volume exactly covers a
    /// `width` x `height` rectangle centred on the origin.
    pub fn orthographic(width: f32, height: f32) -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            projection: Projection::Orthographic { height },
            near: -10.0,
            far: 10.0,
            aspect: width / height.max(f32::EPSILON),
            ..Self::default()
        };
        camera.update_projection();
        camera
    }

    pub fn at(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        self.look_at(target.into());
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.projection = Projection::Perspective {
            fov: fov_degrees.to_radians(),
        };
        self.update_projection();
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self.update_projection();
        self
    }

    /// Point the camera at `target`, keeping its position.
    pub fn look_at(&mut self, target: Vec3) {
        self.forward = (target - self.position).normalize_or(Vec3::NEG_Z);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Set the viewport aspect ratio and refresh the projection matrix.
    ///
    /// Degenerate sizes (zero height) keep the previous aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection();
    }

    /// Recompute the cached projection matrix from the current parameters.
    pub fn update_projection(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective { fov } => {
                Mat4::perspective_rh(fov, self.aspect, self.near, self.far)
            }
            Projection::Orthographic { height } => {
                let half_h = height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        };
    }

    /// Compute the right vector from forward and up.
    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }

    /// Frustum visibility test for a single world-space point.
    ///
    /// The point is visible when its clip-space coordinates fall inside the
    /// canonical view volume (wgpu depth range `0..=w`).
    pub fn contains_point(&self, point: Vec3) -> bool {
        let clip = self.view_projection() * Vec4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 0.0 {
            return false;
        }
        let w = clip.w;
        clip.x.abs() <= w && clip.y.abs() <= w && clip.z >= 0.0 && clip.z <= w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_change_updates_projection() {
        let mut camera = Camera::new();
        let before = camera.projection_matrix();

        camera.set_viewport(800, 800);

        assert_eq!(camera.aspect(), 1.0);
        assert_ne!(before, camera.projection_matrix());
    }

    #[test]
    fn zero_viewport_is_ignored() {
        let mut camera = Camera::new();
        let before = camera.projection_matrix();

        camera.set_viewport(0, 600);

        assert_eq!(camera.aspect(), 16.0 / 9.0);
        assert_eq!(before, camera.projection_matrix());
    }

    #[test]
    fn origin_is_visible_from_default_camera() {
        let camera = Camera::new().looking_at(Vec3::ZERO);
        assert!(camera.contains_point(Vec3::ZERO));
    }

    #[test]
    fn point_behind_camera_is_not_visible() {
        let camera = Camera::new().looking_at(Vec3::ZERO);
        assert!(!camera.contains_point(Vec3::new(0.0, 0.0, 1500.0)));
    }

    #[test]
    fn point_far_to_the_side_is_not_visible() {
        let camera = Camera::new().looking_at(Vec3::ZERO);
        assert!(!camera.contains_point(Vec3::new(5000.0, 0.0, 0.0)));
    }

    #[test]
    fn orthographic_covers_requested_rectangle() {
        let camera = Camera::orthographic(200.0, 100.0);
        assert!(camera.contains_point(Vec3::new(99.0, 49.0, 0.0)));
        assert!(!camera.contains_point(Vec3::new(101.0, 0.0, 0.0)));
    }
}
