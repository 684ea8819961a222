use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

use crate::game::config::{finite, finite3, positive, CameraParams, ConfigError};
use crate::game::ship::Spaceship;

/// Chase camera that eases toward a point fixed in the ship's frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaseCamera {
    pub position: Point3<f32>,
    pub look_target: Point3<f32>,
    pub offset: Vector3<f32>,
    /// Fraction of the remaining gap closed each frame.
    pub smoothing: f32,
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl ChaseCamera {
    pub fn new(params: &CameraParams, aspect: f32) -> Result<Self, ConfigError> {
        let label = "camera";
        let smoothing = finite(label, "smoothing", params.smoothing)?;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ConfigError::Smoothing(smoothing));
        }
        Ok(ChaseCamera {
            position: Point3::from(finite3(label, "start", params.start)?),
            look_target: Point3::origin(),
            offset: Vector3::from(finite3(label, "offset", params.offset)?),
            smoothing,
            fovy: positive(label, "fov", params.fov)?.to_radians(),
            aspect: positive(label, "aspect", aspect)?,
            near: positive(label, "near", params.near)?,
            far: positive(label, "far", params.far)?,
        })
    }

    /// Where the camera wants to be this frame.
    pub fn chase_target(&self, ship: &Spaceship) -> Point3<f32> {
        ship.world_transform() * Point3::from(self.offset)
    }

    pub fn follow(&mut self, ship: &Spaceship) {
        let target = self.chase_target(ship);
        self.position = Point3::from(self.position.coords.lerp(&target.coords, self.smoothing));
        self.look_target = Point3::from(ship.position);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.look_target, &Vector3::y())
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect, self.fovy, self.near, self.far).to_homogeneous()
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}
