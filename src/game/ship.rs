use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::game::config::{finite, finite3, positive, ConfigError, ShipParams};
use crate::game::input::InputState;

#[derive(Debug, Clone, PartialEq)]
pub struct Spaceship {
    pub position: Vector3<f32>,
    /// Radians about +Y. Zero faces +Z.
    pub yaw: f32,
    pub size: Vector3<f32>,
    pub color: [f32; 3],
    pub speed: f32,
    pub turn_rate: f32,
    pub light_range: f32,
}

impl Spaceship {
    pub fn new(params: &ShipParams) -> Result<Self, ConfigError> {
        let label = "ship";
        let position = Vector3::from(finite3(label, "start", params.start)?);
        let look_at = Vector3::from(finite3(label, "look_at", params.look_at)?);
        let size = finite3(label, "size", params.size)?;
        for extent in size {
            positive(label, "size", extent)?;
        }

        let heading = look_at - position;
        let yaw = if heading.x == 0.0 && heading.z == 0.0 {
            0.0
        } else {
            heading.x.atan2(heading.z)
        };

        Ok(Spaceship {
            position,
            yaw,
            size: Vector3::from(size),
            color: finite3(label, "color", params.color)?,
            speed: finite(label, "speed", params.speed)?,
            turn_rate: finite(label, "turn_rate", params.turn_rate)?,
            light_range: positive(label, "light_range", params.light_range)?,
        })
    }

    /// The hull's local +Z axis in world space.
    pub fn forward_direction(&self) -> Vector3<f32> {
        Vector3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    pub fn world_transform(&self) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::from(self.position),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw),
        )
    }

    /// One frame of flight. Note the key names are swapped relative to the
    /// motion: `backward` pushes along the forward axis, `forward` against it.
    /// Translation uses the heading from before this frame's turn.
    ///
    /// Turning adds the increment to the yaw of the hull's own Euler frame.
    /// After facing the sun that frame is flipped about X and Z (Euler
    /// (π, 0, π)), so a positive Euler step is a negative step about world +Y:
    /// `turn_right` swings the nose toward +X when heading down -Z.
    pub fn apply_input(&mut self, input: &InputState) {
        let direction = self.forward_direction();

        if input.backward {
            self.position += direction * self.speed;
        }
        if input.forward {
            self.position -= direction * self.speed;
        }
        if input.turn_right {
            self.yaw -= self.turn_rate;
        }
        if input.turn_left {
            self.yaw += self.turn_rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    fn ship() -> Spaceship {
        Spaceship::new(&ShipParams::default()).unwrap()
    }

    #[test]
    fn starts_facing_the_sun() {
        let ship = ship();
        assert_relative_eq!(ship.position, Vector3::new(0.0, 0.0, 15.0));
        assert_relative_eq!(ship.forward_direction(), Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn backward_key_moves_along_the_heading() {
        let mut ship = ship();
        let start = ship.position;
        let heading = ship.forward_direction();
        let input = InputState { backward: true, ..InputState::default() };
        for _ in 0..40 {
            ship.apply_input(&input);
        }
        assert_relative_eq!(ship.position, start + heading * 0.2 * 40.0, epsilon = 1e-4);
    }

    #[test]
    fn forward_key_moves_against_the_heading() {
        let mut ship = ship();
        let input = InputState { forward: true, ..InputState::default() };
        ship.apply_input(&input);
        assert_relative_eq!(ship.position, Vector3::new(0.0, 0.0, 15.2), epsilon = 1e-5);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut ship = ship();
        let start = ship.clone();
        let input = InputState {
            forward: true,
            backward: true,
            turn_left: true,
            turn_right: true,
        };
        ship.apply_input(&input);
        assert_relative_eq!(ship.position, start.position, epsilon = 1e-6);
        assert_relative_eq!(ship.yaw, start.yaw, epsilon = 1e-6);
    }

    #[test]
    fn turning_changes_yaw_by_the_increment() {
        let mut ship = ship();
        let yaw = ship.yaw;
        ship.apply_input(&InputState { turn_right: true, ..InputState::default() });
        assert_relative_eq!(ship.yaw, yaw - 0.05);
        ship.apply_input(&InputState { turn_left: true, ..InputState::default() });
        ship.apply_input(&InputState { turn_left: true, ..InputState::default() });
        assert_relative_eq!(ship.yaw, yaw + 0.05, epsilon = 1e-6);
    }

    #[test]
    fn turn_right_from_the_start_swings_toward_plus_x() {
        let mut ship = ship();
        ship.apply_input(&InputState { turn_right: true, ..InputState::default() });
        let heading = ship.forward_direction();
        assert!(heading.x > 0.0, "heading {heading:?}");
        assert_relative_eq!(heading, Vector3::new(0.05f32.sin(), 0.0, -0.05f32.cos()), epsilon = 1e-5);

        let thrust = InputState { backward: true, ..InputState::default() };
        for _ in 0..20 {
            ship.apply_input(&thrust);
        }
        assert!(ship.position.x > 0.0);
        assert_relative_eq!(ship.position, Vector3::new(0.0, 0.0, 15.0) + heading * 0.2 * 20.0, epsilon = 1e-4);
    }

    #[test]
    fn turn_left_from_the_start_swings_toward_minus_x() {
        let mut ship = ship();
        ship.apply_input(&InputState { turn_left: true, ..InputState::default() });
        assert!(ship.forward_direction().x < 0.0);
    }

    #[test]
    fn turn_applies_after_the_move() {
        let mut ship = ship();
        let start = ship.position;
        let heading = ship.forward_direction();
        ship.apply_input(&InputState {
            backward: true,
            turn_right: true,
            ..InputState::default()
        });
        assert_relative_eq!(ship.position, start + heading * 0.2, epsilon = 1e-5);
    }

    #[test]
    fn world_transform_maps_local_axes() {
        let ship = ship();
        let nose = ship.world_transform() * Point3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(nose.coords, ship.position + ship.forward_direction(), epsilon = 1e-5);
    }

    #[test]
    fn degenerate_look_at_faces_plus_z() {
        let params = ShipParams { look_at: [0.0, 3.0, 15.0], ..ShipParams::default() };
        let ship = Spaceship::new(&params).unwrap();
        assert_eq!(ship.yaw, 0.0);
    }
}
