//! Orbit laws. Both are angle-driven: every frame adds a constant angular
//! step, there is no gravity and no time integration.

use nalgebra::Vector3;

use crate::game::bodies::CelestialBody;

/// Position on a circular orbit of radius `distance` in the parent's y = 0 plane.
pub fn circular_position(angle: f32, distance: f32) -> Vector3<f32> {
    Vector3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
}

/// Advances a body by one frame. The angle is never wrapped; cos/sin take care of it.
pub fn advance_circular(body: &mut CelestialBody) {
    body.current_angle += body.angular_speed;
    body.position = circular_position(body.current_angle, body.orbit_distance);
}

/// Inclined ellipse traced by the comet.
///
/// `position` is a parametric approximation: the parameter advances uniformly,
/// so the comet does not speed up near perihelion the way a Keplerian orbit would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalOrbit {
    pub semi_major_axis: f32,
    pub eccentricity: f32,
    /// Radians.
    pub inclination: f32,
}

impl EllipticalOrbit {
    pub fn semi_minor_axis(&self) -> f32 {
        self.semi_major_axis * (1.0 - self.eccentricity * self.eccentricity).sqrt()
    }

    pub fn position(&self, theta: f32) -> Vector3<f32> {
        let x = self.semi_major_axis * theta.cos();
        let z_flat = self.semi_minor_axis() * theta.sin();
        Vector3::new(
            x,
            z_flat * self.inclination.sin(),
            z_flat * self.inclination.cos(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn body(distance: f32, speed: f32, angle: f32) -> CelestialBody {
        CelestialBody {
            name: "Probe".to_string(),
            radius: 1.0,
            orbit_distance: distance,
            angular_speed: speed,
            current_angle: angle,
            axial_tilt: 0.0,
            parent: None,
            texture: None,
            ring: None,
            position: circular_position(angle, distance),
        }
    }

    #[test]
    fn one_frame_at_earth_distance() {
        let mut earth = body(40.0, 0.005, 0.0);
        advance_circular(&mut earth);
        assert_relative_eq!(earth.current_angle, 0.005);
        assert_relative_eq!(
            earth.position,
            Vector3::new(0.005f32.cos() * 40.0, 0.0, 0.005f32.sin() * 40.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn angle_accumulates_without_wrapping() {
        let mut planet = body(14.0, 0.5, 1.0);
        for _ in 0..100 {
            advance_circular(&mut planet);
        }
        assert_relative_eq!(planet.current_angle, 1.0 + 100.0 * 0.5, epsilon = 1e-3);
        assert_relative_eq!(
            planet.position,
            circular_position(51.0, 14.0),
            epsilon = 1e-2
        );
    }

    #[test]
    fn comet_reference_points() {
        let orbit = EllipticalOrbit {
            semi_major_axis: 200.0,
            eccentricity: 0.7,
            inclination: 30f32.to_radians(),
        };
        assert_relative_eq!(orbit.position(0.0), Vector3::new(200.0, 0.0, 0.0), epsilon = 1e-4);

        let b = 200.0 * (1.0f32 - 0.49).sqrt();
        let quarter = orbit.position(std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(quarter.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(quarter.y, b * 0.5, epsilon = 1e-3);
        assert_relative_eq!(quarter.z, b * 30f32.to_radians().cos(), epsilon = 1e-3);
    }

    #[test]
    fn comet_orbit_is_centred_on_the_origin() {
        let orbit = EllipticalOrbit {
            semi_major_axis: 200.0,
            eccentricity: 0.7,
            inclination: 30f32.to_radians(),
        };
        let a = orbit.position(0.3);
        let b = orbit.position(0.3 + std::f32::consts::PI);
        assert_relative_eq!(a + b, Vector3::zeros(), epsilon = 1e-3);
    }

    proptest! {
        #[test]
        fn circular_bodies_stay_on_their_circle(
            distance in 0.5f32..300.0,
            speed in -0.05f32..0.05,
            start in 0.0f32..std::f32::consts::TAU,
            frames in 1usize..500,
        ) {
            let mut b = body(distance, speed, start);
            for _ in 0..frames {
                advance_circular(&mut b);
            }
            prop_assert!((b.position.norm() - distance).abs() < distance * 1e-4);
            prop_assert_eq!(b.position.y, 0.0);
            let expected = start + frames as f32 * speed;
            prop_assert!((b.current_angle - expected).abs() < 1e-3);
        }

        #[test]
        fn comet_stays_in_its_inclined_plane(theta in -10.0f32..10.0) {
            let inclination = 30f32.to_radians();
            let orbit = EllipticalOrbit { semi_major_axis: 200.0, eccentricity: 0.7, inclination };
            let p = orbit.position(theta);
            // plane normal is (0, cos i, -sin i)
            let off_plane = p.y * inclination.cos() - p.z * inclination.sin();
            prop_assert!(off_plane.abs() < 1e-3);
        }
    }
}
