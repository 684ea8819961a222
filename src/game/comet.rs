use nalgebra::Vector3;
use std::collections::VecDeque;

use crate::game::config::{finite, finite3, positive, CometParams, ConfigError};
use crate::game::orbit::EllipticalOrbit;

pub const TRAIL_CAPACITY: usize = 30;

/// Recent absolute positions, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailBuffer {
    points: VecDeque<Vector3<f32>>,
}

impl TrailBuffer {
    pub fn new() -> Self {
        TrailBuffer {
            points: VecDeque::with_capacity(TRAIL_CAPACITY + 1),
        }
    }

    pub fn push_and_trim(&mut self, position: Vector3<f32>) {
        self.points.push_front(position);
        self.points.truncate(TRAIL_CAPACITY);
    }

    /// The history re-anchored on `current`, same order as stored.
    pub fn to_relative_polyline(&self, current: &Vector3<f32>) -> Vec<Vector3<f32>> {
        self.points.iter().map(|p| p - current).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector3<f32>> {
        self.points.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comet {
    pub radius: f32,
    pub color: [f32; 3],
    pub angular_speed: f32,
    pub current_angle: f32,
    pub orbit: EllipticalOrbit,
    pub position: Vector3<f32>,
    pub trail: TrailBuffer,
}

impl Comet {
    pub fn new(params: &CometParams) -> Result<Self, ConfigError> {
        let label = "comet";
        let eccentricity = finite(label, "eccentricity", params.eccentricity)?;
        if !(0.0..1.0).contains(&eccentricity) {
            return Err(ConfigError::Eccentricity(eccentricity));
        }
        let orbit = EllipticalOrbit {
            semi_major_axis: positive(label, "semi_major_axis", params.semi_major_axis)?,
            eccentricity,
            inclination: finite(label, "inclination", params.inclination)?.to_radians(),
        };
        let current_angle = finite(label, "initial_angle", params.initial_angle)?;

        Ok(Comet {
            radius: positive(label, "radius", params.radius)?,
            color: finite3(label, "color", params.color)?,
            angular_speed: finite(label, "speed", params.speed)?,
            current_angle,
            orbit,
            position: orbit.position(current_angle),
            trail: TrailBuffer::new(),
        })
    }

    pub fn advance(&mut self) {
        self.current_angle += self.angular_speed;
        self.position = self.orbit.position(self.current_angle);
        self.trail.push_and_trim(self.position);
    }

    /// Trail vertices in the comet's own frame.
    pub fn trail_polyline(&self) -> Vec<Vector3<f32>> {
        self.trail.to_relative_polyline(&self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn point(i: usize) -> Vector3<f32> {
        Vector3::new(i as f32, 2.0 * i as f32, -(i as f32))
    }

    #[test]
    fn keeps_the_last_thirty_newest_first() {
        let mut trail = TrailBuffer::new();
        for i in 0..35 {
            trail.push_and_trim(point(i));
        }
        assert_eq!(trail.len(), TRAIL_CAPACITY);
        let kept: Vec<_> = trail.iter().copied().collect();
        let expected: Vec<_> = (5..35).rev().map(point).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn first_frame_is_a_single_point() {
        let mut comet = Comet::new(&CometParams::default()).unwrap();
        comet.advance();
        assert_eq!(comet.trail_polyline(), vec![Vector3::zeros()]);
    }

    #[test]
    fn relative_points_add_back_to_history() {
        let mut comet = Comet::new(&CometParams::default()).unwrap();
        for _ in 0..12 {
            comet.advance();
        }
        let relative = comet.trail_polyline();
        for (rel, abs) in relative.iter().zip(comet.trail.iter()) {
            assert_relative_eq!(rel + comet.position, *abs, epsilon = 1e-4);
        }
        assert_eq!(relative[0], Vector3::zeros());
    }

    #[test]
    fn advance_follows_the_ellipse() {
        let mut comet = Comet::new(&CometParams::default()).unwrap();
        assert_relative_eq!(comet.position, Vector3::new(200.0, 0.0, 0.0), epsilon = 1e-4);
        comet.advance();
        assert_relative_eq!(comet.current_angle, 0.002);
        assert_relative_eq!(comet.position, comet.orbit.position(0.002));
    }

    #[test]
    fn rejects_open_orbits() {
        let params = CometParams { eccentricity: 1.0, ..CometParams::default() };
        assert_eq!(Comet::new(&params), Err(ConfigError::Eccentricity(1.0)));
    }

    proptest! {
        #[test]
        fn trail_length_tracks_frames(frames in 0usize..120) {
            let mut comet = Comet::new(&CometParams::default()).unwrap();
            for _ in 0..frames {
                comet.advance();
            }
            prop_assert_eq!(comet.trail.len(), frames.min(TRAIL_CAPACITY));
            let newest = comet.trail.iter().next().copied();
            if frames > 0 {
                prop_assert_eq!(newest, Some(comet.position));
            } else {
                prop_assert_eq!(newest, None);
            }
        }
    }
}
