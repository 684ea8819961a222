use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::game::config::{
    finite, finite3, non_negative, positive, AsterismParams, BodyParams, ConfigError, StarParams,
    StarfieldParams,
};
use crate::game::orbit::circular_position;

/// Ring centre line, as a multiple of the host radius.
pub const RING_RADIUS_FACTOR: f32 = 1.5;
pub const RING_HALF_WIDTH: f32 = 5.0;
pub const RING_OPACITY: f32 = 0.7;

/// Handle into the scene's body arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub texture: Option<String>,
    pub opacity: f32,
}

impl Ring {
    fn around(host_radius: f32, texture: Option<String>) -> Self {
        let centre = host_radius * RING_RADIUS_FACTOR;
        Ring {
            inner_radius: (centre - RING_HALF_WIDTH).max(host_radius),
            outer_radius: centre + RING_HALF_WIDTH,
            texture,
            opacity: RING_OPACITY,
        }
    }

    /// The annulus mesh is built in the XY plane; this lays it into the
    /// host's equatorial plane.
    pub fn local_transform() -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub name: String,
    pub radius: f32,
    pub orbit_distance: f32,
    /// Radians per frame.
    pub angular_speed: f32,
    pub current_angle: f32,
    /// Radians, about the body's local z axis.
    pub axial_tilt: f32,
    pub parent: Option<BodyId>,
    pub texture: Option<String>,
    pub ring: Option<Ring>,
    /// Relative to the parent's frame, or to the origin for planets.
    pub position: Vector3<f32>,
}

impl CelestialBody {
    pub fn local_transform(&self) -> Isometry3<f32> {
        Isometry3::from_parts(
            Translation3::from(self.position),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.axial_tilt),
        )
    }
}

/// Builds one planet or moon from its table row. The starting angle is drawn
/// per body so the system does not start lined up.
pub fn build_body<R: Rng + ?Sized>(
    params: &BodyParams,
    parent: Option<BodyId>,
    rng: &mut R,
) -> Result<CelestialBody, ConfigError> {
    let name = params.name.as_str();
    let radius = positive(name, "radius", params.radius)?;
    let orbit_distance = non_negative(name, "distance", params.distance)?;
    let angular_speed = finite(name, "speed", params.speed)?;
    let axial_tilt = finite(name, "tilt", params.tilt)?.to_radians();

    let current_angle = rng.gen_range(0.0..TAU);
    let ring = params
        .ring_texture
        .as_ref()
        .map(|texture| Ring::around(radius, Some(texture.clone())));

    Ok(CelestialBody {
        name: params.name.clone(),
        radius,
        orbit_distance,
        angular_speed,
        current_angle,
        axial_tilt,
        parent,
        texture: params.texture.clone(),
        ring,
        position: circular_position(current_angle, orbit_distance),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub radius: f32,
    pub texture: Option<String>,
}

impl Star {
    pub fn new(params: &StarParams) -> Result<Self, ConfigError> {
        Ok(Star {
            radius: positive("Sun", "radius", params.radius)?,
            texture: params.texture.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<Point3<f32>>,
    pub colors: Vec<[f32; 3]>,
    pub point_size: f32,
    pub opacity: f32,
    pub additive: bool,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

pub fn scatter_starfield<R: Rng + ?Sized>(
    params: &StarfieldParams,
    rng: &mut R,
) -> Result<PointCloud, ConfigError> {
    let extent = positive("starfield", "extent", params.extent)?;
    let color = finite3("starfield", "color", params.color)?;
    let point_size = positive("starfield", "point_size", params.point_size)?;

    let positions = (0..params.count)
        .map(|_| {
            Point3::new(
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
                (rng.gen::<f32>() - 0.5) * extent,
            )
        })
        .collect();

    Ok(PointCloud {
        positions,
        colors: vec![color; params.count],
        point_size,
        opacity: 1.0,
        additive: false,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asterism {
    pub anchor: Point3<f32>,
    pub cloud: PointCloud,
    pub light_range: f32,
}

/// Scatters a bluish cluster around `params.anchor` and turns it to a random
/// orientation about that anchor. Points never move afterwards.
pub fn scatter_asterism<R: Rng + ?Sized>(
    params: &AsterismParams,
    rng: &mut R,
) -> Result<Asterism, ConfigError> {
    let label = "asterism";
    if params.count == 0 {
        return Err(ConfigError::EmptyCluster(label.to_string()));
    }
    let anchor = Point3::from(finite3(label, "anchor", params.anchor)?);
    let spread = Vector3::from(finite3(label, "spread", params.spread)?);
    let point_size = positive(label, "point_size", params.point_size)?;
    let opacity = positive(label, "opacity", params.opacity)?.min(1.0);
    let light_range = positive(label, "light_range", params.light_range)?;

    let orientation = UnitQuaternion::from_euler_angles(
        rng.gen_range(0.0..TAU),
        rng.gen_range(0.0..TAU),
        rng.gen_range(0.0..TAU),
    );

    let mut positions = Vec::with_capacity(params.count);
    let mut colors = Vec::with_capacity(params.count);
    for _ in 0..params.count {
        let mut jitter = || (rng.gen::<f32>() - 0.5) * rng.gen::<f32>();
        let offset = Vector3::new(
            jitter() * spread.x,
            jitter() * spread.y,
            jitter() * spread.z,
        );
        positions.push(anchor + orientation * offset);
        colors.push([0.5 + rng.gen::<f32>() * 0.5, 0.5, 1.0]);
    }

    Ok(Asterism {
        anchor,
        cloud: PointCloud {
            positions,
            colors,
            point_size,
            opacity,
            additive: true,
        },
        light_range,
    })
}
