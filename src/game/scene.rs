use nalgebra::{Isometry3, Point3};
use rand::Rng;
use std::collections::HashSet;

use crate::game::bodies::{
    build_body, scatter_asterism, scatter_starfield, Asterism, BodyId, CelestialBody, PointCloud,
    Ring, Star,
};
use crate::game::camera::ChaseCamera;
use crate::game::comet::Comet;
use crate::game::config::{positive, ConfigError, SceneConfig};
use crate::game::input::InputState;
use crate::game::orbit;
use crate::game::ship::Spaceship;

const SUN_LIGHT_RANGE: f32 = 1000.0;
const FRAME_LOG_INTERVAL: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Point3<f32>,
    pub color: [f32; 3],
    pub range: f32,
}

/// The whole simulated world. Bodies live in an arena and refer to their
/// parent by handle; parents always come before their children.
pub struct Scene {
    pub star: Star,
    bodies: Vec<CelestialBody>,
    pub comet: Comet,
    pub ship: Spaceship,
    pub camera: ChaseCamera,
    pub starfield: PointCloud,
    pub asterisms: Vec<Asterism>,
    frame: u64,
}

impl Scene {
    pub fn build<R: Rng + ?Sized>(
        config: &SceneConfig,
        aspect: f32,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let star = Star::new(&config.sun)?;

        let mut names = HashSet::new();
        let mut bodies = Vec::with_capacity(config.planets.len() + config.moons.len());
        for params in &config.planets {
            if !names.insert(params.name.as_str()) {
                return Err(ConfigError::DuplicateBody(params.name.clone()));
            }
            bodies.push(build_body(params, None, rng)?);
        }
        for moon in &config.moons {
            if !names.insert(moon.body.name.as_str()) {
                return Err(ConfigError::DuplicateBody(moon.body.name.clone()));
            }
            let host = bodies
                .iter()
                .position(|b: &CelestialBody| b.name == moon.host)
                .map(BodyId)
                .ok_or_else(|| ConfigError::UnknownHost {
                    moon: moon.body.name.clone(),
                    host: moon.host.clone(),
                })?;
            bodies.push(build_body(&moon.body, Some(host), rng)?);
        }

        let starfield = scatter_starfield(&config.starfield, rng)?;
        let asterisms = config
            .asterisms
            .iter()
            .map(|params| scatter_asterism(params, rng))
            .collect::<Result<Vec<_>, _>>()?;

        let comet = Comet::new(&config.comet)?;
        let ship = Spaceship::new(&config.ship)?;
        positive("ship", "model_scale", config.ship.model_scale)?;
        let camera = ChaseCamera::new(&config.camera, aspect)?;

        log::info!(
            "scene populated: {} bodies, {} asterisms, {} background stars",
            bodies.len(),
            asterisms.len(),
            starfield.len()
        );

        Ok(Scene {
            star,
            bodies,
            comet,
            ship,
            camera,
            starfield,
            asterisms,
            frame: 0,
        })
    }

    /// One simulation step. Order matters: the camera chases the ship
    /// position produced in the same frame.
    pub fn advance_frame(&mut self, input: &InputState) {
        for body in &mut self.bodies {
            orbit::advance_circular(body);
        }
        self.ship.apply_input(input);
        self.camera.follow(&self.ship);
        self.comet.advance();

        self.frame += 1;
        if self.frame % FRAME_LOG_INTERVAL == 0 {
            log::debug!(
                "frame {}: ship at ({:.1}, {:.1}, {:.1})",
                self.frame,
                self.ship.position.x,
                self.ship.position.y,
                self.ship.position.z
            );
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &CelestialBody)> {
        self.bodies.iter().enumerate().map(|(i, b)| (BodyId(i), b))
    }

    pub fn body(&self, id: BodyId) -> &CelestialBody {
        &self.bodies[id.0]
    }

    pub fn find(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|b| b.name == name).map(BodyId)
    }

    pub fn world_transform(&self, id: BodyId) -> Isometry3<f32> {
        let body = &self.bodies[id.0];
        let local = body.local_transform();
        match body.parent {
            Some(parent) => self.world_transform(parent) * local,
            None => local,
        }
    }

    /// World transform of a body's ring, if it has one.
    pub fn ring_transform(&self, id: BodyId) -> Option<(Isometry3<f32>, &Ring)> {
        let ring = self.bodies[id.0].ring.as_ref()?;
        Some((self.world_transform(id) * Ring::local_transform(), ring))
    }

    /// Sun first, then one per asterism, then the ship's engine glow.
    pub fn lights(&self) -> Vec<PointLight> {
        let mut lights = Vec::with_capacity(self.asterisms.len() + 2);
        lights.push(PointLight {
            position: Point3::origin(),
            color: [1.0, 1.0, 1.0],
            range: SUN_LIGHT_RANGE,
        });
        lights.extend(self.asterisms.iter().map(|a| PointLight {
            position: a.anchor,
            color: [1.0, 1.0, 1.0],
            range: a.light_range,
        }));
        lights.push(PointLight {
            position: Point3::from(self.ship.position),
            color: self.ship.color,
            range: self.ship.light_range,
        });
        lights
    }
}
