pub mod bodies;
pub mod camera;
pub mod comet;
pub mod config;
pub mod input;
pub mod orbit;
pub mod scene;
pub mod ship;

use std::collections::HashMap;
use nalgebra::Matrix4;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use wasm_bindgen::JsValue;
use web_sys::WebGlTexture;
use crate::engine::mesh::Mesh;
use crate::engine::renderer::{GpuMesh, Light, Material, Renderer};
use crate::game::bodies::{BodyId, PointCloud};
use crate::game::config::SceneConfig;
use crate::game::input::{ControlKey, InputState};
use crate::game::scene::Scene;

const SPHERE_SEGMENTS: u16 = 32;
const RING_SEGMENTS: u16 = 256;
const TRAIL_OPACITY: f32 = 0.7;

struct SceneMeshes {
    sphere: GpuMesh,
    ship: GpuMesh,
    ship_scale: f32,
    ship_is_model: bool,
    rings: Vec<(BodyId, GpuMesh)>,
    starfield: GpuMesh,
    asterisms: Vec<GpuMesh>,
}

/// The simulated scene plus everything needed to put it on screen.
pub struct SolarSystem {
    renderer: Renderer,
    scene: Scene,
    input: InputState,
    meshes: SceneMeshes,
    textures: HashMap<String, WebGlTexture>,
}

fn cloud_mesh(cloud: &PointCloud) -> Mesh {
    let positions: Vec<[f32; 3]> = cloud.positions.iter().map(|p| [p.x, p.y, p.z]).collect();
    Mesh::points(&positions, &cloud.colors)
}

impl SolarSystem {
    pub fn new(renderer: Renderer, config: &SceneConfig, ship_model: Option<Mesh>) -> Result<Self, JsValue> {
        let aspect = renderer
            .canvas()
            .filter(|c| c.width() > 0 && c.height() > 0)
            .map(|c| c.width() as f32 / c.height() as f32)
            .unwrap_or(1.0);

        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let scene = Scene::build(config, aspect, &mut rng)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let (ship, ship_scale, ship_is_model) = match ship_model {
            Some(model) => (renderer.upload_mesh(&model)?, config.ship.model_scale, true),
            None => {
                let size = scene.ship.size;
                (renderer.upload_mesh(&Mesh::cuboid(size.x, size.y, size.z, scene.ship.color))?, 1.0, false)
            }
        };

        let mut rings = Vec::new();
        for (id, body) in scene.bodies() {
            if let Some(ring) = &body.ring {
                let mesh = Mesh::annulus(ring.inner_radius, ring.outer_radius, RING_SEGMENTS, [1.0, 1.0, 1.0]);
                rings.push((id, renderer.upload_mesh(&mesh)?));
            }
        }

        let asterisms = scene
            .asterisms
            .iter()
            .map(|a| renderer.upload_mesh(&cloud_mesh(&a.cloud)))
            .collect::<Result<Vec<_>, _>>()?;

        let meshes = SceneMeshes {
            sphere: renderer.upload_mesh(&Mesh::sphere(1.0, SPHERE_SEGMENTS, SPHERE_SEGMENTS, [1.0, 1.0, 1.0]))?,
            ship,
            ship_scale,
            ship_is_model,
            rings,
            starfield: renderer.upload_mesh(&cloud_mesh(&scene.starfield))?,
            asterisms,
        };

        let urls = scene
            .star
            .texture
            .iter()
            .chain(scene.bodies().flat_map(|(_, b)| {
                b.texture.iter().chain(b.ring.iter().flat_map(|r| r.texture.iter()))
            }));
        let mut textures = HashMap::new();
        for url in urls {
            if textures.contains_key(url) {
                continue;
            }
            match renderer.create_texture(url) {
                Ok(texture) => {
                    textures.insert(url.clone(), texture);
                }
                Err(err) => log::warn!("no texture for {}: {:?}", url, err),
            }
        }

        Ok(SolarSystem {
            renderer,
            scene,
            input: InputState::default(),
            meshes,
            textures,
        })
    }

    /// Returns whether `key` is one of the flight controls.
    pub fn set_key(&mut self, key: &str, pressed: bool) -> bool {
        match ControlKey::from_key(key) {
            Some(control) => {
                self.input.set_flag(control, pressed);
                true
            }
            None => false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.renderer.set_size(width, height);
        self.scene.resize(width, height);
        log::debug!("viewport resized to {}x{}", width, height);
    }

    pub fn update(&mut self) {
        self.scene.advance_frame(&self.input);
    }

    fn texture(&self, url: Option<&str>) -> Option<&WebGlTexture> {
        url.and_then(|u| self.textures.get(u))
    }

    pub fn render(&self) {
        let renderer = &self.renderer;
        let scene = &self.scene;

        renderer.clear(0.0, 0.0, 0.0);
        renderer.disable_blend();
        renderer.enable_depth_test();
        renderer.set_view_projection(&scene.camera.view_projection());

        let lights: Vec<Light> = scene
            .lights()
            .iter()
            .map(|l| Light {
                position: [l.position.x, l.position.y, l.position.z],
                color: l.color,
                range: l.range,
            })
            .collect();
        renderer.set_lights(&lights);

        renderer.draw_points(&self.meshes.starfield, scene.starfield.point_size, scene.starfield.opacity);

        let sun = Material { unlit: true, ..Material::textured(self.texture(scene.star.texture.as_deref())) };
        renderer.draw_mesh(&self.meshes.sphere, &sun, &Matrix4::new_scaling(scene.star.radius));

        for (id, body) in scene.bodies() {
            let model = scene.world_transform(id).to_homogeneous() * Matrix4::new_scaling(body.radius);
            let material = Material::textured(self.texture(body.texture.as_deref()));
            renderer.draw_mesh(&self.meshes.sphere, &material, &model);
        }

        let ship = &scene.ship;
        let ship_material = if self.meshes.ship_is_model {
            Material::textured(None)
        } else {
            Material::solid(ship.color)
        };
        let ship_model = ship.world_transform().to_homogeneous() * Matrix4::new_scaling(self.meshes.ship_scale);
        renderer.draw_mesh(&self.meshes.ship, &ship_material, &ship_model);

        let comet = &scene.comet;
        let comet_frame = Matrix4::new_translation(&comet.position);
        renderer.draw_mesh(
            &self.meshes.sphere,
            &Material::solid(comet.color),
            &(comet_frame * Matrix4::new_scaling(comet.radius)),
        );

        renderer.enable_blend(false);

        let trail: Vec<f32> = comet.trail_polyline().iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        renderer.draw_lines(&trail, comet.color, TRAIL_OPACITY, &comet_frame);

        for (id, mesh) in &self.meshes.rings {
            if let Some((transform, ring)) = scene.ring_transform(*id) {
                let material = Material {
                    double_sided: true,
                    opacity: ring.opacity,
                    ..Material::textured(self.texture(ring.texture.as_deref()))
                };
                renderer.draw_mesh(mesh, &material, &transform.to_homogeneous());
            }
        }

        for (asterism, mesh) in scene.asterisms.iter().zip(&self.meshes.asterisms) {
            renderer.enable_blend(asterism.cloud.additive);
            renderer.draw_points(mesh, asterism.cloud.point_size, asterism.cloud.opacity);
        }
        renderer.disable_blend();
    }
}
