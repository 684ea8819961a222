use serde::{Deserialize, Serialize};

/// Everything that can go wrong while turning a parameter table into a scene.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("malformed scene config: {0}")]
    Parse(String),

    #[error("{body}: `{field}` must be a finite number, got {value}")]
    NonFinite {
        body: String,
        field: &'static str,
        value: f32,
    },

    #[error("{body}: `{field}` must be positive, got {value}")]
    NonPositive {
        body: String,
        field: &'static str,
        value: f32,
    },

    #[error("{body}: `{field}` must not be negative, got {value}")]
    Negative {
        body: String,
        field: &'static str,
        value: f32,
    },

    #[error("comet eccentricity must lie in [0, 1), got {0}")]
    Eccentricity(f32),

    #[error("camera smoothing must lie in (0, 1], got {0}")]
    Smoothing(f32),

    #[error("{0}: point count must be non-zero")]
    EmptyCluster(String),

    #[error("moon {moon} orbits unknown host {host}")]
    UnknownHost { moon: String, host: String },

    #[error("duplicate body name {0}")]
    DuplicateBody(String),
}

pub(crate) fn finite(body: &str, field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { body: body.to_string(), field, value })
    }
}

pub(crate) fn positive(body: &str, field: &'static str, value: f32) -> Result<f32, ConfigError> {
    let value = finite(body, field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { body: body.to_string(), field, value })
    }
}

pub(crate) fn non_negative(body: &str, field: &'static str, value: f32) -> Result<f32, ConfigError> {
    let value = finite(body, field, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { body: body.to_string(), field, value })
    }
}

pub(crate) fn finite3(body: &str, field: &'static str, v: [f32; 3]) -> Result<[f32; 3], ConfigError> {
    for c in v {
        finite(body, field, c)?;
    }
    Ok(v)
}

/// One row of the planet/moon table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BodyParams {
    pub name: String,
    pub radius: f32,
    pub distance: f32,
    /// Radians per frame.
    pub speed: f32,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub ring_texture: Option<String>,
    /// Degrees.
    #[serde(default)]
    pub tilt: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoonParams {
    pub host: String,
    #[serde(flatten)]
    pub body: BodyParams,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StarParams {
    pub radius: f32,
    #[serde(default)]
    pub texture: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CometParams {
    pub radius: f32,
    pub color: [f32; 3],
    pub speed: f32,
    #[serde(default)]
    pub initial_angle: f32,
    pub semi_major_axis: f32,
    pub eccentricity: f32,
    /// Degrees.
    pub inclination: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AsterismParams {
    pub anchor: [f32; 3],
    pub count: usize,
    pub spread: [f32; 3],
    pub point_size: f32,
    pub opacity: f32,
    pub light_range: f32,
}

impl AsterismParams {
    fn at(anchor: [f32; 3]) -> Self {
        AsterismParams {
            anchor,
            count: 1500,
            spread: [300.0, 30.0, 40.0],
            point_size: 1.0,
            opacity: 0.6,
            light_range: 100.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StarfieldParams {
    pub count: usize,
    /// Edge length of the cube the stars are scattered in.
    pub extent: f32,
    pub color: [f32; 3],
    pub point_size: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShipParams {
    pub start: [f32; 3],
    pub look_at: [f32; 3],
    pub speed: f32,
    pub turn_rate: f32,
    pub size: [f32; 3],
    pub color: [f32; 3],
    pub light_range: f32,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "unit_scale")]
    pub model_scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub start: [f32; 3],
    /// Ship-local offset the camera chases.
    pub offset: [f32; 3],
    pub smoothing: f32,
    /// Degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub seed: Option<u64>,
    pub sun: StarParams,
    pub planets: Vec<BodyParams>,
    pub moons: Vec<MoonParams>,
    pub comet: CometParams,
    pub asterisms: Vec<AsterismParams>,
    pub starfield: StarfieldParams,
    pub ship: ShipParams,
    pub camera: CameraParams,
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn planet(name: &str, radius: f32, distance: f32, speed: f32, tilt: f32) -> BodyParams {
    BodyParams {
        name: name.to_string(),
        radius,
        distance,
        speed,
        texture: Some(format!("texture/{}_tx.png", name.to_lowercase())),
        ring_texture: None,
        tilt,
    }
}

fn ringed(mut body: BodyParams, ring_texture: &str) -> BodyParams {
    body.ring_texture = Some(ring_texture.to_string());
    body
}

impl Default for StarParams {
    fn default() -> Self {
        StarParams {
            radius: 10.0,
            texture: Some(
                "https://raw.githubusercontent.com/uemura5683/threejs_plactice/master/earth_vol2/img/sun.jpg"
                    .to_string(),
            ),
        }
    }
}

impl Default for CometParams {
    fn default() -> Self {
        CometParams {
            radius: 0.5,
            color: [1.0, 1.0, 1.0],
            speed: 0.002,
            initial_angle: 0.0,
            semi_major_axis: 200.0,
            eccentricity: 0.7,
            inclination: 30.0,
        }
    }
}

impl Default for StarfieldParams {
    fn default() -> Self {
        StarfieldParams {
            count: 10_000,
            extent: 2000.0,
            color: [1.0, 1.0, 1.0],
            point_size: 1.5,
        }
    }
}

impl Default for ShipParams {
    fn default() -> Self {
        ShipParams {
            start: [0.0, 0.0, 15.0],
            look_at: [0.0, 0.0, 0.0],
            speed: 0.2,
            turn_rate: 0.05,
            size: [1.0, 0.5, 2.0],
            color: [0.0, 1.0, 0.0],
            light_range: 10.0,
            model: None,
            model_scale: 1.0,
        }
    }
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraParams {
            start: [0.0, 10.0, 20.0],
            offset: [0.0, 5.0, 10.0],
            smoothing: 0.05,
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        let saturn_ring = "https://raw.githubusercontent.com/82mou/sandbox/master/universe/img/saturn-ring.jpg";
        let uranus_ring = "https://raw.githubusercontent.com/82mou/sandbox/master/universe/img/ouranos-ring.jpg";

        SceneConfig {
            seed: None,
            sun: StarParams::default(),
            planets: vec![
                planet("Mercury", 0.38, 14.0, 0.005, 0.03),
                planet("Venus", 0.95, 29.0, 0.005, 177.4),
                planet("Earth", 1.0, 40.0, 0.005, 23.4),
                planet("Mars", 0.53, 60.0, 0.005, 25.2),
                planet("Jupiter", 10.97, 100.0, 0.003, 3.1),
                ringed(planet("Saturn", 9.13, 150.0, 0.002, 26.7), saturn_ring),
                ringed(planet("Uranus", 3.98, 200.0, 0.001, 97.8), uranus_ring),
                planet("Neptune", 3.87, 250.0, 0.0009, 28.3),
            ],
            moons: vec![MoonParams {
                host: "Earth".to_string(),
                body: BodyParams {
                    name: "Moon".to_string(),
                    radius: 0.27,
                    distance: 1.5,
                    speed: 0.01,
                    texture: Some("texture/moon_tx.png".to_string()),
                    ring_texture: None,
                    tilt: 0.0,
                },
            }],
            comet: CometParams::default(),
            asterisms: vec![
                AsterismParams::at([200.0, 0.0, -200.0]),
                AsterismParams::at([200.0, 5.0, 500.0]),
                AsterismParams::at([400.0, 5.0, 400.0]),
                AsterismParams::at([-200.0, 0.0, 300.0]),
                AsterismParams::at([-200.0, 0.0, -300.0]),
                AsterismParams::at([-500.0, 0.0, 10.0]),
            ],
            starfield: StarfieldParams::default(),
            ship: ShipParams::default(),
            camera: CameraParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_eight_planets_two_ringed() {
        let config = SceneConfig::default();
        assert_eq!(config.planets.len(), 8);
        let ringed: Vec<_> = config
            .planets
            .iter()
            .filter(|p| p.ring_texture.is_some())
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(ringed, ["Saturn", "Uranus"]);
        assert_eq!(config.moons[0].host, "Earth");
        assert_eq!(config.asterisms.len(), 6);
    }

    #[test]
    fn shipped_asset_matches_defaults() {
        let shipped = SceneConfig::from_json(include_str!("../../assets/config.json")).unwrap();
        assert_eq!(shipped, SceneConfig::default());
    }

    #[test]
    fn partial_document_keeps_default_sections() {
        let config = SceneConfig::from_json(r#"{ "seed": 7, "planets": [] }"#).unwrap();
        assert_eq!(config.seed, Some(7));
        assert!(config.planets.is_empty());
        assert_eq!(config.comet, CometParams::default());
        assert_eq!(config.moons.len(), 1);
    }

    #[test]
    fn missing_numeric_field_is_reported() {
        let err = SceneConfig::from_json(
            r#"{ "planets": [ { "name": "Vulcan", "radius": 1.0, "speed": 0.01 } ] }"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Parse(msg) => assert!(msg.contains("distance"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn moon_row_flattens_body_fields() {
        let config = SceneConfig::from_json(
            r#"{ "moons": [ { "host": "Mars", "name": "Phobos", "radius": 0.1, "distance": 1.0, "speed": 0.03 } ] }"#,
        )
        .unwrap();
        let moon = &config.moons[0];
        assert_eq!(moon.host, "Mars");
        assert_eq!(moon.body.name, "Phobos");
        assert_eq!(moon.body.tilt, 0.0);
        assert_eq!(moon.body.texture, None);
    }

    #[test]
    fn validators_name_the_field() {
        let err = positive("Earth", "radius", -1.0).unwrap_err();
        assert_eq!(err.to_string(), "Earth: `radius` must be positive, got -1");
        assert!(matches!(
            finite("Earth", "speed", f32::NAN),
            Err(ConfigError::NonFinite { field: "speed", .. })
        ));
        assert_eq!(non_negative("Sun", "distance", 0.0), Ok(0.0));
    }
}
