//! # Scene Configuration
//!
//! Everything the city session needs besides the model itself: camera
//! framing, the night environment (background, ambient light, moon and mesh
//! shadows), point lights at emissive surfaces, flicker rules and the fly-by
//! loop. Defaults reproduce the night city scene.
//!
//! ```toml
//! seed = 7
//!
//! [environment.moon]
//! intensity = 2.5
//!
//! [fly_by]
//! actor = "delorean_fly"
//! start = -40.0
//! end = 40.0
//! respawn_delay_ms = 3000
//!
//! [fly_by.radio]
//! ceiling = 0.4
//! reference_speed = 0.5
//!
//! [[flicker]]
//! name = "BarNeon"
//! selector = { exact = "BarNeon" }
//! mode = "solo"
//! ```

use super::{Config, ConfigError};
use crate::foundation::math::{Axis, Vec3};
use crate::fx::flicker::FlickerProfile;
use serde::{Deserialize, Serialize};

/// Top-level scene configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Seed for flicker randomness; `None` draws from entropy
    pub seed: Option<u64>,
    /// Camera framing
    pub camera: CameraConfig,
    /// Background, ambient light, moon and mesh shadows
    pub environment: EnvironmentConfig,
    /// Point lights placed at matching emissive meshes
    pub lights: Vec<LightRule>,
    /// Flicker effects on emissive materials
    pub flicker: Vec<FlickerRule>,
    /// The looping fly-by actor and its radio
    pub fly_by: FlyByConfig,
}

impl Config for SceneConfig {}

impl Default for SceneConfig {
    fn default() -> Self {
        let neon = |name: &str, color: u32, offset: [f32; 3]| LightRule {
            selector: MaterialSelector::Exact(name.to_string()),
            color,
            intensity: 40.0,
            range: 10.0,
            offset,
            cast_shadow: true,
        };
        let neon_flicker = |name: &str| FlickerRule {
            name: name.to_string(),
            selector: MaterialSelector::Exact(name.to_string()),
            mode: FlickerMode::Solo,
            interval_ms: 1500,
            jitter_ms: 300,
            profile: FlickerProfile::neon_sign(),
        };

        Self {
            seed: None,
            camera: CameraConfig::default(),
            environment: EnvironmentConfig::default(),
            lights: vec![
                neon("ChinChenNeon", 0x33ff00, [1.0, 1.0, -4.0]),
                neon("BarNeon", 0xff1500, [4.0, 2.0, -5.0]),
                neon("HotelNeon", 0x3cd7ff, [0.0, 3.0, -0.5]),
                LightRule {
                    selector: MaterialSelector::Prefix("neon_lamp".to_string()),
                    color: 0xffddaa,
                    intensity: 8.0,
                    range: 10.0,
                    offset: [0.0; 3],
                    cast_shadow: true,
                },
                LightRule {
                    selector: MaterialSelector::Exact("lamp_neon".to_string()),
                    color: 0xffeeaa,
                    intensity: 5.0,
                    range: 8.0,
                    offset: [0.0; 3],
                    cast_shadow: true,
                },
            ],
            flicker: vec![
                neon_flicker("ChinChenNeon"),
                neon_flicker("BarNeon"),
                neon_flicker("HotelNeon"),
                FlickerRule {
                    name: "street_lamps".to_string(),
                    selector: MaterialSelector::Prefix("neon_lamp".to_string()),
                    mode: FlickerMode::Group,
                    interval_ms: 2000,
                    jitter_ms: 0,
                    profile: FlickerProfile::street_lamp(),
                },
            ],
            fly_by: FlyByConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Check ranges and cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.environment.validate()?;

        for (i, light) in self.lights.iter().enumerate() {
            if light.intensity < 0.0 || light.range < 0.0 {
                return Err(ConfigError::invalid(
                    format!("lights[{i}]"),
                    "intensity and range must be non-negative",
                ));
            }
        }

        for rule in &self.flicker {
            let field = format!("flicker.{}", rule.name);
            if rule.interval_ms == 0 {
                return Err(ConfigError::invalid(field, "interval_ms must be positive"));
            }
            rule.profile
                .validate()
                .map_err(|reason| ConfigError::invalid(field, reason))?;
        }

        self.fly_by.validate()
    }
}

/// Which material names a rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSelector {
    /// Material name equals the pattern
    Exact(String),
    /// Material name starts with the pattern
    Prefix(String),
}

impl MaterialSelector {
    /// Whether `material_name` is selected
    pub fn matches(&self, material_name: &str) -> bool {
        match self {
            Self::Exact(name) => material_name == name,
            Self::Prefix(prefix) => material_name.starts_with(prefix.as_str()),
        }
    }
}

/// Camera framing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// Camera height as a fraction of the model's diagonal
    pub height_ratio: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            height_ratio: 0.6,
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::invalid("camera.fov_degrees", "must be in (0, 180)"));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::invalid("camera.near", "must satisfy 0 < near < far"));
        }
        Ok(())
    }
}

/// Night environment around the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Packed `0xRRGGBB` clear color
    pub background: u32,
    /// Uniform fill light
    pub ambient: AmbientConfig,
    /// Directional moon light
    pub moon: MoonConfig,
    /// Whether model meshes cast shadows
    pub cast_shadows: bool,
    /// Whether model meshes receive shadows
    pub receive_shadows: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            background: 0x0c0c1a,
            ambient: AmbientConfig::default(),
            moon: MoonConfig::default(),
            cast_shadows: true,
            receive_shadows: true,
        }
    }
}

impl EnvironmentConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ambient.intensity < 0.0 {
            return Err(ConfigError::invalid("environment.ambient.intensity", "must be non-negative"));
        }
        self.moon.validate()
    }
}

/// Uniform fill light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Packed `0xRRGGBB` color
    pub color: u32,
    /// Light intensity
    pub intensity: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            color: 0x111122,
            intensity: 0.3,
        }
    }
}

/// Directional light standing in for the moon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonConfig {
    /// Whether the moon is added at all
    pub enabled: bool,
    /// Packed `0xRRGGBB` color
    pub color: u32,
    /// Light intensity
    pub intensity: f32,
    /// World position of the light
    pub position: [f32; 3],
    /// Point the light aims at
    pub target: [f32; 3],
    /// Whether the moon casts shadows
    pub cast_shadow: bool,
    /// Shadow map parameters
    pub shadow: ShadowConfig,
}

impl Default for MoonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: 0x99bbff,
            intensity: 4.0,
            position: [20.0, 80.0, 20.0],
            target: [0.0; 3],
            cast_shadow: true,
            shadow: ShadowConfig::default(),
        }
    }
}

impl MoonConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.intensity < 0.0 {
            return Err(ConfigError::invalid("environment.moon.intensity", "must be non-negative"));
        }
        if self.position == self.target {
            return Err(ConfigError::invalid("environment.moon.target", "must differ from position"));
        }
        self.shadow.validate()
    }
}

/// Shadow map of the moon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Shadow map resolution per side
    pub map_size: u32,
    /// Depth bias
    pub bias: f32,
    /// Bias along the surface normal
    pub normal_bias: f32,
    /// Near plane of the shadow camera
    pub near: f32,
    /// Far plane of the shadow camera
    pub far: f32,
    /// Half width and height of the shadow camera
    pub half_extent: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 2048,
            bias: -0.0005,
            normal_bias: 0.01,
            near: 1.0,
            far: 200.0,
            half_extent: 50.0,
        }
    }
}

impl ShadowConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.map_size == 0 {
            return Err(ConfigError::invalid("environment.moon.shadow.map_size", "must be positive"));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::invalid("environment.moon.shadow.near", "must satisfy 0 < near < far"));
        }
        if !(self.half_extent > 0.0) {
            return Err(ConfigError::invalid("environment.moon.shadow.half_extent", "must be positive"));
        }
        Ok(())
    }
}

/// Point light placed at every mesh whose material matches `selector`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightRule {
    /// Material names that get this light
    pub selector: MaterialSelector,
    /// Packed `0xRRGGBB` color
    pub color: u32,
    /// Light intensity
    pub intensity: f32,
    /// Falloff distance
    pub range: f32,
    /// Offset from the mesh's world position
    #[serde(default)]
    pub offset: [f32; 3],
    /// Whether the light casts shadows
    #[serde(default = "default_true")]
    pub cast_shadow: bool,
}

impl LightRule {
    /// Offset as a vector
    pub fn offset(&self) -> Vec3 {
        Vec3::new(self.offset[0], self.offset[1], self.offset[2])
    }
}

fn default_true() -> bool {
    true
}

/// How matched materials are grouped into flicker targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlickerMode {
    /// Every matched material flickers on its own schedule
    Solo,
    /// All matched materials flicker together
    Group,
}

/// Flicker effect bound to materials by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlickerRule {
    /// Name used in logs
    pub name: String,
    /// Material names to flicker
    pub selector: MaterialSelector,
    /// Solo or group targets
    pub mode: FlickerMode,
    /// Base cycle period
    pub interval_ms: u64,
    /// Upper bound of the random extra delay added to every cycle
    #[serde(default)]
    pub jitter_ms: u64,
    /// Intensities and behavior thresholds
    #[serde(default)]
    pub profile: FlickerProfile,
}

/// The looping fly-by actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyByConfig {
    /// Scene node name of the actor
    pub actor: String,
    /// Axis of travel
    pub axis: Axis,
    /// Position where every pass begins
    pub start: f32,
    /// Position where a pass ends
    pub end: f32,
    /// Units moved per render tick
    pub speed: f32,
    /// Time between the end of a pass and the next pass
    pub respawn_delay_ms: u64,
    /// Radio that plays while the actor flies
    pub radio: RadioConfig,
}

impl Default for FlyByConfig {
    fn default() -> Self {
        Self {
            actor: "delorean_fly".to_string(),
            axis: Axis::Z,
            start: -40.0,
            end: 40.0,
            speed: 1.0,
            respawn_delay_ms: 8000,
            radio: RadioConfig::default(),
        }
    }
}

impl FlyByConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.actor.is_empty() {
            return Err(ConfigError::invalid("fly_by.actor", "must not be empty"));
        }
        if !(self.speed > 0.0) {
            return Err(ConfigError::invalid("fly_by.speed", "must be positive"));
        }
        if !(self.start < self.end) {
            return Err(ConfigError::invalid("fly_by.start", "must be below fly_by.end"));
        }
        self.radio.validate()
    }
}

/// Audio paired with the fly-by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Audio file, looped while playing
    pub path: String,
    /// Highest volume reached while ramping up
    pub ceiling: f32,
    /// Volume added per render tick while ramping up
    pub ramp_step: f32,
    /// Volume removed per fade tick
    pub fade_step: f32,
    /// The fade stops once volume is at or below this
    pub fade_floor: f32,
    /// Period of the fade ticker
    pub fade_period_ms: u64,
    /// When set, playback rate follows `speed / reference_speed`
    pub reference_speed: Option<f32>,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            path: "assets/dembow.mp3".to_string(),
            ceiling: 0.1,
            ramp_step: 0.01,
            fade_step: 0.01,
            fade_floor: 0.01,
            fade_period_ms: 100,
            reference_speed: None,
        }
    }
}

impl RadioConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ceiling) {
            return Err(ConfigError::invalid("fly_by.radio.ceiling", "must be in [0, 1]"));
        }
        if !(self.ramp_step > 0.0 && self.fade_step > 0.0) {
            return Err(ConfigError::invalid("fly_by.radio", "volume steps must be positive"));
        }
        if self.fade_floor < 0.0 {
            return Err(ConfigError::invalid("fly_by.radio.fade_floor", "must be non-negative"));
        }
        if self.fade_period_ms == 0 {
            return Err(ConfigError::invalid("fly_by.radio.fade_period_ms", "must be positive"));
        }
        if matches!(self.reference_speed, Some(speed) if !(speed > 0.0)) {
            return Err(ConfigError::invalid("fly_by.radio.reference_speed", "must be positive"));
        }
        Ok(())
    }
}
