//! # Rendering Backend Interface
//!
//! The scene effects never draw anything themselves. They talk to whatever
//! owns the scene graph through the traits in this module:
//!
//! - [`MaterialBackend`]: emissive intensity of a material
//! - [`ObjectBackend`]: position and visibility of a scene node
//! - [`RenderBackend`]: frame submission, lights, shadows, background and
//!   camera placement
//!
//! Handles are opaque and owned by the backend; the engine never creates
//! them, it only receives them inside a [`SceneGraph`](crate::scene::SceneGraph).
//! [`HeadlessRenderer`] is an in-memory implementation used by the demo
//! viewer and by tests.

pub mod headless;

pub use headless::HeadlessRenderer;

use crate::foundation::math::{Color, Vec3};
use thiserror::Error;

/// Handle to a material's emissive property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialRef(pub u64);

/// Handle to a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u64);

/// Handle to a light added by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightHandle(pub u64);

/// Rendering errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The backend has no scene to draw yet
    #[error("No scene loaded")]
    NoScene,
}

/// Emissive intensity access
pub trait MaterialBackend {
    /// Current emissive intensity, `None` for an unknown handle
    fn emissive_intensity(&self, material: MaterialRef) -> Option<f32>;

    /// Set emissive intensity; unknown handles are ignored
    fn set_emissive_intensity(&mut self, material: MaterialRef, intensity: f32);
}

/// Scene node transform and visibility access
pub trait ObjectBackend {
    /// Local position of a node
    fn position(&self, object: ObjectRef) -> Option<Vec3>;

    /// Move a node
    fn set_position(&mut self, object: ObjectRef, position: Vec3);

    /// Show or hide a node
    fn set_visible(&mut self, object: ObjectRef, visible: bool);
}

/// Point light description
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// World position
    pub position: Vec3,
    /// Light color
    pub color: Color,
    /// Light intensity
    pub intensity: f32,
    /// Falloff distance
    pub range: f32,
    /// Whether the light casts shadows
    pub cast_shadow: bool,
}

/// Uniform fill light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Light color
    pub color: Color,
    /// Light intensity
    pub intensity: f32,
}

/// Shadow map parameters of a directional light
///
/// The shadow camera is orthographic and square: `half_extent` units to
/// each side of the light's view axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
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

/// Light shining from `position` towards `target`
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    /// World position of the light
    pub position: Vec3,
    /// Point the light aims at
    pub target: Vec3,
    /// Light color
    pub color: Color,
    /// Light intensity
    pub intensity: f32,
    /// Shadow casting, `None` for no shadows
    pub shadow: Option<ShadowSettings>,
}

/// Camera placement produced by scene framing
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose {
    /// Eye position
    pub position: Vec3,
    /// Point looked at
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

/// Frame submission and scene setup
pub trait RenderBackend: MaterialBackend + ObjectBackend {
    /// Add a point light to the scene
    fn add_point_light(&mut self, light: PointLight) -> LightHandle;

    /// Add a directional light to the scene
    fn add_directional_light(&mut self, light: DirectionalLight) -> LightHandle;

    /// Replace the ambient light
    fn set_ambient_light(&mut self, light: AmbientLight);

    /// Clear color behind the scene
    fn set_background(&mut self, color: Color);

    /// Whether a mesh node casts and receives shadows; unknown handles are ignored
    fn set_mesh_shadows(&mut self, object: ObjectRef, cast: bool, receive: bool);

    /// Translate the loaded model as a whole
    fn set_scene_offset(&mut self, offset: Vec3);

    /// Place the camera
    fn set_camera(&mut self, pose: CameraPose);

    /// Draw one frame
    fn render(&mut self) -> Result<(), RenderError>;
}
