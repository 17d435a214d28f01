//! Scene binding
//!
//! Turns the model the backend finished loading into what the effects
//! drive. Everything here runs once per scene load:
//!
//! ```text
//! SceneGraph (loaded model)
//!      ↓
//! framing   → model offset + camera pose
//! lighting  → ambient, moon and point lights at emissive meshes
//! binding   → fly-by actor + flicker targets
//! ```

mod binding;
mod framing;
mod lighting;
mod scene_graph;

pub use binding::{bind_flicker_targets, find_actor, BoundFlicker};
pub use framing::{frame_scene, Framing};
pub use lighting::{ambient_light, moon_light, place_point_lights};
pub use scene_graph::{MeshBinding, SceneGraph, SceneNode, AABB};
