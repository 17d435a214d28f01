//! In-memory render backend
//!
//! Keeps every material, node, light, shadow and camera write in plain maps
//! and counts frames instead of drawing them. The viewer runs on it when no
//! window is available, and tests inspect it after driving the engine.

use super::{
    AmbientLight, CameraPose, DirectionalLight, LightHandle, MaterialBackend, MaterialRef, ObjectBackend, ObjectRef,
    PointLight, RenderBackend, RenderError,
};
use crate::foundation::math::{Color, Vec3};
use crate::scene::SceneGraph;
use std::collections::HashMap;

/// Emissive intensity materials start with
pub const DEFAULT_EMISSIVE_INTENSITY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeState {
    position: Vec3,
    visible: bool,
    cast_shadow: bool,
    receive_shadow: bool,
}

/// Render backend without a GPU
#[derive(Debug)]
pub struct HeadlessRenderer {
    materials: HashMap<MaterialRef, f32>,
    nodes: HashMap<ObjectRef, NodeState>,
    lights: Vec<PointLight>,
    directional_lights: Vec<DirectionalLight>,
    next_light: u64,
    ambient: Option<AmbientLight>,
    background: Option<Color>,
    camera: Option<CameraPose>,
    scene_offset: Vec3,
    scene_loaded: bool,
    frames: u64,
    emissive_writes: u64,
}

impl HeadlessRenderer {
    /// Renderer with no scene; `render` fails until one is loaded
    pub fn new() -> Self {
        Self {
            materials: HashMap::new(),
            nodes: HashMap::new(),
            lights: Vec::new(),
            directional_lights: Vec::new(),
            next_light: 0,
            ambient: None,
            background: None,
            camera: None,
            scene_offset: Vec3::zeros(),
            scene_loaded: false,
            frames: 0,
            emissive_writes: 0,
        }
    }

    /// Renderer holding every node and material of `graph`
    pub fn from_scene(graph: &SceneGraph) -> Self {
        let mut renderer = Self::new();
        renderer.load_scene(graph);
        renderer
    }

    /// Replace the current scene with `graph`
    pub fn load_scene(&mut self, graph: &SceneGraph) {
        self.nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                (
                    node.object,
                    NodeState {
                        position: node.position,
                        visible: true,
                        cast_shadow: false,
                        receive_shadow: false,
                    },
                )
            })
            .collect();
        self.materials = graph
            .materials()
            .map(|(_, material)| (material, DEFAULT_EMISSIVE_INTENSITY))
            .collect();
        self.lights.clear();
        self.directional_lights.clear();
        self.next_light = 0;
        self.ambient = None;
        self.background = None;
        self.camera = None;
        self.scene_offset = Vec3::zeros();
        self.scene_loaded = true;

        log::debug!(
            "Headless scene loaded: {} nodes, {} materials",
            self.nodes.len(),
            self.materials.len()
        );
    }

    /// Whether a node is shown
    pub fn is_visible(&self, object: ObjectRef) -> Option<bool> {
        self.nodes.get(&object).map(|node| node.visible)
    }

    /// Lights added so far
    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Directional lights added so far
    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional_lights
    }

    /// Current ambient light
    pub fn ambient_light(&self) -> Option<AmbientLight> {
        self.ambient
    }

    /// Current background color
    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Cast and receive shadow flags of a node
    pub fn mesh_shadows(&self, object: ObjectRef) -> Option<(bool, bool)> {
        self.nodes
            .get(&object)
            .map(|node| (node.cast_shadow, node.receive_shadow))
    }

    /// Last camera placement
    pub fn camera(&self) -> Option<&CameraPose> {
        self.camera.as_ref()
    }

    /// Translation applied to the whole model
    pub fn scene_offset(&self) -> Vec3 {
        self.scene_offset
    }

    /// Frames rendered
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Emissive writes accepted
    pub fn emissive_writes(&self) -> u64 {
        self.emissive_writes
    }

    fn allocate_light(&mut self) -> LightHandle {
        let handle = LightHandle(self.next_light);
        self.next_light += 1;
        handle
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialBackend for HeadlessRenderer {
    fn emissive_intensity(&self, material: MaterialRef) -> Option<f32> {
        self.materials.get(&material).copied()
    }

    fn set_emissive_intensity(&mut self, material: MaterialRef, intensity: f32) {
        if let Some(current) = self.materials.get_mut(&material) {
            *current = intensity;
            self.emissive_writes += 1;
        }
    }
}

impl ObjectBackend for HeadlessRenderer {
    fn position(&self, object: ObjectRef) -> Option<Vec3> {
        self.nodes.get(&object).map(|node| node.position)
    }

    fn set_position(&mut self, object: ObjectRef, position: Vec3) {
        if let Some(node) = self.nodes.get_mut(&object) {
            node.position = position;
        }
    }

    fn set_visible(&mut self, object: ObjectRef, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&object) {
            node.visible = visible;
        }
    }
}

impl RenderBackend for HeadlessRenderer {
    fn add_point_light(&mut self, light: PointLight) -> LightHandle {
        self.lights.push(light);
        self.allocate_light()
    }

    fn add_directional_light(&mut self, light: DirectionalLight) -> LightHandle {
        self.directional_lights.push(light);
        self.allocate_light()
    }

    fn set_ambient_light(&mut self, light: AmbientLight) {
        self.ambient = Some(light);
    }

    fn set_background(&mut self, color: Color) {
        self.background = Some(color);
    }

    fn set_mesh_shadows(&mut self, object: ObjectRef, cast: bool, receive: bool) {
        if let Some(node) = self.nodes.get_mut(&object) {
            node.cast_shadow = cast;
            node.receive_shadow = receive;
        }
    }

    fn set_scene_offset(&mut self, offset: Vec3) {
        self.scene_offset = offset;
    }

    fn set_camera(&mut self, pose: CameraPose) {
        self.camera = Some(pose);
    }

    fn render(&mut self) -> Result<(), RenderError> {
        if !self.scene_loaded {
            return Err(RenderError::NoScene);
        }
        self.frames += 1;
        Ok(())
    }
}
