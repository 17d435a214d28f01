//! Scene lighting
//!
//! Neon signs and lamps only glow; the light they throw on the street comes
//! from point lights placed next to them. A rule adds one light per matching
//! mesh, at the mesh's recentred position plus the rule's offset.
//!
//! The night itself is a dim ambient fill plus a shadow-casting moon. The
//! moon sits in world space and ignores the model recentring.

use super::SceneGraph;
use crate::config::{AmbientConfig, LightRule, MoonConfig};
use crate::foundation::math::{Color, Vec3};
use crate::render::{AmbientLight, DirectionalLight, PointLight, ShadowSettings};

/// Lights for every mesh matched by a rule
///
/// `scene_offset` is the model recentring from framing. A mesh matched by
/// several rules gets one light per rule.
pub fn place_point_lights(graph: &SceneGraph, rules: &[LightRule], scene_offset: Vec3) -> Vec<PointLight> {
    let mut lights = Vec::new();
    for (node, mesh) in graph.meshes() {
        for rule in rules.iter().filter(|rule| rule.selector.matches(&mesh.material_name)) {
            lights.push(PointLight {
                position: node.position + scene_offset + rule.offset(),
                color: Color::from_hex(rule.color),
                intensity: rule.intensity,
                range: rule.range,
                cast_shadow: rule.cast_shadow,
            });
        }
    }

    log::info!("Placed {} point lights from {} rules", lights.len(), rules.len());
    lights
}

/// Ambient fill light
pub fn ambient_light(config: &AmbientConfig) -> AmbientLight {
    AmbientLight {
        color: Color::from_hex(config.color),
        intensity: config.intensity,
    }
}

/// The moon, `None` when disabled
pub fn moon_light(config: &MoonConfig) -> Option<DirectionalLight> {
    if !config.enabled {
        log::info!("Moon light disabled");
        return None;
    }

    let [x, y, z] = config.position;
    let [tx, ty, tz] = config.target;
    let shadow = config.cast_shadow.then(|| ShadowSettings {
        map_size: config.shadow.map_size,
        bias: config.shadow.bias,
        normal_bias: config.shadow.normal_bias,
        near: config.shadow.near,
        far: config.shadow.far,
        half_extent: config.shadow.half_extent,
    });

    Some(DirectionalLight {
        position: Vec3::new(x, y, z),
        target: Vec3::new(tx, ty, tz),
        color: Color::from_hex(config.color),
        intensity: config.intensity,
        shadow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaterialSelector, SceneConfig};

    #[test]
    fn test_default_night_lighting() {
        let environment = SceneConfig::default().environment;

        let ambient = ambient_light(&environment.ambient);
        assert_eq!(ambient.color, Color::from_hex(0x111122));
        assert_eq!(ambient.intensity, 0.3);

        let moon = moon_light(&environment.moon).unwrap();
        assert_eq!(moon.position, Vec3::new(20.0, 80.0, 20.0));
        assert_eq!(moon.target, Vec3::zeros());
        assert_eq!(moon.color, Color::from_hex(0x99bbff));
        assert_eq!(moon.intensity, 4.0);

        let shadow = moon.shadow.unwrap();
        assert_eq!(shadow.map_size, 2048);
        assert_eq!(shadow.bias, -0.0005);
        assert_eq!((shadow.near, shadow.far), (1.0, 200.0));
        assert_eq!(shadow.half_extent, 50.0);
    }

    #[test]
    fn test_moon_without_shadow_or_disabled() {
        let mut moon = SceneConfig::default().environment.moon;
        moon.cast_shadow = false;
        assert_eq!(moon_light(&moon).map(|light| light.shadow), Some(None));

        moon.enabled = false;
        assert!(moon_light(&moon).is_none());
    }

    #[test]
    fn test_lights_follow_rules() {
        let mut graph = SceneGraph::new();
        graph.add_mesh("bar", Vec3::new(10.0, 0.0, 0.0), "BarNeon", Vec3::repeat(1.0));
        graph.add_mesh("lamp_1", Vec3::new(0.0, 5.0, 0.0), "neon_lamp", Vec3::repeat(0.2));
        graph.add_mesh("lamp_2", Vec3::new(0.0, 5.0, 8.0), "neon_lamp.001", Vec3::repeat(0.2));
        graph.add_mesh("wall", Vec3::zeros(), "Concrete", Vec3::repeat(3.0));

        let offset = Vec3::new(-1.0, 0.0, 0.0);
        let lights = place_point_lights(&graph, &SceneConfig::default().lights, offset);
        assert_eq!(lights.len(), 3);

        let bar = &lights[0];
        assert_eq!(bar.position, Vec3::new(13.0, 2.0, -5.0));
        assert_eq!(bar.color, Color::from_hex(0xff1500));
        assert_eq!(bar.intensity, 40.0);
        assert!(bar.cast_shadow);

        assert_eq!(lights[1].position, Vec3::new(-1.0, 5.0, 0.0));
        assert_eq!(lights[1].intensity, 8.0);
        assert_eq!(lights[2].position, Vec3::new(-1.0, 5.0, 8.0));
    }

    #[test]
    fn test_no_matches_no_lights() {
        let mut graph = SceneGraph::new();
        graph.add_mesh("wall", Vec3::zeros(), "Concrete", Vec3::repeat(3.0));
        let rules = vec![LightRule {
            selector: MaterialSelector::Exact("HotelNeon".to_string()),
            color: 0x3cd7ff,
            intensity: 40.0,
            range: 10.0,
            offset: [0.0, 3.0, -0.5],
            cast_shadow: true,
        }];

        assert!(place_point_lights(&graph, &rules, Vec3::zeros()).is_empty());
    }
}
