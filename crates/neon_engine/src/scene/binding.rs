//! Resolving effect targets by name
//!
//! Nodes and materials are looked up once, right after the scene loads.
//! Whatever is missing leaves its effect inert with a warning; nothing here
//! fails.

use super::{SceneGraph, SceneNode};
use crate::config::{FlickerMode, FlickerRule};
use crate::fx::flicker::FlickerTarget;
use crate::render::MaterialRef;
use std::time::Duration;

/// A flicker target with its timing
#[derive(Debug, Clone, PartialEq)]
pub struct BoundFlicker {
    /// Materials and profile
    pub target: FlickerTarget,
    /// Base period between cycles
    pub interval: Duration,
    /// Largest random addition to each period
    pub jitter: Duration,
}

/// Node named `name`, if the model has one
pub fn find_actor<'a>(graph: &'a SceneGraph, name: &str) -> Option<&'a SceneNode> {
    let node = graph.find_by_name(name);
    match node {
        Some(node) => log::info!("Found actor `{}` at {:?}", name, node.position),
        None => log::warn!("Actor `{}` not found in the scene; fly-by disabled", name),
    }
    node
}

/// Flicker targets for every rule
///
/// A solo rule yields one target per distinct matching material and nothing
/// when no material matches. A group rule always yields exactly one target,
/// possibly without materials.
pub fn bind_flicker_targets(graph: &SceneGraph, rules: &[FlickerRule]) -> Vec<BoundFlicker> {
    let mut bound = Vec::new();

    for rule in rules {
        let matched = matching_materials(graph, rule);
        let bind = |target: FlickerTarget| BoundFlicker {
            target,
            interval: Duration::from_millis(rule.interval_ms),
            jitter: Duration::from_millis(rule.jitter_ms),
        };

        match rule.mode {
            FlickerMode::Solo => {
                if matched.is_empty() {
                    log::warn!("Flicker `{}` matched no material", rule.name);
                }
                for (name, material) in matched {
                    bound.push(bind(FlickerTarget::solo(name, material, rule.profile.clone())));
                }
            }
            FlickerMode::Group => {
                log::info!("Flicker group `{}` bound to {} material(s)", rule.name, matched.len());
                let materials = matched.into_iter().map(|(_, material)| material).collect();
                bound.push(bind(FlickerTarget::group(rule.name.clone(), materials, rule.profile.clone())));
            }
        }
    }

    bound
}

/// Distinct materials matched by `rule`, in scene order
fn matching_materials(graph: &SceneGraph, rule: &FlickerRule) -> Vec<(String, MaterialRef)> {
    let mut matched: Vec<(String, MaterialRef)> = Vec::new();
    for (_, mesh) in graph.meshes() {
        if rule.selector.matches(&mesh.material_name) && !matched.iter().any(|(_, m)| *m == mesh.material) {
            matched.push((mesh.material_name.clone(), mesh.material));
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MaterialSelector, SceneConfig};
    use crate::foundation::math::Vec3;
    use crate::fx::flicker::{FlickerProfile, TargetKind};

    fn city() -> SceneGraph {
        let mut graph = SceneGraph::new();
        let half = Vec3::repeat(0.5);
        graph.add_mesh("sign_chin", Vec3::zeros(), "ChinChenNeon", half);
        graph.add_mesh("sign_bar_front", Vec3::x(), "BarNeon", half);
        graph.add_mesh("sign_bar_back", Vec3::y(), "BarNeon", half);
        graph.add_mesh("lamp_1", Vec3::z(), "neon_lamp", half);
        graph.add_mesh("lamp_2", Vec3::z() * 2.0, "neon_lamp.001", half);
        graph.add_mesh("lamp_3", Vec3::z() * 3.0, "neon_lamp", half);
        graph.add_node("delorean_fly", Vec3::new(0.0, 4.0, 0.0));
        graph
    }

    #[test]
    fn test_default_rules_on_city() {
        let graph = city();
        let bound = bind_flicker_targets(&graph, &SceneConfig::default().flicker);

        // HotelNeon is absent: two solo targets and the lamp group
        assert_eq!(bound.len(), 3);

        let bar = &bound[1];
        assert_eq!(bar.target.name, "BarNeon");
        assert_eq!(bar.target.kind, TargetKind::Solo);
        assert_eq!(bar.target.materials.len(), 1);
        assert_eq!(bar.interval, Duration::from_millis(1500));
        assert_eq!(bar.jitter, Duration::from_millis(300));

        let lamps = &bound[2];
        assert_eq!(lamps.target.kind, TargetKind::Group);
        // neon_lamp and neon_lamp.001 are two materials
        assert_eq!(lamps.target.materials.len(), 2);
        assert_eq!(lamps.target.profile, FlickerProfile::street_lamp());
    }

    #[test]
    fn test_empty_group_still_bound() {
        let graph = SceneGraph::new();
        let rules = vec![FlickerRule {
            name: "street_lamps".to_string(),
            selector: MaterialSelector::Prefix("neon_lamp".to_string()),
            mode: FlickerMode::Group,
            interval_ms: 2000,
            jitter_ms: 0,
            profile: FlickerProfile::street_lamp(),
        }];

        let bound = bind_flicker_targets(&graph, &rules);
        assert_eq!(bound.len(), 1);
        assert!(bound[0].target.materials.is_empty());
    }

    #[test]
    fn test_prefix_solo_yields_one_target_per_material() {
        let graph = city();
        let rules = vec![FlickerRule {
            name: "lamps".to_string(),
            selector: MaterialSelector::Prefix("neon_lamp".to_string()),
            mode: FlickerMode::Solo,
            interval_ms: 1000,
            jitter_ms: 0,
            profile: FlickerProfile::street_lamp(),
        }];

        let names: Vec<String> = bind_flicker_targets(&graph, &rules)
            .into_iter()
            .map(|bound| bound.target.name)
            .collect();
        assert_eq!(names, vec!["neon_lamp", "neon_lamp.001"]);
    }

    #[test]
    fn test_find_actor() {
        let graph = city();
        let actor = find_actor(&graph, "delorean_fly").unwrap();
        assert_eq!(actor.position, Vec3::new(0.0, 4.0, 0.0));
        assert!(find_actor(&graph, "hovercar").is_none());
    }
}
