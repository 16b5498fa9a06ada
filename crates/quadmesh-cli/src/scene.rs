//! Translate the loaded config into surface settings, patches and views.

use std::collections::HashMap;

use glam::{IVec2, Quat, Vec3};
use quadmesh_config::{CameraConfig, Config};
use quadmesh_math::Aabb;
use quadmesh_surface::{SurfacePatch, SurfaceSettings, ViewState};
use quadmesh_tree::{HitProxyId, MaterialRef, SurfaceMaterial};

pub fn surface_settings(config: &Config) -> SurfaceSettings {
    let [ex, ey] = config.surface.extent_in_tiles;
    SurfaceSettings {
        location: Vec3::from_array(config.surface.location),
        tile_size: config.surface.tile_size,
        extent_in_tiles: IVec2::new(ex, ey),
        lod_scale: config.lod.lod_scale,
        force_collapse_density_level: config.lod.force_collapse_density_level,
        density_count: config.lod.density_count,
        lod_morphing_enabled: config.lod.morphing,
        lowest_lod: config.lod.lowest_lod,
        height_morph: config.lod.height_morph,
        prune: config.surface.prune,
        visible: config.surface.visible,
    }
}

/// Patches in config order. Patches naming the same material share one
/// [`MaterialRef`], so they land in the same draw bucket. Hit proxies are
/// numbered from 1.
pub fn surface_patches(config: &Config) -> Vec<SurfacePatch> {
    let mut materials: HashMap<&str, MaterialRef> = HashMap::new();
    config
        .patches
        .iter()
        .enumerate()
        .map(|(i, patch)| {
            let material = patch.material.as_deref().map(|name| {
                materials
                    .entry(name)
                    .or_insert_with(|| MaterialRef::new(SurfaceMaterial::named(name)))
                    .clone()
            });
            SurfacePatch {
                bounds: Aabb::new(Vec3::from_array(patch.min), Vec3::from_array(patch.max)),
                material,
                base_height: patch.base_height,
                selected: patch.selected,
                hit_proxy: HitProxyId(i as u32 + 1),
            }
        })
        .collect()
}

/// `view_count` cameras (at least one) orbiting the target: the configured
/// camera first, the rest rotated evenly about +Z.
pub fn view_states(camera: &CameraConfig) -> Vec<ViewState> {
    let target = Vec3::from_array(camera.target);
    let offset = Vec3::from_array(camera.position) - target;
    let count = camera.view_count.max(1);
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let eye = target + Quat::from_rotation_z(angle) * offset;
            ViewState::look_at(eye, target, camera.fov_deg, camera.aspect, camera.near, camera.far)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadmesh_config::PatchConfig;

    #[test]
    fn test_patches_share_materials_by_name() {
        let mut config = Config::default();
        config.patches = vec![
            PatchConfig {
                material: Some("water".to_string()),
                ..PatchConfig::default()
            },
            PatchConfig {
                material: Some("sand".to_string()),
                ..PatchConfig::default()
            },
            PatchConfig {
                material: Some("water".to_string()),
                ..PatchConfig::default()
            },
            PatchConfig::default(),
        ];
        let patches = surface_patches(&config);
        assert_eq!(patches.len(), 4);
        assert_eq!(patches[0].material, patches[2].material);
        assert_ne!(patches[0].material, patches[1].material);
        assert!(patches[3].material.is_none());
        assert_eq!(patches[3].hit_proxy, HitProxyId(4));
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = Config::default();
        config.surface.extent_in_tiles = [3, 5];
        config.lod.morphing = false;
        let settings = surface_settings(&config);
        assert_eq!(settings.extent_in_tiles, IVec2::new(3, 5));
        assert!(!settings.lod_morphing_enabled);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn test_views_orbit_target() {
        let camera = CameraConfig {
            position: [100.0, 0.0, 50.0],
            target: [0.0, 0.0, 0.0],
            view_count: 4,
            ..CameraConfig::default()
        };
        let views = view_states(&camera);
        assert_eq!(views.len(), 4);
        assert_eq!(views[0].view_origin, Vec3::new(100.0, 0.0, 50.0));
        assert!((views[1].view_origin - Vec3::new(0.0, 100.0, 50.0)).length() < 1e-3);
        for view in &views {
            assert!((view.view_origin.truncate().length() - 100.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_zero_view_count_still_yields_one_view() {
        let camera = CameraConfig {
            view_count: 0,
            ..CameraConfig::default()
        };
        assert_eq!(view_states(&camera).len(), 1);
    }
}
