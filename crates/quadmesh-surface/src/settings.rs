use glam::{IVec2, Vec3};
use quadmesh_math::Aabb;
use quadmesh_tree::{HitProxyId, MaterialRef, SurfaceRenderData};

use crate::SurfaceError;

/// Placement and LOD policy of a surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceSettings {
    /// World location. XY is snapped to the tile grid on rebuild.
    pub location: Vec3,
    /// Leaf tile size in world units.
    pub tile_size: f32,
    /// Half-size of the tiled region, in tiles.
    pub extent_in_tiles: IVec2,
    /// Multiplier on every LOD distance band.
    pub lod_scale: f32,
    /// Incomplete homogeneous subtrees collapse once density exceeds this.
    pub force_collapse_density_level: i32,
    /// Density buckets per material. At least 1.
    pub density_count: u32,
    /// Set the should-morph bit on emitted tiles that have a coarser bucket.
    pub lod_morphing_enabled: bool,
    /// Finest LOD level the distance pass descends to.
    pub lowest_lod: u32,
    /// Morph height written for tiles emitted at `lowest_lod`.
    pub height_morph: f32,
    /// Prune redundant nodes when sealing.
    pub prune: bool,
    /// Invisible surfaces rebuild to an empty tree.
    pub visible: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            tile_size: 100.0,
            extent_in_tiles: IVec2::splat(64),
            lod_scale: 1.0,
            force_collapse_density_level: 0,
            density_count: 3,
            lod_morphing_enabled: true,
            lowest_lod: 0,
            height_morph: 0.0,
            prune: true,
            visible: true,
        }
    }
}

impl SurfaceSettings {
    /// Check everything a rebuild or traversal would otherwise assert on.
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(SurfaceError::InvalidTileSize(self.tile_size));
        }
        if self.extent_in_tiles.x <= 0 || self.extent_in_tiles.y <= 0 {
            return Err(SurfaceError::InvalidExtent(self.extent_in_tiles));
        }
        if self.density_count == 0 {
            return Err(SurfaceError::InvalidDensityCount);
        }
        if !(self.lod_scale.is_finite() && self.lod_scale > 0.0) {
            return Err(SurfaceError::InvalidLodScale(self.lod_scale));
        }
        Ok(())
    }
}

/// A box of surface inserted on rebuild. Later patches in the list take
/// priority where they overlap earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfacePatch {
    /// XY footprint claimed by the patch and the Z range it adds to the tree.
    pub bounds: Aabb,
    /// Patches without a material are stored but never drawn.
    pub material: Option<MaterialRef>,
    /// Height at which the patch's tiles are drawn and sampled.
    pub base_height: f32,
    /// Highlighted in the selection outline.
    pub selected: bool,
    /// Picking id written with every tile of the patch.
    pub hit_proxy: HitProxyId,
}

impl SurfacePatch {
    pub fn new(bounds: Aabb, material: MaterialRef, base_height: f32) -> Self {
        Self {
            bounds,
            material: Some(material),
            base_height,
            selected: false,
            hit_proxy: HitProxyId::default(),
        }
    }

    pub(crate) fn render_data(&self) -> SurfaceRenderData {
        SurfaceRenderData {
            material: self.material.clone(),
            surface_base_height: self.base_height,
            selected: self.selected,
            hit_proxy: self.hit_proxy,
            material_index: None,
        }
    }
}
