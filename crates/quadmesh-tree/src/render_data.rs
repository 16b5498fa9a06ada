//! Surface render data records referenced by tree nodes.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Description of a surface material. The tree never looks inside it; it only
/// groups draw instances by material identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceMaterial {
    pub name: String,
}

impl SurfaceMaterial {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Shared handle to a material, compared and hashed by identity.
///
/// Two handles are equal only if they point at the same allocation, even
/// when the materials they point at compare equal by value.
#[derive(Debug, Clone)]
pub struct MaterialRef(Arc<SurfaceMaterial>);

impl MaterialRef {
    pub fn new(material: SurfaceMaterial) -> Self {
        Self(Arc::new(material))
    }

    pub fn material(&self) -> &SurfaceMaterial {
        &self.0
    }

    /// Identity key: address of the shared allocation.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for MaterialRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MaterialRef {}

impl Hash for MaterialRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Identifier used by interactive picking to map a drawn tile back to the
/// patch that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HitProxyId(pub u32);

impl HitProxyId {
    /// Encode the id as an RGB colour, one byte per channel (R = low byte).
    pub fn color(self) -> [f32; 3] {
        let [r, g, b, _] = self.0.to_le_bytes();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

/// Per-patch render attributes. Slot 0 of the record table is always the
/// default record: no material, lowest priority.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceRenderData {
    /// Tiles of records without a material are never drawn.
    pub material: Option<MaterialRef>,
    /// Height at which tiles of this surface are drawn and sampled.
    pub surface_base_height: f32,
    /// Highlighted in the selection outline.
    pub selected: bool,
    /// Picking id, encoded as a colour when selection data is emitted.
    pub hit_proxy: HitProxyId,
    /// Bucket index of `material`, assigned when material buckets are built.
    /// `None` for records without a material.
    pub material_index: Option<u32>,
}

impl SurfaceRenderData {
    pub fn with_material(material: MaterialRef, surface_base_height: f32) -> Self {
        Self {
            material: Some(material),
            surface_base_height,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_ref_compares_by_identity() {
        let a = MaterialRef::new(SurfaceMaterial::named("ocean"));
        let b = MaterialRef::new(SurfaceMaterial::named("ocean"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.material(), b.material());
    }

    #[test]
    fn test_hit_proxy_color_encodes_bytes() {
        let color = HitProxyId(0x00_03_02_FF).color();
        assert_eq!(color, [1.0, 2.0 / 255.0, 3.0 / 255.0]);
    }

    #[test]
    fn test_default_record_has_no_material() {
        let data = SurfaceRenderData::default();
        assert!(data.material.is_none());
        assert!(data.material_index.is_none());
        assert_eq!(data.surface_base_height, 0.0);
    }
}
