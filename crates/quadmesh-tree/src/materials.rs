//! Material bucket assignment: one bucket per distinct material identity.

use rustc_hash::FxHashMap;

use crate::render_data::{MaterialRef, SurfaceRenderData};

/// Assign every record the bucket index of its material and return the
/// distinct materials indexed by bucket.
///
/// Buckets are numbered from 0 in first-seen order. Records without a
/// material get `None`. Must run again whenever the record table changes.
pub fn assign_material_buckets(render_data: &mut [SurfaceRenderData]) -> Vec<MaterialRef> {
    let mut buckets: FxHashMap<MaterialRef, u32> = FxHashMap::default();
    let mut materials = Vec::new();

    for data in render_data.iter_mut() {
        data.material_index = data.material.as_ref().map(|material| {
            *buckets.entry(material.clone()).or_insert_with(|| {
                materials.push(material.clone());
                (materials.len() - 1) as u32
            })
        });
    }

    materials
}
