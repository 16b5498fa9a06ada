//! Camera-driven LOD selection producing bucketed, morph-aware draw instances.
//!
//! Three walks share the same emission path:
//! - [`Traversal::select_lod`]: distance bands per level, the primary pass.
//! - [`Traversal::select_lod_refinement`]: descends until nodes can be drawn
//!   whole, raising the density level each step.
//! - [`Traversal::select_lod_within_bounds`]: leaf-level tiles restricted to
//!   a 2D focus region.
//!
//! All three cull against the view frustum at every node and skip the whole
//! subtree of a culled node.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use quadmesh_math::{Frustum, Rect};

use crate::lod_distance::LodDistances;
use crate::node::{NO_CHILD, Node};
use crate::render_data::SurfaceRenderData;
use crate::store::NodeData;

/// Bit offset of the should-morph flag in [`TileInstance::packed_lod`].
pub const SHOULD_MORPH_BIT: u32 = 8;
/// Bit offset of the can-morph-twice flag in [`TileInstance::packed_lod`].
pub const CAN_MORPH_TWICE_BIT: u32 = 9;

/// Camera and policy inputs for one traversal.
#[derive(Clone, Debug)]
pub struct TraversalDesc {
    /// Nodes whose box falls outside are skipped with their subtree.
    pub frustum: Frustum,
    /// Only XY is used for distance bands.
    pub observer_position: Vec3,
    /// Added to every emitted position and base height.
    pub pre_view_translation: Vec3,
    /// Multiplier on every LOD distance band.
    pub lod_scale: f32,
    /// Finest level the distance pass descends to.
    pub lowest_lod: u32,
    /// Incomplete homogeneous subtrees collapse once density exceeds this.
    pub force_collapse_density_level: i32,
    /// Number of density buckets per material. At least 1.
    pub density_count: u32,
    /// Set the should-morph bit on tiles that have a coarser bucket.
    pub lod_morphing_enabled: bool,
    /// Morph height written for tiles emitted at `lowest_lod`.
    pub height_morph: f32,
    /// Focus region for [`QuadTree::select_lod_within_bounds`](crate::QuadTree::select_lod_within_bounds).
    pub tessellated_bounds: Option<Rect>,
}

impl Default for TraversalDesc {
    fn default() -> Self {
        Self {
            frustum: Frustum::everything(),
            observer_position: Vec3::ZERO,
            pre_view_translation: Vec3::ZERO,
            lod_scale: 1.0,
            lowest_lod: 0,
            force_collapse_density_level: 0,
            density_count: 3,
            lod_morphing_enabled: true,
            height_morph: 0.0,
            tessellated_bounds: None,
        }
    }
}

/// GPU-layout per-instance data for one tile.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TileInstance {
    /// Translated tile center XY and translated base height.
    pub position: [f32; 3],
    /// Surface record index owning the tile.
    pub surface_index: u32,
    /// LOD level in bits 0..8, should-morph in bit 8, can-morph-twice in bit 9.
    pub packed_lod: u32,
    /// Morph height, non-zero only on tiles at the lowest LOD.
    pub height_morph: f32,
    /// Tile size along X and Y.
    pub scale: [f32; 2],
}

impl TileInstance {
    pub fn lod_level(&self) -> u32 {
        self.packed_lod & 0xFF
    }

    pub fn should_morph(&self) -> bool {
        self.packed_lod & (1 << SHOULD_MORPH_BIT) != 0
    }

    pub fn can_morph_twice(&self) -> bool {
        self.packed_lod & (1 << CAN_MORPH_TWICE_BIT) != 0
    }
}

/// Picking data attached to each instance when selection support is built in.
#[cfg(feature = "selection")]
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TileSelection {
    /// Owning record's hit proxy, see [`HitProxyId::color`](crate::HitProxyId::color).
    pub hit_proxy_color: [f32; 3],
    /// 1.0 when the owning surface is selected.
    pub selected: f32,
}

/// One emitted tile and the (material, density) bucket it is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DrawInstance {
    /// `material_index * density_count + density`.
    pub bucket_index: u32,
    pub instance: TileInstance,
    #[cfg(feature = "selection")]
    pub selection: TileSelection,
}

/// Contiguous range of bucket-sorted instances drawn by one instanced call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceBatch {
    pub bucket_index: u32,
    /// Offset of the batch in [`TraversalOutput::sorted_instances`].
    pub first_instance: u32,
    pub instance_count: u32,
}

/// Instances emitted by a traversal, in emission order, plus bucket counts.
#[derive(Clone, Debug, Default)]
pub struct TraversalOutput {
    pub instances: Vec<DrawInstance>,
    /// Instances per bucket, `materials * density_count` entries.
    pub bucket_instance_counts: Vec<u32>,
    /// Total emitted, equal to the sum of the bucket counts.
    pub instance_count: u32,
}

impl TraversalOutput {
    /// Empty output with `bucket_count` zeroed bucket counters.
    pub fn new(bucket_count: usize) -> Self {
        Self {
            instances: Vec::new(),
            bucket_instance_counts: vec![0; bucket_count],
            instance_count: 0,
        }
    }

    /// Reset counters and instances, keeping allocations.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.bucket_instance_counts.fill(0);
        self.instance_count = 0;
    }

    /// One batch per non-empty bucket, with offsets into
    /// [`sorted_instances`](Self::sorted_instances).
    pub fn batches(&self) -> Vec<InstanceBatch> {
        let mut first_instance = 0;
        let mut batches = Vec::new();
        for (bucket_index, &count) in self.bucket_instance_counts.iter().enumerate() {
            if count > 0 {
                batches.push(InstanceBatch {
                    bucket_index: bucket_index as u32,
                    first_instance,
                    instance_count: count,
                });
            }
            first_instance += count;
        }
        batches
    }

    /// Instances grouped by bucket, ready for upload. Emission order is kept
    /// within a bucket.
    pub fn sorted_instances(&self) -> Vec<TileInstance> {
        let mut offsets = Vec::with_capacity(self.bucket_instance_counts.len());
        let mut running = 0;
        for &count in &self.bucket_instance_counts {
            offsets.push(running);
            running += count as usize;
        }

        let mut sorted = vec![TileInstance::default(); running];
        for draw in &self.instances {
            let slot = &mut offsets[draw.bucket_index as usize];
            sorted[*slot] = draw.instance;
            *slot += 1;
        }
        sorted
    }
}

/// Read-only walk state shared by the three selection passes.
pub(crate) struct Traversal<'a> {
    data: &'a NodeData,
    desc: &'a TraversalDesc,
    distances: LodDistances,
    output: &'a mut TraversalOutput,
}

impl<'a> Traversal<'a> {
    /// # Panics
    ///
    /// Panics if `desc.density_count` is zero.
    pub fn new(
        data: &'a NodeData,
        desc: &'a TraversalDesc,
        leaf_size: f32,
        output: &'a mut TraversalOutput,
    ) -> Self {
        assert!(desc.density_count > 0, "density count must be at least 1");
        Self {
            data,
            desc,
            distances: LodDistances::new(leaf_size, desc.lod_scale),
            output,
        }
    }

    fn render_data(&self, node: &Node) -> &'a SurfaceRenderData {
        let data: &'a NodeData = self.data;
        &data.render_data[node.surface_index as usize]
    }

    fn stored_children(&self, node: &Node) -> impl Iterator<Item = &'a Node> + use<'a> {
        let data: &'a NodeData = self.data;
        let nodes = &data.nodes;
        node.children
            .into_iter()
            .filter(|&child| child != NO_CHILD)
            .map(move |child| &nodes[child as usize])
    }

    /// Distance-band selection starting at `node` on `lod_level`.
    pub fn select_lod(&mut self, node: &Node, lod_level: u32) {
        if !self.desc.frustum.is_visible(&node.bounds) {
            return;
        }

        let render_data = self.render_data(node);
        let force_collapse = self.desc.force_collapse_density_level;
        let observer = self.desc.observer_position.truncate();
        let closest_distance = node.bounds.rect().distance_squared_to_point(observer).sqrt();

        // Farther than this level's band: the node belongs to the next
        // coarser level. Draw it whole if possible, else refine below it.
        if closest_distance > self.distances.distance(lod_level) {
            if node.can_render(0, force_collapse, render_data) {
                self.add_node_for_render(node, render_data, 1, lod_level + 1);
            } else {
                for child in self.stored_children(node) {
                    self.select_lod_refinement(child, 2, lod_level + 1);
                }
            }
            return;
        }

        if lod_level == 0 {
            if node.can_render(0, force_collapse, render_data) {
                self.add_node_for_render(node, render_data, 0, lod_level);
            }
            return;
        }

        // Entirely inside this level's band, or no finer level is allowed.
        if closest_distance > self.distances.distance(lod_level - 1)
            || lod_level == self.desc.lowest_lod
        {
            if node.can_render(0, force_collapse, render_data) {
                self.add_node_for_render(node, render_data, 0, lod_level);
            } else {
                for child in self.stored_children(node) {
                    self.select_lod_refinement(child, 1, lod_level);
                }
            }
        } else if node.is_collapsible() {
            for child in node.implicit_children() {
                self.select_lod(&child, lod_level - 1);
            }
        } else {
            for child in self.stored_children(node) {
                self.select_lod(child, lod_level - 1);
            }
        }
    }

    /// Descend stored children until a node can be drawn whole.
    pub fn select_lod_refinement(&mut self, node: &Node, density_level: i32, lod_level: u32) {
        if !self.desc.frustum.is_visible(&node.bounds) {
            return;
        }

        let render_data = self.render_data(node);
        if node.can_render(
            density_level,
            self.desc.force_collapse_density_level,
            render_data,
        ) {
            self.add_node_for_render(node, render_data, density_level, lod_level);
        } else {
            for child in self.stored_children(node) {
                self.select_lod_refinement(child, density_level + 1, lod_level);
            }
        }
    }

    /// Emit leaf-level tiles lying inside-or-on `bounds`.
    pub fn select_lod_within_bounds(&mut self, node: &Node, lod_level: u32, bounds: &Rect) {
        if !self.desc.frustum.is_visible(&node.bounds) {
            return;
        }

        if lod_level == 0 {
            let render_data = self.render_data(node);
            if bounds.contains_rect(&node.bounds.rect())
                && node.can_render(0, self.desc.force_collapse_density_level, render_data)
            {
                self.add_node_for_render(node, render_data, 0, lod_level);
            }
        } else if node.is_collapsible() {
            for child in node.implicit_children() {
                self.select_lod_within_bounds(&child, lod_level - 1, bounds);
            }
        } else {
            for child in self.stored_children(node) {
                self.select_lod_within_bounds(child, lod_level - 1, bounds);
            }
        }
    }

    fn add_node_for_render(
        &mut self,
        node: &Node,
        render_data: &SurfaceRenderData,
        density_level: i32,
        lod_level: u32,
    ) {
        let desc = self.desc;
        let density_count = desc.density_count as i32;
        let density_index = density_level.min(density_count - 1);
        let material_index = render_data
            .material_index
            .expect("material buckets are assigned when the tree is sealed");
        let bucket_index = material_index * desc.density_count + density_index as u32;

        let translated = node.bounds.center() + desc.pre_view_translation;
        let base_height = render_data.surface_base_height + desc.pre_view_translation.z;
        let scale = node.bounds.size().truncate();

        // No morph target past the last density level; the next-to-last
        // level can only morph once.
        let should_morph = desc.lod_morphing_enabled && density_index != density_count - 1;
        let can_morph_twice = density_index < density_count - 2;
        let packed_lod = (lod_level & 0xFF)
            | (u32::from(should_morph) << SHOULD_MORPH_BIT)
            | (u32::from(can_morph_twice) << CAN_MORPH_TWICE_BIT);

        let instance = TileInstance {
            position: [translated.x, translated.y, base_height],
            surface_index: node.surface_index,
            packed_lod,
            height_morph: if lod_level == desc.lowest_lod {
                desc.height_morph
            } else {
                0.0
            },
            scale: scale.to_array(),
        };

        self.output.bucket_instance_counts[bucket_index as usize] += 1;
        self.output.instances.push(DrawInstance {
            bucket_index,
            instance,
            #[cfg(feature = "selection")]
            selection: TileSelection {
                hit_proxy_color: render_data.hit_proxy.color(),
                selected: if render_data.selected { 1.0 } else { 0.0 },
            },
        });
        self.output.instance_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(bucket_index: u32, x: f32) -> DrawInstance {
        DrawInstance {
            bucket_index,
            instance: TileInstance {
                position: [x, 0.0, 0.0],
                ..TileInstance::default()
            },
            ..DrawInstance::default()
        }
    }

    #[test]
    fn test_packed_lod_decoding() {
        let instance = TileInstance {
            packed_lod: 5 | (1 << SHOULD_MORPH_BIT),
            ..TileInstance::default()
        };
        assert_eq!(instance.lod_level(), 5);
        assert!(instance.should_morph());
        assert!(!instance.can_morph_twice());
    }

    #[test]
    fn test_batches_skip_empty_buckets() {
        let output = TraversalOutput {
            instances: vec![draw(2, 0.0), draw(0, 1.0), draw(2, 2.0)],
            bucket_instance_counts: vec![1, 0, 2, 0],
            instance_count: 3,
        };
        let batches = output.batches();
        assert_eq!(
            batches,
            vec![
                InstanceBatch {
                    bucket_index: 0,
                    first_instance: 0,
                    instance_count: 1
                },
                InstanceBatch {
                    bucket_index: 2,
                    first_instance: 1,
                    instance_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_sorted_instances_group_by_bucket_in_emission_order() {
        let output = TraversalOutput {
            instances: vec![draw(2, 0.0), draw(0, 1.0), draw(2, 2.0)],
            bucket_instance_counts: vec![1, 0, 2],
            instance_count: 3,
        };
        let xs: Vec<f32> = output
            .sorted_instances()
            .iter()
            .map(|i| i.position[0])
            .collect();
        assert_eq!(xs, vec![1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_tile_instance_is_plain_bytes() {
        let instances = [TileInstance::default(); 2];
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<TileInstance>());
    }

    #[test]
    fn test_clear_keeps_bucket_len() {
        let mut output = TraversalOutput::new(4);
        output.bucket_instance_counts[1] = 3;
        output.instances.push(draw(1, 0.0));
        output.instance_count = 1;
        output.clear();
        assert_eq!(output.bucket_instance_counts, vec![0; 4]);
        assert!(output.instances.is_empty());
        assert_eq!(output.instance_count, 0);
    }
}
