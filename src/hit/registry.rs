use std::collections::HashMap;

use crate::{
    foundation::core::{NodeId, Rgba8},
    foundation::error::{EaselError, EaselResult},
};

/// Key reserved for "no hit" (fully transparent background).
const KEY_NONE: u32 = 0x000000;
/// Maximum 24-bit key, also reserved.
const KEY_MAX: u32 = 0xFF_FFFF;

/// Bijective mapping from 24-bit hit-canvas colors to shape ids.
///
/// Keys are allocated sequentially, skipping the two reserved values and
/// wrapping at 24 bits. A shape keeps its key for the registry's lifetime;
/// keys are only recycled by [`reset`](Self::reset), which the owning layer
/// invokes when its shape set or order changes.
pub struct HitColorRegistry {
    next: u32,
    node_by_key: HashMap<u32, NodeId>,
    key_by_node: HashMap<NodeId, u32>,
}

impl Default for HitColorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HitColorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            next: 1,
            node_by_key: HashMap::new(),
            key_by_node: HashMap::new(),
        }
    }

    /// Drop all assignments and restart the counter (full rebuild).
    pub fn reset(&mut self) {
        self.next = 1;
        self.node_by_key.clear();
        self.key_by_node.clear();
    }

    /// Key already assigned to `node`, or a freshly allocated one.
    pub fn key_for(&mut self, node: NodeId) -> EaselResult<u32> {
        if let Some(key) = self.key_by_node.get(&node) {
            return Ok(*key);
        }
        if self.node_by_key.len() as u32 >= KEY_MAX - 1 {
            return Err(EaselError::resource_exhaustion(
                "hit-color registry is full",
            ));
        }
        // Skip reserved values and keys still held by live assignments.
        let mut key = self.next;
        loop {
            key &= KEY_MAX;
            if key != KEY_NONE && key != KEY_MAX && !self.node_by_key.contains_key(&key) {
                break;
            }
            key = key.wrapping_add(1);
        }
        self.next = (key + 1) & KEY_MAX;
        self.node_by_key.insert(key, node);
        self.key_by_node.insert(node, key);
        Ok(key)
    }

    /// Decode a key back to its shape, if assigned.
    pub fn resolve(&self, key: u32) -> Option<NodeId> {
        self.node_by_key.get(&key).copied()
    }

    /// Number of live assignments.
    pub fn len(&self) -> usize {
        self.node_by_key.len()
    }

    /// Whether no keys are assigned.
    pub fn is_empty(&self) -> bool {
        self.node_by_key.is_empty()
    }

    /// Opaque color encoding of a key for the hit canvas.
    pub fn key_to_color(key: u32) -> Rgba8 {
        Rgba8::rgb(
            ((key >> 16) & 0xFF) as u8,
            ((key >> 8) & 0xFF) as u8,
            (key & 0xFF) as u8,
        )
    }

    /// Decode a sampled opaque pixel back to a key.
    pub fn color_to_key(r: u8, g: u8, b: u8) -> u32 {
        (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/hit/registry.rs"]
mod tests;
