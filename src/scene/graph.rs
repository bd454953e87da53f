use std::collections::HashMap;

use smallvec::SmallVec;

use crate::{
    foundation::core::{Affine, NodeId},
    foundation::error::{EaselError, EaselResult},
    scene::attrs::{AttrValue, Attrs, is_transform_attr},
    scene::node::{AbsCache, NodeData, NodeKind},
};

/// Id-keyed arena owning every node of one stage.
///
/// Handles are monotonically assigned [`NodeId`]s and never reused; a
/// destroyed id resolves to [`EaselError::InvalidState`] on any access. A
/// child's parent pointer is the single source of truth for membership, and
/// child order is paint order.
pub struct SceneGraph {
    nodes: HashMap<u64, NodeData>,
    next_id: u64,
    /// Bumped on every transform-attr mutation, reparent, and detach.
    /// Absolute-transform caches stamped with an older value are stale.
    generation: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            generation: 1,
        }
    }

    pub(crate) fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id.0, NodeData::new(kind));
        id
    }

    /// Current transform generation; advances on any transform-affecting
    /// mutation anywhere in the graph.
    pub(crate) fn transform_generation(&self) -> u64 {
        self.generation
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id.0)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> EaselResult<&NodeData> {
        self.nodes
            .get(&id.0)
            .ok_or_else(|| EaselError::invalid_state(format!("node {} is destroyed", id.0)))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> EaselResult<&mut NodeData> {
        self.nodes
            .get_mut(&id.0)
            .ok_or_else(|| EaselError::invalid_state(format!("node {} is destroyed", id.0)))
    }

    /// Parent of `id`, or `None` for a root.
    pub fn parent(&self, id: NodeId) -> EaselResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Ordered children of `id` (paint order).
    pub fn children(&self, id: NodeId) -> EaselResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Attribute bag of `id`.
    pub fn attrs(&self, id: NodeId) -> EaselResult<&Attrs> {
        Ok(&self.node(id)?.attrs)
    }

    /// Set one attribute, returning whether it was transform-affecting.
    ///
    /// Transform-attribute mutation advances the graph generation so every
    /// cached absolute transform is recomputed on next query.
    pub fn set_attr(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> EaselResult<bool> {
        let transform = is_transform_attr(key);
        self.node_mut(id)?.attrs.set(key, value);
        if transform {
            self.generation += 1;
        }
        Ok(transform)
    }

    /// Append `child` to `parent`'s child list, reparenting if needed.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> EaselResult<()> {
        if parent == child {
            return Err(EaselError::invalid_state("a node cannot parent itself"));
        }
        if !self.node(parent)?.kind.is_container() {
            return Err(EaselError::invalid_state("shapes cannot own children"));
        }
        // Reject cycles: parent must not live in child's subtree.
        let mut cursor = Some(parent);
        while let Some(n) = cursor {
            if n == child {
                return Err(EaselError::invalid_state(
                    "cannot add an ancestor as a child",
                ));
            }
            cursor = self.node(n)?.parent;
        }

        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        // Ancestor chains changed; invalidate lazily via the generation.
        self.generation += 1;
        Ok(())
    }

    /// Remove `child` from its parent's list without destroying it.
    pub fn detach(&mut self, child: NodeId) -> EaselResult<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|c| *c != child);
        self.node_mut(child)?.parent = None;
        self.generation += 1;
        Ok(())
    }

    /// Destroy `id` and its entire subtree, returning every removed id.
    pub fn destroy(&mut self, id: NodeId) -> EaselResult<Vec<NodeId>> {
        self.node(id)?;
        self.detach(id)?;

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(data) = self.nodes.remove(&n.0) {
                stack.extend(data.children.iter().copied());
                removed.push(n);
            }
        }
        Ok(removed)
    }

    /// Paint-order index of `id` within its parent.
    pub fn z_index(&self, id: NodeId) -> EaselResult<usize> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| EaselError::invalid_state("root nodes have no z index"))?;
        let idx = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == id)
            .ok_or_else(|| EaselError::invalid_state("child missing from parent list"))?;
        Ok(idx)
    }

    /// Move `id` to a specific paint-order index (clamped to the child count).
    pub fn move_to_index(&mut self, id: NodeId, index: usize) -> EaselResult<()> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| EaselError::invalid_state("root nodes cannot be reordered"))?;
        let children = &mut self.node_mut(parent)?.children;
        let from = children
            .iter()
            .position(|c| *c == id)
            .ok_or_else(|| EaselError::invalid_state("child missing from parent list"))?;
        children.remove(from);
        let to = index.min(children.len());
        children.insert(to, id);
        Ok(())
    }

    /// Move `id` to the top of the paint order.
    pub fn move_to_top(&mut self, id: NodeId) -> EaselResult<()> {
        self.move_to_index(id, usize::MAX)
    }

    /// Move `id` to the bottom of the paint order.
    pub fn move_to_bottom(&mut self, id: NodeId) -> EaselResult<()> {
        self.move_to_index(id, 0)
    }

    /// Swap `id` one step up in the paint order.
    pub fn move_up(&mut self, id: NodeId) -> EaselResult<()> {
        let idx = self.z_index(id)?;
        self.move_to_index(id, idx + 1)
    }

    /// Swap `id` one step down in the paint order.
    pub fn move_down(&mut self, id: NodeId) -> EaselResult<()> {
        let idx = self.z_index(id)?;
        self.move_to_index(id, idx.saturating_sub(1))
    }

    /// Ancestor chain starting at `id` itself and ending at the root.
    pub fn ancestors(&self, id: NodeId) -> EaselResult<SmallVec<[NodeId; 8]>> {
        let mut chain = SmallVec::new();
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            chain.push(n);
            cursor = self.node(n)?.parent;
        }
        Ok(chain)
    }

    /// Nearest ancestor (including `id` itself) that is a layer.
    pub fn owning_layer(&self, id: NodeId) -> EaselResult<Option<NodeId>> {
        for n in self.ancestors(id)? {
            if matches!(self.node(n)?.kind, NodeKind::Layer) {
                return Ok(Some(n));
            }
        }
        Ok(None)
    }

    /// Absolute transform of `id`: its local affine composed with all
    /// ancestors, child-in-parent-space convention.
    ///
    /// Cached per node and stamped with the graph's transform generation;
    /// between mutations repeated calls return bit-identical matrices.
    pub fn absolute_transform(&mut self, id: NodeId) -> EaselResult<Affine> {
        let mut chain = self.ancestors(id)?;
        chain.reverse(); // root first

        let generation = self.generation;
        let mut current = Affine::IDENTITY;
        for nid in chain {
            let node = self.node_mut(nid)?;
            current = match &node.abs_cache {
                Some(cache) if cache.generation == generation => cache.affine,
                _ => {
                    let abs = current * node.local_transform().to_affine();
                    node.abs_cache = Some(AbsCache {
                        affine: abs,
                        generation,
                    });
                    abs
                }
            };
        }
        Ok(current)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
