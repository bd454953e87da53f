//! The stage: tree root, draw orchestration, hit testing, pointer dispatch.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use smallvec::{SmallVec, smallvec};
use tracing::debug;

use crate::{
    event::types::{Event, EventType, ListenerId},
    foundation::core::{Affine, NodeId, Point, Rect, Size, Vec2},
    foundation::error::{EaselError, EaselResult},
    hit::registry::HitColorRegistry,
    scene::graph::SceneGraph,
    scene::layer::{LayerSurfaces, draw_layer},
    scene::node::{CachedBitmap, NodeKind, ShapeData},
    scene::shape::{Geometry, ShapeStyle, ShapeView},
    schedule::clock::{Clock, MonotonicClock, NoopScheduler, TickScheduler},
    schedule::redraw::RedrawQueue,
    surface::canvas::{CanvasSurface, PaintMode},
    surface::filter::{FilterFn, apply_filters},
    scene::attrs::{AttrValue, Attrs},
};

/// Two presses on the same node within this window make a double click/tap.
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Pointer travel (logical pixels) before an armed drag actually starts.
const DRAG_THRESHOLD: f64 = 2.0;

/// Construction parameters for a [`Stage`].
pub struct StageConfig {
    /// Logical viewport size.
    pub size: Size,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f64,
    /// Time source for click windows and animations. Defaults to a
    /// [`MonotonicClock`].
    pub clock: Option<Rc<dyn Clock>>,
    /// Host frame-loop hook for batched draws. Defaults to
    /// [`NoopScheduler`] (host polls `run_pending_draws`).
    pub scheduler: Option<Box<dyn TickScheduler>>,
}

impl StageConfig {
    /// Config for a `width x height` stage at pixel ratio 1.
    pub fn new(width: u32, height: u32) -> EaselResult<Self> {
        Ok(Self {
            size: Size::new(width, height)?,
            pixel_ratio: 1.0,
            clock: None,
            scheduler: None,
        })
    }

    /// Override the physical-to-logical scale.
    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Inject a time source.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Inject a host tick scheduler.
    pub fn with_scheduler(mut self, scheduler: Box<dyn TickScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

/// Cumulative draw counters, exposed for coalescing checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Full layer draws executed (immediate or flushed).
    pub layer_draws: u64,
    /// Hit registries rebuilt after structural changes.
    pub hit_rebuilds: u64,
}

struct ListenerSlot {
    node: NodeId,
    event: EventType,
    /// Taken out of the slot while the callback runs so it may call back
    /// into the stage.
    callback: Option<Box<dyn FnMut(&mut Stage, &mut Event)>>,
}

enum DragState {
    Idle,
    /// A press landed on a draggable node; waiting for the threshold.
    Armed { node: NodeId },
    Dragging { node: NodeId, grab: Vec2 },
}

struct PointerState {
    hovered: Option<NodeId>,
    pressed: Option<NodeId>,
    press_position: Point,
    last_click: Option<(NodeId, Duration)>,
    last_tap: Option<(NodeId, Duration)>,
    drag: DragState,
    dragged_this_gesture: bool,
}

impl PointerState {
    fn new() -> Self {
        Self {
            hovered: None,
            pressed: None,
            press_position: Point::ORIGIN,
            last_click: None,
            last_tap: None,
            drag: DragState::Idle,
            dragged_this_gesture: false,
        }
    }

    fn forget(&mut self, removed: &[NodeId]) {
        if self.hovered.is_some_and(|n| removed.contains(&n)) {
            self.hovered = None;
        }
        if self.pressed.is_some_and(|n| removed.contains(&n)) {
            self.pressed = None;
        }
        if self.last_click.is_some_and(|(n, _)| removed.contains(&n)) {
            self.last_click = None;
        }
        if self.last_tap.is_some_and(|(n, _)| removed.contains(&n)) {
            self.last_tap = None;
        }
        let drag_node = match self.drag {
            DragState::Armed { node } | DragState::Dragging { node, .. } => Some(node),
            DragState::Idle => None,
        };
        if drag_node.is_some_and(|n| removed.contains(&n)) {
            self.drag = DragState::Idle;
        }
    }
}

/// Root of a scene. Owns the node tree, one scene/hit surface pair per
/// layer, the redraw queue, and all event listeners.
pub struct Stage {
    size: Size,
    pixel_ratio: f64,
    graph: SceneGraph,
    root: NodeId,
    surfaces: HashMap<NodeId, LayerSurfaces>,
    redraw: RedrawQueue,
    listeners: HashMap<u64, ListenerSlot>,
    next_listener: u64,
    pointer: PointerState,
    clock: Rc<dyn Clock>,
    stats: DrawStats,
}

impl Stage {
    /// Build an empty stage from `config`.
    pub fn new(config: StageConfig) -> Self {
        let mut graph = SceneGraph::new();
        let root = graph.create(NodeKind::Group);
        let clock = config
            .clock
            .unwrap_or_else(|| Rc::new(MonotonicClock::new()));
        let scheduler = config
            .scheduler
            .unwrap_or_else(|| Box::new(NoopScheduler));
        Self {
            size: config.size,
            pixel_ratio: config.pixel_ratio,
            graph,
            root,
            surfaces: HashMap::new(),
            redraw: RedrawQueue::new(scheduler),
            listeners: HashMap::new(),
            next_listener: 1,
            pointer: PointerState::new(),
            clock,
            stats: DrawStats::default(),
        }
    }

    /// Logical viewport size.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Physical pixels per logical pixel.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// The invisible root container all layers hang off.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The stage's time source.
    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    /// Cumulative draw counters.
    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    /// Read-only access to the node arena.
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Resize the viewport, reallocating every layer surface.
    pub fn set_size(&mut self, size: Size) -> EaselResult<()> {
        self.size = size;
        for (layer, surfaces) in &mut self.surfaces {
            surfaces.resize(size.width, size.height)?;
            self.redraw.enqueue(*layer);
        }
        Ok(())
    }

    // ---- tree construction -------------------------------------------------

    /// Append a new layer to the top of the stage.
    pub fn add_layer(&mut self) -> EaselResult<NodeId> {
        let layer = self.graph.create(NodeKind::Layer);
        self.graph.add_child(self.root, layer)?;
        self.surfaces.insert(
            layer,
            LayerSurfaces::new(self.size.width, self.size.height, self.pixel_ratio)?,
        );
        self.redraw.enqueue(layer);
        Ok(layer)
    }

    /// Append a new group under `parent`.
    pub fn add_group(&mut self, parent: NodeId) -> EaselResult<NodeId> {
        if parent == self.root {
            return Err(EaselError::invalid_state(
                "only layers may be direct children of the stage",
            ));
        }
        let group = self.graph.create(NodeKind::Group);
        self.graph.add_child(parent, group)?;
        self.mark_structural(group)?;
        Ok(group)
    }

    /// Append a new shape with the given geometry under `parent`.
    pub fn add_shape(&mut self, parent: NodeId, geometry: Geometry) -> EaselResult<NodeId> {
        if parent == self.root {
            return Err(EaselError::invalid_state(
                "only layers may be direct children of the stage",
            ));
        }
        let shape = self
            .graph
            .create(NodeKind::Shape(ShapeData::new(geometry)));
        self.graph.add_child(parent, shape)?;
        self.mark_structural(shape)?;
        Ok(shape)
    }

    /// Reparent `child` under `new_parent`, preserving the child's subtree.
    pub fn move_node(&mut self, child: NodeId, new_parent: NodeId) -> EaselResult<()> {
        if new_parent == self.root && !matches!(self.graph.node(child)?.kind, NodeKind::Layer) {
            return Err(EaselError::invalid_state(
                "only layers may be direct children of the stage",
            ));
        }
        self.mark_structural(child)?;
        self.graph.add_child(new_parent, child)?;
        self.mark_structural(child)?;
        Ok(())
    }

    /// Detach `id` from the tree without destroying it.
    pub fn remove(&mut self, id: NodeId) -> EaselResult<()> {
        self.mark_structural(id)?;
        self.graph.detach(id)?;
        if matches!(self.graph.node(id)?.kind, NodeKind::Layer) {
            self.redraw.discard(id);
        }
        Ok(())
    }

    /// Destroy `id` and its subtree, releasing surfaces and listeners.
    pub fn destroy(&mut self, id: NodeId) -> EaselResult<()> {
        self.mark_structural(id)?;
        let removed = self.graph.destroy(id)?;
        for node in &removed {
            self.surfaces.remove(node);
            self.redraw.discard(*node);
        }
        self.listeners
            .retain(|_, slot| !removed.contains(&slot.node));
        self.pointer.forget(&removed);
        Ok(())
    }

    // ---- ordering ----------------------------------------------------------

    /// Paint-order index of `id` within its parent.
    pub fn z_index(&self, id: NodeId) -> EaselResult<usize> {
        self.graph.z_index(id)
    }

    /// Move `id` to a specific paint-order index.
    pub fn move_to_index(&mut self, id: NodeId, index: usize) -> EaselResult<()> {
        self.graph.move_to_index(id, index)?;
        self.mark_structural(id)
    }

    /// Move `id` to the top of its siblings.
    pub fn move_to_top(&mut self, id: NodeId) -> EaselResult<()> {
        self.graph.move_to_top(id)?;
        self.mark_structural(id)
    }

    /// Move `id` below all of its siblings.
    pub fn move_to_bottom(&mut self, id: NodeId) -> EaselResult<()> {
        self.graph.move_to_bottom(id)?;
        self.mark_structural(id)
    }

    /// Swap `id` one step up in the paint order.
    pub fn move_up(&mut self, id: NodeId) -> EaselResult<()> {
        self.graph.move_up(id)?;
        self.mark_structural(id)
    }

    /// Swap `id` one step down in the paint order.
    pub fn move_down(&mut self, id: NodeId) -> EaselResult<()> {
        self.graph.move_down(id)?;
        self.mark_structural(id)
    }

    // ---- attributes --------------------------------------------------------

    /// Attribute bag of `id`.
    pub fn attrs(&self, id: NodeId) -> EaselResult<&Attrs> {
        self.graph.attrs(id)
    }

    /// Set one attribute and schedule the owning layer for redraw.
    pub fn set_attr(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> EaselResult<()> {
        self.graph.set_attr(id, key, value)?;
        self.batch_draw_owner(id)
    }

    /// Convenience for the common `x`/`y` pair.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> EaselResult<()> {
        self.graph.set_attr(id, "x", position.x)?;
        self.graph.set_attr(id, "y", position.y)?;
        self.batch_draw_owner(id)
    }

    /// Absolute (stage-space) transform of `id`.
    pub fn absolute_transform(&mut self, id: NodeId) -> EaselResult<Affine> {
        self.graph.absolute_transform(id)
    }

    // ---- drawing -----------------------------------------------------------

    /// Draw every layer immediately, in paint order.
    pub fn draw(&mut self) -> EaselResult<()> {
        for layer in self.layers()? {
            self.draw_layer(layer)?;
        }
        Ok(())
    }

    /// Draw one layer immediately and drop any pending request for it.
    pub fn draw_layer(&mut self, layer: NodeId) -> EaselResult<()> {
        let surfaces = self
            .surfaces
            .get_mut(&layer)
            .ok_or_else(|| EaselError::invalid_state("node is not a layer"))?;
        if self.graph.node(layer)?.is_visible() {
            let rebuilt = draw_layer(&mut self.graph, surfaces, layer)?;
            self.stats.layer_draws += 1;
            if rebuilt {
                self.stats.hit_rebuilds += 1;
            }
        } else {
            surfaces.scene.clear();
            surfaces.hit.clear();
        }
        self.redraw.discard(layer);
        Ok(())
    }

    /// Scene surface of `layer`, for pixel readback and PNG export.
    pub fn layer_surface(&self, layer: NodeId) -> EaselResult<&CanvasSurface> {
        self.surfaces
            .get(&layer)
            .map(|s| &s.scene)
            .ok_or_else(|| EaselError::invalid_state("node is not a layer"))
    }

    /// Request a coalesced redraw of the layer owning `node` (or of the layer
    /// itself). Duplicate requests within one tick fold into a single draw.
    pub fn batch_draw(&mut self, node: NodeId) -> EaselResult<()> {
        let layer = self
            .graph
            .owning_layer(node)?
            .ok_or_else(|| EaselError::invalid_state("node is not attached to a layer"))?;
        self.redraw.enqueue(layer);
        Ok(())
    }

    /// Flush all pending batched draws. Returns how many layers were drawn.
    pub fn run_pending_draws(&mut self) -> EaselResult<usize> {
        let pending = self.redraw.take_pending();
        let mut drawn = 0;
        for layer in pending {
            if !self.surfaces.contains_key(&layer) {
                continue;
            }
            self.draw_layer(layer)?;
            drawn += 1;
        }
        if drawn > 0 {
            debug!(layers = drawn, "flushed pending draws");
        }
        Ok(drawn)
    }

    // ---- hit testing -------------------------------------------------------

    /// Topmost listening shape under `point`, searching layers back to front.
    ///
    /// Pending batched draws are flushed first so lookups never see stale
    /// hit pixels. Only fully opaque hit pixels decode; antialiased edge
    /// pixels resolve to no hit.
    pub fn shape_at(&mut self, point: Point) -> EaselResult<Option<NodeId>> {
        self.run_pending_draws()?;
        for layer in self.layers()?.into_iter().rev() {
            let node = self.graph.node(layer)?;
            if !node.is_visible() || !node.is_listening() {
                continue;
            }
            let Some(surfaces) = self.surfaces.get(&layer) else {
                continue;
            };
            let Some([r, g, b, a]) = surfaces.hit.pixel_at(point.x, point.y) else {
                continue;
            };
            if a != 255 {
                continue;
            }
            let key = HitColorRegistry::color_to_key(r, g, b);
            if let Some(shape) = surfaces.registry.resolve(key) {
                return Ok(Some(shape));
            }
        }
        Ok(None)
    }

    // ---- listeners ---------------------------------------------------------

    /// Register a listener for `event` on `node`.
    pub fn on(
        &mut self,
        node: NodeId,
        event: EventType,
        callback: impl FnMut(&mut Stage, &mut Event) + 'static,
    ) -> EaselResult<ListenerId> {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.graph.node_mut(node)?.listeners.push(id);
        self.listeners.insert(
            id.0,
            ListenerSlot {
                node,
                event,
                callback: Some(Box::new(callback)),
            },
        );
        Ok(id)
    }

    /// Remove a listener. Unknown ids are ignored (the node may already be
    /// gone).
    pub fn off(&mut self, listener: ListenerId) {
        if let Some(slot) = self.listeners.remove(&listener.0)
            && let Ok(node) = self.graph.node_mut(slot.node)
        {
            node.listeners.retain(|l| *l != listener);
        }
    }

    /// Dispatch an event to `target`, bubbling through its ancestors.
    ///
    /// The listener list per node is snapshotted before invocation and
    /// callbacks are taken out of their slots while running, so listeners
    /// may freely mutate the stage, including adding or removing listeners.
    pub fn dispatch(&mut self, event_type: EventType, target: NodeId, pointer: Point) {
        let path: SmallVec<[NodeId; 8]> = if event_type.bubbles() {
            match self.graph.ancestors(target) {
                Ok(path) => path,
                Err(_) => return,
            }
        } else {
            smallvec![target]
        };

        let mut event = Event::new(event_type, target, pointer);
        for node in path {
            let ids: Vec<ListenerId> = match self.graph.node(node) {
                Ok(data) => data.listeners.clone(),
                Err(_) => continue,
            };
            event.current_target = node;
            for lid in ids {
                let matches_event = self
                    .listeners
                    .get(&lid.0)
                    .is_some_and(|slot| slot.event == event_type);
                if !matches_event {
                    continue;
                }
                let Some(mut callback) =
                    self.listeners.get_mut(&lid.0).and_then(|s| s.callback.take())
                else {
                    continue;
                };
                callback(self, &mut event);
                if let Some(slot) = self.listeners.get_mut(&lid.0) {
                    slot.callback = Some(callback);
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
    }

    // ---- pointer input -----------------------------------------------------

    /// Feed a mouse-button press at stage coordinates.
    pub fn pointer_down(&mut self, point: Point) -> EaselResult<()> {
        self.press(point, EventType::MouseDown)
    }

    /// Feed a mouse move at stage coordinates.
    pub fn pointer_move(&mut self, point: Point) -> EaselResult<()> {
        self.advance_drag(point)?;
        let target = self.shape_at(point)?;
        self.sync_hover(target, point);
        if let Some(t) = target {
            self.dispatch(EventType::MouseMove, t, point);
        }
        Ok(())
    }

    /// Feed a mouse-button release at stage coordinates.
    pub fn pointer_up(&mut self, point: Point) -> EaselResult<()> {
        self.release(point, EventType::MouseUp, EventType::Click, EventType::DblClick)
    }

    /// Feed a touch press at stage coordinates.
    pub fn touch_start(&mut self, point: Point) -> EaselResult<()> {
        self.press(point, EventType::TouchStart)
    }

    /// Feed a touch move at stage coordinates. Touch has no hover, so only
    /// drag and `touchmove` fire.
    pub fn touch_move(&mut self, point: Point) -> EaselResult<()> {
        self.advance_drag(point)?;
        if let Some(t) = self.shape_at(point)? {
            self.dispatch(EventType::TouchMove, t, point);
        }
        Ok(())
    }

    /// Feed a touch release at stage coordinates.
    pub fn touch_end(&mut self, point: Point) -> EaselResult<()> {
        self.release(point, EventType::TouchEnd, EventType::Tap, EventType::DblTap)
    }

    fn press(&mut self, point: Point, down: EventType) -> EaselResult<()> {
        let target = self.shape_at(point)?;
        self.pointer.pressed = target;
        self.pointer.press_position = point;
        self.pointer.dragged_this_gesture = false;
        self.pointer.drag = match target {
            Some(t) => match self.draggable_ancestor(t)? {
                Some(node) => DragState::Armed { node },
                None => DragState::Idle,
            },
            None => DragState::Idle,
        };
        if let Some(t) = target {
            self.dispatch(down, t, point);
        }
        Ok(())
    }

    fn release(
        &mut self,
        point: Point,
        up: EventType,
        click: EventType,
        double: EventType,
    ) -> EaselResult<()> {
        let dragging = match self.pointer.drag {
            DragState::Dragging { node, .. } => Some(node),
            _ => None,
        };
        self.pointer.drag = DragState::Idle;
        if let Some(node) = dragging {
            self.dispatch(EventType::DragEnd, node, point);
        }

        let target = self.shape_at(point)?;
        if let Some(t) = target {
            self.dispatch(up, t, point);
        }

        let pressed = self.pointer.pressed.take();
        if !self.pointer.dragged_this_gesture
            && let Some(t) = pressed
            && target == Some(t)
        {
            self.dispatch(click, t, point);
            let now = self.clock.now();
            let slot = if click == EventType::Click {
                &mut self.pointer.last_click
            } else {
                &mut self.pointer.last_tap
            };
            let is_double = matches!(
                *slot,
                Some((prev, at)) if prev == t && now.saturating_sub(at) <= DOUBLE_CLICK_WINDOW
            );
            if is_double {
                *slot = None;
                self.dispatch(double, t, point);
            } else {
                *slot = Some((t, now));
            }
        }
        Ok(())
    }

    fn advance_drag(&mut self, point: Point) -> EaselResult<()> {
        match self.pointer.drag {
            DragState::Idle => Ok(()),
            DragState::Armed { node } => {
                if (point - self.pointer.press_position).hypot() <= DRAG_THRESHOLD {
                    return Ok(());
                }
                let grab = self.grab_offset(node, self.pointer.press_position)?;
                self.pointer.drag = DragState::Dragging { node, grab };
                self.pointer.dragged_this_gesture = true;
                self.dispatch(EventType::DragStart, node, point);
                self.drag_to(node, grab, point)
            }
            DragState::Dragging { node, grab } => self.drag_to(node, grab, point),
        }
    }

    fn drag_to(&mut self, node: NodeId, grab: Vec2, point: Point) -> EaselResult<()> {
        let local = self.parent_space(node, point)?;
        self.set_position(node, Point::new(local.x - grab.x, local.y - grab.y))?;
        self.dispatch(EventType::DragMove, node, point);
        Ok(())
    }

    /// Offset between the pointer (in the node's parent space) and the node's
    /// position at drag start, so the grab point stays under the pointer.
    fn grab_offset(&mut self, node: NodeId, point: Point) -> EaselResult<Vec2> {
        let local = self.parent_space(node, point)?;
        let attrs = self.graph.attrs(node)?;
        Ok(Vec2::new(
            local.x - attrs.number("x"),
            local.y - attrs.number("y"),
        ))
    }

    fn parent_space(&mut self, node: NodeId, point: Point) -> EaselResult<Point> {
        let parent = self.graph.parent(node)?;
        let world = match parent {
            Some(p) => self.graph.absolute_transform(p)?,
            None => Affine::IDENTITY,
        };
        Ok(world.inverse() * point)
    }

    fn sync_hover(&mut self, target: Option<NodeId>, point: Point) {
        if target == self.pointer.hovered {
            return;
        }
        if let Some(old) = self.pointer.hovered.take()
            && self.graph.contains(old)
        {
            self.dispatch(EventType::MouseOut, old, point);
            self.dispatch(EventType::MouseLeave, old, point);
        }
        if let Some(new) = target {
            self.dispatch(EventType::MouseOver, new, point);
            self.dispatch(EventType::MouseEnter, new, point);
        }
        self.pointer.hovered = target;
    }

    fn draggable_ancestor(&self, node: NodeId) -> EaselResult<Option<NodeId>> {
        for id in self.graph.ancestors(node)? {
            if id == self.root {
                break;
            }
            if self.graph.attrs(id)?.flag("draggable") {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    // ---- shape caching -----------------------------------------------------

    /// Rasterize `shape` into an off-screen bitmap (with filters applied) so
    /// subsequent draws composite the cached pixels instead of re-running the
    /// shape's geometry.
    ///
    /// Node opacity stays live; fill, stroke, and shadow are baked.
    pub fn cache_shape(&mut self, shape: NodeId) -> EaselResult<()> {
        let rect = self.cache_rect(shape)?;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(EaselError::configuration(
                "shape has empty bounds, nothing to cache",
            ));
        }
        let mut surface = CanvasSurface::new(
            rect.width().ceil() as u32,
            rect.height().ceil() as u32,
            self.pixel_ratio,
        )?;
        {
            let mut session = surface.session(PaintMode::Scene);
            session.set_world(Affine::translate(Vec2::new(-rect.x0, -rect.y0)));

            let node = self.graph.node(shape)?;
            let NodeKind::Shape(data) = &node.kind else {
                return Err(EaselError::invalid_state("only shapes can be cached"));
            };
            let mut style = ShapeStyle::from_attrs(&node.attrs);
            style.opacity = 1.0;
            match &data.geometry {
                Geometry::Custom(proc_) => {
                    let view = ShapeView {
                        id: shape,
                        attrs: &node.attrs,
                    };
                    proc_.draw(&view, &mut session)?;
                }
                geometry => {
                    if let Some(path) = geometry.build_path(&node.attrs)? {
                        session.paint_shape(&path, &style);
                    }
                }
            }
        }
        surface.present();

        let filters = match &mut self.graph.node_mut(shape)?.kind {
            NodeKind::Shape(data) => std::mem::take(&mut data.filters),
            _ => Vec::new(),
        };
        if !filters.is_empty() {
            let (pw, ph) = surface.physical_size();
            apply_filters(&filters, surface.pixels_mut(), u32::from(pw), u32::from(ph));
        }
        if let NodeKind::Shape(data) = &mut self.graph.node_mut(shape)?.kind {
            data.filters = filters;
        }

        let image = surface.to_image();
        if let NodeKind::Shape(data) = &mut self.graph.node_mut(shape)?.kind {
            data.cache = Some(CachedBitmap {
                image,
                rect,
                pixel_ratio: self.pixel_ratio,
            });
        }
        self.batch_draw_owner(shape)
    }

    /// Drop a shape's cached bitmap and go back to live geometry.
    pub fn clear_cache(&mut self, shape: NodeId) -> EaselResult<()> {
        if let NodeKind::Shape(data) = &mut self.graph.node_mut(shape)?.kind {
            data.cache = None;
        }
        self.batch_draw_owner(shape)
    }

    /// Replace a shape's filter chain. Re-caches immediately when a cache
    /// exists; otherwise filters take effect on the next `cache_shape`.
    pub fn set_filters(&mut self, shape: NodeId, filters: Vec<FilterFn>) -> EaselResult<()> {
        let cached = {
            let NodeKind::Shape(data) = &mut self.graph.node_mut(shape)?.kind else {
                return Err(EaselError::invalid_state("only shapes take filters"));
            };
            data.filters = filters;
            data.cache.is_some()
        };
        if cached {
            self.cache_shape(shape)?;
        }
        Ok(())
    }

    /// Local-space rect a shape cache must cover: geometry bounds padded by
    /// the stroke band and shadow offset.
    fn cache_rect(&self, shape: NodeId) -> EaselResult<Rect> {
        let node = self.graph.node(shape)?;
        let NodeKind::Shape(data) = &node.kind else {
            return Err(EaselError::invalid_state("only shapes can be cached"));
        };
        let view = ShapeView {
            id: shape,
            attrs: &node.attrs,
        };
        let mut rect = data.geometry.self_rect(&view)?;
        let style = ShapeStyle::from_attrs(&node.attrs);
        if style.stroke.is_some() {
            let half = style.stroke_width / 2.0;
            rect = rect.inflate(half, half);
        }
        if let Some(shadow) = &style.shadow {
            rect = rect.union(rect + shadow.offset);
        }
        Ok(rect)
    }

    // ---- internals ----------------------------------------------------------

    /// Layers in paint order (bottom first).
    fn layers(&self) -> EaselResult<Vec<NodeId>> {
        Ok(self.graph.children(self.root)?.to_vec())
    }

    fn batch_draw_owner(&mut self, node: NodeId) -> EaselResult<()> {
        if let Some(layer) = self.graph.owning_layer(node)? {
            self.redraw.enqueue(layer);
        }
        Ok(())
    }

    /// Record a structural change: the owning layer's hit registry must be
    /// rebuilt and the layer redrawn.
    fn mark_structural(&mut self, node: NodeId) -> EaselResult<()> {
        if let Some(layer) = self.graph.owning_layer(node)? {
            if let Some(surfaces) = self.surfaces.get_mut(&layer) {
                surfaces.hit_stale = true;
            }
            self.redraw.enqueue(layer);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/stage.rs"]
mod tests;
