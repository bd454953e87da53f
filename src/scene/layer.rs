//! Per-layer draw passes.
//!
//! Each layer owns a scene surface and a hit surface. A draw renders both:
//! the scene pass paints styled pixels, the hit pass paints color-keyed
//! silhouettes of listening shapes so pointer lookups are a single pixel
//! read plus a registry decode.

use smallvec::SmallVec;
use tracing::warn;

use crate::{
    foundation::core::{NodeId, Rgba8},
    foundation::error::{EaselError, EaselResult},
    hit::registry::HitColorRegistry,
    scene::graph::SceneGraph,
    scene::node::NodeKind,
    scene::shape::{Geometry, ShapeStyle, ShapeView},
    surface::canvas::{CanvasSurface, DrawSession, PaintMode},
};

/// Raster state owned by one layer node.
pub(crate) struct LayerSurfaces {
    pub scene: CanvasSurface,
    pub hit: CanvasSurface,
    pub registry: HitColorRegistry,
    /// Set on structural change (add/remove/reorder); forces a registry
    /// rebuild on the next draw. Attribute-only changes repaint the hit
    /// canvas with existing keys.
    pub hit_stale: bool,
}

impl LayerSurfaces {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> EaselResult<Self> {
        Ok(Self {
            scene: CanvasSurface::new(width, height, pixel_ratio)?,
            hit: CanvasSurface::new(width, height, pixel_ratio)?,
            registry: HitColorRegistry::new(),
            hit_stale: true,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> EaselResult<()> {
        self.scene.resize(width, height)?;
        self.hit.resize(width, height)?;
        self.hit_stale = true;
        Ok(())
    }
}

/// Render one layer's scene and hit surfaces from the current graph state.
///
/// Returns whether the hit registry was rebuilt. A shape whose geometry
/// fails to resolve is skipped with a warning; one bad shape never takes
/// down the layer.
#[tracing::instrument(skip(graph, surfaces))]
pub(crate) fn draw_layer(
    graph: &mut SceneGraph,
    surfaces: &mut LayerSurfaces,
    layer: NodeId,
) -> EaselResult<bool> {
    let rebuilt = surfaces.hit_stale;
    if rebuilt {
        surfaces.registry.reset();
    }

    {
        let mut session = surfaces.scene.session(PaintMode::Scene);
        paint_scene(graph, &mut session, layer)?;
    }
    surfaces.scene.present();

    {
        let mut session = surfaces.hit.session(PaintMode::Hit(Rgba8::transparent()));
        paint_hit(graph, &mut session, &mut surfaces.registry, layer)?;
    }
    surfaces.hit.present();

    surfaces.hit_stale = false;
    Ok(rebuilt)
}

fn paint_scene(
    graph: &mut SceneGraph,
    session: &mut DrawSession<'_>,
    node: NodeId,
) -> EaselResult<()> {
    let data = graph.node(node)?;
    if !data.is_visible() {
        return Ok(());
    }
    match &data.kind {
        NodeKind::Shape(_) => {
            if let Err(e) = draw_shape_scene(graph, session, node) {
                warn!(node = node.0, error = %e, "skipping shape that failed to draw");
            }
        }
        NodeKind::Group | NodeKind::Layer => {
            let opacity = data.attrs.number("opacity");
            let children: SmallVec<[NodeId; 8]> = data.children.iter().copied().collect();
            let pushed = session.push_opacity(opacity);
            for child in children {
                paint_scene(graph, session, child)?;
            }
            session.pop_opacity(pushed);
        }
    }
    Ok(())
}

fn draw_shape_scene(
    graph: &mut SceneGraph,
    session: &mut DrawSession<'_>,
    id: NodeId,
) -> EaselResult<()> {
    let world = graph.absolute_transform(id)?;
    let node = graph.node(id)?;
    let NodeKind::Shape(data) = &node.kind else {
        return Err(EaselError::invalid_state("expected a shape node"));
    };
    session.set_world(world);

    if let Some(cache) = &data.cache {
        let pushed = session.push_opacity(node.attrs.number("opacity"));
        session.draw_image(&cache.image, cache.rect, cache.pixel_ratio);
        session.pop_opacity(pushed);
        return Ok(());
    }

    let style = ShapeStyle::from_attrs(&node.attrs);
    match &data.geometry {
        Geometry::Custom(proc_) => {
            let pushed = session.push_opacity(style.opacity);
            let view = ShapeView {
                id,
                attrs: &node.attrs,
            };
            let outcome = proc_.draw(&view, session);
            session.pop_opacity(pushed);
            outcome?;
        }
        geometry => {
            if let Some(path) = geometry.build_path(&node.attrs)? {
                session.paint_shape(&path, &style);
            }
        }
    }
    Ok(())
}

fn paint_hit(
    graph: &mut SceneGraph,
    session: &mut DrawSession<'_>,
    registry: &mut HitColorRegistry,
    node: NodeId,
) -> EaselResult<()> {
    let data = graph.node(node)?;
    // A non-listening container removes its whole subtree from hit testing,
    // same as an invisible one.
    if !data.is_visible() || !data.is_listening() {
        return Ok(());
    }
    match &data.kind {
        NodeKind::Shape(_) => {
            let key = registry.key_for(node)?;
            session.set_hit_color(HitColorRegistry::key_to_color(key));
            if let Err(e) = draw_shape_hit(graph, session, node) {
                warn!(node = node.0, error = %e, "skipping shape that failed to hit-draw");
            }
        }
        NodeKind::Group | NodeKind::Layer => {
            let children: SmallVec<[NodeId; 8]> = data.children.iter().copied().collect();
            for child in children {
                paint_hit(graph, session, registry, child)?;
            }
        }
    }
    Ok(())
}

fn draw_shape_hit(
    graph: &mut SceneGraph,
    session: &mut DrawSession<'_>,
    id: NodeId,
) -> EaselResult<()> {
    let world = graph.absolute_transform(id)?;
    let node = graph.node(id)?;
    let NodeKind::Shape(data) = &node.kind else {
        return Err(EaselError::invalid_state("expected a shape node"));
    };
    session.set_world(world);

    let style = ShapeStyle::from_attrs(&node.attrs);
    match &data.geometry {
        Geometry::Custom(proc_) => {
            let view = ShapeView {
                id,
                attrs: &node.attrs,
            };
            proc_.draw(&view, session)?;
        }
        geometry => {
            if let Some(path) = geometry.build_path(&node.attrs)? {
                session.paint_shape(&path, &style);
            }
        }
    }
    Ok(())
}
