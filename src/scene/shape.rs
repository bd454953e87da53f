use kurbo::Shape as _;

use crate::{
    foundation::core::{BezPath, NodeId, Point, Rect, Vec2},
    foundation::error::{EaselError, EaselResult},
    scene::attrs::Attrs,
    surface::canvas::DrawSession,
};

/// Flattening tolerance used when lowering analytic geometry to paths.
pub(crate) const PATH_TOLERANCE: f64 = 0.1;

/// Read-only view of a shape handed to custom draw procedures.
pub struct ShapeView<'a> {
    /// The shape's node id.
    pub id: NodeId,
    /// The shape's attribute bag.
    pub attrs: &'a Attrs,
}

/// Plugin contract for shapes the core does not know about.
///
/// A procedure issues primitive calls against the passed [`DrawSession`]
/// (typically building a path and calling [`DrawSession::fill_path`]) and
/// reports its local, untransformed bounds via [`Self::self_rect`].
pub trait DrawProcedure {
    /// Issue drawing calls for this shape.
    fn draw(&self, shape: &ShapeView<'_>, session: &mut DrawSession<'_>) -> EaselResult<()>;

    /// Local-space bounding rect used for caching and coarse pruning.
    fn self_rect(&self, shape: &ShapeView<'_>) -> Rect;
}

/// Drawable geometry of a shape node.
///
/// Built-in variants read their dimensions from the node's attribute bag at
/// draw time (`Rect` → `width`/`height`/`cornerRadius`, `Circle` → `radius`,
/// `Ellipse` → `radiusX`/`radiusY`, `Line` → `points`/`closed`). `Path`
/// carries an explicit local-space path, `Custom` defers to a
/// [`DrawProcedure`] implementation.
pub enum Geometry {
    /// Axis-aligned rectangle anchored at the local origin.
    Rect,
    /// Circle centered on the local origin.
    Circle,
    /// Ellipse centered on the local origin.
    Ellipse,
    /// Polyline/polygon described by the `points` attribute.
    Line,
    /// Explicit local-space path.
    Path(BezPath),
    /// User-supplied draw procedure.
    Custom(Box<dyn DrawProcedure>),
}

impl Geometry {
    /// Lower built-in geometry to a local-space path.
    ///
    /// Returns `None` for [`Geometry::Custom`], which draws through its own
    /// procedure. Malformed `points` data is a configuration error, surfaced
    /// rather than coerced.
    pub fn build_path(&self, attrs: &Attrs) -> EaselResult<Option<BezPath>> {
        match self {
            Self::Rect => {
                let w = attrs.number("width");
                let h = attrs.number("height");
                let corner = attrs.number("cornerRadius");
                let rect = Rect::new(0.0, 0.0, w, h);
                let path = if corner > 0.0 {
                    rect.to_rounded_rect(corner).to_path(PATH_TOLERANCE)
                } else {
                    rect.to_path(PATH_TOLERANCE)
                };
                Ok(Some(path))
            }
            Self::Circle => {
                let r = attrs.number("radius");
                Ok(Some(
                    kurbo::Circle::new(Point::ORIGIN, r).to_path(PATH_TOLERANCE),
                ))
            }
            Self::Ellipse => {
                let rx = attrs.number("radiusX");
                let ry = attrs.number("radiusY");
                Ok(Some(
                    kurbo::Ellipse::new(Point::ORIGIN, Vec2::new(rx, ry), 0.0)
                        .to_path(PATH_TOLERANCE),
                ))
            }
            Self::Line => {
                let points = attrs.list("points");
                if points.len() < 4 || points.len() % 2 != 0 {
                    return Err(EaselError::configuration(
                        "line points must hold an even number of coordinates (at least 4)",
                    ));
                }
                let mut path = BezPath::new();
                path.move_to(Point::new(points[0], points[1]));
                for pair in points[2..].chunks_exact(2) {
                    path.line_to(Point::new(pair[0], pair[1]));
                }
                if attrs.flag("closed") {
                    path.close_path();
                }
                Ok(Some(path))
            }
            Self::Path(path) => Ok(Some(path.clone())),
            Self::Custom(_) => Ok(None),
        }
    }

    /// Local, untransformed bounds of this geometry.
    pub fn self_rect(&self, view: &ShapeView<'_>) -> EaselResult<Rect> {
        match self {
            Self::Custom(proc_) => Ok(proc_.self_rect(view)),
            _ => {
                let path = self
                    .build_path(view.attrs)?
                    .unwrap_or_else(BezPath::new);
                Ok(path.bounding_box())
            }
        }
    }
}

/// Shadow parameters resolved from a shape's attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowStyle {
    /// Shadow paint color (alpha already scaled by `shadowOpacity`).
    pub color: crate::foundation::core::Rgba8,
    /// Offset of the shadow silhouette in local space.
    pub offset: Vec2,
}

/// Resolved fill/stroke/shadow styling applied uniformly to every shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeStyle {
    /// Fill color, if any.
    pub fill: Option<crate::foundation::core::Rgba8>,
    /// Stroke color, if any.
    pub stroke: Option<crate::foundation::core::Rgba8>,
    /// Stroke width in local units.
    pub stroke_width: f64,
    /// Node opacity in `[0, 1]`.
    pub opacity: f64,
    /// Optional offset-silhouette shadow.
    pub shadow: Option<ShadowStyle>,
}

impl ShapeStyle {
    /// Resolve styling attributes into a concrete style.
    pub fn from_attrs(attrs: &Attrs) -> Self {
        let shadow = attrs.color("shadowColor").map(|color| ShadowStyle {
            color: color.with_alpha_scaled(attrs.number("shadowOpacity")),
            offset: Vec2::new(
                attrs.number("shadowOffsetX"),
                attrs.number("shadowOffsetY"),
            ),
        });
        Self {
            fill: attrs.color("fill"),
            stroke: attrs.color("stroke"),
            stroke_width: attrs.number("strokeWidth"),
            opacity: attrs.number("opacity").clamp(0.0, 1.0),
            shadow,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shape.rs"]
mod tests;
