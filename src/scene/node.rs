use crate::{
    event::types::ListenerId,
    foundation::core::{Affine, NodeId, Rect, Vec2},
    scene::attrs::Attrs,
    scene::shape::Geometry,
    surface::filter::FilterFn,
};

/// Cached absolute transform, stamped with the graph's transform generation
/// at computation time. Any transform mutation or reparent anywhere bumps
/// the generation, so a matching stamp means the chain is unchanged.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AbsCache {
    pub affine: Affine,
    pub generation: u64,
}

/// Shape bitmap cache produced by `Stage::cache_shape`.
pub(crate) struct CachedBitmap {
    /// Premultiplied raster of the shape's self rect, filters applied.
    pub image: vello_cpu::Image,
    /// Local-space rect the bitmap covers.
    pub rect: Rect,
    /// Device scale baked into the bitmap.
    pub pixel_ratio: f64,
}

pub(crate) struct ShapeData {
    pub geometry: Geometry,
    pub filters: Vec<FilterFn>,
    pub cache: Option<CachedBitmap>,
}

impl ShapeData {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            filters: Vec::new(),
            cache: None,
        }
    }
}

pub(crate) enum NodeKind {
    Group,
    Layer,
    Shape(ShapeData),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        !matches!(self, Self::Shape(_))
    }
}

pub(crate) struct NodeData {
    pub parent: Option<NodeId>,
    pub attrs: Attrs,
    pub kind: NodeKind,
    /// Ordered child list; index order is paint order (later = on top).
    pub children: Vec<NodeId>,
    pub abs_cache: Option<AbsCache>,
    pub listeners: Vec<ListenerId>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            attrs: Attrs::new(),
            kind,
            children: Vec::new(),
            abs_cache: None,
            listeners: Vec::new(),
        }
    }

    /// Local transform derived from the transform attributes.
    pub fn local_transform(&self) -> crate::foundation::core::LocalTransform {
        crate::foundation::core::LocalTransform {
            translate: Vec2::new(self.attrs.number("x"), self.attrs.number("y")),
            rotation_rad: self.attrs.number("rotation"),
            scale: Vec2::new(self.attrs.number("scaleX"), self.attrs.number("scaleY")),
            offset: Vec2::new(self.attrs.number("offsetX"), self.attrs.number("offsetY")),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.attrs.flag("visible")
    }

    pub fn is_listening(&self) -> bool {
        self.attrs.flag("listening")
    }
}
