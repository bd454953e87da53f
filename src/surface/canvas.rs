//! Off-screen raster surfaces backed by `vello_cpu`.
//!
//! Each layer owns two of these: a scene surface holding the visible pixels
//! and a hit surface holding color-keyed silhouettes. Logical coordinates are
//! scaled by the configured pixel ratio before rasterization, so callers work
//! in logical units throughout.

use std::path::Path;
use std::sync::Arc;

use crate::{
    foundation::core::{Affine, BezPath, Rect, Rgba8, Vec2},
    foundation::error::{EaselError, EaselResult},
    scene::shape::{PATH_TOLERANCE, ShapeStyle},
};

/// An off-screen premultiplied RGBA8 raster target.
pub struct CanvasSurface {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl CanvasSurface {
    /// Allocate a surface of `width x height` logical pixels at `pixel_ratio`.
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> EaselResult<Self> {
        if width == 0 || height == 0 {
            return Err(EaselError::configuration(
                "surface dimensions must be non-zero",
            ));
        }
        if !(pixel_ratio.is_finite() && pixel_ratio > 0.0) {
            return Err(EaselError::configuration(format!(
                "pixel ratio must be positive, got {pixel_ratio}"
            )));
        }
        let (pw, ph) = physical_extent(width, height, pixel_ratio)?;
        Ok(Self {
            width,
            height,
            pixel_ratio,
            ctx: vello_cpu::RenderContext::new(pw, ph),
            pixmap: vello_cpu::Pixmap::new(pw, ph),
        })
    }

    /// Logical width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Physical-to-logical scale factor.
    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Physical extent of the backing pixmap.
    pub fn physical_size(&self) -> (u16, u16) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Reallocate the backing store for a new logical size.
    pub fn resize(&mut self, width: u32, height: u32) -> EaselResult<()> {
        *self = Self::new(width, height, self.pixel_ratio)?;
        Ok(())
    }

    /// Begin a fresh draw pass, discarding any recorded commands.
    pub(crate) fn session(&mut self, mode: PaintMode) -> DrawSession<'_> {
        self.ctx.reset();
        DrawSession::new(&mut self.ctx, Affine::scale(self.pixel_ratio), mode)
    }

    /// Rasterize the recorded commands into the backing pixmap.
    pub(crate) fn present(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Clear the backing pixmap to transparent without drawing.
    pub fn clear(&mut self) {
        self.ctx.reset();
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    /// Premultiplied RGBA of the pixel at logical coordinates, if in bounds.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<[u8; 4]> {
        let px = (x * self.pixel_ratio).floor();
        let py = (y * self.pixel_ratio).floor();
        if px < 0.0 || py < 0.0 {
            return None;
        }
        let (px, py) = (px as usize, py as usize);
        let (pw, ph) = self.physical_size();
        if px >= usize::from(pw) || py >= usize::from(ph) {
            return None;
        }
        let idx = (py * usize::from(pw) + px) * 4;
        let bytes = self.pixmap.data_as_u8_slice();
        Some([bytes[idx], bytes[idx + 1], bytes[idx + 2], bytes[idx + 3]])
    }

    /// Raw premultiplied RGBA8 bytes of the backing pixmap, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Mutable view of the backing pixels, for filter application.
    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Snapshot the current pixels as an image paint.
    pub(crate) fn to_image(&self) -> vello_cpu::Image {
        let (pw, ph) = self.physical_size();
        let pixmap = pixmap_from_premul_bytes(self.pixmap.data_as_u8_slice(), pw, ph);
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        }
    }

    /// Encode the surface as a PNG file (straight alpha).
    pub fn to_png(&self, path: impl AsRef<Path>) -> EaselResult<()> {
        let (pw, ph) = self.physical_size();
        let mut bytes = self.pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        let img = image::RgbaImage::from_raw(u32::from(pw), u32::from(ph), bytes)
            .ok_or_else(|| EaselError::invalid_state("surface buffer size mismatch"))?;
        img.save(path.as_ref()).map_err(|e| {
            EaselError::configuration(format!(
                "failed to write png '{}': {e}",
                path.as_ref().display()
            ))
        })
    }
}

/// How a draw pass paints shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PaintMode {
    /// Normal rendering with the shape's own style.
    Scene,
    /// Hit-canvas rendering: every pixel gets this solid color, shadows and
    /// opacity are suppressed.
    Hit(Rgba8),
}

/// Recording handle for one draw pass over a [`CanvasSurface`].
///
/// Custom shapes receive one of these and issue primitive calls; the session
/// substitutes the hit color during hit passes so a custom shape stays
/// hit-testable without extra work.
pub struct DrawSession<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
    base: Affine,
    current: Affine,
    stack: Vec<Affine>,
    mode: PaintMode,
}

impl<'a> DrawSession<'a> {
    fn new(ctx: &'a mut vello_cpu::RenderContext, base: Affine, mode: PaintMode) -> Self {
        Self {
            ctx,
            base,
            current: base,
            stack: Vec::new(),
            mode,
        }
    }

    /// Save the current transform.
    pub fn save(&mut self) {
        self.stack.push(self.current);
    }

    /// Restore the most recently saved transform.
    pub fn restore(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.current = prev;
        }
    }

    /// Append a local transform to the current one.
    pub fn concat(&mut self, local: Affine) {
        self.current *= local;
    }

    /// Replace the current transform with a world-space one.
    pub(crate) fn set_world(&mut self, world: Affine) {
        self.current = self.base * world;
    }

    pub(crate) fn hit_mode(&self) -> bool {
        matches!(self.mode, PaintMode::Hit(_))
    }

    /// Switch the active hit key. No effect on scene passes.
    pub(crate) fn set_hit_color(&mut self, color: Rgba8) {
        if let PaintMode::Hit(key) = &mut self.mode {
            *key = color;
        }
    }

    /// Open a group opacity layer. No-op for hit passes and full opacity.
    pub(crate) fn push_opacity(&mut self, opacity: f64) -> bool {
        if self.hit_mode() || opacity >= 1.0 {
            return false;
        }
        self.ctx
            .push_opacity_layer(opacity.clamp(0.0, 1.0) as f32);
        true
    }

    pub(crate) fn pop_opacity(&mut self, pushed: bool) {
        if pushed {
            self.ctx.pop_layer();
        }
    }

    /// Fill `path` with `color` under the current transform.
    pub fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        self.prepare(color);
        let cpu_path = bezpath_to_cpu(path);
        self.ctx.fill_path(&cpu_path);
    }

    /// Fill an axis-aligned rect with `color` under the current transform.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.prepare(color);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    }

    /// Stroke `path` with `color` at `width`, expanding the outline to a fill.
    pub fn stroke_path(&mut self, path: &BezPath, color: Rgba8, width: f64) {
        if width <= 0.0 {
            return;
        }
        let outline = kurbo::stroke(
            path.iter(),
            &kurbo::Stroke::new(width),
            &kurbo::StrokeOpts::default(),
            PATH_TOLERANCE,
        );
        self.fill_path(&outline, color);
    }

    /// Composite a cached bitmap covering `rect` in the current local space.
    /// The bitmap holds `pixel_ratio` physical pixels per logical unit.
    pub(crate) fn draw_image(&mut self, image: &vello_cpu::Image, rect: Rect, pixel_ratio: f64) {
        let placement = self.current
            * Affine::translate(Vec2::new(rect.x0, rect.y0))
            * Affine::scale(1.0 / pixel_ratio);
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_transform(affine_to_cpu(placement));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(image.clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            rect.width() * pixel_ratio,
            rect.height() * pixel_ratio,
        ));
    }

    /// Paint a full styled shape: shadow, fill, then stroke. Hit passes paint
    /// the same coverage as a solid silhouette.
    pub(crate) fn paint_shape(&mut self, path: &BezPath, style: &ShapeStyle) {
        if self.hit_mode() {
            // The hit canvas wants the full interactive silhouette: the
            // interior regardless of fill, plus the stroke band.
            let key = Rgba8::transparent();
            self.fill_path(path, key);
            if style.stroke.is_some() {
                self.stroke_path(path, key, style.stroke_width);
            }
            return;
        }

        let pushed = self.push_opacity(style.opacity);
        if let Some(shadow) = &style.shadow {
            self.save();
            self.concat(Affine::translate(shadow.offset));
            if style.fill.is_some() {
                self.fill_path(path, shadow.color);
            }
            if style.stroke.is_some() {
                self.stroke_path(path, shadow.color, style.stroke_width);
            }
            self.restore();
        }
        if let Some(fill) = style.fill {
            self.fill_path(path, fill);
        }
        if let Some(stroke) = style.stroke {
            self.stroke_path(path, stroke, style.stroke_width);
        }
        self.pop_opacity(pushed);
    }

    fn prepare(&mut self, color: Rgba8) {
        let paint = match self.mode {
            PaintMode::Scene => color,
            PaintMode::Hit(key) => key,
        };
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_transform(affine_to_cpu(self.current));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            paint.r, paint.g, paint.b, paint.a,
        ));
    }
}

fn physical_extent(width: u32, height: u32, pixel_ratio: f64) -> EaselResult<(u16, u16)> {
    let pw = (f64::from(width) * pixel_ratio).round();
    let ph = (f64::from(height) * pixel_ratio).round();
    let to_u16 = |v: f64, axis: &str| -> EaselResult<u16> {
        if v < 1.0 || v > f64::from(u16::MAX) {
            return Err(EaselError::resource_exhaustion(format!(
                "physical {axis} {v} out of range 1..={}",
                u16::MAX
            )));
        }
        Ok(v as u16)
    };
    Ok((to_u16(pw, "width")?, to_u16(ph, "height")?))
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u16, height: u16) -> vello_cpu::Pixmap {
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        usize::from(width) * usize::from(height),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, true)
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/canvas.rs"]
mod tests;
