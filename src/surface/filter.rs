//! Pixel filters applied to cached shape bitmaps.
//!
//! Filters operate in place on premultiplied RGBA8 buffers, after the shape
//! has been rasterized into its cache and before the cache is composited.

/// In-place pixel filter over a premultiplied RGBA8 buffer.
pub type FilterFn = Box<dyn Fn(&mut [u8], u32, u32)>;

/// Run `filters` in order over `pixels` (premul RGBA8, `width * height * 4`).
pub(crate) fn apply_filters(filters: &[FilterFn], pixels: &mut [u8], width: u32, height: u32) {
    for f in filters {
        f(pixels, width, height);
    }
}

/// Luminance grayscale. Alpha is untouched; premultiplied channels stay
/// premultiplied since the weights sum to one.
pub fn grayscale() -> FilterFn {
    Box::new(|pixels, _w, _h| {
        for px in pixels.chunks_exact_mut(4) {
            let y = (u32::from(px[0]) * 54 + u32::from(px[1]) * 183 + u32::from(px[2]) * 19)
                >> 8;
            let y = y as u8;
            px[0] = y;
            px[1] = y;
            px[2] = y;
        }
    })
}

/// Invert color channels. Unpremultiplies before inverting so the result
/// stays a valid premultiplied pixel.
pub fn invert() -> FilterFn {
    Box::new(|pixels, _w, _h| {
        for px in pixels.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                continue;
            }
            for c in &mut px[..3] {
                let straight = (u16::from(*c) * 255 + a / 2) / a;
                let inverted = 255u16.saturating_sub(straight.min(255));
                *c = ((inverted * a + 127) / 255) as u8;
            }
        }
    })
}

/// Scale color channels by `factor` (clamped to `[0, 1]` per channel against
/// alpha so pixels stay premultiplied).
pub fn brightness(factor: f64) -> FilterFn {
    let factor = factor.max(0.0);
    Box::new(move |pixels, _w, _h| {
        for px in pixels.chunks_exact_mut(4) {
            let a = px[3];
            for c in &mut px[..3] {
                let v = (f64::from(*c) * factor).round().clamp(0.0, 255.0) as u8;
                *c = v.min(a);
            }
        }
    })
}
