use super::*;
use crate::scene::shape::ShadowStyle;

#[test]
fn zero_dimensions_are_rejected() {
    assert!(CanvasSurface::new(0, 10, 1.0).is_err());
    assert!(CanvasSurface::new(10, 0, 1.0).is_err());
    assert!(CanvasSurface::new(10, 10, 0.0).is_err());
    assert!(CanvasSurface::new(10, 10, -1.0).is_err());
}

#[test]
fn oversized_physical_extent_is_resource_exhaustion() {
    match CanvasSurface::new(60_000, 10, 2.0) {
        Err(e) => assert!(matches!(e, EaselError::ResourceExhaustion(_))),
        Ok(_) => panic!("oversized surface was accepted"),
    }
}

#[test]
fn pixel_ratio_scales_the_backing_store() {
    let surface = CanvasSurface::new(100, 50, 2.0).unwrap();
    assert_eq!(surface.physical_size(), (200, 100));
    assert_eq!((surface.width(), surface.height()), (100, 50));
    assert_eq!(surface.pixels().len(), 200 * 100 * 4);
}

#[test]
fn filled_rect_lands_in_the_pixels() {
    let mut surface = CanvasSurface::new(40, 40, 1.0).unwrap();
    {
        let mut session = surface.session(PaintMode::Scene);
        session.fill_rect(Rect::new(10.0, 10.0, 30.0, 30.0), Rgba8::rgb(255, 0, 0));
    }
    surface.present();

    assert_eq!(surface.pixel_at(20.0, 20.0), Some([255, 0, 0, 255]));
    assert_eq!(surface.pixel_at(5.0, 5.0), Some([0, 0, 0, 0]));
}

#[test]
fn pixel_at_respects_the_pixel_ratio() {
    let mut surface = CanvasSurface::new(20, 20, 2.0).unwrap();
    {
        let mut session = surface.session(PaintMode::Scene);
        session.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Rgba8::rgb(0, 255, 0));
    }
    surface.present();

    // Logical coordinates; the sample maps through the ratio internally.
    assert_eq!(surface.pixel_at(5.0, 5.0), Some([0, 255, 0, 255]));
    assert_eq!(surface.pixel_at(15.0, 15.0), Some([0, 0, 0, 0]));
    assert_eq!(surface.pixel_at(25.0, 25.0), None);
    assert_eq!(surface.pixel_at(-1.0, 5.0), None);
}

#[test]
fn hit_mode_substitutes_the_key_color() {
    let mut surface = CanvasSurface::new(20, 20, 1.0).unwrap();
    {
        let mut session = surface.session(PaintMode::Hit(Rgba8::rgb(0, 0, 7)));
        // The caller's paint color must be ignored on the hit canvas.
        session.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Rgba8::rgba(9, 9, 9, 9));
    }
    surface.present();
    assert_eq!(surface.pixel_at(10.0, 10.0), Some([0, 0, 7, 255]));
}

#[test]
fn opacity_layers_are_suppressed_on_hit_passes() {
    let mut surface = CanvasSurface::new(10, 10, 1.0).unwrap();
    let mut session = surface.session(PaintMode::Hit(Rgba8::rgb(1, 2, 3)));
    assert!(!session.push_opacity(0.5));
    let mut surface = CanvasSurface::new(10, 10, 1.0).unwrap();
    let mut session = surface.session(PaintMode::Scene);
    assert!(session.push_opacity(0.5));
    session.pop_opacity(true);
}

#[test]
fn shadow_paints_an_offset_silhouette() {
    let mut surface = CanvasSurface::new(60, 60, 1.0).unwrap();
    let style = ShapeStyle {
        fill: Some(Rgba8::rgb(0, 0, 255)),
        stroke: None,
        stroke_width: 2.0,
        opacity: 1.0,
        shadow: Some(ShadowStyle {
            color: Rgba8::rgb(10, 10, 10),
            offset: Vec2::new(20.0, 20.0),
        }),
    };
    {
        let mut session = surface.session(PaintMode::Scene);
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((20.0, 0.0));
        path.line_to((20.0, 20.0));
        path.line_to((0.0, 20.0));
        path.close_path();
        session.paint_shape(&path, &style);
    }
    surface.present();

    // Shape interior is the fill; the region only the offset silhouette
    // covers is the shadow color.
    assert_eq!(surface.pixel_at(10.0, 10.0), Some([0, 0, 255, 255]));
    assert_eq!(surface.pixel_at(30.0, 30.0), Some([10, 10, 10, 255]));
    assert_eq!(surface.pixel_at(50.0, 50.0), Some([0, 0, 0, 0]));
}

#[test]
fn transform_stack_saves_and_restores() {
    let mut surface = CanvasSurface::new(40, 40, 1.0).unwrap();
    {
        let mut session = surface.session(PaintMode::Scene);
        session.save();
        session.concat(Affine::translate(Vec2::new(20.0, 0.0)));
        session.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Rgba8::rgb(255, 0, 0));
        session.restore();
        session.fill_rect(Rect::new(0.0, 20.0, 10.0, 30.0), Rgba8::rgb(0, 255, 0));
    }
    surface.present();

    assert_eq!(surface.pixel_at(25.0, 5.0), Some([255, 0, 0, 255]));
    assert_eq!(surface.pixel_at(5.0, 25.0), Some([0, 255, 0, 255]));
    assert_eq!(surface.pixel_at(5.0, 5.0), Some([0, 0, 0, 0]));
}
