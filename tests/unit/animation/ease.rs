use super::*;

const ALL: [Ease; 19] = [
    Ease::Linear,
    Ease::InQuad,
    Ease::OutQuad,
    Ease::InOutQuad,
    Ease::InCubic,
    Ease::OutCubic,
    Ease::InOutCubic,
    Ease::InStrong,
    Ease::OutStrong,
    Ease::InOutStrong,
    Ease::InBack,
    Ease::OutBack,
    Ease::InOutBack,
    Ease::InElastic,
    Ease::OutElastic,
    Ease::InOutElastic,
    Ease::InBounce,
    Ease::OutBounce,
    Ease::InOutBounce,
];

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn every_curve_pins_its_endpoints() {
    for ease in ALL {
        assert!(close(ease.apply(0.0), 0.0), "{ease:?} at 0");
        assert!(close(ease.apply(1.0), 1.0), "{ease:?} at 1");
    }
}

#[test]
fn input_is_clamped() {
    for ease in ALL {
        assert_eq!(ease.apply(-0.5), ease.apply(0.0), "{ease:?} below range");
        assert_eq!(ease.apply(1.5), ease.apply(1.0), "{ease:?} above range");
    }
}

#[test]
fn linear_is_the_identity() {
    assert_eq!(Ease::Linear.apply(0.25), 0.25);
    assert_eq!(Ease::Linear.apply(0.5), 0.5);
}

#[test]
fn quad_bends_the_expected_way() {
    assert!(close(Ease::InQuad.apply(0.5), 0.25));
    assert!(close(Ease::OutQuad.apply(0.5), 0.75));
    assert!(close(Ease::InOutQuad.apply(0.5), 0.5));
}

#[test]
fn in_out_curves_are_point_symmetric() {
    for ease in [Ease::InOutQuad, Ease::InOutCubic, Ease::InOutStrong] {
        for t in [0.1, 0.25, 0.4] {
            assert!(
                close(ease.apply(t) + ease.apply(1.0 - t), 1.0),
                "{ease:?} at {t}"
            );
        }
    }
}

#[test]
fn back_overshoots_inside_the_range() {
    assert!(Ease::OutBack.apply(0.5) > 1.0);
    assert!(Ease::InBack.apply(0.5) < 0.0);
}

#[test]
fn elastic_oscillates_past_the_target() {
    let mut overshoot = false;
    let mut t = 0.05;
    while t < 1.0 {
        if Ease::OutElastic.apply(t) > 1.0 {
            overshoot = true;
        }
        t += 0.05;
    }
    assert!(overshoot);
}

#[test]
fn bounce_segments_join_up() {
    assert!(close(Ease::OutBounce.apply(0.5), 0.765625));
    let out = Ease::OutBounce.apply(0.3);
    assert!(close(Ease::InBounce.apply(0.7), 1.0 - out));
}
