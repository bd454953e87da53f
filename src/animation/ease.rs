/// Easing curves applied to normalized tween progress.
///
/// Input is clamped to `[0, 1]`; output may overshoot for the `Back` and
/// `Elastic` families.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    /// No easing.
    #[default]
    Linear,
    /// Quadratic ease-in.
    InQuad,
    /// Quadratic ease-out.
    OutQuad,
    /// Quadratic ease-in-out.
    InOutQuad,
    /// Cubic ease-in.
    InCubic,
    /// Cubic ease-out.
    OutCubic,
    /// Cubic ease-in-out.
    InOutCubic,
    /// Quintic ease-in.
    InStrong,
    /// Quintic ease-out.
    OutStrong,
    /// Quintic ease-in-out.
    InOutStrong,
    /// Overshooting ease-in.
    InBack,
    /// Overshooting ease-out.
    OutBack,
    /// Overshooting ease-in-out.
    InOutBack,
    /// Spring-like ease-in.
    InElastic,
    /// Spring-like ease-out.
    OutElastic,
    /// Spring-like ease-in-out.
    InOutElastic,
    /// Bouncing ease-in.
    InBounce,
    /// Bouncing ease-out.
    OutBounce,
    /// Bouncing ease-in-out.
    InOutBounce,
}

impl Ease {
    /// Map normalized progress through this curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InStrong => t.powi(5),
            Self::OutStrong => 1.0 - (1.0 - t).powi(5),
            Self::InOutStrong => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(5) / 2.0)
                }
            }
            Self::InBack => {
                const S: f64 = 1.70158;
                t * t * ((S + 1.0) * t - S)
            }
            Self::OutBack => {
                const S: f64 = 1.70158;
                let t = t - 1.0;
                t * t * ((S + 1.0) * t + S) + 1.0
            }
            Self::InOutBack => {
                const S: f64 = 1.70158 * 1.525;
                let t = t * 2.0;
                if t < 1.0 {
                    (t * t * ((S + 1.0) * t - S)) / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * ((S + 1.0) * t + S) + 2.0) / 2.0
                }
            }
            Self::InElastic => 1.0 - Self::OutElastic.apply(1.0 - t),
            Self::OutElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    const P: f64 = 0.3;
                    const S: f64 = P / 4.0;
                    (2.0f64).powf(-10.0 * t)
                        * ((t - S) * (2.0 * std::f64::consts::PI) / P).sin()
                        + 1.0
                }
            }
            Self::InOutElastic => {
                if t < 0.5 {
                    Self::InElastic.apply(t * 2.0) / 2.0
                } else {
                    Self::OutElastic.apply(t * 2.0 - 1.0) / 2.0 + 0.5
                }
            }
            Self::InBounce => 1.0 - Self::OutBounce.apply(1.0 - t),
            Self::OutBounce => {
                const N: f64 = 7.5625;
                const D: f64 = 2.75;
                if t < 1.0 / D {
                    N * t * t
                } else if t < 2.0 / D {
                    let t = t - 1.5 / D;
                    N * t * t + 0.75
                } else if t < 2.5 / D {
                    let t = t - 2.25 / D;
                    N * t * t + 0.9375
                } else {
                    let t = t - 2.625 / D;
                    N * t * t + 0.984375
                }
            }
            Self::InOutBounce => {
                if t < 0.5 {
                    Self::InBounce.apply(t * 2.0) / 2.0
                } else {
                    Self::OutBounce.apply(t * 2.0 - 1.0) / 2.0 + 0.5
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
