//! Keyframe timelines for the primitive-field effects.
//!
//! Each primitive owns a [`Timeline`] drawn once at init. The timeline maps
//! elapsed seconds to a progress in `[0, 1)` that loops forever; keyframe
//! tracks then map that progress to a value.

/// Timing curve applied to each keyframe segment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Easing {
    Linear,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Easing::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

/// One coordinate of a cubic Bézier with endpoints 0 and 1.
#[inline]
fn bezier_axis(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

#[inline]
fn bezier_axis_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Evaluates a CSS-style timing curve at `x`.
///
/// Solves `x(s) = x` with Newton steps, falling back to bisection where the
/// slope flattens out.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let mut s = x;
    for _ in 0..8 {
        let err = bezier_axis(x1, x2, s) - x;
        if err.abs() < 1e-6 {
            return bezier_axis(y1, y2, s);
        }
        let slope = bezier_axis_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    s = x;
    for _ in 0..32 {
        let v = bezier_axis(x1, x2, s);
        if (v - x).abs() < 1e-6 {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) * 0.5;
    }
    bezier_axis(y1, y2, s)
}

/// Samples evenly spaced keyframes at `progress`, easing each segment.
///
/// Empty tracks read as 0; a single keyframe is constant.
pub fn sample_keyframes(values: &[f32], progress: f32, easing: Easing) -> f32 {
    match values {
        [] => 0.0,
        [only] => *only,
        _ => {
            let segments = (values.len() - 1) as f32;
            let scaled = progress.clamp(0.0, 1.0) * segments;
            let index = (scaled.floor() as usize).min(values.len() - 2);
            let local = easing.apply(scaled - index as f32);
            let (a, b) = (values[index], values[index + 1]);
            a + (b - a) * local
        }
    }
}

/// A looping animation: waits `delay_s` once, then repeats every
/// `duration_s` forever.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Timeline {
    pub duration_s: f32,
    pub delay_s: f32,
}

impl Timeline {
    pub fn new(duration_s: f32, delay_s: f32) -> Self {
        Self {
            duration_s: duration_s.max(f32::EPSILON),
            delay_s: delay_s.max(0.0),
        }
    }

    /// Progress through the current cycle, or `None` while still delayed.
    pub fn progress(&self, elapsed_s: f32) -> Option<f32> {
        let local = elapsed_s - self.delay_s;
        if !local.is_finite() || local < 0.0 {
            return None;
        }
        Some((local % self.duration_s) / self.duration_s)
    }
}
