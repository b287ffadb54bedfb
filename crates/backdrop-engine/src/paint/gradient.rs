use super::{Palette, Rgb};

/// Stop positions used by the noise shader's ramp.
pub const RAMP_POSITIONS: [f32; 3] = [0.0, 0.5, 1.0];

/// A single ramp stop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub position: f32,
    pub color: Rgb,
}

impl ColorStop {
    #[inline]
    pub const fn new(position: f32, color: Rgb) -> Self {
        Self { position, color }
    }
}

/// Three-stop color ramp.
///
/// Invariant: positions are finite and strictly increasing. [`ColorRamp::new`]
/// rejects anything else, so sampling never divides by a zero range.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorRamp {
    stops: [ColorStop; 3],
}

impl ColorRamp {
    pub fn new(stops: [ColorStop; 3]) -> Option<Self> {
        let ordered = stops.iter().all(|s| s.position.is_finite())
            && stops.windows(2).all(|w| w[0].position < w[1].position);
        ordered.then_some(Self { stops })
    }

    /// Places the palette's stops at [`RAMP_POSITIONS`].
    pub fn from_palette(palette: &Palette) -> Self {
        let [c0, c1, c2] = palette.stops();
        Self {
            stops: [
                ColorStop::new(RAMP_POSITIONS[0], c0),
                ColorStop::new(RAMP_POSITIONS[1], c1),
                ColorStop::new(RAMP_POSITIONS[2], c2),
            ],
        }
    }

    #[inline]
    pub fn stops(&self) -> &[ColorStop; 3] {
        &self.stops
    }

    /// Evaluates the ramp at `v`.
    ///
    /// Picks the highest-indexed stop (excluding the last) whose position is
    /// `<= v` and interpolates toward its successor. This is the same walk the
    /// fragment shader performs, so CPU and GPU agree on every input.
    /// `v` is clamped into the ramp's span; NaN samples the first stop.
    pub fn sample(&self, v: f32) -> Rgb {
        let first = self.stops[0].position;
        let last = self.stops[self.stops.len() - 1].position;
        let v = if v.is_nan() { first } else { v.clamp(first, last) };

        let mut index = 0;
        for (i, stop) in self.stops[..self.stops.len() - 1].iter().enumerate() {
            if stop.position <= v {
                index = i;
            }
        }

        let current = self.stops[index];
        let next = self.stops[index + 1];
        let t = (v - current.position) / (next.position - current.position);
        current.color.lerp(next.color, t)
    }

    /// Packs the stops as `[r, g, b, position]` rows for a uniform buffer.
    pub fn to_uniform(&self) -> [[f32; 4]; 3] {
        self.stops.map(|s| [s.color.r, s.color.g, s.color.b, s.position])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ColorRamp {
        ColorRamp::new([
            ColorStop::new(0.0, Rgb::new(0.0, 0.0, 0.0)),
            ColorStop::new(0.5, Rgb::new(0.2, 0.4, 0.6)),
            ColorStop::new(1.0, Rgb::new(1.0, 0.8, 0.6)),
        ])
        .unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn rejects_unordered_positions() {
        let c = Rgb::black();
        assert!(ColorRamp::new([
            ColorStop::new(0.0, c),
            ColorStop::new(0.5, c),
            ColorStop::new(0.5, c),
        ])
        .is_none());
        assert!(ColorRamp::new([
            ColorStop::new(0.0, c),
            ColorStop::new(f32::NAN, c),
            ColorStop::new(1.0, c),
        ])
        .is_none());
    }

    // ── sample ────────────────────────────────────────────────────────────

    #[test]
    fn sample_endpoints_are_exact() {
        let r = ramp();
        assert_eq!(r.sample(0.0), r.stops()[0].color);
        assert_eq!(r.sample(1.0), r.stops()[2].color);
    }

    #[test]
    fn sample_middle_stop_is_exact() {
        let r = ramp();
        assert_eq!(r.sample(0.5), r.stops()[1].color);
    }

    #[test]
    fn sample_quarter_is_midpoint_of_first_segment() {
        let r = ramp();
        assert_eq!(r.sample(0.25), r.stops()[0].color.lerp(r.stops()[1].color, 0.5));
    }

    #[test]
    fn sample_three_quarters_is_midpoint_of_second_segment() {
        let r = ramp();
        let got = r.sample(0.75);
        assert!((got.r - 0.6).abs() < 1e-6);
        assert!((got.g - 0.6).abs() < 1e-6);
        assert!((got.b - 0.6).abs() < 1e-6);
    }

    #[test]
    fn sample_clamps_out_of_range() {
        let r = ramp();
        assert_eq!(r.sample(-3.0), r.stops()[0].color);
        assert_eq!(r.sample(7.0), r.stops()[2].color);
        assert_eq!(r.sample(f32::NAN), r.stops()[0].color);
    }

    #[test]
    fn uniform_rows_carry_positions() {
        let rows = ramp().to_uniform();
        assert_eq!(rows[0][3], 0.0);
        assert_eq!(rows[1][3], 0.5);
        assert_eq!(rows[2][3], 1.0);
        assert_eq!(&rows[1][..3], &[0.2, 0.4, 0.6]);
    }
}
