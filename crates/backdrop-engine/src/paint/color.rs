/// Straight RGB color with channels normalized to `[0, 1]`.
///
/// No alpha: opacity is a per-draw parameter in every backend, never part of
/// a palette entry.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Creates a color from 8-bit channels (`0`–`255`).
    #[inline]
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Parses `#rgb` or `#rrggbb` (the leading `#` is optional).
    ///
    /// Returns `None` for any other length or for non-hex digits.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).ok();

        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let nibble = c.to_digit(16)? as u8;
                    out[i] = nibble * 16 + nibble;
                }
                Some(Self::from_u8(out[0], out[1], out[2]))
            }
            6 => Some(Self::from_u8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => None,
        }
    }

    /// Quantizes to 8-bit channels, rounding to nearest and clamping.
    #[inline]
    pub fn to_u8(self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Formats as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// True when every channel is finite and inside `[0, 1]`.
    #[inline]
    pub fn is_valid(self) -> bool {
        let ok = |c: f32| c.is_finite() && (0.0..=1.0).contains(&c);
        ok(self.r) && ok(self.g) && ok(self.b)
    }

    /// Linear interpolation toward `other`.
    ///
    /// Written as `a * (1 - t) + b * t` so that `t == 0` and `t == 1` return
    /// the endpoints bit-exactly.
    #[inline]
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let s = 1.0 - t;
        Rgb::new(
            self.r * s + other.r * t,
            self.g * s + other.g * t,
            self.b * s + other.b * t,
        )
    }

    /// Scales every channel by `factor` and snaps the result to the 8-bit grid.
    #[inline]
    pub fn scaled_quantized(self, factor: f32) -> Rgb {
        let q = |c: f32| (c * 255.0 * factor).round().clamp(0.0, 255.0) / 255.0;
        Rgb::new(q(self.r), q(self.g), q(self.b))
    }

    /// Moves the color `amount` of the way toward white.
    #[inline]
    pub fn lighten(self, amount: f32) -> Rgb {
        self.lerp(Rgb::white(), amount.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── from_hex ──────────────────────────────────────────────────────────

    #[test]
    fn hex_six_digits() {
        assert_eq!(Rgb::from_hex("#ff0080"), Some(Rgb::from_u8(255, 0, 128)));
    }

    #[test]
    fn hex_without_hash() {
        assert_eq!(Rgb::from_hex("818cf8"), Some(Rgb::from_u8(0x81, 0x8c, 0xf8)));
    }

    #[test]
    fn hex_three_digits_expand() {
        assert_eq!(Rgb::from_hex("#fa0"), Rgb::from_hex("#ffaa00"));
    }

    #[test]
    fn hex_rejects_garbage() {
        assert_eq!(Rgb::from_hex(""), None);
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(Rgb::from_hex("#ééé"), None);
    }

    #[test]
    fn hex_round_trips_through_to_hex() {
        assert_eq!(Rgb::from_u8(0xa7, 0x8b, 0xfa).to_hex(), "#a78bfa");
    }

    // ── lerp ──────────────────────────────────────────────────────────────

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = Rgb::new(0.1, 0.2, 0.3);
        let b = Rgb::new(0.7, 0.3, 0.9);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn lerp_midpoint() {
        let m = Rgb::black().lerp(Rgb::white(), 0.5);
        assert_eq!(m, Rgb::new(0.5, 0.5, 0.5));
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn validity_requires_unit_range() {
        assert!(Rgb::new(0.0, 0.5, 1.0).is_valid());
        assert!(!Rgb::new(1.5, 0.0, 0.0).is_valid());
        assert!(!Rgb::new(f32::NAN, 0.0, 0.0).is_valid());
        assert!(!Rgb::new(0.0, -0.1, 0.0).is_valid());
    }

    #[test]
    fn scaled_quantized_snaps_to_byte_grid() {
        let c = Rgb::from_u8(200, 100, 12).scaled_quantized(0.25);
        assert_eq!(c.to_u8(), [50, 25, 3]);
    }
}
