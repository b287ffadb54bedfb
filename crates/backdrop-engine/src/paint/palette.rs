//! Palette derivation from the theme accent color.
//!
//! The accent is read through an explicit [`ThemeSource`] handed over at
//! mount time; backends never look up theme tokens themselves.

use std::collections::HashMap;

use super::{ColorRamp, Rgb};

/// Theme token holding the accent color as `"r g b"` (0–255 channels).
pub const ACCENT_TOKEN: &str = "--color-accent-500";

/// Accent used when the theme token is missing or malformed (`#a78bfa`).
pub const FALLBACK_ACCENT: Rgb = Rgb::from_u8(0xa7, 0x8b, 0xfa);

/// Channel factors for the darker, base and lighter stops.
///
/// All three stay very dark: the palette is painted behind content.
pub const PALETTE_FACTORS: [f32; 3] = [0.15, 0.25, 0.35];

/// Three ordered colors derived from one accent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Palette {
    source: Rgb,
    stops: [Rgb; 3],
}

impl Palette {
    /// The (sanitized) accent the stops were derived from.
    #[inline]
    pub fn source(&self) -> Rgb {
        self.source
    }

    /// Darker, base and lighter stops, in that order.
    #[inline]
    pub fn stops(&self) -> [Rgb; 3] {
        self.stops
    }

    #[inline]
    pub fn ramp(&self) -> ColorRamp {
        ColorRamp::from_palette(self)
    }
}

impl Default for Palette {
    fn default() -> Self {
        derive_palette(FALLBACK_ACCENT)
    }
}

/// Derives the 3-stop palette from `base`.
///
/// Pure: the same input always yields bit-identical output. A base with
/// non-finite or out-of-range channels is replaced by [`FALLBACK_ACCENT`].
pub fn derive_palette(base: Rgb) -> Palette {
    let source = if base.is_valid() {
        base
    } else {
        log::debug!("palette base {base:?} is not a valid color; using fallback accent");
        FALLBACK_ACCENT
    };

    Palette {
        source,
        stops: PALETTE_FACTORS.map(|k| source.scaled_quantized(k)),
    }
}

// ── theme access ──────────────────────────────────────────────────────────

/// Read-only view of the host's live theme tokens.
pub trait ThemeSource {
    /// Returns the raw text of the token, if the theme defines it.
    fn token(&self, name: &str) -> Option<String>;
}

/// Theme backed by an in-memory token map.
#[derive(Debug, Clone, Default)]
pub struct StaticTheme {
    tokens: HashMap<String, String>,
}

impl StaticTheme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tokens.insert(name.into(), value.into());
    }
}

impl ThemeSource for StaticTheme {
    fn token(&self, name: &str) -> Option<String> {
        self.tokens.get(name).cloned()
    }
}

/// Reads the accent color from [`ACCENT_TOKEN`], falling back to
/// [`FALLBACK_ACCENT`] when the token is absent or malformed.
pub fn current_accent_color(theme: &dyn ThemeSource) -> Rgb {
    match theme.token(ACCENT_TOKEN) {
        Some(text) => parse_rgb_triplet(&text).unwrap_or_else(|| {
            log::debug!("malformed accent token {text:?}; using fallback accent");
            FALLBACK_ACCENT
        }),
        None => FALLBACK_ACCENT,
    }
}

/// Parses `"r g b"` with 0–255 channels separated by whitespace.
///
/// Fractional channels are rounded. Exactly three finite channels inside
/// `[0, 255]` are required.
pub fn parse_rgb_triplet(text: &str) -> Option<Rgb> {
    let mut channels = [0u8; 3];
    let mut parts = text.split_whitespace();

    for slot in &mut channels {
        let value: f32 = parts.next()?.parse().ok()?;
        let value = value.round();
        if !value.is_finite() || !(0.0..=255.0).contains(&value) {
            return None;
        }
        *slot = value as u8;
    }

    if parts.next().is_some() {
        return None;
    }

    Some(Rgb::from_u8(channels[0], channels[1], channels[2]))
}
