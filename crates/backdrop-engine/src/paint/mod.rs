//! Color model shared by the effect backends.
//!
//! Scope:
//! - straight (non-premultiplied) RGB colors normalized to [0, 1]
//! - the fixed 3-stop ramp evaluated by the noise shader
//! - palette derivation from a live theme accent color

pub mod color;
pub mod gradient;
pub mod palette;

pub use color::Rgb;
pub use gradient::{ColorRamp, ColorStop, RAMP_POSITIONS};
pub use palette::{
    current_accent_color, derive_palette, parse_rgb_triplet, Palette, StaticTheme, ThemeSource,
    ACCENT_TOKEN, FALLBACK_ACCENT, PALETTE_FACTORS,
};
