//! Effect configuration.
//!
//! Hosts hand over an open JSON settings map. Every known key has a type and
//! a valid range; anything missing, mistyped or non-finite silently becomes
//! the default. Nothing here can fail.

use std::fmt;
use std::str::FromStr;

use backdrop_engine::paint::Rgb;
use backdrop_engine::surface::SurfaceKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The five effects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// GPU noise field colored through the accent palette.
    #[serde(alias = "shader_noise_field")]
    Aurora,
    /// Flowing paths traced progressively on a raster canvas.
    #[serde(alias = "procedural_path_tracer")]
    Gemini,
    /// Falling vertical light beams.
    #[serde(alias = "vector_beam_field")]
    Beams,
    /// Skewed grid of softly pulsing cells.
    #[serde(alias = "grid_pulse_field")]
    Boxes,
    /// Curved beams drawing themselves in along fixed sweeping paths.
    #[serde(alias = "path_beam_field")]
    Trails,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Aurora,
        EffectKind::Gemini,
        EffectKind::Beams,
        EffectKind::Boxes,
        EffectKind::Trails,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Aurora => "aurora",
            EffectKind::Gemini => "gemini",
            EffectKind::Beams => "beams",
            EffectKind::Boxes => "boxes",
            EffectKind::Trails => "trails",
        }
    }

    /// Native context the effect draws with.
    pub fn surface_kind(self) -> SurfaceKind {
        match self {
            EffectKind::Aurora => SurfaceKind::Gpu,
            EffectKind::Gemini | EffectKind::Beams | EffectKind::Boxes | EffectKind::Trails => {
                SurfaceKind::Raster
            }
        }
    }

    /// Default of the `showRadialGradient` key. The shader field is unmasked
    /// unless asked for.
    pub fn radial_gradient_default(self) -> bool {
        !matches!(self, EffectKind::Aurora)
    }

    /// Range and default of the `speed` key.
    ///
    /// The unit differs per effect: time step factor for the shader,
    /// progress per frame for the path tracer, playback rate for the
    /// primitive fields.
    pub fn speed_param(self) -> NumberParam {
        match self {
            EffectKind::Aurora => NumberParam::new(0.5, 0.0, 10.0),
            EffectKind::Gemini => NumberParam::new(0.003, 0.0, 0.1),
            EffectKind::Beams | EffectKind::Boxes | EffectKind::Trails => {
                NumberParam::new(1.0, 0.1, 10.0)
            }
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aurora" | "shader_noise_field" => Ok(EffectKind::Aurora),
            "gemini" | "procedural_path_tracer" => Ok(EffectKind::Gemini),
            "beams" | "vector_beam_field" => Ok(EffectKind::Beams),
            "boxes" | "grid_pulse_field" => Ok(EffectKind::Boxes),
            "trails" | "path_beam_field" => Ok(EffectKind::Trails),
            other => anyhow::bail!("unknown effect kind: {other:?}"),
        }
    }
}

/// A clamped numeric setting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NumberParam {
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl NumberParam {
    pub const fn new(default: f32, min: f32, max: f32) -> Self {
        Self { default, min, max }
    }

    /// Finite numbers are clamped into range; everything else is the default.
    pub fn sanitize(&self, value: Option<&Value>) -> f32 {
        match value.and_then(Value::as_f64) {
            Some(v) if v.is_finite() => (v as f32).clamp(self.min, self.max),
            _ => self.default,
        }
    }
}

pub const AMPLITUDE: NumberParam = NumberParam::new(1.0, 0.0, 10.0);
pub const BLEND: NumberParam = NumberParam::new(0.5, 0.0, 1.0);
pub const LINE_WIDTH: NumberParam = NumberParam::new(2.0, 0.5, 10.0);
pub const GRID_LINES: NumberParam = NumberParam::new(12.0, 2.0, 30.0);

/// Cell color of the grid effect (`#818cf8`).
pub const DEFAULT_BOX_COLOR: Rgb = Rgb::from_u8(0x81, 0x8c, 0xf8);

const KNOWN_KEYS: [&str; 9] = [
    "speed",
    "amplitude",
    "blend",
    "rows",
    "cols",
    "boxColor",
    "showRadialGradient",
    "lineWidth",
    "seed",
];

/// Sanitized settings for one mount.
///
/// An immutable snapshot: changing any value means remounting.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    pub speed: f32,
    pub amplitude: f32,
    pub blend: f32,
    pub rows: u32,
    pub cols: u32,
    pub box_color: Rgb,
    pub show_radial_gradient: bool,
    pub line_width: f32,
    /// Seed for per-primitive randomization; `None` draws a fresh one.
    pub seed: Option<u64>,
}

impl EffectConfig {
    /// All defaults for `kind`.
    pub fn defaults(kind: EffectKind) -> Self {
        Self::from_settings(kind, &Map::new())
    }

    pub fn from_settings(kind: EffectKind, settings: &Map<String, Value>) -> Self {
        for key in settings.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                log::debug!("ignoring unknown {kind} setting {key:?}");
            }
        }

        let grid = |key: &str| GRID_LINES.sanitize(settings.get(key)).round() as u32;

        Self {
            speed: kind.speed_param().sanitize(settings.get("speed")),
            amplitude: AMPLITUDE.sanitize(settings.get("amplitude")),
            blend: BLEND.sanitize(settings.get("blend")),
            rows: grid("rows"),
            cols: grid("cols"),
            box_color: sanitize_color(settings.get("boxColor"), DEFAULT_BOX_COLOR),
            show_radial_gradient: settings
                .get("showRadialGradient")
                .and_then(Value::as_bool)
                .unwrap_or_else(|| kind.radial_gradient_default()),
            line_width: LINE_WIDTH.sanitize(settings.get("lineWidth")),
            seed: settings.get("seed").and_then(Value::as_u64),
        }
    }
}

/// Accepts `#rgb` / `#rrggbb` strings; anything else is `fallback`.
pub fn sanitize_color(value: Option<&Value>, fallback: Rgb) -> Rgb {
    value
        .and_then(Value::as_str)
        .and_then(Rgb::from_hex)
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("settings must be an object"),
        }
    }

    // ── kinds ────────────────────────────────────────────────────────────

    #[test]
    fn kind_parses_short_and_long_names() {
        assert_eq!("aurora".parse::<EffectKind>().unwrap(), EffectKind::Aurora);
        assert_eq!(
            "procedural_path_tracer".parse::<EffectKind>().unwrap(),
            EffectKind::Gemini
        );
        assert_eq!(" Boxes ".parse::<EffectKind>().unwrap(), EffectKind::Boxes);
        assert!("sparkles".parse::<EffectKind>().is_err());
    }

    #[test]
    fn kind_deserializes_with_aliases() {
        let kind: EffectKind = serde_json::from_value(json!("vector_beam_field")).unwrap();
        assert_eq!(kind, EffectKind::Beams);
        let kind: EffectKind = serde_json::from_value(json!("aurora")).unwrap();
        assert_eq!(kind, EffectKind::Aurora);
        let kind: EffectKind = serde_json::from_value(json!("path_beam_field")).unwrap();
        assert_eq!(kind, EffectKind::Trails);
    }

    #[test]
    fn only_the_shader_needs_a_gpu() {
        for kind in EffectKind::ALL {
            let expected = if kind == EffectKind::Aurora {
                SurfaceKind::Gpu
            } else {
                SurfaceKind::Raster
            };
            assert_eq!(kind.surface_kind(), expected);
        }
    }

    // ── sanitizing ───────────────────────────────────────────────────────

    #[test]
    fn empty_settings_give_documented_defaults() {
        let c = EffectConfig::defaults(EffectKind::Aurora);
        assert_eq!(c.speed, 0.5);
        assert_eq!(c.amplitude, 1.0);
        assert_eq!(c.blend, 0.5);
        assert_eq!((c.rows, c.cols), (12, 12));
        assert_eq!(c.box_color.to_hex(), "#818cf8");
        assert!(!c.show_radial_gradient);
        assert_eq!(c.line_width, 2.0);
        assert_eq!(c.seed, None);

        assert_eq!(EffectConfig::defaults(EffectKind::Gemini).speed, 0.003);
        assert_eq!(EffectConfig::defaults(EffectKind::Beams).speed, 1.0);
    }

    #[test]
    fn shader_field_is_unmasked_unless_asked() {
        assert!(!EffectConfig::defaults(EffectKind::Aurora).show_radial_gradient);
        let c = EffectConfig::from_settings(
            EffectKind::Aurora,
            &settings(json!({ "showRadialGradient": true })),
        );
        assert!(c.show_radial_gradient);
        let c = EffectConfig::from_settings(
            EffectKind::Aurora,
            &settings(json!({ "showRadialGradient": "yes" })),
        );
        assert!(!c.show_radial_gradient);
    }

    #[test]
    fn out_of_range_numbers_are_clamped() {
        let c = EffectConfig::from_settings(
            EffectKind::Boxes,
            &settings(json!({ "rows": 100, "cols": 1, "blend": -3.0, "lineWidth": 50 })),
        );
        assert_eq!(c.rows, 30);
        assert_eq!(c.cols, 2);
        assert_eq!(c.blend, 0.0);
        assert_eq!(c.line_width, 10.0);
    }

    #[test]
    fn mistyped_values_fall_back_to_defaults() {
        let c = EffectConfig::from_settings(
            EffectKind::Boxes,
            &settings(json!({
                "rows": "7",
                "amplitude": null,
                "boxColor": "not a color",
                "showRadialGradient": "false",
                "seed": -4,
            })),
        );
        assert_eq!(c.rows, 12);
        assert_eq!(c.amplitude, 1.0);
        assert_eq!(c.box_color, DEFAULT_BOX_COLOR);
        assert!(c.show_radial_gradient);
        assert_eq!(c.seed, None);
    }

    #[test]
    fn valid_values_are_kept() {
        let c = EffectConfig::from_settings(
            EffectKind::Boxes,
            &settings(json!({
                "rows": 5.4,
                "boxColor": "#0f0",
                "showRadialGradient": false,
                "seed": 42,
            })),
        );
        assert_eq!(c.rows, 5);
        assert_eq!(c.box_color.to_hex(), "#00ff00");
        assert!(!c.show_radial_gradient);
        assert_eq!(c.seed, Some(42));
    }
}
