use std::path::PathBuf;

use anyhow::{Context, Result};
use backdrop_engine::paint::{StaticTheme, ACCENT_TOKEN};
use backdrop_fx::flag::{parse_animation_setting, CachedFlag};
use backdrop_fx::EffectKind;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser, Debug)]
#[command(name = "backdrop-studio")]
#[command(about = "Preview animated background effects")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Effect to mount: aurora, gemini, beams or boxes
    #[arg(short, long, default_value = "aurora", global = true)]
    pub effect: EffectKind,

    /// Effect settings as a JSON object, e.g. '{"speed": 1.0}'
    #[arg(short, long, global = true)]
    pub settings: Option<String>,

    /// Accent color as "r g b" (0-255), like the theme token
    #[arg(short, long, global = true)]
    pub accent: Option<String>,

    /// Remote flag payload, e.g. '{"enabled": true}'; enabled when omitted
    #[arg(long, global = true)]
    pub flag: Option<String>,

    /// Behave as if the user asked for reduced motion
    #[arg(long, global = true)]
    pub reduced_motion: bool,

    /// Log filter in env_logger syntax
    #[arg(long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a window and run the effect live
    Window {
        #[arg(long, default_value = "1280")]
        width: u32,

        #[arg(long, default_value = "720")]
        height: u32,
    },

    /// Render frames headlessly and write the last one as PNG
    Snapshot {
        /// Output file
        #[arg(short, long, default_value = "backdrop.png")]
        out: PathBuf,

        /// Number of host frames to simulate
        #[arg(short, long, default_value = "90")]
        frames: u32,

        #[arg(long, default_value = "960")]
        width: u32,

        #[arg(long, default_value = "540")]
        height: u32,
    },
}

/// Everything a mount needs, resolved from the command line.
#[derive(Debug)]
pub struct MountSetup {
    pub kind: EffectKind,
    pub settings: Map<String, Value>,
    pub theme: StaticTheme,
    pub enabled: bool,
    pub reduced_motion: bool,
}

impl Cli {
    pub fn mount_setup(&self) -> Result<MountSetup> {
        let settings = match &self.settings {
            Some(text) => match serde_json::from_str(text).context("--settings is not JSON")? {
                Value::Object(map) => map,
                other => anyhow::bail!("--settings must be a JSON object, got {other}"),
            },
            None => Map::new(),
        };

        let mut theme = StaticTheme::new();
        if let Some(accent) = &self.accent {
            theme.set(ACCENT_TOKEN, accent.clone());
        }

        let enabled = match &self.flag {
            Some(payload) => {
                let payload = payload.clone();
                CachedFlag::new(move || parse_animation_setting(&payload)).is_enabled()
            }
            None => true,
        };

        Ok(MountSetup {
            kind: self.effect,
            settings,
            theme,
            enabled,
            reduced_motion: self.reduced_motion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("backdrop-studio").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn snapshot_defaults() {
        let cli = parse(&["snapshot"]);
        assert_eq!(cli.effect, EffectKind::Aurora);
        match cli.command {
            Command::Snapshot { frames, width, height, .. } => {
                assert_eq!((frames, width, height), (90, 960, 540));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn setup_reads_settings_accent_and_flag() {
        let cli = parse(&[
            "snapshot",
            "--effect",
            "boxes",
            "--settings",
            r#"{"rows": 4}"#,
            "--accent",
            "10 20 30",
            "--flag",
            r#"{"enabled": false}"#,
        ]);
        let setup = cli.mount_setup().unwrap();
        assert_eq!(setup.kind, EffectKind::Boxes);
        assert_eq!(setup.settings.get("rows"), Some(&Value::from(4)));
        assert!(!setup.enabled);
    }

    #[test]
    fn malformed_flag_payload_reads_as_disabled() {
        let cli = parse(&["snapshot", "--flag", "oops"]);
        assert!(!cli.mount_setup().unwrap().enabled);
    }

    #[test]
    fn settings_must_be_an_object() {
        let cli = parse(&["snapshot", "--settings", "[1, 2]"]);
        assert!(cli.mount_setup().is_err());
    }
}
