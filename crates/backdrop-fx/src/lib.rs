//! Animated background effects.
//!
//! One [`EffectController`] mounts one effect into one host container. The
//! effect itself is an [`EffectBackend`] variant chosen by [`EffectKind`].

pub mod backend;
pub mod config;
pub mod controller;
pub mod flag;
pub mod motion;

pub use backend::EffectBackend;
pub use config::{EffectConfig, EffectKind};
pub use controller::{ControllerState, EffectController};
pub use flag::{AnimationSetting, CachedFlag, FlagSource};
