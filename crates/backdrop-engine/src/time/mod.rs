//! Time subsystem.
//!
//! Provides rate-limited frame scheduling without coupling to any event loop.
//! Intended usage:
//! - one `FrameScheduler` per mounted effect
//! - forward every host frame callback (timestamp in ms) to `advance()`
//! - render only when it returns a `Tick`

mod scheduler;

pub use scheduler::{
    FrameScheduler, ScheduleState, Tick, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_MAX_DELTA_MS,
};
