/// Default logical frame interval: 30 frames per second.
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 1000.0 / 30.0;

/// Largest step a single tick may add to the elapsed time.
///
/// Hosts that stall without reporting the page hidden (debugger, sleep)
/// would otherwise hand the effect a multi-second jump.
pub const DEFAULT_MAX_DELTA_MS: f64 = 250.0;

/// One accepted, rate-limited frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tick {
    /// Accumulated elapsed time since `start()`, in milliseconds.
    ///
    /// Monotonic; excludes suspended periods and clamped stalls.
    pub elapsed_ms: f64,

    /// Time added by this tick, in milliseconds (0 for the first tick).
    pub delta_ms: f64,

    /// Monotonic tick counter, starting at 0.
    pub frame_index: u64,
}

/// Mutable scheduling state. Owned and mutated only by [`FrameScheduler`].
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ScheduleState {
    /// Carry-adjusted timestamp of the last accepted tick; `None` until the
    /// first host frame after start or resume.
    pub last_time: Option<f64>,

    /// Host timestamp at which the last tick was accepted.
    pub last_accepted: f64,

    /// Fractional interval carried over from the last accepted tick.
    pub remainder_ms: f64,

    /// Accumulated elapsed time handed to ticks.
    pub elapsed_ms: f64,

    /// Number of ticks emitted.
    pub frames: u64,
}

/// Capped-rate frame scheduler.
///
/// The host calls [`advance`](Self::advance) from its per-frame callback with
/// a monotonic timestamp. At most one [`Tick`] is produced per interval; the
/// leftover `delta % interval` is carried into the next baseline so the
/// effective rate does not drift below the cap.
///
/// While hidden, host frames are ignored. The first host frame after
/// becoming visible re-baselines and ticks with a zero delta, so the hidden
/// period never shows up as a jump in `elapsed_ms`.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval_ms: f64,
    max_delta_ms: f64,
    running: bool,
    hidden: bool,
    state: ScheduleState,
}

impl FrameScheduler {
    /// Creates a stopped scheduler capped at 30 ticks per second.
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_FRAME_INTERVAL_MS)
    }

    /// Creates a stopped scheduler with a custom interval.
    ///
    /// Non-finite or non-positive intervals fall back to the default.
    pub fn with_interval(interval_ms: f64) -> Self {
        let interval_ms = if interval_ms.is_finite() && interval_ms > 0.0 {
            interval_ms
        } else {
            DEFAULT_FRAME_INTERVAL_MS
        };
        Self {
            interval_ms,
            max_delta_ms: DEFAULT_MAX_DELTA_MS.max(interval_ms),
            running: false,
            hidden: false,
            state: ScheduleState::default(),
        }
    }

    /// Overrides the per-tick delta clamp. Never lower than one interval.
    pub fn with_max_delta(mut self, max_delta_ms: f64) -> Self {
        if max_delta_ms.is_finite() {
            self.max_delta_ms = max_delta_ms.max(self.interval_ms);
        }
        self
    }

    #[inline]
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// True when the host should keep delivering frame callbacks.
    #[inline]
    pub fn wants_frames(&self) -> bool {
        self.running && !self.hidden
    }

    #[inline]
    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Starts (or restarts) scheduling from a zeroed state.
    pub fn start(&mut self) {
        self.state = ScheduleState::default();
        self.running = true;
    }

    /// Stops scheduling. A no-op when not started.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.state = ScheduleState::default();
    }

    /// Applies a host visibility change.
    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        if !hidden {
            // Re-baseline on the next host frame.
            self.state.last_time = None;
        }
    }

    /// Processes one host frame callback at `now_ms`.
    ///
    /// Returns a tick when at least one interval has passed since the last
    /// accepted tick; otherwise leaves the state untouched.
    pub fn advance(&mut self, now_ms: f64) -> Option<Tick> {
        if !self.running || self.hidden || !now_ms.is_finite() {
            return None;
        }

        let Some(last_time) = self.state.last_time else {
            self.state.last_time = Some(now_ms);
            self.state.last_accepted = now_ms;
            self.state.remainder_ms = 0.0;
            return Some(self.emit(0.0));
        };

        let delta = now_ms - last_time;
        if delta < 0.0 {
            // Host clock went backwards; adopt it as the new baseline.
            self.state.last_time = Some(now_ms);
            self.state.last_accepted = now_ms;
            return None;
        }
        if delta < self.interval_ms {
            return None;
        }

        let remainder = delta % self.interval_ms;
        let step = (now_ms - self.state.last_accepted).clamp(0.0, self.max_delta_ms);

        self.state.last_time = Some(now_ms - remainder);
        self.state.last_accepted = now_ms;
        self.state.remainder_ms = remainder;

        Some(self.emit(step))
    }

    /// Callback form of [`advance`](Self::advance): invokes `on_tick` when a
    /// tick is produced and reports whether it was.
    pub fn drive<F>(&mut self, now_ms: f64, on_tick: F) -> bool
    where
        F: FnOnce(Tick),
    {
        match self.advance(now_ms) {
            Some(tick) => {
                on_tick(tick);
                true
            }
            None => false,
        }
    }

    fn emit(&mut self, step: f64) -> Tick {
        self.state.elapsed_ms += step;
        let tick = Tick {
            elapsed_ms: self.state.elapsed_ms,
            delta_ms: step,
            frame_index: self.state.frames,
        };
        self.state.frames = self.state.frames.wrapping_add(1);
        tick
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> FrameScheduler {
        let mut s = FrameScheduler::new();
        s.start();
        s
    }

    // ── throttling ────────────────────────────────────────────────────────

    #[test]
    fn stopped_scheduler_never_ticks() {
        let mut s = FrameScheduler::new();
        assert_eq!(s.advance(0.0), None);
        assert_eq!(s.advance(1000.0), None);
    }

    #[test]
    fn first_frame_after_start_ticks_immediately() {
        let mut s = started();
        let tick = s.advance(5000.0).unwrap();
        assert_eq!(tick.elapsed_ms, 0.0);
        assert_eq!(tick.frame_index, 0);
    }

    #[test]
    fn frames_inside_interval_are_noops() {
        let mut s = started();
        s.advance(0.0);
        let before = *s.state();
        assert_eq!(s.advance(10.0), None);
        assert_eq!(s.advance(33.0), None);
        assert_eq!(*s.state(), before);
    }

    #[test]
    fn remainder_is_carried_into_baseline() {
        let mut s = FrameScheduler::with_interval(10.0);
        s.start();
        s.advance(0.0);
        let tick = s.advance(14.0).unwrap();
        assert_eq!(tick.delta_ms, 14.0);
        assert_eq!(s.state().last_time, Some(10.0));
        assert_eq!(s.state().remainder_ms, 4.0);
        // 20.0 is a full interval after the carried baseline.
        assert!(s.advance(20.0).is_some());
    }

    #[test]
    fn backwards_clock_rebaselines() {
        let mut s = started();
        s.advance(1000.0);
        assert_eq!(s.advance(500.0), None);
        assert_eq!(s.advance(520.0), None);
        assert!(s.advance(540.0).is_some());
    }

    #[test]
    fn non_finite_timestamps_are_ignored() {
        let mut s = started();
        assert_eq!(s.advance(f64::NAN), None);
        assert!(s.advance(0.0).is_some());
    }

    // ── start / stop ──────────────────────────────────────────────────────

    #[test]
    fn stop_when_not_started_is_noop() {
        let mut s = FrameScheduler::new();
        s.stop();
        assert!(!s.is_running());
    }

    #[test]
    fn restart_resets_state() {
        let mut s = started();
        s.advance(0.0);
        s.advance(100.0);
        s.stop();
        s.start();
        assert_eq!(*s.state(), ScheduleState::default());
        assert_eq!(s.advance(7000.0).unwrap().elapsed_ms, 0.0);
    }

    // ── suspension ────────────────────────────────────────────────────────

    #[test]
    fn hidden_scheduler_does_not_tick() {
        let mut s = started();
        s.advance(0.0);
        s.set_hidden(true);
        assert!(!s.wants_frames());
        assert_eq!(s.advance(100.0), None);
    }

    #[test]
    fn resume_after_long_hide_does_not_jump() {
        let mut s = started();
        s.advance(0.0);
        let before = s.advance(40.0).unwrap().elapsed_ms;
        s.set_hidden(true);
        s.advance(30_000.0);
        s.set_hidden(false);
        let resumed = s.advance(60_000.0).unwrap();
        assert_eq!(resumed.elapsed_ms, before);
        let next = s.advance(60_040.0).unwrap();
        assert_eq!(next.elapsed_ms, before + 40.0);
    }

    #[test]
    fn stall_is_clamped() {
        let mut s = started();
        s.advance(0.0);
        let tick = s.advance(10_000.0).unwrap();
        assert_eq!(tick.delta_ms, DEFAULT_MAX_DELTA_MS);
    }

    #[test]
    fn drive_invokes_callback_only_on_ticks() {
        let mut s = started();
        let mut seen = Vec::new();
        assert!(s.drive(0.0, |t| seen.push(t.frame_index)));
        assert!(!s.drive(1.0, |t| seen.push(t.frame_index)));
        assert!(s.drive(50.0, |t| seen.push(t.frame_index)));
        assert_eq!(seen, vec![0, 1]);
    }
}
