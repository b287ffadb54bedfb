//! Frame-rate cap and drift over long simulated runs.

use backdrop_engine::time::{FrameScheduler, DEFAULT_FRAME_INTERVAL_MS};

const HOST_FRAME_MS: f64 = 16.0;

#[test]
fn fires_about_once_per_two_host_frames() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start();

    let mut fired = 0;
    for i in 0..1000 {
        if scheduler.advance(i as f64 * HOST_FRAME_MS).is_some() {
            fired += 1;
        }
    }

    // 16 s of host time at a 33.3 ms cap.
    assert!((450..=510).contains(&fired), "fired {fired} times");
}

#[test]
fn elapsed_time_tracks_wall_clock() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start();

    let mut last_elapsed = 0.0;
    for i in 0..1000 {
        let now = i as f64 * HOST_FRAME_MS;
        if let Some(tick) = scheduler.advance(now) {
            assert!(tick.elapsed_ms >= last_elapsed);
            assert!(
                (now - tick.elapsed_ms).abs() <= HOST_FRAME_MS,
                "drifted at {now}: elapsed {}",
                tick.elapsed_ms
            );
            last_elapsed = tick.elapsed_ms;
        }
    }
}

#[test]
fn long_hidden_period_does_not_jump() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start();

    let mut now = 0.0;
    for _ in 0..100 {
        scheduler.advance(now);
        now += HOST_FRAME_MS;
    }
    let before = scheduler.state().elapsed_ms;

    scheduler.set_hidden(true);
    now += 10.0 * 60.0 * 1000.0;
    scheduler.set_hidden(false);

    let mut resumed = 0.0;
    for _ in 0..100 {
        if let Some(tick) = scheduler.advance(now) {
            resumed = tick.elapsed_ms;
        }
        now += HOST_FRAME_MS;
    }

    // Only visible time counts: 100 more host frames, give or take a tick.
    let gained = resumed - before;
    assert!(gained <= 100.0 * HOST_FRAME_MS + DEFAULT_FRAME_INTERVAL_MS, "gained {gained}");
    assert!(gained >= 100.0 * HOST_FRAME_MS - 3.0 * DEFAULT_FRAME_INTERVAL_MS, "gained {gained}");
}
