use std::cell::Cell;
use std::rc::Rc;

use tween_core::{BackendKind, FrameScheduler, FRAME_INTERVAL_MILLIS};
use tween_testing::{ScriptedHost, VirtualClock};

#[test]
fn browserless_host_selects_the_timer_backend() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());
    assert_eq!(scheduler.backend_kind(), BackendKind::Timer);
}

#[test]
fn schedule_never_runs_the_callback_synchronously() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    // Push well past the pacing window so the computed delay is zero.
    host.clock().advance(500.0);
    let fired = Rc::new(Cell::new(false));
    let flag = fired.clone();
    scheduler.schedule(move |_| flag.set(true));

    assert!(!fired.get());
    assert_eq!(host.timers().armed().last().unwrap().delay, 0.0);
    host.timers().fire_due(host.clock().now());
    assert!(fired.get());
}

#[test]
fn fallback_frames_land_on_a_16ms_grid_until_the_caller_falls_behind() {
    let host = Rc::new(ScriptedHost::browserless());
    let clock = host.clock();
    let scheduler = FrameScheduler::new(host.clone());

    scheduler.schedule(|_| {}); // t=0: a full interval out
    clock.advance(3.0);
    scheduler.schedule(|_| {}); // t=3: stretched to hold the grid
    clock.advance(40.0);
    scheduler.schedule(|_| {}); // t=43: grid slot 48 is still ahead
    clock.advance(27.0);
    scheduler.schedule(|_| {}); // t=70: behind the grid, fires immediately

    let armed = host.timers().armed();
    let deadlines: Vec<f64> = armed.iter().map(|timer| timer.deadline).collect();
    let delays: Vec<f64> = armed.iter().map(|timer| timer.delay).collect();
    assert_eq!(deadlines, vec![16.0, 32.0, 48.0, 70.0]);
    assert_eq!(delays, vec![16.0, 29.0, 5.0, 0.0]);
}

#[test]
fn callback_timestamp_matches_the_armed_deadline() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let seen = Rc::new(Cell::new(f64::NAN));
    let slot = seen.clone();
    scheduler.schedule(move |timestamp| slot.set(timestamp));

    let deadline = host.timers().armed()[0].deadline;
    host.clock().set(deadline);
    host.timers().fire_due(deadline);
    assert_eq!(seen.get(), deadline);
    assert_eq!(seen.get(), FRAME_INTERVAL_MILLIS);
}

#[test]
fn cancelling_a_fallback_frame_clears_its_timer() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let handle = scheduler.schedule(|_| panic!("cancelled frame fired"));
    scheduler.cancel(handle);

    assert_eq!(host.timers().pending_count(), 0);
    assert_eq!(host.timers().cleared(), vec![handle.raw()]);
    host.timers().fire_due(1_000.0);
}

#[test]
fn high_res_clock_wins_when_present() {
    let high_res = Rc::new(VirtualClock::new(500.0));
    let host = Rc::new(ScriptedHost::browserless().with_high_res_clock(high_res.clone()));
    let scheduler = FrameScheduler::new(host.clone());

    // Tier one passes readings through unshifted.
    assert_eq!(scheduler.now(), 500.0);
    high_res.advance(10.0);
    assert_eq!(scheduler.now(), 510.0);
    assert_eq!(host.construct_timestamp_calls(), 0);
}

#[test]
fn startup_record_anchors_the_synthesized_origin() {
    let host = Rc::new(ScriptedHost::browserless().with_startup_millis(1_000.0));
    host.clock().set(1_250.0);
    let scheduler = FrameScheduler::new(host.clone());
    assert_eq!(scheduler.now(), 250.0);
}

#[test]
fn first_wall_reading_becomes_the_origin_without_a_startup_record() {
    let host = Rc::new(ScriptedHost::browserless());
    host.clock().set(5_000.0);
    let scheduler = FrameScheduler::new(host.clone());
    assert_eq!(scheduler.now(), 0.0);
    host.clock().advance(12.5);
    assert_eq!(scheduler.now(), 12.5);
}

#[test]
fn constructed_timestamps_back_the_clock_when_wall_is_missing() {
    let host = Rc::new(ScriptedHost::browserless().without_wall_clock());
    let scheduler = FrameScheduler::new(host.clone());
    // The origin reading already had to go through construction.
    assert!(host.construct_timestamp_calls() >= 1);

    host.clock().advance(7.0);
    let calls_before = host.construct_timestamp_calls();
    assert_eq!(scheduler.now(), 7.0);
    assert!(host.construct_timestamp_calls() > calls_before);
}

#[test]
fn wall_regression_passes_through_on_the_synthesized_tier() {
    let host = Rc::new(ScriptedHost::browserless());
    host.clock().set(100.0);
    let scheduler = FrameScheduler::new(host.clone());
    host.clock().advance(50.0);
    assert_eq!(scheduler.now(), 50.0);

    // Host wall clock adjusted backwards; the synthesized tier reports it.
    host.clock().set(80.0);
    assert_eq!(scheduler.now(), -20.0);
}
