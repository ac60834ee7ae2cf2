use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tween_animation::{EasingTable, Tween, TweenSpec};
use tween_core::{FrameRequestName, FrameScheduler, FRAME_INTERVAL_MILLIS};
use tween_testing::ScriptedHost;

/// Advances virtual time one frame interval at a time, firing due timers.
fn pump(host: &ScriptedHost, frames: usize) {
    let clock = host.clock();
    let timers = host.timers();
    for _ in 0..frames {
        clock.advance(FRAME_INTERVAL_MILLIS);
        timers.fire_due(clock.now());
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn tween_reaches_its_end_value_exactly() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let ticks: Rc<RefCell<Vec<(f64, f64)>>> = Rc::new(RefCell::new(Vec::new()));
    let done_runs = Rc::new(Cell::new(0u32));
    let final_value = Rc::new(Cell::new(f64::NAN));

    let tick_log = ticks.clone();
    let runs = done_runs.clone();
    let landed = final_value.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 10.0).lasting(100))
        .on_tick(move |value, timestamp| tick_log.borrow_mut().push((value, timestamp)))
        .on_done(move |value| {
            runs.set(runs.get() + 1);
            landed.set(value);
        });

    tween.begin();
    assert!(tween.is_running());
    pump(&host, 20);

    assert!(!tween.is_running());
    assert_eq!(done_runs.get(), 1);
    assert_eq!(final_value.get(), 10.0);
    assert_eq!(tween.value(), 10.0);

    let ticks = ticks.borrow();
    assert_close(ticks.first().unwrap().0, 0.0);
    assert_eq!(ticks.last().unwrap().0, 10.0);
    for pair in ticks.windows(2) {
        assert!(pair[1].0 >= pair[0].0, "values went backwards: {pair:?}");
    }
}

#[test]
fn values_follow_the_linear_ramp() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let ticks: Rc<RefCell<Vec<(f64, f64)>>> = Rc::new(RefCell::new(Vec::new()));
    let tick_log = ticks.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 10.0).lasting(160))
        .on_tick(move |value, timestamp| tick_log.borrow_mut().push((value, timestamp)));

    tween.begin();
    pump(&host, 15);

    // One tick per frame: fractions 0.0, 0.1, .., 0.9 and the final landing.
    let ticks = ticks.borrow();
    assert_eq!(ticks.len(), 11);
    for (index, &(value, timestamp)) in ticks.iter().enumerate() {
        assert_close(value, index as f64);
        assert_eq!(timestamp, FRAME_INTERVAL_MILLIS * (index as f64 + 1.0));
    }
}

#[test]
fn delay_holds_ticks_back() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let ticks: Rc<RefCell<Vec<(f64, f64)>>> = Rc::new(RefCell::new(Vec::new()));
    let done_runs = Rc::new(Cell::new(0u32));

    let tick_log = ticks.clone();
    let runs = done_runs.clone();
    let tween = Tween::new(
        &scheduler,
        TweenSpec::default()
            .between(0.0, 1.0)
            .lasting(50)
            .after_delay(50),
    )
    .on_tick(move |value, timestamp| tick_log.borrow_mut().push((value, timestamp)))
    .on_done(move |_| runs.set(runs.get() + 1));

    tween.begin();
    pump(&host, 12);

    let ticks = ticks.borrow();
    // First frame lands at 16ms and fixes the start time; the delay then
    // swallows every frame before 66ms on the tween's own timeline.
    assert_eq!(ticks.first().unwrap().1, 80.0);
    assert!(ticks.iter().all(|&(_, timestamp)| timestamp >= 80.0));
    assert_eq!(ticks.last().unwrap().0, 1.0);
    assert_eq!(done_runs.get(), 1);
}

#[test]
fn stop_freezes_the_value_and_skips_done() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let tick_count = Rc::new(Cell::new(0u32));
    let done_runs = Rc::new(Cell::new(0u32));

    let counter = tick_count.clone();
    let runs = done_runs.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 10.0).lasting(160))
        .on_tick(move |_, _| counter.set(counter.get() + 1))
        .on_done(move |_| runs.set(runs.get() + 1));

    tween.begin();
    pump(&host, 3);
    tween.stop();

    assert!(!tween.is_running());
    assert_close(tween.value(), 2.0);
    assert_eq!(host.timers().pending_count(), 0);

    pump(&host, 10);
    assert_eq!(tick_count.get(), 3);
    assert_eq!(done_runs.get(), 0);
}

#[test]
fn begin_restarts_from_the_start() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let done_runs = Rc::new(Cell::new(0u32));
    let runs = done_runs.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 10.0).lasting(60))
        .on_done(move |_| runs.set(runs.get() + 1));

    tween.begin();
    pump(&host, 8);
    assert_eq!(done_runs.get(), 1);
    assert_eq!(tween.value(), 10.0);

    tween.begin();
    assert_eq!(tween.value(), 0.0);
    assert!(tween.is_running());
    pump(&host, 8);
    assert_eq!(done_runs.get(), 2);
    assert_eq!(tween.value(), 10.0);
}

#[test]
fn restarting_midflight_cancels_the_pending_frame() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let done_runs = Rc::new(Cell::new(0u32));
    let runs = done_runs.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 10.0).lasting(160))
        .on_done(move |_| runs.set(runs.get() + 1));

    tween.begin();
    pump(&host, 3);
    assert_close(tween.value(), 2.0);

    // Restart while the fourth frame is still armed.
    tween.begin();
    assert_eq!(host.timers().cleared().len(), 1);
    assert_eq!(host.timers().pending_count(), 1);
    assert_eq!(tween.value(), 0.0);
    assert!(tween.is_running());

    // Only the rerun completes; the abandoned first run never fires done.
    pump(&host, 14);
    assert_eq!(done_runs.get(), 1);
    assert_eq!(tween.value(), 10.0);
}

#[test]
fn dropped_tween_stops_silently() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let tick_count = Rc::new(Cell::new(0u32));
    let counter = tick_count.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 10.0).lasting(160))
        .on_tick(move |_, _| counter.set(counter.get() + 1));

    tween.begin();
    pump(&host, 2);
    assert_eq!(tick_count.get(), 2);

    drop(tween);
    pump(&host, 5);

    // The armed frame fires into a dead weak reference and nothing reschedules.
    assert_eq!(tick_count.get(), 2);
    assert_eq!(host.timers().pending_count(), 0);
}

#[test]
fn easing_shapes_the_motion() {
    let host = Rc::new(ScriptedHost::browserless());
    let scheduler = FrameScheduler::new(host.clone());

    let mut table = EasingTable::new();
    table.register_fn("quad", |t| t * t);

    let ticks: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));
    let tick_log = ticks.clone();
    let tween = Tween::new(
        &scheduler,
        TweenSpec::default()
            .between(0.0, 10.0)
            .lasting(160)
            .eased_by_name("quad", &table),
    )
    .on_tick(move |value, _| tick_log.borrow_mut().push(value));

    tween.begin();
    pump(&host, 15);

    let ticks = ticks.borrow();
    // Second frame sits at t = 0.1: quad gives 0.01 of the range.
    assert_close(ticks[1], 0.1);
    // Quad stays below the linear ramp mid-flight and still lands exactly.
    assert!(ticks[5] < 5.0);
    assert_eq!(*ticks.last().unwrap(), 10.0);
}

#[test]
fn tween_runs_on_a_native_frame_backend() {
    let host = Rc::new(ScriptedHost::browserless().with_standard_frame_fns());
    let scheduler = FrameScheduler::new(host.clone());
    let fns = host.frame_fns(FrameRequestName::Standard);

    let done_runs = Rc::new(Cell::new(0u32));
    let runs = done_runs.clone();
    let tween = Tween::new(&scheduler, TweenSpec::default().between(0.0, 1.0).lasting(32))
        .on_done(move |_| runs.set(runs.get() + 1));

    tween.begin();
    assert_eq!(fns.dispatch_all(0.0), 1);
    assert_eq!(fns.dispatch_all(16.0), 1);
    assert_eq!(fns.dispatch_all(32.0), 1);

    assert_eq!(done_runs.get(), 1);
    assert_eq!(tween.value(), 1.0);
    // The native facility carried every frame; the timer host stayed idle.
    assert!(host.timers().armed().is_empty());
}
