use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use tween_animation::{EasingTable, Tween, TweenSpec};
use tween_core::FrameScheduler;
use tween_runtime_std::StdHost;

const RUN_BUDGET: Duration = Duration::from_secs(5);

fn main() {
    env_logger::init();

    println!("=== Tween-RS Console Demo ===");
    println!("Animates 0 -> 1000 over 600ms on the timer fallback:");
    println!("  - Frames self-space one interval apart");
    println!("  - Eased with a registered ease-out-quad curve");
    println!();

    let host = Rc::new(StdHost::new());
    let scheduler = FrameScheduler::new(host.clone());
    println!("scheduler backend: {}", scheduler.backend_kind());

    let mut easings = EasingTable::new();
    easings.register_fn("ease-out-quad", |t| t * (2.0 - t));

    let finished = Rc::new(Cell::new(false));
    let flag = finished.clone();
    let tween = Tween::new(
        &scheduler,
        TweenSpec::default()
            .between(0.0, 1000.0)
            .lasting(600)
            .eased_by_name("ease-out-quad", &easings),
    )
    .on_tick(|value, timestamp| println!("  t={timestamp:8.1}ms  value={value:8.2}"))
    .on_done(move |value| {
        println!("landed on {value}");
        flag.set(true);
    });

    tween.begin();

    let timers = host.timers();
    let deadline = Instant::now() + RUN_BUDGET;
    while !finished.get() {
        if Instant::now() > deadline {
            log::error!("demo did not finish within {RUN_BUDGET:?}");
            break;
        }
        match timers.next_delay() {
            Some(delay) => thread::sleep(delay),
            None => thread::sleep(Duration::from_millis(1)),
        }
        timers.run_due();
    }
}
