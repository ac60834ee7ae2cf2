//! The tween driver.

use std::cell::RefCell;
use std::rc::Rc;

use tween_core::{FrameHandle, FrameScheduler, Millis};

use crate::easing::{linear, EasingFn, EasingTable};

/// Trait for types that can be linearly interpolated.
pub trait Lerp {
    fn lerp(&self, target: &Self, fraction: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction
    }
}

impl Lerp for f64 {
    fn lerp(&self, target: &Self, fraction: f32) -> Self {
        self + (target - self) * fraction as f64
    }
}

/// Duration applied when a spec does not name one, in milliseconds.
pub const DEFAULT_DURATION_MILLIS: u64 = 1000;

/// What to animate: endpoints, timing and the easing curve.
#[derive(Clone)]
pub struct TweenSpec<T: Lerp + Clone> {
    pub start: T,
    pub end: T,
    pub duration_millis: u64,
    pub delay_millis: u64,
    pub easing: EasingFn,
}

impl<T: Lerp + Clone> TweenSpec<T> {
    /// Linear spec from `start` to `end` over the default duration.
    pub fn new(start: T, end: T) -> Self {
        Self {
            start,
            end,
            duration_millis: DEFAULT_DURATION_MILLIS,
            delay_millis: 0,
            easing: linear(),
        }
    }

    pub fn between(mut self, start: T, end: T) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn lasting(mut self, duration_millis: u64) -> Self {
        self.duration_millis = duration_millis;
        self
    }

    /// Delay before the first tick, in milliseconds.
    pub fn after_delay(mut self, delay_millis: u64) -> Self {
        self.delay_millis = delay_millis;
        self
    }

    pub fn eased(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Resolves `name` in `table`, falling back to linear when unknown.
    pub fn eased_by_name(self, name: &str, table: &EasingTable) -> Self {
        let easing = table.resolve(name);
        self.eased(easing)
    }
}

impl Default for TweenSpec<f64> {
    fn default() -> Self {
        Self::new(0.0, 1000.0)
    }
}

impl Default for TweenSpec<f32> {
    fn default() -> Self {
        Self::new(0.0, 1000.0)
    }
}

type TickFn<T> = Box<dyn FnMut(T, Millis)>;
type DoneFn<T> = Box<dyn FnMut(T)>;

/// Drives one value from `start` to `end` over scheduler frames.
///
/// Observers are installed with the consuming builders before the first
/// [`begin`](Self::begin). `begin` restarts from `start` every time,
/// cancelling whatever frame was still pending. The frame loop holds only a
/// weak reference, so dropping every handle stops the loop silently at the
/// next frame.
pub struct Tween<T: Lerp + Clone + 'static> {
    inner: Rc<RefCell<TweenInner<T>>>,
}

struct TweenInner<T: Lerp + Clone> {
    scheduler: FrameScheduler,
    spec: TweenSpec<T>,
    current: T,
    start_time: Option<Millis>,
    pending: Option<FrameHandle>,
    running: bool,
    tick: TickFn<T>,
    done: DoneFn<T>,
}

impl<T: Lerp + Clone + 'static> Tween<T> {
    pub fn new(scheduler: &FrameScheduler, spec: TweenSpec<T>) -> Self {
        let inner = TweenInner {
            scheduler: scheduler.clone(),
            current: spec.start.clone(),
            spec,
            start_time: None,
            pending: None,
            running: false,
            tick: Box::new(|_, _| {}),
            done: Box::new(|_| {}),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Installs the per-frame observer, called with the value and the frame
    /// timestamp.
    pub fn on_tick(self, tick: impl FnMut(T, Millis) + 'static) -> Self {
        self.inner.borrow_mut().tick = Box::new(tick);
        self
    }

    /// Installs the completion observer, fired once per run with the final
    /// value.
    pub fn on_done(self, done: impl FnMut(T) + 'static) -> Self {
        self.inner.borrow_mut().done = Box::new(done);
        self
    }

    /// Starts, or restarts from the beginning, cancelling any pending frame.
    pub fn begin(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(handle) = inner.pending.take() {
                inner.scheduler.cancel(handle);
            }
            inner.current = inner.spec.start.clone();
            inner.start_time = None;
            inner.running = true;
        }
        Self::schedule_frame(&self.inner);
    }

    /// Halts mid-flight without firing the completion observer. The value
    /// freezes wherever the last frame left it.
    pub fn stop(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = inner.pending.take() {
            inner.scheduler.cancel(handle);
        }
        inner.running = false;
        inner.start_time = None;
    }

    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// The most recently computed value.
    pub fn value(&self) -> T {
        self.inner.borrow().current.clone()
    }

    fn schedule_frame(this: &Rc<RefCell<TweenInner<T>>>) {
        let scheduler = {
            let inner = this.borrow();
            if !inner.running || inner.pending.is_some() {
                return;
            }
            inner.scheduler.clone()
        };
        let weak = Rc::downgrade(this);
        let handle = scheduler.schedule(move |timestamp| {
            if let Some(strong) = weak.upgrade() {
                Self::on_frame(&strong, timestamp);
            }
        });
        this.borrow_mut().pending = Some(handle);
    }

    fn on_frame(this: &Rc<RefCell<TweenInner<T>>>, timestamp: Millis) {
        enum Step<T> {
            Hold,
            Tick(T),
            Finish(T),
        }

        let step = {
            let mut inner = this.borrow_mut();
            inner.pending = None;
            if !inner.running {
                return;
            }

            let started = *inner.start_time.get_or_insert(timestamp);
            let elapsed = (timestamp - started).max(0.0);
            let delay = inner.spec.delay_millis as f64;
            if elapsed < delay {
                Step::Hold
            } else {
                let duration = inner.spec.duration_millis.max(1) as f64;
                let fraction = ((elapsed - delay) / duration).clamp(0.0, 1.0);
                let eased = (inner.spec.easing)(fraction);
                let value = inner.spec.start.lerp(&inner.spec.end, eased as f32);
                if fraction >= 1.0 {
                    // Land exactly on the endpoint, whatever the curve did.
                    inner.current = inner.spec.end.clone();
                    inner.running = false;
                    inner.start_time = None;
                    Step::Finish(inner.spec.end.clone())
                } else {
                    inner.current = value.clone();
                    Step::Tick(value)
                }
            }
        };

        match step {
            Step::Hold => Self::schedule_frame(this),
            Step::Tick(value) => {
                Self::fire_tick(this, value, timestamp);
                Self::schedule_frame(this);
            }
            Step::Finish(value) => {
                Self::fire_tick(this, value.clone(), timestamp);
                Self::fire_done(this, value);
            }
        }
    }

    // Observers run with the cell released so they may call begin or stop.
    // The observer is swapped out for the duration of the call and swapped
    // back afterwards.
    fn fire_tick(this: &Rc<RefCell<TweenInner<T>>>, value: T, timestamp: Millis) {
        let mut tick = std::mem::replace(&mut this.borrow_mut().tick, Box::new(|_, _| {}));
        tick(value, timestamp);
        this.borrow_mut().tick = tick;
    }

    fn fire_done(this: &Rc<RefCell<TweenInner<T>>>, value: T) {
        let mut done = std::mem::replace(&mut this.borrow_mut().done, Box::new(|_| {}));
        done(value);
        this.borrow_mut().done = done;
    }
}

impl<T: Lerp + Clone + 'static> Clone for Tween<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
