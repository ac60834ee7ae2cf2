//! Standard library backed host services for Tween-RS.
//!
//! [`StdHost`] wires `std::time` clocks and a cooperative one-shot timer
//! queue into the host capability traits. It exposes no frame facility, so a
//! scheduler built on it always lands on the timer fallback. The process owns
//! the loop: sleep for [`StdTimerHost::next_delay`], call
//! [`StdTimerHost::run_due`], repeat.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tween_core::collections::HashMap;
use tween_core::{HighResClock, HostEnv, Millis, RawHandle, TimerHost, WallClock};

/// Monotonic clock reporting milliseconds since its own construction.
pub struct StdHighResClock {
    origin: Instant,
}

impl StdHighResClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdHighResClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HighResClock for StdHighResClock {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Wall clock reporting milliseconds since the Unix epoch.
pub struct StdWallClock;

impl WallClock for StdWallClock {
    fn now(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0
    }
}

struct TimerEntry {
    deadline: Instant,
    callback: Box<dyn FnOnce()>,
}

/// Cooperative one-shot timer queue.
///
/// Arming a timer never spawns a thread. The owning loop drains the queue by
/// calling [`run_due`](Self::run_due); callbacks run on that thread and may
/// arm further timers.
pub struct StdTimerHost {
    pending: RefCell<HashMap<RawHandle, TimerEntry>>,
    next_handle: Cell<RawHandle>,
}

impl StdTimerHost {
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(HashMap::default()),
            next_handle: Cell::new(1),
        }
    }

    /// Runs every timer whose deadline has passed, earliest deadline first,
    /// and returns how many ran. Timers armed by the callbacks themselves
    /// wait for a later call.
    pub fn run_due(&self) -> usize {
        let now = Instant::now();
        let mut due: Vec<(Instant, RawHandle)> = self
            .pending
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(&handle, entry)| (entry.deadline, handle))
            .collect();
        due.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut fired = 0;
        for (_, handle) in due {
            // A callback may have cleared a handle that was due alongside it.
            let entry = self.pending.borrow_mut().remove(&handle);
            if let Some(entry) = entry {
                (entry.callback)();
                fired += 1;
            }
        }
        fired
    }

    /// How long the owner may sleep before the next deadline. Zero when a
    /// timer is already overdue, `None` when the queue is empty.
    pub fn next_delay(&self) -> Option<Duration> {
        let earliest = {
            let pending = self.pending.borrow();
            pending.values().map(|entry| entry.deadline).min()?
        };
        Some(earliest.saturating_duration_since(Instant::now()))
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

impl Default for StdTimerHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerHost for StdTimerHost {
    fn set_timeout(&self, callback: Box<dyn FnOnce() + 'static>, delay: Millis) -> RawHandle {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        let deadline = Instant::now() + Duration::from_secs_f64(delay.max(0.0) / 1000.0);
        self.pending
            .borrow_mut()
            .insert(handle, TimerEntry { deadline, callback });
        handle
    }

    fn clear_timeout(&self, handle: RawHandle) {
        self.pending.borrow_mut().remove(&handle);
    }
}

/// Host over the standard library.
///
/// `new` presents everything a headless process has: a monotonic clock, the
/// wall clock, a startup timestamp and the timer queue. `barebones` strips
/// the clocks away and leaves only timestamp construction plus timers, the
/// most impoverished host a scheduler still accepts.
pub struct StdHost {
    high_res: Option<Rc<StdHighResClock>>,
    wall: Option<Rc<StdWallClock>>,
    startup: Option<Millis>,
    timers: Rc<StdTimerHost>,
}

impl StdHost {
    pub fn new() -> Self {
        let startup = WallClock::now(&StdWallClock);
        Self {
            high_res: Some(Rc::new(StdHighResClock::new())),
            wall: Some(Rc::new(StdWallClock)),
            startup: Some(startup),
            timers: Rc::new(StdTimerHost::new()),
        }
    }

    pub fn barebones() -> Self {
        Self {
            high_res: None,
            wall: None,
            startup: None,
            timers: Rc::new(StdTimerHost::new()),
        }
    }

    /// The timer queue, for the loop that pumps it.
    pub fn timers(&self) -> Rc<StdTimerHost> {
        self.timers.clone()
    }
}

impl Default for StdHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEnv for StdHost {
    fn high_res_clock(&self) -> Option<Rc<dyn HighResClock>> {
        self.high_res
            .clone()
            .map(|clock| clock as Rc<dyn HighResClock>)
    }

    fn wall_clock(&self) -> Option<Rc<dyn WallClock>> {
        self.wall.clone().map(|clock| clock as Rc<dyn WallClock>)
    }

    fn startup_millis(&self) -> Option<Millis> {
        self.startup
    }

    fn timer_host(&self) -> Option<Rc<dyn TimerHost>> {
        Some(self.timers.clone())
    }

    fn construct_timestamp(&self) -> Millis {
        WallClock::now(&StdWallClock)
    }
}
