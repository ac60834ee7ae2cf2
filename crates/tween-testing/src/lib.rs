//! Scripted host environments for deterministic scheduler tests.
//!
//! Everything in here runs on virtual time. Tests assemble a [`ScriptedHost`]
//! exposing exactly the capabilities under test, hand it to
//! `FrameScheduler::new`, and then drive the clock and timers by hand while
//! asserting on what the scheduler asked the host to do.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tween_core::collections::HashMap;
use tween_core::{
    FrameCallback, FrameCancelFn, FrameCancelName, FrameRequestFn, FrameRequestName, HighResClock,
    HostEnv, Millis, RawHandle, TimerHost, Vendor, WallClock,
};

/// Settable millisecond clock shared between a test and its host.
///
/// `set` may move time backwards. Wall clocks do that in the field, and the
/// synthesized-timestamp tests rely on reproducing it.
pub struct VirtualClock {
    millis: Cell<Millis>,
}

impl VirtualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            millis: Cell::new(start),
        }
    }

    pub fn set(&self, millis: Millis) {
        self.millis.set(millis);
    }

    pub fn advance(&self, delta: Millis) {
        self.millis.set(self.millis.get() + delta);
    }

    pub fn now(&self) -> Millis {
        self.millis.get()
    }
}

impl WallClock for VirtualClock {
    fn now(&self) -> Millis {
        self.millis.get()
    }
}

impl HighResClock for VirtualClock {
    fn now(&self) -> Millis {
        self.millis.get()
    }
}

/// Record of one `set_timeout` call, in virtual milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArmedTimer {
    pub handle: RawHandle,
    pub delay: Millis,
    pub deadline: Millis,
}

struct TimerEntry {
    deadline: Millis,
    callback: Box<dyn FnOnce()>,
}

/// One-shot timer host fired manually from the test.
///
/// Every `set_timeout` is logged to an armed list and every `clear_timeout`
/// to a cleared list, whether or not the handle was still live, so tests can
/// assert on the exact traffic the scheduler produced.
pub struct ManualTimers {
    clock: Rc<VirtualClock>,
    pending: RefCell<HashMap<RawHandle, TimerEntry>>,
    armed: RefCell<Vec<ArmedTimer>>,
    cleared: RefCell<Vec<RawHandle>>,
    next_handle: Cell<RawHandle>,
}

impl ManualTimers {
    pub fn new(clock: Rc<VirtualClock>) -> Self {
        Self {
            clock,
            pending: RefCell::new(HashMap::default()),
            armed: RefCell::new(Vec::new()),
            cleared: RefCell::new(Vec::new()),
            next_handle: Cell::new(1),
        }
    }

    /// Fires every pending timer whose deadline is at or before `now`, in
    /// deadline order. Timers armed by the callbacks themselves stay pending
    /// for a later pass. Returns the number fired.
    pub fn fire_due(&self, now: Millis) -> usize {
        let mut due: Vec<(Millis, RawHandle)> = self
            .pending
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(&handle, entry)| (entry.deadline, handle))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut fired = 0;
        for (_, handle) in due {
            // A callback may have cleared a later due handle already.
            let entry = self.pending.borrow_mut().remove(&handle);
            if let Some(entry) = entry {
                (entry.callback)();
                fired += 1;
            }
        }
        fired
    }

    /// Fires the single earliest pending timer regardless of the clock and
    /// returns its deadline, or `None` when nothing is pending.
    pub fn fire_next(&self) -> Option<Millis> {
        let (deadline, handle) = self
            .pending
            .borrow()
            .iter()
            .map(|(&handle, entry)| (entry.deadline, handle))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))?;
        let entry = self.pending.borrow_mut().remove(&handle)?;
        (entry.callback)();
        Some(deadline)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Every timer ever armed, in arming order.
    pub fn armed(&self) -> Vec<ArmedTimer> {
        self.armed.borrow().clone()
    }

    /// Every handle ever passed to `clear_timeout`, in call order.
    pub fn cleared(&self) -> Vec<RawHandle> {
        self.cleared.borrow().clone()
    }
}

impl TimerHost for ManualTimers {
    fn set_timeout(&self, callback: Box<dyn FnOnce() + 'static>, delay: Millis) -> RawHandle {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        let deadline = self.clock.now() + delay.max(0.0);
        self.armed.borrow_mut().push(ArmedTimer {
            handle,
            delay,
            deadline,
        });
        self.pending
            .borrow_mut()
            .insert(handle, TimerEntry { deadline, callback });
        handle
    }

    fn clear_timeout(&self, handle: RawHandle) {
        self.cleared.borrow_mut().push(handle);
        self.pending.borrow_mut().remove(&handle);
    }
}

/// Request/cancel recorder standing in for one host frame facility.
///
/// Captured callbacks are dispatched by hand with an explicit timestamp, the
/// way a browser would invoke them on the next vsync.
pub struct RecordingFrameFns {
    pending: RefCell<Vec<(RawHandle, FrameCallback)>>,
    requested: Cell<usize>,
    cancelled: RefCell<Vec<RawHandle>>,
    next_handle: Cell<RawHandle>,
}

impl RecordingFrameFns {
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
            requested: Cell::new(0),
            cancelled: RefCell::new(Vec::new()),
            next_handle: Cell::new(1),
        }
    }

    /// Total requests ever made, including ones already dispatched.
    pub fn request_count(&self) -> usize {
        self.requested.get()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Every handle ever passed to `cancel`, in call order.
    pub fn cancelled(&self) -> Vec<RawHandle> {
        self.cancelled.borrow().clone()
    }

    /// Runs the oldest captured callback with `timestamp` and returns its
    /// handle, or `None` when nothing is pending.
    pub fn dispatch_next(&self, timestamp: Millis) -> Option<RawHandle> {
        let (handle, callback) = {
            let mut pending = self.pending.borrow_mut();
            if pending.is_empty() {
                return None;
            }
            pending.remove(0)
        };
        callback(timestamp);
        Some(handle)
    }

    /// Runs every callback captured so far with the same `timestamp`, like a
    /// single vsync dispatch. Callbacks requested during the pass are held
    /// for the next one. Returns the number run.
    pub fn dispatch_all(&self, timestamp: Millis) -> usize {
        let snapshot: Vec<(RawHandle, FrameCallback)> =
            self.pending.borrow_mut().drain(..).collect();
        let fired = snapshot.len();
        for (_, callback) in snapshot {
            callback(timestamp);
        }
        fired
    }
}

impl Default for RecordingFrameFns {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRequestFn for RecordingFrameFns {
    fn request(&self, callback: FrameCallback) -> RawHandle {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        self.requested.set(self.requested.get() + 1);
        self.pending.borrow_mut().push((handle, callback));
        handle
    }
}

impl FrameCancelFn for RecordingFrameFns {
    fn cancel(&self, handle: RawHandle) {
        self.cancelled.borrow_mut().push(handle);
        self.pending.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

/// Builder-style host exposing an arbitrary subset of capabilities.
///
/// The baseline is [`ScriptedHost::browserless`]: a virtual wall clock plus
/// manual timers and nothing else, which forces the scheduler onto its timer
/// fallback with a synthesized clock. `with_*` methods layer frame functions
/// and richer clocks on top.
pub struct ScriptedHost {
    clock: Rc<VirtualClock>,
    high_res: Option<Rc<VirtualClock>>,
    expose_wall_clock: bool,
    startup: Option<Millis>,
    timers: Option<Rc<ManualTimers>>,
    request_fns: HashMap<FrameRequestName, Rc<RecordingFrameFns>>,
    cancel_fns: HashMap<FrameCancelName, Rc<RecordingFrameFns>>,
    construct_calls: Cell<usize>,
}

impl ScriptedHost {
    pub fn browserless() -> Self {
        let clock = Rc::new(VirtualClock::new(0.0));
        let timers = Rc::new(ManualTimers::new(clock.clone()));
        Self {
            clock,
            high_res: None,
            expose_wall_clock: true,
            startup: None,
            timers: Some(timers),
            request_fns: HashMap::default(),
            cancel_fns: HashMap::default(),
            construct_calls: Cell::new(0),
        }
    }

    /// Standard request/cancel pair backed by one shared recorder.
    pub fn with_standard_frame_fns(mut self) -> Self {
        let fns = Rc::new(RecordingFrameFns::new());
        self.request_fns.insert(FrameRequestName::Standard, fns.clone());
        self.cancel_fns.insert(FrameCancelName::Standard, fns);
        self
    }

    /// Prefixed request/cancel pair for one vendor, one shared recorder.
    pub fn with_vendor_frame_fns(mut self, vendor: Vendor) -> Self {
        let fns = Rc::new(RecordingFrameFns::new());
        self.request_fns
            .insert(FrameRequestName::Prefixed(vendor), fns.clone());
        self.cancel_fns
            .insert(FrameCancelName::Prefixed(vendor), fns);
        self
    }

    /// Prefixed request function with no canceller under any name.
    pub fn with_vendor_request_only(mut self, vendor: Vendor) -> Self {
        let fns = Rc::new(RecordingFrameFns::new());
        self.request_fns
            .insert(FrameRequestName::Prefixed(vendor), fns);
        self
    }

    /// Moves the vendor's canceller to its legacy `CancelRequest` name.
    pub fn with_legacy_vendor_cancel(mut self, vendor: Vendor) -> Self {
        let fns = self
            .cancel_fns
            .remove(&FrameCancelName::Prefixed(vendor))
            .or_else(|| {
                self.request_fns
                    .get(&FrameRequestName::Prefixed(vendor))
                    .cloned()
            });
        if let Some(fns) = fns {
            self.cancel_fns
                .insert(FrameCancelName::PrefixedLegacy(vendor), fns);
        }
        self
    }

    pub fn with_high_res_clock(mut self, clock: Rc<VirtualClock>) -> Self {
        self.high_res = Some(clock);
        self
    }

    pub fn with_startup_millis(mut self, startup: Millis) -> Self {
        self.startup = Some(startup);
        self
    }

    pub fn without_wall_clock(mut self) -> Self {
        self.expose_wall_clock = false;
        self
    }

    pub fn without_timers(mut self) -> Self {
        self.timers = None;
        self
    }

    /// The shared wall clock driving this host.
    pub fn clock(&self) -> Rc<VirtualClock> {
        self.clock.clone()
    }

    /// The manual timer host. Panics when built `without_timers`.
    pub fn timers(&self) -> Rc<ManualTimers> {
        self.timers
            .clone()
            .expect("scripted host has no timer facility")
    }

    /// The recorder registered under `name`. Panics when absent.
    pub fn frame_fns(&self, name: FrameRequestName) -> Rc<RecordingFrameFns> {
        self.request_fns
            .get(&name)
            .cloned()
            .expect("scripted host has no frame functions under that name")
    }

    /// How many times the scheduler fell back to `construct_timestamp`.
    pub fn construct_timestamp_calls(&self) -> usize {
        self.construct_calls.get()
    }
}

impl HostEnv for ScriptedHost {
    fn high_res_clock(&self) -> Option<Rc<dyn HighResClock>> {
        self.high_res
            .clone()
            .map(|clock| clock as Rc<dyn HighResClock>)
    }

    fn wall_clock(&self) -> Option<Rc<dyn WallClock>> {
        if self.expose_wall_clock {
            Some(self.clock.clone())
        } else {
            None
        }
    }

    fn startup_millis(&self) -> Option<Millis> {
        self.startup
    }

    fn frame_request_fn(&self, name: FrameRequestName) -> Option<Rc<dyn FrameRequestFn>> {
        self.request_fns
            .get(&name)
            .map(|fns| fns.clone() as Rc<dyn FrameRequestFn>)
    }

    fn frame_cancel_fn(&self, name: FrameCancelName) -> Option<Rc<dyn FrameCancelFn>> {
        self.cancel_fns
            .get(&name)
            .map(|fns| fns.clone() as Rc<dyn FrameCancelFn>)
    }

    fn timer_host(&self) -> Option<Rc<dyn TimerHost>> {
        self.timers.clone().map(|timers| timers as Rc<dyn TimerHost>)
    }

    fn construct_timestamp(&self) -> Millis {
        self.construct_calls.set(self.construct_calls.get() + 1);
        self.clock.now()
    }
}
