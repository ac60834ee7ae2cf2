//! The frame scheduler.
//!
//! [`FrameScheduler::new`] probes a host environment once, settles on a
//! backend and a canonical clock, and hands out clone-able handles to both.
//! Construction is the explicit replacement for ambient environment
//! patching: callers take the scheduler as a dependency instead of reaching
//! for process-wide globals, and initializing twice against the same
//! environment selects the same backend both times without wrapping.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::clock::SchedulerClock;
use crate::host::{FrameCancelFn, FrameRequestFn, FrameRequestName, HostEnv, TimerHost, Vendor};
use crate::probe::probe_frame_fns;
use crate::{Millis, RawHandle};

/// Target spacing between frames, the ~60 Hz cadence.
pub const FRAME_INTERVAL_MILLIS: Millis = 16.0;

/// Opaque handle for one scheduled callback, meaningful for exactly one
/// cancellation attempt. Dropping a handle does nothing; cancelling a fired
/// or already-cancelled handle is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(RawHandle);

impl FrameHandle {
    pub fn raw(self) -> RawHandle {
        self.0
    }
}

/// Which backend a scheduler settled on at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Host frame facility under the standard name.
    Standard,
    /// Host frame facility under a vendor-prefixed name.
    Vendor(Vendor),
    /// Paced one-shot timers; no frame facility was found.
    Timer,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Standard => f.write_str("standard"),
            BackendKind::Vendor(vendor) => write!(f, "{}-prefixed", vendor.prefix()),
            BackendKind::Timer => f.write_str("timer fallback"),
        }
    }
}

enum Backend {
    Frame {
        kind: BackendKind,
        request: Rc<dyn FrameRequestFn>,
        cancel: Option<Rc<dyn FrameCancelFn>>,
    },
    Timer {
        timers: Rc<dyn TimerHost>,
        /// Timestamp the most recently armed fallback frame fires at.
        /// Updated at scheduling time, not at fire time, so back-to-back
        /// `schedule` calls self-space one frame interval apart even when
        /// the caller schedules faster than the timers fire.
        last_scheduled: Cell<Millis>,
    },
}

struct SchedulerInner {
    clock: SchedulerClock,
    backend: Backend,
}

/// Best-effort 60 Hz one-shot callback scheduler with a uniform clock.
///
/// Cheap to clone; clones share the backend selected at construction.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<SchedulerInner>,
}

impl FrameScheduler {
    /// Initializes a scheduler against `env`.
    ///
    /// Detection order for `schedule`: the standard frame facility, then
    /// vendor-prefixed facilities (`ms`, `moz`, `webkit`, `o`), then paced
    /// one-shot timers. Detection for `now()`: the host high-resolution
    /// clock, else a clock synthesized from wall readings. Absent
    /// capabilities fall through silently; nothing here errors.
    ///
    /// # Panics
    ///
    /// Panics if the environment exposes neither a frame facility nor a
    /// timer facility. Such a host has no way to run a callback later and
    /// is outside this crate's support envelope.
    pub fn new(env: Rc<dyn HostEnv>) -> Self {
        let clock = SchedulerClock::resolve(&env);
        let backend = match probe_frame_fns(env.as_ref()) {
            Some(fns) => {
                let kind = match fns.name {
                    FrameRequestName::Standard => BackendKind::Standard,
                    FrameRequestName::Prefixed(vendor) => BackendKind::Vendor(vendor),
                };
                Backend::Frame {
                    kind,
                    request: fns.request,
                    cancel: fns.cancel,
                }
            }
            None => {
                let timers = match env.timer_host() {
                    Some(timers) => timers,
                    None => panic!(
                        "host environment exposes no frame request function and no timer facility"
                    ),
                };
                Backend::Timer {
                    timers,
                    last_scheduled: Cell::new(0.0),
                }
            }
        };
        let scheduler = Self {
            inner: Rc::new(SchedulerInner { clock, backend }),
        };
        log::debug!(
            "frame scheduler selected {} backend, {} clock",
            scheduler.backend_kind(),
            if scheduler.inner.clock.is_synthesized() {
                "synthesized"
            } else {
                "high-res"
            }
        );
        scheduler
    }

    /// Milliseconds on the scheduler's canonical clock.
    ///
    /// Non-decreasing between successive calls, except on the synthesized
    /// tier when the host's wall clock is adjusted backwards. That
    /// regression is passed through unchanged: callers relying on wall
    /// semantics see the wall clock they asked for.
    pub fn now(&self) -> Millis {
        self.inner.clock.now()
    }

    /// Which backend this scheduler settled on.
    pub fn backend_kind(&self) -> BackendKind {
        match &self.inner.backend {
            Backend::Frame { kind, .. } => *kind,
            Backend::Timer { .. } => BackendKind::Timer,
        }
    }

    /// Invokes `callback` exactly once, asynchronously, at roughly the next
    /// frame interval, passing the scheduler's best estimate of the fire
    /// time. Never blocks the caller.
    ///
    /// On a frame backend the callback and its timestamp come straight from
    /// the host facility. On the timer fallback the delay is paced so that
    /// consecutive callers land one frame interval apart:
    /// `max(0, 16 - (now - last_scheduled))` milliseconds from now, with
    /// the callback stamped `now + delay` as computed at scheduling time.
    pub fn schedule(&self, callback: impl FnOnce(Millis) + 'static) -> FrameHandle {
        match &self.inner.backend {
            Backend::Frame { request, .. } => FrameHandle(request.request(Box::new(callback))),
            Backend::Timer {
                timers,
                last_scheduled,
            } => {
                let now = self.inner.clock.now();
                let time_to_call =
                    (FRAME_INTERVAL_MILLIS - (now - last_scheduled.get())).max(0.0);
                let fire_at = now + time_to_call;
                let handle =
                    timers.set_timeout(Box::new(move || callback(fire_at)), time_to_call);
                last_scheduled.set(fire_at);
                FrameHandle(handle)
            }
        }
    }

    /// Prevents a still-pending callback from firing. No-op when the
    /// callback already ran, the handle was already cancelled, or the
    /// adopted backend has no canceller.
    pub fn cancel(&self, handle: FrameHandle) {
        match &self.inner.backend {
            Backend::Frame { cancel, .. } => {
                if let Some(cancel) = cancel {
                    cancel.cancel(handle.raw());
                }
            }
            Backend::Timer { timers, .. } => timers.clear_timeout(handle.raw()),
        }
    }

    /// A future resolving with the next frame timestamp.
    ///
    /// Dropping the future before it resolves cancels the underlying
    /// request.
    pub fn next_frame(&self) -> NextFrame {
        let shared = Rc::new(NextFrameShared {
            timestamp: Cell::new(None),
            waker: RefCell::new(None),
        });
        let handle = {
            let shared = shared.clone();
            self.schedule(move |timestamp| {
                shared.timestamp.set(Some(timestamp));
                if let Some(waker) = shared.waker.borrow_mut().take() {
                    waker.wake();
                }
            })
        };
        NextFrame {
            scheduler: self.clone(),
            shared,
            handle: Some(handle),
        }
    }
}

struct NextFrameShared {
    timestamp: Cell<Option<Millis>>,
    waker: RefCell<Option<Waker>>,
}

/// Future for [`FrameScheduler::next_frame`].
pub struct NextFrame {
    scheduler: FrameScheduler,
    shared: Rc<NextFrameShared>,
    handle: Option<FrameHandle>,
}

impl Future for NextFrame {
    type Output = Millis;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Millis> {
        let this = self.get_mut();
        if let Some(timestamp) = this.shared.timestamp.get() {
            this.handle = None;
            return Poll::Ready(timestamp);
        }
        *this.shared.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for NextFrame {
    fn drop(&mut self) {
        if self.shared.timestamp.get().is_some() {
            return;
        }
        if let Some(handle) = self.handle.take() {
            self.scheduler.cancel(handle);
        }
    }
}
