//! Host environment abstraction for the frame scheduler.
//!
//! These traits describe what a hosting runtime may expose: clocks, a frame
//! request/cancel function pair under one of several well-known names, and a
//! one-shot timer facility. Every capability is optional except timestamp
//! construction, so a [`HostEnv`] can model anything from a full browser-like
//! environment down to a bare process with nothing but a date primitive.

use std::rc::Rc;

use crate::{Millis, RawHandle};

/// Callback invoked with the scheduler's estimate of the frame time.
pub type FrameCallback = Box<dyn FnOnce(Millis) + 'static>;

/// High-resolution monotonic clock, the `performance.now` analog.
pub trait HighResClock {
    fn now(&self) -> Millis;
}

/// Wall clock reporting milliseconds since a fixed epoch, the `Date.now`
/// analog. Not guaranteed monotonic: the host may adjust it.
pub trait WallClock {
    fn now(&self) -> Millis;
}

/// One half of a frame facility: accepts a callback and returns a raw handle
/// usable for cancellation.
pub trait FrameRequestFn {
    fn request(&self, callback: FrameCallback) -> RawHandle;
}

/// The other half of a frame facility: revokes a still-pending request.
pub trait FrameCancelFn {
    fn cancel(&self, handle: RawHandle);
}

/// One-shot timer facility, the `setTimeout`/`clearTimeout` analog.
pub trait TimerHost {
    /// Arms a timer firing `callback` once after roughly `delay` milliseconds.
    fn set_timeout(&self, callback: Box<dyn FnOnce() + 'static>, delay: Millis) -> RawHandle;

    /// Disarms a pending timer. No-op for unknown or already-fired handles.
    fn clear_timeout(&self, handle: RawHandle);
}

/// Engine prefixes under which pre-standard frame facilities were shipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    Ms,
    Moz,
    Webkit,
    O,
}

impl Vendor {
    /// Probe priority order. `Ms` outranks `Moz`, which outranks `Webkit`,
    /// which outranks `O`.
    pub const ALL: [Vendor; 4] = [Vendor::Ms, Vendor::Moz, Vendor::Webkit, Vendor::O];

    pub fn prefix(self) -> &'static str {
        match self {
            Vendor::Ms => "ms",
            Vendor::Moz => "moz",
            Vendor::Webkit => "webkit",
            Vendor::O => "o",
        }
    }
}

/// Name a frame request function may be published under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameRequestName {
    Standard,
    Prefixed(Vendor),
}

/// Name a frame cancel function may be published under. Some engines shipped
/// the canceller under an alternate legacy name, looked up only when the
/// primary prefixed name is absent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameCancelName {
    Standard,
    Prefixed(Vendor),
    PrefixedLegacy(Vendor),
}

/// Capability surface of a hosting runtime.
///
/// Lookup methods return `None` when the host does not provide the
/// capability; the scheduler silently falls through to its next tier.
/// Implementations are read-only from the scheduler's point of view, so
/// initializing several schedulers against the same environment selects the
/// same backends without wrapping one another.
pub trait HostEnv {
    /// High-resolution clock, if the host has one.
    fn high_res_clock(&self) -> Option<Rc<dyn HighResClock>> {
        None
    }

    /// Direct wall clock, if the host has one.
    fn wall_clock(&self) -> Option<Rc<dyn WallClock>> {
        None
    }

    /// Frame request function published under `name`, if any.
    fn frame_request_fn(&self, name: FrameRequestName) -> Option<Rc<dyn FrameRequestFn>> {
        let _ = name;
        None
    }

    /// Frame cancel function published under `name`, if any.
    fn frame_cancel_fn(&self, name: FrameCancelName) -> Option<Rc<dyn FrameCancelFn>> {
        let _ = name;
        None
    }

    /// One-shot timer facility, if the host has one.
    fn timer_host(&self) -> Option<Rc<dyn TimerHost>> {
        None
    }

    /// Timestamp of the host's startup record, the navigation-start analog.
    fn startup_millis(&self) -> Option<Millis> {
        None
    }

    /// Constructs a wall-clock timestamp from the host's date primitive.
    /// Always answerable; the last resort for clock synthesis.
    fn construct_timestamp(&self) -> Millis;
}
