//! Frame scheduling core for Tween-RS.
//!
//! This crate provides [`FrameScheduler`], a uniform time source and a
//! best-effort 60 Hz one-shot callback primitive built on whatever the host
//! environment exposes. A scheduler is constructed explicitly from a
//! [`HostEnv`] describing the host's capabilities; it probes for a native
//! frame facility (standard name first, then vendor-prefixed variants) and
//! falls back to a paced one-shot timer when none exists.

mod clock;
mod probe;

pub mod collections;
pub mod host;
pub mod scheduler;

pub use host::{
    FrameCallback, FrameCancelFn, FrameCancelName, FrameRequestFn, FrameRequestName, HighResClock,
    HostEnv, TimerHost, Vendor, WallClock,
};
pub use scheduler::{BackendKind, FrameHandle, FrameScheduler, NextFrame, FRAME_INTERVAL_MILLIS};

/// Milliseconds since a backend-defined reference point.
pub type Millis = f64;

/// Raw identifier handed out by a host backend for a pending request.
pub type RawHandle = u64;
