//! Ordered capability probing for frame facilities.
//!
//! The scheduler walks a fixed list of probe targets, the standard name
//! first and then each vendor prefix in priority order, and adopts the first
//! request function it finds together with that target's cancel function.
//! Probing stops at the first hit; the timer fallback is considered only
//! when every target misses.

use std::rc::Rc;

use crate::host::{FrameCancelFn, FrameCancelName, FrameRequestFn, FrameRequestName, HostEnv, Vendor};

/// A frame facility adopted from the host.
///
/// `cancel` may legitimately be absent: an engine can publish a request
/// function without any matching canceller, in which case cancellation on
/// that backend is a silent no-op.
pub(crate) struct FrameFns {
    pub(crate) name: FrameRequestName,
    pub(crate) request: Rc<dyn FrameRequestFn>,
    pub(crate) cancel: Option<Rc<dyn FrameCancelFn>>,
}

/// Probes the environment for a frame facility, in priority order.
pub(crate) fn probe_frame_fns(env: &dyn HostEnv) -> Option<FrameFns> {
    let targets = std::iter::once(FrameRequestName::Standard)
        .chain(Vendor::ALL.into_iter().map(FrameRequestName::Prefixed));
    for name in targets {
        if let Some(request) = env.frame_request_fn(name) {
            return Some(FrameFns {
                name,
                request,
                cancel: cancel_for(env, name),
            });
        }
    }
    None
}

/// Looks up the cancel function paired with an adopted request name,
/// falling back to the vendor's legacy cancel name when the primary one is
/// absent.
fn cancel_for(env: &dyn HostEnv, name: FrameRequestName) -> Option<Rc<dyn FrameCancelFn>> {
    match name {
        FrameRequestName::Standard => env.frame_cancel_fn(FrameCancelName::Standard),
        FrameRequestName::Prefixed(vendor) => env
            .frame_cancel_fn(FrameCancelName::Prefixed(vendor))
            .or_else(|| env.frame_cancel_fn(FrameCancelName::PrefixedLegacy(vendor))),
    }
}
