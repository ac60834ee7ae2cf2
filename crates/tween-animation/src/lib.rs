//! Tween driver for Tween-RS.
//!
//! This crate animates values over frames delivered by a
//! `tween_core::FrameScheduler`: a [`TweenSpec`] names the endpoints and
//! timing, an [`EasingTable`] maps curve names to functions, and a [`Tween`]
//! owns the per-frame loop.

pub mod easing;
pub mod tween;

pub use easing::{linear, EasingFn, EasingTable};
pub use tween::{Lerp, Tween, TweenSpec, DEFAULT_DURATION_MILLIS};

pub mod prelude {
    pub use crate::easing::{linear, EasingFn, EasingTable};
    pub use crate::tween::{Lerp, Tween, TweenSpec};
}
