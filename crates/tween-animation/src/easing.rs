//! Named easing curves.
//!
//! Curves ease the elapsed-time fraction; blending the eased fraction into a
//! value stays with `Lerp`. The registry ships empty and callers register
//! what they need. Resolving a name that was never registered warns and
//! substitutes the linear curve, so a typo degrades the motion instead of
//! breaking it.

use std::rc::Rc;

use indexmap::IndexMap;

/// Maps a time fraction in `[0, 1]` to an eased fraction. Outputs outside
/// `[0, 1]` are legal; overshooting curves produce them.
pub type EasingFn = Rc<dyn Fn(f64) -> f64>;

/// The identity curve.
pub fn linear() -> EasingFn {
    Rc::new(|t| t)
}

/// Insertion-ordered name-to-curve registry.
#[derive(Clone, Default)]
pub struct EasingTable {
    curves: IndexMap<String, EasingFn>,
}

impl EasingTable {
    pub fn new() -> Self {
        Self {
            curves: IndexMap::new(),
        }
    }

    /// Registers `easing` under `name`, replacing any previous curve.
    pub fn register(&mut self, name: impl Into<String>, easing: EasingFn) {
        self.curves.insert(name.into(), easing);
    }

    /// Convenience for registering a plain closure.
    pub fn register_fn(&mut self, name: impl Into<String>, easing: impl Fn(f64) -> f64 + 'static) {
        self.register(name, Rc::new(easing));
    }

    pub fn get(&self, name: &str) -> Option<EasingFn> {
        self.curves.get(name).cloned()
    }

    /// Looks up `name`, warning and falling back to linear when it was
    /// never registered.
    pub fn resolve(&self, name: &str) -> EasingFn {
        match self.get(name) {
            Some(easing) => easing,
            None => {
                log::warn!("unknown easing {name:?}, using linear");
                linear()
            }
        }
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}
