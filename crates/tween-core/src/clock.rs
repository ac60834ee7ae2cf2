//! Canonical clock resolution.
//!
//! A scheduler answers `now()` from exactly one of two tiers, chosen at
//! initialization: a host high-resolution clock when present, otherwise a
//! clock synthesized from wall-clock readings relative to a fixed origin.

use std::rc::Rc;

use crate::host::{HighResClock, HostEnv, WallClock};
use crate::Millis;

/// The scheduler's canonical time source.
pub(crate) enum SchedulerClock {
    /// Tier 1: delegate directly to the host's high-resolution clock.
    HighRes(Rc<dyn HighResClock>),
    /// Tier 2: wall clock minus a reference origin captured at resolution
    /// time. Regresses if the host adjusts its wall clock backwards; that is
    /// a known limitation of the wall tier and is deliberately not papered
    /// over.
    Synthesized {
        wall: Rc<dyn WallClock>,
        origin: Millis,
    },
}

impl SchedulerClock {
    /// Picks the best clock the environment supports.
    ///
    /// Without a high-resolution clock, readings come from the host's wall
    /// clock, or from a wall clock synthesized over the host's timestamp
    /// construction primitive when even a direct wall clock is missing. The
    /// origin is the host's startup timestamp when its startup record
    /// exposes one, else a single wall reading taken here, so the first
    /// `now()` lands at or near zero.
    pub(crate) fn resolve(env: &Rc<dyn HostEnv>) -> Self {
        if let Some(clock) = env.high_res_clock() {
            return SchedulerClock::HighRes(clock);
        }
        let wall: Rc<dyn WallClock> = match env.wall_clock() {
            Some(wall) => wall,
            None => Rc::new(ConstructedWallClock { env: env.clone() }),
        };
        let origin = match env.startup_millis() {
            Some(startup) => startup,
            None => wall.now(),
        };
        SchedulerClock::Synthesized { wall, origin }
    }

    pub(crate) fn now(&self) -> Millis {
        match self {
            SchedulerClock::HighRes(clock) => clock.now(),
            SchedulerClock::Synthesized { wall, origin } => wall.now() - origin,
        }
    }

    pub(crate) fn is_synthesized(&self) -> bool {
        matches!(self, SchedulerClock::Synthesized { .. })
    }
}

/// Wall clock adapter over the host's date construction primitive.
struct ConstructedWallClock {
    env: Rc<dyn HostEnv>,
}

impl WallClock for ConstructedWallClock {
    fn now(&self) -> Millis {
        self.env.construct_timestamp()
    }
}
