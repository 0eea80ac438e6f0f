use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn interpolate(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
        }
    }
}

/// Timing of a page slide.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1000),
            easing: Easing::Linear,
        }
    }
}

/// Frame clock. The driver samples it once per frame and threads the instant
/// through every time-dependent call; library code never reads it directly.
pub trait Clock {
    fn now(&self) -> Instant;
}

pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock tests can drive deterministically. Cloned handles share the same
/// underlying instant, so advancing one advances them all.
#[derive(Clone)]
pub struct TestClock {
    t: Rc<Cell<Instant>>,
}

impl TestClock {
    pub fn new(start: Instant) -> Self {
        Self {
            t: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }

    pub fn set(&self, to: Instant) {
        self.t.set(to);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
