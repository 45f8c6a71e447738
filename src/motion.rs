//! Entrance and exit timing
//!
//! Delays are pure functions of position, so a view can be rebuilt from
//! scratch on every frame and still animate consistently. `Presence`
//! remembers when each keyed element first appeared and keeps the last view
//! of elements that went away until their exit has played.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub const DEFAULT_STAGGER: Duration = Duration::from_millis(60);
pub const DEFAULT_EXIT: Duration = Duration::from_millis(220);

/// Delay for the `index`th sibling.
pub fn stagger_delay(index: usize, unit: Duration) -> Duration {
    unit.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Delay for an element inside a severity group: everything in the higher
/// groups goes first, then this group in its own order.
pub fn group_delay(prior_in_higher_groups: usize, index_in_group: usize, unit: Duration) -> Duration {
    stagger_delay(prior_in_higher_groups.saturating_add(index_in_group), unit)
}

/// Damped spring shared by every entrance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            stiffness: 170.0,
            damping: 26.0,
            mass: 1.0,
        }
    }
}

impl Spring {
    fn omega0(&self) -> f32 {
        (self.stiffness / self.mass).sqrt()
    }

    fn zeta(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    fn is_degenerate(&self) -> bool {
        !(self.stiffness > 0.0 && self.mass > 0.0 && self.damping >= 0.0)
    }

    /// Unclamped unit step response
    fn response(&self, t: f32) -> f32 {
        let omega0 = self.omega0();
        let zeta = self.zeta();
        if zeta < 1.0 {
            let omega_d = omega0 * (1.0 - zeta * zeta).sqrt();
            let envelope = (-zeta * omega0 * t).exp();
            1.0 - envelope * ((omega_d * t).cos() + (zeta * omega0 / omega_d) * (omega_d * t).sin())
        } else {
            // Over-damped springs are treated as critically damped
            1.0 - (-omega0 * t).exp() * (1.0 + omega0 * t)
        }
    }

    /// Step response at `elapsed`, clamped to `0.0..=1.0` (a terminal cell
    /// cannot overshoot).
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.is_degenerate() {
            return 1.0;
        }
        let t = elapsed.as_secs_f32();
        if t <= 0.0 {
            return 0.0;
        }
        self.response(t).clamp(0.0, 1.0)
    }

    /// Time after which the response stays within 1% of rest, capped at
    /// `MAX_SETTLE`.
    pub fn settle_time(&self) -> Duration {
        if self.is_degenerate() {
            return Duration::ZERO;
        }
        let steps = (MAX_SETTLE.as_millis() / SETTLE_STEP.as_millis()) as u32;
        let mut settled_at = Duration::ZERO;
        for step in 1..=steps {
            let at = SETTLE_STEP * step;
            if (1.0 - self.response(at.as_secs_f32())).abs() > 0.01 {
                settled_at = at + SETTLE_STEP;
            }
        }
        settled_at.min(MAX_SETTLE)
    }
}

const SETTLE_STEP: Duration = Duration::from_millis(5);
const MAX_SETTLE: Duration = Duration::from_secs(2);

/// Where an element is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Still inside its stagger delay
    Waiting,
    Entering(f32),
    Settled,
    /// Remaining visibility, 1.0 down to 0.0
    Exiting(f32),
}

impl Phase {
    pub fn opacity(&self) -> f32 {
        match self {
            Phase::Waiting => 0.0,
            Phase::Entering(p) | Phase::Exiting(p) => *p,
            Phase::Settled => 1.0,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Phase::Waiting)
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    first_seen: Instant,
    delay: Duration,
    removed_at: Option<Instant>,
    order: usize,
    last: V,
}

/// Keyed presence tracker
#[derive(Debug, Clone)]
pub struct Presence<K, V> {
    entries: HashMap<K, Entry<V>>,
    spring: Spring,
    settle: Duration,
    exit: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> Presence<K, V> {
    pub fn new(spring: Spring, exit: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            spring,
            settle: spring.settle_time(),
            exit,
        }
    }

    /// Record the elements present in this frame. New keys start entering,
    /// keys that are missing start exiting, and finished exits are pruned.
    pub fn sync<I>(&mut self, now: Instant, present: I)
    where
        I: IntoIterator<Item = (K, Duration, V)>,
    {
        let mut seen = Vec::new();
        for (order, (key, delay, view)) in present.into_iter().enumerate() {
            match self.entries.get_mut(&key) {
                Some(entry) => {
                    entry.removed_at = None;
                    entry.order = order;
                    entry.last = view;
                }
                None => {
                    self.entries.insert(
                        key.clone(),
                        Entry {
                            first_seen: now,
                            delay,
                            removed_at: None,
                            order,
                            last: view,
                        },
                    );
                }
            }
            seen.push(key);
        }

        for (key, entry) in self.entries.iter_mut() {
            if entry.removed_at.is_none() && !seen.contains(key) {
                entry.removed_at = Some(now);
            }
        }
        self.prune(now);
    }

    pub fn phase(&self, key: &K, now: Instant) -> Phase {
        match self.entries.get(key) {
            Some(entry) => self.entry_phase(entry, now),
            None => Phase::Waiting,
        }
    }

    fn entry_phase(&self, entry: &Entry<V>, now: Instant) -> Phase {
        if let Some(removed_at) = entry.removed_at {
            let gone = now.saturating_duration_since(removed_at);
            if self.exit.is_zero() || gone >= self.exit {
                return Phase::Exiting(0.0);
            }
            return Phase::Exiting(1.0 - gone.as_secs_f32() / self.exit.as_secs_f32());
        }
        let age = now.saturating_duration_since(entry.first_seen);
        if age < entry.delay {
            return Phase::Waiting;
        }
        let running = age - entry.delay;
        if running >= self.settle {
            Phase::Settled
        } else {
            Phase::Entering(self.spring.progress(running))
        }
    }

    /// Elements that are gone but still animating out, in their last order.
    pub fn exiting(&self, now: Instant) -> Vec<(&K, &V, Phase)> {
        let mut leaving: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.removed_at.is_some())
            .map(|(key, entry)| (entry.order, key, &entry.last, self.entry_phase(entry, now)))
            .filter(|(_, _, _, phase)| phase.opacity() > 0.0)
            .collect();
        leaving.sort_by_key(|(order, ..)| *order);
        leaving
            .into_iter()
            .map(|(_, key, view, phase)| (key, view, phase))
            .collect()
    }

    /// Last known position of a key (present or exiting).
    pub fn order_of(&self, key: &K) -> Option<usize> {
        self.entries.get(key).map(|entry| entry.order)
    }

    pub fn prune(&mut self, now: Instant) {
        let exit = self.exit;
        self.entries.retain(|_, entry| match entry.removed_at {
            Some(removed_at) => now.saturating_duration_since(removed_at) < exit,
            None => true,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for Presence<K, V> {
    fn default() -> Self {
        Self::new(Spring::default(), DEFAULT_EXIT)
    }
}
