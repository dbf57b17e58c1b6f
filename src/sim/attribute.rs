//! Clamped depletable resources (HP, shield, food).

use serde::{Deserialize, Serialize};

/// A numeric resource clamped to `[0, max]`.
///
/// Mutators report whether the clamped value actually changed; damage and
/// heal logic use that signal to decide whether to raise downstream events,
/// so a clamped-to-same-value write must return `false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeBar {
    current: f32,
    max: f32,
}

impl AttributeBar {
    /// Full bar. `max` must be positive.
    pub fn new(max: f32) -> Self {
        debug_assert!(max > 0.0);
        Self { current: max, max }
    }

    pub fn with_value(max: f32, current: f32) -> Self {
        debug_assert!(max > 0.0);
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current <= 0.0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    /// Fraction in [0,1], for observation encoders
    #[inline]
    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    /// Add `delta` (negative to deplete), clamping into `[0, max]`.
    /// Returns true iff the stored value changed.
    pub fn change_by(&mut self, delta: f32) -> bool {
        self.set(self.current + delta)
    }

    /// Set the value, clamping into `[0, max]`.
    /// Returns true iff the stored value changed.
    pub fn set(&mut self, value: f32) -> bool {
        let clamped = value.clamp(0.0, self.max);
        if clamped == self.current {
            return false;
        }
        self.current = clamped;
        true
    }

    /// Refill to max (round reset)
    pub fn refill(&mut self) {
        self.current = self.max;
    }
}
