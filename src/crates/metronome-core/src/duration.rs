use crate::rational::Rational;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Sub};

/// Whether `value` is a positive power of two (1, 2, 4, 8, ...)
pub fn is_power_of_two(value: i64) -> bool {
    value > 0 && value & (value - 1) == 0
}

/// A length of musical time: `beats` notes of value `1/subdivision`.
///
/// `MetricalDuration::new(3, 16)` is three sixteenth notes. Comparison is by
/// value, so `2/8` and `1/4` are the same duration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricalDuration {
    beats: i64,
    subdivision: i64,
}

impl MetricalDuration {
    pub const ZERO: MetricalDuration = MetricalDuration {
        beats: 0,
        subdivision: 1,
    };

    /// # Panics
    ///
    /// Panics if `subdivision` is not a positive power of two.
    pub fn new(beats: i64, subdivision: i64) -> Self {
        assert!(
            is_power_of_two(subdivision),
            "Subdivision must be a power of two, got {}",
            subdivision
        );
        MetricalDuration { beats, subdivision }
    }

    pub fn beats(&self) -> i64 {
        self.beats
    }

    pub fn subdivision(&self) -> i64 {
        self.subdivision
    }

    /// The duration as an exact fraction of a whole note
    pub fn rational(&self) -> Rational {
        Rational::new(self.beats, self.subdivision)
    }

    /// The duration in whole notes, as a float
    pub fn to_float(&self) -> f64 {
        self.rational().to_float()
    }

    pub fn is_zero(&self) -> bool {
        self.beats == 0
    }

    /// Express the duration with another subdivision, if the beat count stays
    /// integral and fits in an `i64`.
    pub fn respelling(&self, subdivision: i64) -> Option<Self> {
        if !is_power_of_two(subdivision) {
            return None;
        }
        let beats = if subdivision >= self.subdivision {
            self.beats.checked_mul(subdivision / self.subdivision)?
        } else {
            let factor = self.subdivision / subdivision;
            if self.beats % factor != 0 {
                return None;
            }
            self.beats / factor
        };
        Some(MetricalDuration { beats, subdivision })
    }

    /// `self + other`, or `None` on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let (beats1, beats2, subdivision) = self.with_common_subdivision(other)?;
        Some(MetricalDuration::new(beats1.checked_add(beats2)?, subdivision))
    }

    /// `self - other`, or `None` on overflow
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (beats1, beats2, subdivision) = self.with_common_subdivision(other)?;
        Some(MetricalDuration::new(beats1.checked_sub(beats2)?, subdivision))
    }

    fn with_common_subdivision(self, other: Self) -> Option<(i64, i64, i64)> {
        // lcm of two powers of two
        let subdivision = self.subdivision.max(other.subdivision);
        Some((
            self.respelling(subdivision)?.beats,
            other.respelling(subdivision)?.beats,
            subdivision,
        ))
    }
}

impl Default for MetricalDuration {
    fn default() -> Self {
        MetricalDuration::ZERO
    }
}

impl fmt::Display for MetricalDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.subdivision)
    }
}

impl From<MetricalDuration> for Rational {
    fn from(duration: MetricalDuration) -> Self {
        duration.rational()
    }
}

impl PartialEq for MetricalDuration {
    fn eq(&self, other: &Self) -> bool {
        self.rational() == other.rational()
    }
}

impl Eq for MetricalDuration {}

impl Hash for MetricalDuration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rational().hash(state);
    }
}

impl PartialOrd for MetricalDuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetricalDuration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rational().cmp(&other.rational())
    }
}

impl Add for MetricalDuration {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(other)
            .unwrap_or_else(|| panic!("Overflow adding {} and {}", self, other))
    }
}

impl AddAssign for MetricalDuration {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for MetricalDuration {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(other)
            .unwrap_or_else(|| panic!("Overflow subtracting {} from {}", other, self))
    }
}
