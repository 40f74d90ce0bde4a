use crate::duration::{is_power_of_two, MetricalDuration};
use serde::Serialize;
use std::fmt;

/// Largest power-of-two subdivision an `i64` can hold
const FINEST_SUBDIVISION: i64 = 1 << 62;

/// Rate of metrical time: `beats_per_minute` notes of value `1/subdivision`
/// per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tempo {
    beats_per_minute: f64,
    subdivision: i64,
}

impl Tempo {
    /// # Panics
    ///
    /// Panics unless `beats_per_minute` is finite and positive and
    /// `subdivision` is a power of two.
    pub fn new(beats_per_minute: f64, subdivision: i64) -> Self {
        assert!(
            beats_per_minute.is_finite() && beats_per_minute > 0.0,
            "Tempo must be finite and positive, got {}",
            beats_per_minute
        );
        assert!(
            is_power_of_two(subdivision),
            "Tempo subdivision must be a power of two, got {}",
            subdivision
        );
        Tempo {
            beats_per_minute,
            subdivision,
        }
    }

    pub fn beats_per_minute(&self) -> f64 {
        self.beats_per_minute
    }

    pub fn subdivision(&self) -> i64 {
        self.subdivision
    }

    /// Create a tempo, or `None` unless `beats_per_minute` is finite and
    /// positive and `subdivision` is a power of two.
    pub fn try_new(beats_per_minute: f64, subdivision: i64) -> Option<Self> {
        let valid = beats_per_minute.is_finite()
            && beats_per_minute > 0.0
            && is_power_of_two(subdivision);
        valid.then(|| Tempo {
            beats_per_minute,
            subdivision,
        })
    }

    /// The same rate counted in notes of value `1/subdivision`.
    ///
    /// ```
    /// use metronome_core::Tempo;
    ///
    /// assert_eq!(Tempo::new(60.0, 4).respelling(8).beats_per_minute(), 120.0);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics when the respelled rate is not a finite positive number. Tempi
    /// for which [`Tempo::is_respellable`] holds never panic.
    pub fn respelling(&self, subdivision: i64) -> Tempo {
        Tempo::new(self.respelled_rate(subdivision), subdivision)
    }

    /// [`Tempo::respelling`], or `None` when the rate leaves the finite positive range
    pub fn try_respelling(&self, subdivision: i64) -> Option<Tempo> {
        Tempo::try_new(self.respelled_rate(subdivision), subdivision)
    }

    /// Whether the rate stays a normal positive number in every subdivision
    /// from `1` to `2^62`, so that respelling and interpolation cannot fail.
    pub fn is_respellable(&self) -> bool {
        [1, FINEST_SUBDIVISION].iter().all(|&subdivision| {
            self.try_respelling(subdivision)
                .map_or(false, |tempo| tempo.beats_per_minute.is_normal())
        })
    }

    fn respelled_rate(&self, subdivision: i64) -> f64 {
        // ratio of two powers of two, exact
        self.beats_per_minute * (subdivision as f64 / self.subdivision as f64)
    }

    /// Whole notes per second
    pub fn whole_notes_per_second(&self) -> f64 {
        self.beats_per_minute / 60.0 / self.subdivision as f64
    }

    /// Seconds taken by `span` when played at this tempo
    pub fn duration_of(&self, span: MetricalDuration) -> f64 {
        span.to_float() / self.whole_notes_per_second()
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo::new(60.0, 4)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{} = {}", self.subdivision, self.beats_per_minute)
    }
}
