use crate::duration::{is_power_of_two, MetricalDuration};
use serde::Serialize;
use std::fmt;

/// A time signature: `beats` notes of value `1/subdivision` per bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Meter {
    beats: i64,
    subdivision: i64,
}

impl Meter {
    /// Create a meter.
    ///
    /// # Panics
    ///
    /// Panics if `subdivision` is not a positive power of two. Use
    /// [`Meter::try_new`] for values that come from user input.
    pub fn new(beats: i64, subdivision: i64) -> Self {
        assert!(
            is_power_of_two(subdivision),
            "Meter subdivision must be a power of two, got {}/{}",
            beats,
            subdivision
        );
        Meter { beats, subdivision }
    }

    /// Create a meter, or `None` if `subdivision` is not a power of two.
    pub fn try_new(beats: i64, subdivision: i64) -> Option<Self> {
        is_power_of_two(subdivision).then(|| Meter { beats, subdivision })
    }

    pub fn beats(&self) -> i64 {
        self.beats
    }

    pub fn subdivision(&self) -> i64 {
        self.subdivision
    }

    /// Length of one bar of this meter
    pub fn metrical_duration(&self) -> MetricalDuration {
        MetricalDuration::new(self.beats, self.subdivision)
    }

    /// Offset of each beat from the downbeat
    pub fn beat_offsets(&self) -> impl Iterator<Item = MetricalDuration> {
        let subdivision = self.subdivision;
        (0..self.beats.max(0)).map(move |beat| MetricalDuration::new(beat, subdivision))
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.subdivision)
    }
}
