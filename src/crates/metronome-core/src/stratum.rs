//! Tempo strata: the tempo of a whole score, queryable at any metrical offset.
//!
//! A [`Stratum`] is an ordered list of [`TempoEvent`]s. A constant event
//! changes the tempo abruptly at its offset. An interpolating event marks the
//! end of a linear ramp: the tempo moves from the previous event's value to
//! the interpolating event's value across the span between them.
//!
//! Wall-clock time is the integral of `60 · ref / bpm(x)` over metrical
//! position `x`. Because `bpm(x)` is linear inside a ramp the integral has a
//! closed form,
//!
//! ```text
//! seconds(x) = 60 · ref · L / (b − a) · ln(bpm(x) / a)
//! ```
//!
//! where `a` and `b` are the tempi at the ends of a ramp of length `L` (in
//! whole notes) and `ref` is the reference subdivision. The stratum evaluates
//! this formula exactly (no quadrature), caches the clock time of every
//! event, and answers [`Stratum::seconds_elapsed`] as the difference of two
//! clock readings.

use crate::duration::MetricalDuration;
use crate::tempo::Tempo;
use log::{debug, trace};
use serde::Serialize;
use std::collections::BTreeMap;

/// A tempo declaration at a metrical offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TempoEvent {
    pub offset: MetricalDuration,
    pub tempo: Tempo,
    /// Whether the tempo is reached by a linear ramp from the previous event
    pub interpolating: bool,
}

/// Accumulates tempo events before freezing them into a [`Stratum`].
///
/// [`Builder::build`] consumes the builder, so events cannot be added to a
/// stratum once it has been built.
#[derive(Debug, Clone)]
pub struct Builder {
    default_tempo: Tempo,
    events: BTreeMap<MetricalDuration, (Tempo, bool)>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            default_tempo: Tempo::default(),
            events: BTreeMap::new(),
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder::default()
    }

    /// Use `tempo` at offset zero when no event is added there.
    pub fn with_default_tempo(mut self, tempo: Tempo) -> Self {
        self.default_tempo = tempo;
        self
    }

    /// Add a tempo event at `offset`.
    ///
    /// An event already registered at an equal offset (`1/4` and `2/8` are
    /// equal) is replaced.
    pub fn add(&mut self, tempo: Tempo, offset: MetricalDuration, interpolating: bool) -> &mut Self {
        trace!("tempo {} at {} (interpolating: {})", tempo, offset, interpolating);
        if let Some((previous, _)) = self.events.insert(offset, (tempo, interpolating)) {
            debug!("tempo {} at {} replaces {}", tempo, offset, previous);
        }
        self
    }

    /// Number of events added so far
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Freeze the events into a stratum, ordered by offset.
    ///
    /// When no event lies at offset zero a constant event with the default
    /// tempo is inserted there. The earliest event never interpolates, since
    /// there is nothing to ramp from.
    pub fn build(self) -> Stratum {
        let default_tempo = self.default_tempo;
        let mut events: Vec<TempoEvent> = self
            .events
            .into_iter()
            .map(|(offset, (tempo, interpolating))| TempoEvent {
                offset,
                tempo,
                interpolating,
            })
            .collect();

        let zero = events.partition_point(|event| event.offset < MetricalDuration::ZERO);
        if events.get(zero).map(|event| event.offset) != Some(MetricalDuration::ZERO) {
            debug!("no tempo at the downbeat, using {}", default_tempo);
            events.insert(
                zero,
                TempoEvent {
                    offset: MetricalDuration::ZERO,
                    tempo: default_tempo,
                    interpolating: false,
                },
            );
        }
        events[0].interpolating = false;

        Stratum::from_events(events, zero)
    }
}

/// Immutable, offset-ordered tempo events with precomputed clock times
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stratum {
    events: Vec<TempoEvent>,
    /// Seconds from offset zero to each event, parallel to `events`
    #[serde(skip)]
    clock: Vec<f64>,
}

impl Default for Stratum {
    fn default() -> Self {
        Builder::default().build()
    }
}

impl Stratum {
    fn from_events(events: Vec<TempoEvent>, zero: usize) -> Self {
        let mut stratum = Stratum {
            clock: vec![0.0; events.len()],
            events,
        };
        for index in 1..stratum.events.len() {
            let end = stratum.events[index].offset;
            let seconds = stratum.segment_seconds(index - 1, end);
            stratum.clock[index] = stratum.clock[index - 1] + seconds;
        }
        let origin = stratum.clock[zero];
        for time in &mut stratum.clock {
            *time -= origin;
        }
        debug!("built tempo stratum with {} events", stratum.events.len());
        stratum
    }

    pub fn events(&self) -> &[TempoEvent] {
        &self.events
    }

    /// Number of events (always at least one)
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Index of the latest event at or before `offset`, if any
    fn governing(&self, offset: MetricalDuration) -> Option<usize> {
        self.events
            .partition_point(|event| event.offset <= offset)
            .checked_sub(1)
    }

    /// The tempo sounding at `offset`.
    ///
    /// Inside a ramp the tempo is interpolated linearly and expressed in the
    /// subdivision of the event the ramp leads to. Before the first event the
    /// first tempo applies; after the last event the last tempo holds.
    pub fn tempo_at(&self, offset: MetricalDuration) -> Tempo {
        let index = match self.governing(offset) {
            Some(index) => index,
            None => return self.events[0].tempo,
        };
        let event = &self.events[index];
        if offset == event.offset {
            return event.tempo;
        }
        match self.events.get(index + 1) {
            Some(next) if next.interpolating => {
                let subdivision = next.tempo.subdivision();
                let start = event.tempo.respelling(subdivision).beats_per_minute();
                let end = next.tempo.beats_per_minute();
                let fraction = fraction_of(offset - event.offset, next.offset - event.offset);
                Tempo::new(start + (end - start) * fraction, subdivision)
            }
            _ => event.tempo,
        }
    }

    /// Seconds from offset zero to `offset` (negative before zero)
    pub fn seconds_at(&self, offset: MetricalDuration) -> f64 {
        match self.governing(offset) {
            Some(index) => self.clock[index] + self.segment_seconds(index, offset),
            None => {
                let first = &self.events[0];
                self.clock[0] - first.tempo.duration_of(first.offset - offset)
            }
        }
    }

    /// Wall-clock seconds between two offsets; negative when `to < from`.
    pub fn seconds_elapsed(&self, from: MetricalDuration, to: MetricalDuration) -> f64 {
        self.seconds_at(to) - self.seconds_at(from)
    }

    /// The metrical position, in whole notes, reached `seconds` after offset zero.
    ///
    /// This is the inverse of [`Stratum::seconds_at`].
    pub fn offset_at_seconds(&self, seconds: f64) -> f64 {
        let index = match self.clock.partition_point(|&time| time <= seconds).checked_sub(1) {
            Some(index) => index,
            None => {
                let first = &self.events[0];
                let before = self.clock[0] - seconds;
                return first.offset.to_float() - before * first.tempo.whole_notes_per_second();
            }
        };
        let event = &self.events[index];
        let elapsed = seconds - self.clock[index];
        match self.events.get(index + 1) {
            Some(next) if next.interpolating => {
                let (ratio, scale) = ramp_shape(event.tempo, next.tempo, next.offset - event.offset);
                // Invert scale · ln(1 + ratio · f) / ratio for the covered fraction f
                let fraction = if ratio == 0.0 {
                    elapsed / scale
                } else {
                    (elapsed * ratio / scale).exp_m1() / ratio
                };
                event.offset.to_float() + fraction * (next.offset - event.offset).to_float()
            }
            _ => event.offset.to_float() + elapsed * event.tempo.whole_notes_per_second(),
        }
    }

    /// Seconds from event `index` to `offset`, which lies inside its segment
    fn segment_seconds(&self, index: usize, offset: MetricalDuration) -> f64 {
        let event = &self.events[index];
        match self.events.get(index + 1) {
            Some(next) if next.interpolating => {
                let (ratio, scale) = ramp_shape(event.tempo, next.tempo, next.offset - event.offset);
                let fraction = fraction_of(offset - event.offset, next.offset - event.offset);
                if ratio == 0.0 {
                    scale * fraction
                } else {
                    scale * (ratio * fraction).ln_1p() / ratio
                }
            }
            _ => event.tempo.duration_of(offset - event.offset),
        }
    }
}

/// Exact `part / whole` as a float
fn fraction_of(part: MetricalDuration, whole: MetricalDuration) -> f64 {
    let numerator = part.beats() as i128 * whole.subdivision() as i128;
    let denominator = whole.beats() as i128 * part.subdivision() as i128;
    numerator as f64 / denominator as f64
}

/// Parameters of a ramp from `from` to `to` over `span`.
///
/// Returns the relative tempo change `(b − a) / a` and the seconds the whole
/// span would take at the starting tempo `a`. The elapsed time after covering
/// fraction `f` of the span is `scale · ln(1 + ratio · f) / ratio`.
fn ramp_shape(from: Tempo, to: Tempo, span: MetricalDuration) -> (f64, f64) {
    let start = from.respelling(to.subdivision());
    let a = start.beats_per_minute();
    let b = to.beats_per_minute();
    ((b - a) / a, start.duration_of(span))
}
