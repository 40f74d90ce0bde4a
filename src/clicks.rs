// Click schedule: when each beat of a score sounds

use metronome_core::{MetricalDuration, Structure};
use serde::Serialize;
use std::fmt;

/// One metronome click
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Click {
    /// Bar number, starting at 1
    pub bar: usize,
    /// Beat within the bar, starting at 1
    pub beat: usize,
    pub offset: MetricalDuration,
    /// Seconds from the start of the score
    pub seconds: f64,
    /// Tempo sounding at the click, in beats per minute
    pub beats_per_minute: f64,
    /// Note value the tempo counts
    pub subdivision: i64,
    pub accent: bool,
}

impl fmt::Display for Click {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>10.3}s  bar {:>3} beat {:>2}  at {:<8} 1/{} = {:.2}{}",
            self.seconds,
            self.bar,
            self.beat,
            self.offset.to_string(),
            self.subdivision,
            self.beats_per_minute,
            if self.accent { "  >" } else { "" }
        )
    }
}

/// Every click of `structure`, in order
pub fn schedule(structure: &Structure) -> impl Iterator<Item = Click> + '_ {
    structure.beats().map(move |beat| {
        let tempo = structure.tempi().tempo_at(beat.offset);
        Click {
            bar: beat.meter_index + 1,
            beat: beat.beat_index + 1,
            offset: beat.offset,
            seconds: structure.seconds_at(beat.offset),
            beats_per_minute: tempo.beats_per_minute(),
            subdivision: tempo.subdivision(),
            accent: beat.is_downbeat(),
        }
    })
}
