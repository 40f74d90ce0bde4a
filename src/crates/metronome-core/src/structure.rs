use crate::duration::MetricalDuration;
use crate::meter::Meter;
use crate::stratum::Stratum;
use serde::Serialize;

/// The metrical layout of a score: its meters in order, and its tempi.
///
/// The offset of each meter is the sum of the durations of the meters
/// before it and is computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Structure {
    meters: Vec<Meter>,
    tempi: Stratum,
}

/// A single beat of a [`Structure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Beat {
    /// Index of the meter the beat belongs to
    pub meter_index: usize,
    /// Index of the beat within its meter; `0` is the downbeat
    pub beat_index: usize,
    pub offset: MetricalDuration,
}

impl Beat {
    pub fn is_downbeat(&self) -> bool {
        self.beat_index == 0
    }
}

impl Structure {
    pub fn new(meters: Vec<Meter>, tempi: Stratum) -> Self {
        Structure { meters, tempi }
    }

    pub fn meters(&self) -> &[Meter] {
        &self.meters
    }

    pub fn tempi(&self) -> &Stratum {
        &self.tempi
    }

    /// Offset of the meter at `index`; `index == meters().len()` gives the
    /// end of the last meter.
    pub fn offset_of_meter(&self, index: usize) -> Option<MetricalDuration> {
        if index > self.meters.len() {
            return None;
        }
        Some(sum_durations(&self.meters[..index]))
    }

    pub fn total_duration(&self) -> MetricalDuration {
        sum_durations(&self.meters)
    }

    /// Each meter with its offset
    pub fn meter_offsets(&self) -> impl Iterator<Item = (MetricalDuration, &Meter)> + '_ {
        self.meters.iter().scan(MetricalDuration::ZERO, |offset, meter| {
            let start = *offset;
            *offset += meter.metrical_duration();
            Some((start, meter))
        })
    }

    /// Every beat of every meter, in order
    pub fn beats(&self) -> impl Iterator<Item = Beat> + '_ {
        self.meter_offsets()
            .enumerate()
            .flat_map(|(meter_index, (start, meter))| {
                meter.beat_offsets().enumerate().map(move |(beat_index, offset)| Beat {
                    meter_index,
                    beat_index,
                    offset: start + offset,
                })
            })
    }

    /// Seconds from the start of the score to `offset`
    pub fn seconds_at(&self, offset: MetricalDuration) -> f64 {
        self.tempi.seconds_at(offset)
    }
}

fn sum_durations(meters: &[Meter]) -> MetricalDuration {
    meters
        .iter()
        .fold(MetricalDuration::ZERO, |sum, meter| sum + meter.metrical_duration())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stratum::Builder;
    use crate::tempo::Tempo;

    fn structure() -> Structure {
        let meters = vec![Meter::new(4, 4), Meter::new(3, 8), Meter::new(5, 16)];
        Structure::new(meters, Stratum::default())
    }

    #[test]
    fn test_offsets_are_running_sums() {
        let structure = structure();
        assert_eq!(structure.offset_of_meter(0), Some(MetricalDuration::ZERO));
        assert_eq!(structure.offset_of_meter(1), Some(MetricalDuration::new(1, 1)));
        assert_eq!(structure.offset_of_meter(2), Some(MetricalDuration::new(11, 8)));
        assert_eq!(structure.offset_of_meter(3), Some(MetricalDuration::new(27, 16)));
        assert_eq!(structure.offset_of_meter(4), None);
        assert_eq!(structure.total_duration(), MetricalDuration::new(27, 16));
    }

    #[test]
    fn test_meter_offsets_match_offset_of_meter() {
        let structure = structure();
        for (index, (offset, meter)) in structure.meter_offsets().enumerate() {
            assert_eq!(Some(offset), structure.offset_of_meter(index));
            assert_eq!(meter, &structure.meters()[index]);
        }
    }

    #[test]
    fn test_beats() {
        let structure = structure();
        let beats: Vec<Beat> = structure.beats().collect();
        assert_eq!(beats.len(), 12);
        assert!(beats[0].is_downbeat());
        assert!(beats[4].is_downbeat());
        assert_eq!(beats[4].meter_index, 1);
        assert_eq!(beats[5].offset, MetricalDuration::new(9, 8));
        assert_eq!(beats[11].offset, MetricalDuration::new(26, 16));
        assert!(beats.windows(2).all(|pair| pair[0].offset < pair[1].offset));
    }

    #[test]
    fn test_empty_structure() {
        let structure = Structure::default();
        assert!(structure.meters().is_empty());
        assert_eq!(structure.total_duration(), MetricalDuration::ZERO);
        assert_eq!(structure.beats().count(), 0);
        assert_eq!(structure.tempi().len(), 1);
    }

    #[test]
    fn test_seconds_at_uses_tempi() {
        let mut builder = Builder::new();
        builder.add(Tempo::new(120.0, 4), MetricalDuration::ZERO, false);
        let structure = Structure::new(vec![Meter::new(4, 4); 2], builder.build());
        let end = structure.total_duration();
        assert!((structure.seconds_at(end) - 4.0).abs() < 1e-12);
    }
}
